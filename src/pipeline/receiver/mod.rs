//! Receiver pipeline components
//!
//! The receiver pipeline flow:
//! ```text
//! Network → ConnectionEvent → TelemetryAggregator → watch<TelemetryState>
//! ```

pub mod coordinator;

pub use coordinator::DashboardCoordinator;
