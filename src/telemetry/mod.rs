//! Consumer-side aggregation of the session event stream.
//!
//! ```text
//! ConnectionEvent::Message → TelemetryEvent::parse → TelemetryAggregator::dispatch
//!                                                      └─ TelemetryState::apply
//! ```

pub mod aggregator;
pub mod feeds;
pub mod histogram;
pub mod history;
pub mod insights;
pub mod snapshot;
pub mod state;

pub use aggregator::TelemetryAggregator;
pub use snapshot::DashboardSnapshot;
pub use state::TelemetryState;
