pub mod connection;
pub mod endpoint;
pub mod session;
pub mod state;

pub use connection::{
    CloseReason, Connection, ConnectionEvent, ConnectionManager, FrameSink, Outbound, SendOutcome,
};
pub use endpoint::{ConnectionError, Endpoint, ParticipantId, Role};
pub use state::ConnectionState;
