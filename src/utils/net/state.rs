//! Connection lifecycle state

use serde::Serialize;

/// Lifecycle of a single connection instance.
///
/// Transitions are monotonic: `Connecting → Open → Closed`, or
/// `Connecting → Closed` when the handshake fails. A closed connection is
/// never reopened; a new one must be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,

    /// Frames may be sent and received
    Open,

    /// Terminal
    Closed,
}

impl ConnectionState {
    /// Check if this state transition is valid
    pub fn can_transition_to(&self, target: &ConnectionState) -> bool {
        use ConnectionState::*;

        match (self, target) {
            (Connecting, Open) => true,
            (Connecting, Closed) => true,
            (Open, Closed) => true,

            // From Closed - no transitions allowed
            (Closed, _) => false,

            // Self-transitions
            (a, b) if a == b => true,

            _ => false,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "Connecting",
            ConnectionState::Open => "Open",
            ConnectionState::Closed => "Closed",
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConnectionState::Closed)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}
