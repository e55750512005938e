//! Participant identity and session endpoint addressing.

use crate::assets::{STUDENT_PREFIX, TEACHER_DASHBOARD_ID};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Invalid URL format.
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// The base URL cannot carry path segments (e.g. `mailto:`).
    #[error("URL cannot be used as an endpoint base: {0}")]
    NotABase(String),

    #[error("Unsupported scheme {0:?}, expected ws or wss")]
    Scheme(String),
}

/// Which side of the session a client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Role {
    /// Producer: streams webcam frames
    Student,
    /// Consumer: aggregates the session's event stream
    TeacherDashboard,
}

/// Lower-cases `name` and collapses every whitespace run into one `_`.
pub fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_space = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('_');
            }
            in_space = true;
        } else {
            out.extend(c.to_lowercase());
            in_space = false;
        }
    }
    out
}

/// Identity of one connection within a session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Derives the id for `role`. The dashboard uses a fixed id and ignores
    /// the username.
    pub fn for_role(role: Role, username: &str) -> Self {
        match role {
            Role::Student => Self::student(username),
            Role::TeacherDashboard => Self::teacher_dashboard(),
        }
    }

    pub fn student(username: &str) -> Self {
        Self(format!("{}{}", STUDENT_PREFIX, sanitize(username)))
    }

    pub fn teacher_dashboard() -> Self {
        Self(TEACHER_DASHBOARD_ID.to_string())
    }

    /// Wraps an id received over the wire, verbatim.
    pub fn from_wire(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The id without its student prefix, for labelling feeds.
    pub fn display_name(&self) -> &str {
        self.0.strip_prefix(STUDENT_PREFIX).unwrap_or(&self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Username used when a student joins without one: `student_<0..1000>`.
pub fn random_username() -> String {
    format!("{}{}", STUDENT_PREFIX, rand::thread_rng().gen_range(0..1000))
}

/// Address of one participant's event stream: `<base>/session/{session}/{participant}`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
    session_id: String,
    participant: ParticipantId,
}

impl Endpoint {
    pub fn new(base: &str, session_id: impl Into<String>, participant: ParticipantId) -> Result<Self, ConnectionError> {
        let base = Url::parse(base)?;
        match base.scheme() {
            "ws" | "wss" => {}
            other => return Err(ConnectionError::Scheme(other.to_string())),
        }
        if base.cannot_be_a_base() {
            return Err(ConnectionError::NotABase(base.to_string()));
        }
        Ok(Self {
            base,
            session_id: session_id.into(),
            participant,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    /// `/session/{sessionId}/{participantId}`
    pub fn path(&self) -> String {
        format!("/session/{}/{}", self.session_id, self.participant)
    }

    /// Full URL, with the path appended to the base and each segment escaped.
    pub fn url(&self) -> Result<Url, ConnectionError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ConnectionError::NotABase(self.base.to_string()))?
            .pop_if_empty()
            .extend(["session", self.session_id.as_str(), self.participant.as_str()]);
        Ok(url)
    }
}
