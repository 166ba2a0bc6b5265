//! Value objects shared across the domain.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Process-lifetime identifier of one client connection.
///
/// Assigned by the server when the WebSocket is accepted; a client
/// never chooses its own id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a connection id from its wire representation.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }

    /// Short prefix used for generated display names.
    pub fn short(&self) -> String {
        self.0.simple().to_string().chars().take(5).collect()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Participant role, fixed for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}
