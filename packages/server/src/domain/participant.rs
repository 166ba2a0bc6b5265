//! Participant registry: connected identities keyed by connection id.
//!
//! The registry owns nothing but its own map. It never touches poll
//! state and never triggers broadcasts; the session coordinator reads
//! it through accessors when it needs roles or counts.

use std::collections::HashMap;

use serde::Serialize;

use super::value_object::{ConnectionId, Role};

/// Fixed display label assigned to every teacher connection.
pub const TEACHER_DISPLAY_NAME: &str = "Teacher";

/// One registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub role: Role,
    pub display_name: String,
}

/// Registry of connected student and teacher identities.
///
/// Multiple teacher connections may coexist; student display names
/// are not required to be unique.
#[derive(Debug, Default, Serialize)]
pub struct ParticipantRegistry {
    entries: HashMap<ConnectionId, Participant>,
}

impl ParticipantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under the given role.
    ///
    /// Students get `requested_name` (trimmed) when non-empty,
    /// otherwise a name derived from the connection id. Teachers get
    /// the fixed label. A connection that is already registered keeps
    /// its original entry untouched: the role is never renegotiated.
    pub fn register(
        &mut self,
        connection_id: ConnectionId,
        role: Role,
        requested_name: Option<&str>,
    ) -> &Participant {
        self.entries.entry(connection_id).or_insert_with(|| {
            let display_name = match role {
                Role::Teacher => TEACHER_DISPLAY_NAME.to_string(),
                Role::Student => {
                    let trimmed = requested_name.unwrap_or_default().trim();
                    if trimmed.is_empty() {
                        format!("Student_{}", connection_id.short())
                    } else {
                        trimmed.to_string()
                    }
                }
            };
            Participant { role, display_name }
        })
    }

    /// Remove a connection's entry. Idempotent; returns the removed
    /// participant when one existed.
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> Option<Participant> {
        self.entries.remove(connection_id)
    }

    pub fn get(&self, connection_id: &ConnectionId) -> Option<&Participant> {
        self.entries.get(connection_id)
    }

    pub fn is_teacher(&self, connection_id: &ConnectionId) -> bool {
        matches!(
            self.entries.get(connection_id),
            Some(p) if p.role == Role::Teacher
        )
    }

    pub fn is_student(&self, connection_id: &ConnectionId) -> bool {
        matches!(
            self.entries.get(connection_id),
            Some(p) if p.role == Role::Student
        )
    }

    /// Snapshot of the student roster, sorted by connection id for
    /// consistent ordering.
    pub fn students(&self) -> Vec<(ConnectionId, String)> {
        let mut students: Vec<(ConnectionId, String)> = self
            .entries
            .iter()
            .filter(|(_, p)| p.role == Role::Student)
            .map(|(id, p)| (*id, p.display_name.clone()))
            .collect();
        students.sort_by_key(|(id, _)| id.to_string());
        students
    }

    pub fn student_count(&self) -> usize {
        self.entries
            .values()
            .filter(|p| p.role == Role::Student)
            .count()
    }

    /// Connection ids of every registered teacher.
    pub fn teacher_ids(&self) -> Vec<ConnectionId> {
        self.entries
            .iter()
            .filter(|(_, p)| p.role == Role::Teacher)
            .map(|(id, _)| *id)
            .collect()
    }
}
