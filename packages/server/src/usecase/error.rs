//! Closed error taxonomy for session operations.
//!
//! Every failure a handler can produce falls into exactly one of four
//! categories, so the coordinator and its tests match exhaustively
//! instead of comparing message strings. The `Display` text of each
//! variant is what the caller sees in its failure ack.

use thiserror::Error;

use crate::domain::{StartPollError, VoteError};

/// Malformed or missing input. Reported to the caller, never fatal,
/// never broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Provide a question and at least one option.")]
    MissingQuestionOrOptions,
    #[error("Empty message")]
    EmptyMessage,
}

/// Wrong role attempting a privileged action. The event is otherwise
/// fully ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("Only a teacher can create a poll.")]
    CreatePollRequiresTeacher,
    #[error("Only a teacher can view the student roster.")]
    RosterRequiresTeacher,
    #[error("Only a teacher can remove students.")]
    RemoveRequiresTeacher,
    #[error("Register as a student first.")]
    NotRegisteredStudent,
}

/// Request conflicts with current poll state; server state is left
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateConflictError {
    #[error(
        "Cannot start a new poll until the current one is completed by all students or has ended."
    )]
    PollInProgress,
    #[error("No active poll to answer.")]
    NoActivePoll,
    #[error("Invalid option index.")]
    InvalidOption,
    #[error("You have already answered.")]
    AlreadyAnswered,
}

/// Anything a session handler can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Authorization(#[from] AuthorizationError),
    #[error(transparent)]
    StateConflict(#[from] StateConflictError),
    /// Caught at the handler boundary and converted to a generic
    /// failure ack; never propagated to other clients.
    #[error("{0}")]
    Internal(String),
}

impl From<StartPollError> for SessionError {
    fn from(err: StartPollError) -> Self {
        match err {
            StartPollError::EmptyQuestion | StartPollError::NoOptions => {
                SessionError::Validation(ValidationError::MissingQuestionOrOptions)
            }
        }
    }
}

impl From<VoteError> for SessionError {
    fn from(err: VoteError) -> Self {
        let conflict = match err {
            VoteError::NotActive => StateConflictError::NoActivePoll,
            VoteError::AlreadyVoted => StateConflictError::AlreadyAnswered,
            VoteError::InvalidOption => StateConflictError::InvalidOption,
        };
        SessionError::StateConflict(conflict)
    }
}
