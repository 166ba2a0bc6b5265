//! Usecase layer: the session coordinator and its error taxonomy.

pub mod coordinator;
pub mod error;

pub use coordinator::{SessionCoordinator, SessionState};
pub use error::{AuthorizationError, SessionError, StateConflictError, ValidationError};
