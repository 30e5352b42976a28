//! Error types for session operations

use crate::backend::BackendError;
use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Session error types
///
/// Quota denials are not errors; they come back as a paywall notice.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A remote collaborator failed; the action had no effect
    #[error("Action failed: {0}")]
    Backend(#[from] BackendError),

    #[error("Task title must not be empty")]
    EmptyTitle,

    /// Description longer than the current limit
    #[error("Description is {len} characters, limit is {max}")]
    DescriptionTooLong { len: u64, max: u64 },

    #[error("Unknown task: {0}")]
    UnknownTask(u64),

    /// Another task creation from this session has not finished yet
    #[error("A task creation is already in flight")]
    SubmissionInFlight,
}
