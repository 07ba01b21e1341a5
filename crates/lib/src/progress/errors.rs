//! Error types for progress tracking
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProgressError {
    /// Status string is not one of the stored lesson states
    #[error("Invalid status: {value}")]
    InvalidStatus { value: String },

    /// Time spent must not be negative
    #[error("Invalid time_spent_seconds: {seconds}")]
    NegativeTime { seconds: i64 },

    /// The kid the progress belongs to does not exist
    #[error("Kid not found")]
    KidNotFound { kid_id: i64 },

    /// The buffer worker has shut down
    #[error("Progress buffer is closed")]
    BufferClosed,

    /// A patch could not be delivered to the server
    #[error("Failed to send progress for lesson {lesson_id}: {reason}")]
    SendFailed { lesson_id: i64, reason: String },
}

impl ProgressError {
    /// Check if this error indicates the kid does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProgressError::KidNotFound { .. })
    }

    /// Check if this error was caused by invalid caller input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ProgressError::InvalidStatus { .. } | ProgressError::NegativeTime { .. }
        )
    }
}

impl From<ProgressError> for crate::Error {
    fn from(err: ProgressError) -> Self {
        crate::Error::Progress(err)
    }
}
