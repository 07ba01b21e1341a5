//! Error types for kid profiles
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KidError {
    /// No kid profile with this id
    #[error("Kid not found")]
    KidNotFound { id: i64 },

    /// Profile name was empty or whitespace
    #[error("name required")]
    EmptyName,

    /// Age outside the supported range
    #[error("Invalid age: {age}")]
    InvalidAge { age: i64 },
}

impl KidError {
    /// Check if this error indicates the kid does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KidError::KidNotFound { .. })
    }

    /// Check if this error was caused by invalid caller input.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, KidError::EmptyName | KidError::InvalidAge { .. })
    }
}

impl From<KidError> for crate::Error {
    fn from(err: KidError) -> Self {
        crate::Error::Kid(err)
    }
}
