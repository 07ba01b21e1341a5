//! Error types for the credential system
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Credential not found: {id}")]
    CredentialNotFound { id: i64 },

    #[error("Credential {field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("Iteration count must be positive, got {iterations}")]
    InvalidIterations { iterations: u32 },

    #[error("Password hashing failed: {reason}")]
    HashingFailed { reason: String },

    #[error("Invalid password")]
    InvalidPassword,
}

impl CredentialError {
    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CredentialError::CredentialNotFound { .. })
    }

    /// Check if this error was caused by invalid caller input.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            CredentialError::EmptyField { .. } | CredentialError::InvalidIterations { .. }
        )
    }
}

impl From<CredentialError> for crate::Error {
    fn from(err: CredentialError) -> Self {
        crate::Error::Credential(err)
    }
}
