//! Error types for session handling
use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SessionError {
    /// No usable session: the token was missing, unknown, expired or revoked.
    ///
    /// Callers cannot tell these cases apart.
    #[error("Unauthorized")]
    Unauthorized,
}

impl SessionError {
    /// Check if this error means the caller must authenticate again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SessionError::Unauthorized)
    }
}

impl From<SessionError> for crate::Error {
    fn from(err: SessionError) -> Self {
        crate::Error::Session(err)
    }
}
