//!
//! KidSpark: access control and progress sync for a family learning server.
//!
//! ## Core Concepts
//!
//! * **Credentials (`credential::CredentialStore`)**: a pool of shared family passwords, stored as
//!   salted PBKDF2 hashes. Any matching credential unlocks the learner app.
//! * **Sessions (`session::SessionManager`)**: opaque bearer tokens of two kinds, administrator
//!   (24 hours) and kid (7 days). Validity is a datastore lookup, so revocation is immediate.
//! * **Progress (`progress::ProgressStore`)**: one row per kid and lesson, written by an atomic
//!   upsert with per-field merge rules (write-once `completed_at`, null-preserving `score`).
//! * **Progress buffering (`progress::ProgressBuffer`)**: a caller-side debouncer that coalesces
//!   frequent activity events into a single write per quiet period.
//! * **Lesson content (`content::LessonContent`)** and **activities (`activity::Activity`)**:
//!   the story/quiz/sandbox players that produce progress patches.
//! * **API (`api::router`)**: the axum routes that tie everything together behind cookies.

pub mod activity;
pub mod api;
pub mod backend;
pub mod clock;
pub mod content;
pub mod credential;
pub mod kid;
pub mod progress;
pub mod session;

pub use backend::Database;
#[cfg(any(test, feature = "testing"))]
pub use clock::FixedClock;
pub use clock::{Clock, SystemClock};

/// Result type used throughout the KidSpark library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the KidSpark library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Structured datastore errors from the backend module
    #[error(transparent)]
    Backend(backend::BackendError),

    /// Structured credential errors from the credential module
    #[error(transparent)]
    Credential(credential::CredentialError),

    /// Structured session errors from the session module
    #[error(transparent)]
    Session(session::SessionError),

    /// Structured kid profile errors from the kid module
    #[error(transparent)]
    Kid(kid::KidError),

    /// Structured progress errors from the progress module
    #[error(transparent)]
    Progress(progress::ProgressError),

    /// Structured lesson content errors from the content module
    #[error(transparent)]
    Content(content::ContentError),

    /// Structured activity errors from the activity module
    #[error(transparent)]
    Activity(activity::ActivityError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Backend(_) => "backend",
            Error::Credential(_) => "credential",
            Error::Session(_) => "session",
            Error::Kid(_) => "kid",
            Error::Progress(_) => "progress",
            Error::Content(_) => "content",
            Error::Activity(_) => "activity",
        }
    }

    /// Check if this error indicates a resource was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Credential(err) => err.is_not_found(),
            Error::Kid(err) => err.is_not_found(),
            Error::Progress(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error is database/backend-related.
    pub fn is_database_error(&self) -> bool {
        matches!(self, Error::Backend(_))
    }

    /// Check if this error was caused by invalid caller input.
    pub fn is_validation_error(&self) -> bool {
        match self {
            Error::Credential(err) => err.is_validation_error(),
            Error::Kid(err) => err.is_validation_error(),
            Error::Progress(err) => err.is_validation_error(),
            Error::Content(_) => true,
            Error::Activity(_) => true,
            _ => false,
        }
    }
}
