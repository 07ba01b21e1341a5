//! Datastore error types for the KidSpark backend.
//!
//! This module defines structured error types for database operations,
//! providing better error context than raw driver errors.

use thiserror::Error;

/// Errors that can occur during datastore operations.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Existing variants will not be removed in minor versions
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BackendError {
    /// A sqlx query or connection failed.
    #[error("SQL error: {reason}")]
    SqlxError {
        /// Description of the failure including the operation context
        reason: String,
        /// The underlying sqlx error, when there is one
        #[source]
        source: Option<sqlx::Error>,
    },

    /// The stored schema version is newer or older than any known migration path.
    #[error("Unsupported schema migration: v{from} to v{to}")]
    UnsupportedMigration {
        /// Version found in the database
        from: i64,
        /// Version this build expects
        to: i64,
    },

    /// A row held a value the domain types cannot represent.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow {
        /// Table the row came from
        table: &'static str,
        /// Description of the bad value
        reason: String,
    },
}

impl BackendError {
    /// Check if this error came from the SQL driver.
    pub fn is_sql_error(&self) -> bool {
        matches!(self, BackendError::SqlxError { .. })
    }

    /// Check if this error indicates a data integrity issue.
    pub fn is_integrity_error(&self) -> bool {
        matches!(
            self,
            BackendError::CorruptRow { .. } | BackendError::UnsupportedMigration { .. }
        )
    }
}

// Conversion from BackendError to the main Error type
impl From<BackendError> for crate::Error {
    fn from(err: BackendError) -> Self {
        crate::Error::Backend(err)
    }
}
