//! Shared family credentials
//!
//! A family keeps a small pool of access passwords (one per device or family
//! member, say). Any of them unlocks the learner app: verification scans the
//! pool in insertion order and stops at the first match. There is no lockout;
//! the PBKDF2 cost is the only brute-force deterrent.

mod admin;
pub mod crypto;
mod errors;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use admin::AdminGate;
pub use crypto::{HashedPassword, hash_password, verify_password};
pub use errors::CredentialError;

use crate::{Clock, Database, Result, backend::SqlxResultExt, clock::millis_to_datetime};

/// A stored credential as listed to administrators (no hash or salt).
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct CredentialSummary {
    pub id: i64,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Persistence and verification for the family password pool.
#[derive(Clone, Debug)]
pub struct CredentialStore {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl CredentialStore {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Hash and store a new family password.
    pub async fn create(&self, label: &str, password: &str) -> Result<CredentialSummary> {
        if label.trim().is_empty() {
            return Err(CredentialError::EmptyField { field: "label" }.into());
        }
        if password.is_empty() {
            return Err(CredentialError::EmptyField { field: "password" }.into());
        }

        let password = password.to_string();
        let hashed = tokio::task::spawn_blocking(move || hash_password(password))
            .await
            .map_err(|e| CredentialError::HashingFailed {
                reason: e.to_string(),
            })?;

        let now = self.clock.now_millis();
        let (id,): (i64,) = sqlx::query_as(
            "INSERT INTO credentials (label, password_hash, salt, iterations, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
        )
        .bind(label)
        .bind(&hashed.hash)
        .bind(&hashed.salt)
        .bind(hashed.iterations as i64)
        .bind(now)
        .fetch_one(self.db.pool())
        .await
        .sql_context("Failed to insert credential")?;

        tracing::info!(credential_id = id, label, "Created family credential");

        Ok(CredentialSummary {
            id,
            label: label.to_string(),
            created_at: millis_to_datetime(now),
            last_used_at: None,
        })
    }

    /// List every credential, newest first.
    pub async fn list(&self) -> Result<Vec<CredentialSummary>> {
        let rows: Vec<(i64, String, i64, Option<i64>)> = sqlx::query_as(
            "SELECT id, label, created_at, last_used_at FROM credentials
             ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(self.db.pool())
        .await
        .sql_context("Failed to list credentials")?;

        Ok(rows
            .into_iter()
            .map(|(id, label, created_at, last_used_at)| CredentialSummary {
                id,
                label,
                created_at: millis_to_datetime(created_at),
                last_used_at: last_used_at.map(millis_to_datetime),
            })
            .collect())
    }

    /// Delete a credential and end every kid session it unlocked.
    ///
    /// Both happen in one transaction. Returns the number of sessions ended.
    pub async fn delete(&self, id: i64) -> Result<u64> {
        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .sql_context("Failed to begin transaction")?;

        let revoked = sqlx::query("DELETE FROM kid_sessions WHERE credential_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete credential sessions")?
            .rows_affected();
        let result = sqlx::query("DELETE FROM credentials WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .sql_context("Failed to delete credential")?;

        if result.rows_affected() == 0 {
            return Err(CredentialError::CredentialNotFound { id }.into());
        }
        tx.commit()
            .await
            .sql_context("Failed to commit credential delete")?;

        tracing::info!(credential_id = id, revoked, "Deleted family credential");
        Ok(revoked)
    }

    /// Check a password against every stored credential.
    ///
    /// Returns the id of the first matching credential. Costs one key
    /// derivation per credential tried. Callers record a successful login
    /// with [`CredentialStore::record_use`].
    pub async fn verify_any(&self, password: &str) -> Result<Option<i64>> {
        let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
            "SELECT id, password_hash, salt, iterations FROM credentials ORDER BY id ASC",
        )
        .fetch_all(self.db.pool())
        .await
        .sql_context("Failed to load credentials")?;

        for (id, stored_hash, salt, iterations) in rows {
            let Ok(iterations) = u32::try_from(iterations) else {
                tracing::warn!(
                    credential_id = id,
                    iterations,
                    "Skipping credential with bad iteration count"
                );
                continue;
            };

            let attempt = password.to_string();
            let matched = tokio::task::spawn_blocking(move || {
                verify_password(attempt, stored_hash, salt, iterations)
            })
            .await
            .map_err(|e| CredentialError::HashingFailed {
                reason: e.to_string(),
            })?;

            if matched {
                tracing::debug!(credential_id = id, "Family credential matched");
                return Ok(Some(id));
            }
        }

        tracing::debug!("No family credential matched");
        Ok(None)
    }

    /// Stamp `last_used_at` on a credential.
    pub async fn record_use(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE credentials SET last_used_at = $1 WHERE id = $2")
            .bind(self.clock.now_millis())
            .bind(id)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to record credential use")?;
        Ok(())
    }
}
