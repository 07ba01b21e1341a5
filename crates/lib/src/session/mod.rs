//! Session issuance, validation and revocation
//!
//! Two independent token kinds live in separate tables: administrator sessions
//! (24 hours) and kid sessions (7 days, bound to one kid and the credential
//! that unlocked it). A token is 32 random bytes, hex encoded, and is stored
//! as the row's primary key. Tokens carry no claims; a session is valid only
//! while its row exists and `expires_at` is strictly in the future, so
//! revocation takes effect on the next request everywhere.

mod errors;

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::{RngCore, rngs::OsRng};
use serde::Serialize;

pub use errors::SessionError;

use crate::{Clock, Database, Result, backend::SqlxResultExt, clock::millis_to_datetime};

/// Lifetime of an administrator session. Never renewed.
pub const ADMIN_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetime of a kid session. Never renewed.
pub const KID_SESSION_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Number of random bytes in a session token.
pub const TOKEN_BYTES: usize = 32;

/// A validated administrator session.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AdminSession {
    #[serde(skip)]
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// A validated kid session.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct KidSession {
    #[serde(skip)]
    pub token: String,
    pub kid_id: i64,
    pub credential_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Generate a fresh session token from the OS random source.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Issues and checks both kinds of session against the datastore.
#[derive(Clone, Debug)]
pub struct SessionManager {
    db: Database,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn new(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    fn expiry(&self, now: i64, ttl: Duration) -> i64 {
        now + ttl.as_millis() as i64
    }

    /// Create an administrator session and return its token.
    pub async fn create_admin_session(&self) -> Result<String> {
        let token = generate_token();
        let now = self.clock.now_millis();

        sqlx::query("INSERT INTO admin_sessions (id, created_at, expires_at) VALUES ($1, $2, $3)")
            .bind(&token)
            .bind(now)
            .bind(self.expiry(now, ADMIN_SESSION_TTL))
            .execute(self.db.pool())
            .await
            .sql_context("Failed to create admin session")?;

        tracing::info!("Created admin session");
        Ok(token)
    }

    /// Create a kid session bound to `kid_id` and the credential that unlocked it.
    ///
    /// The row is only written while both the kid and the credential still
    /// exist, so a concurrent delete cannot leave a live session behind. A
    /// missing kid or credential fails with [`SessionError::Unauthorized`].
    pub async fn create_kid_session(&self, kid_id: i64, credential_id: i64) -> Result<String> {
        let token = generate_token();
        let now = self.clock.now_millis();

        let inserted = sqlx::query(
            "INSERT INTO kid_sessions (id, kid_id, credential_id, created_at, expires_at)
             SELECT $1, $2, $3, $4, $5
             WHERE EXISTS (SELECT 1 FROM kids WHERE id = $2)
               AND EXISTS (SELECT 1 FROM credentials WHERE id = $3)",
        )
        .bind(&token)
        .bind(kid_id)
        .bind(credential_id)
        .bind(now)
        .bind(self.expiry(now, KID_SESSION_TTL))
        .execute(self.db.pool())
        .await;

        let rows = match inserted {
            Ok(result) => result.rows_affected(),
            Err(sqlx::Error::Database(e)) if e.is_foreign_key_violation() => 0,
            Err(e) => return Err(e).sql_context("Failed to create kid session"),
        };
        if rows == 0 {
            tracing::info!(
                kid_id,
                credential_id,
                "Refused kid session for a removed kid or credential"
            );
            return Err(SessionError::Unauthorized.into());
        }

        tracing::info!(kid_id, credential_id, "Created kid session");
        Ok(token)
    }

    /// Look up an administrator session that has not yet expired.
    pub async fn validate_admin(&self, token: &str) -> Result<Option<AdminSession>> {
        if token.is_empty() {
            return Ok(None);
        }
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT created_at, expires_at FROM admin_sessions
             WHERE id = $1 AND expires_at > $2",
        )
        .bind(token)
        .bind(self.clock.now_millis())
        .fetch_optional(self.db.pool())
        .await
        .sql_context("Failed to validate admin session")?;

        Ok(row.map(|(created_at, expires_at)| AdminSession {
            token: token.to_string(),
            created_at: millis_to_datetime(created_at),
            expires_at: millis_to_datetime(expires_at),
        }))
    }

    /// Look up a kid session that has not yet expired.
    pub async fn validate_kid(&self, token: &str) -> Result<Option<KidSession>> {
        if token.is_empty() {
            return Ok(None);
        }
        let row: Option<(i64, i64, i64, i64)> = sqlx::query_as(
            "SELECT kid_id, credential_id, created_at, expires_at FROM kid_sessions
             WHERE id = $1 AND expires_at > $2",
        )
        .bind(token)
        .bind(self.clock.now_millis())
        .fetch_optional(self.db.pool())
        .await
        .sql_context("Failed to validate kid session")?;

        Ok(
            row.map(|(kid_id, credential_id, created_at, expires_at)| KidSession {
                token: token.to_string(),
                kid_id,
                credential_id,
                created_at: millis_to_datetime(created_at),
                expires_at: millis_to_datetime(expires_at),
            }),
        )
    }

    /// Validate an optional administrator token, failing with a uniform error.
    pub async fn require_admin(&self, token: Option<&str>) -> Result<AdminSession> {
        match token {
            Some(token) => self
                .validate_admin(token)
                .await?
                .ok_or_else(|| SessionError::Unauthorized.into()),
            None => Err(SessionError::Unauthorized.into()),
        }
    }

    /// Validate an optional kid token, failing with a uniform error.
    pub async fn require_kid(&self, token: Option<&str>) -> Result<KidSession> {
        match token {
            Some(token) => self
                .validate_kid(token)
                .await?
                .ok_or_else(|| SessionError::Unauthorized.into()),
            None => Err(SessionError::Unauthorized.into()),
        }
    }

    /// Revoke an administrator session. Revoking an unknown token is a no-op.
    pub async fn revoke_admin(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM admin_sessions WHERE id = $1")
            .bind(token)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to revoke admin session")?;
        Ok(())
    }

    /// Revoke a kid session. Revoking an unknown token is a no-op.
    pub async fn revoke_kid(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM kid_sessions WHERE id = $1")
            .bind(token)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to revoke kid session")?;
        Ok(())
    }

    /// Revoke every session of a kid, e.g. when the profile is deleted.
    pub async fn revoke_kid_sessions_for_kid(&self, kid_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM kid_sessions WHERE kid_id = $1")
            .bind(kid_id)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to revoke sessions for kid")?;
        Ok(result.rows_affected())
    }

    /// Revoke every kid session unlocked by a credential, e.g. when it is deleted.
    pub async fn revoke_kid_sessions_for_credential(&self, credential_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM kid_sessions WHERE credential_id = $1")
            .bind(credential_id)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to revoke sessions for credential")?;
        Ok(result.rows_affected())
    }

    /// Delete expired rows of both kinds. Returns the number removed.
    ///
    /// Housekeeping only: expired sessions already fail validation.
    pub async fn purge_expired(&self) -> Result<u64> {
        let now = self.clock.now_millis();
        let admin = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to purge admin sessions")?;
        let kid = sqlx::query("DELETE FROM kid_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(self.db.pool())
            .await
            .sql_context("Failed to purge kid sessions")?;

        let removed = admin.rows_affected() + kid.rows_affected();
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        Ok(removed)
    }
}
