//! SQL schema definitions and migrations.
//!
//! The schema is designed to be portable between SQLite and PostgreSQL. The
//! only dialect difference is the auto-increment primary key, which is
//! substituted per [`DbKind`] before the statements run.
//!
//! # Migration System
//!
//! Migrations are code-based functions rather than SQL files. To add one:
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add the migration to the match statement in `run_migration`
//!
//! All timestamps are stored as BIGINT Unix milliseconds so expiry checks are
//! plain integer comparisons on both dialects.

use super::{BackendError, Database, DbKind, SqlxResultExt};
use crate::Result;

/// Current schema version.
///
/// Increment this when making schema changes that require migration.
pub const SCHEMA_VERSION: i64 = 1;

/// Placeholder replaced by the dialect's auto-increment primary key column.
const SERIAL_ID: &str = "{serial_id}";

/// SQL statements to create the schema tables.
pub const CREATE_TABLES: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS schema_version (
        version BIGINT PRIMARY KEY
    )",
    // Shared family passwords. Verification scans every row.
    "CREATE TABLE IF NOT EXISTS credentials (
        id {serial_id},
        label TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        salt TEXT NOT NULL,
        iterations BIGINT NOT NULL,
        created_at BIGINT NOT NULL,
        last_used_at BIGINT
    )",
    "CREATE TABLE IF NOT EXISTS kids (
        id {serial_id},
        name TEXT NOT NULL,
        avatar TEXT,
        age BIGINT NOT NULL,
        created_at BIGINT NOT NULL
    )",
    // Session tables are keyed by the bearer token itself. A kid session
    // cannot outlive its kid or the credential that unlocked it.
    "CREATE TABLE IF NOT EXISTS admin_sessions (
        id TEXT PRIMARY KEY NOT NULL,
        created_at BIGINT NOT NULL,
        expires_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS kid_sessions (
        id TEXT PRIMARY KEY NOT NULL,
        kid_id BIGINT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
        credential_id BIGINT NOT NULL REFERENCES credentials(id) ON DELETE CASCADE,
        created_at BIGINT NOT NULL,
        expires_at BIGINT NOT NULL
    )",
    // One row per (kid, lesson). A missing row means not started.
    "CREATE TABLE IF NOT EXISTS progress (
        kid_id BIGINT NOT NULL REFERENCES kids(id) ON DELETE CASCADE,
        lesson_id BIGINT NOT NULL,
        status TEXT NOT NULL,
        score BIGINT,
        time_spent_seconds BIGINT NOT NULL DEFAULT 0,
        answers_blob TEXT,
        started_at BIGINT NOT NULL,
        completed_at BIGINT,
        PRIMARY KEY (kid_id, lesson_id)
    )",
];

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_admin_sessions_expires ON admin_sessions(expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_kid_sessions_expires ON kid_sessions(expires_at)",
    "CREATE INDEX IF NOT EXISTS idx_kid_sessions_kid ON kid_sessions(kid_id)",
    "CREATE INDEX IF NOT EXISTS idx_kid_sessions_credential ON kid_sessions(credential_id)",
];

fn serial_id(kind: DbKind) -> &'static str {
    match kind {
        DbKind::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        DbKind::Postgres => "BIGSERIAL PRIMARY KEY",
    }
}

/// Initialize the database schema.
///
/// Creates tables and indexes if they don't exist, and handles migrations
/// if the schema version has changed.
pub async fn initialize(db: &Database) -> Result<()> {
    let pool = db.pool();

    for statement in CREATE_TABLES {
        let statement = statement.replace(SERIAL_ID, serial_id(db.kind()));
        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
        }
        Some((current_version,)) if current_version < SCHEMA_VERSION => {
            migrate(db, current_version, SCHEMA_VERSION).await?;
        }
        Some((current_version,)) if current_version > SCHEMA_VERSION => {
            return Err(BackendError::UnsupportedMigration {
                from: current_version,
                to: SCHEMA_VERSION,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| BackendError::SqlxError {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    tracing::debug!(kind = db.kind().as_str(), version = SCHEMA_VERSION, "Schema ready");
    Ok(())
}

/// Run migrations sequentially from one schema version to another.
async fn migrate(db: &Database, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(db, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(db.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

/// Execute a single migration step.
///
/// Version 1 is the first released schema, so there is no step yet. New
/// steps become match arms here, e.g. `1 => migrate_v1_to_v2(db).await`.
async fn run_migration(db: &Database, from: i64, to: i64) -> Result<()> {
    let _ = db;
    Err(BackendError::UnsupportedMigration { from, to }.into())
}
