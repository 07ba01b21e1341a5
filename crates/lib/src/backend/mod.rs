//! SQL datastore for KidSpark.
//!
//! All persistent state (credentials, sessions, kids, progress) lives in one
//! relational database reached through sqlx's `AnyPool`, so the same queries
//! run against SQLite and PostgreSQL.
//!
//! ## Schema and Migrations
//!
//! The schema is defined in the [`schema`] module and initialized on connect.
//! Dialect differences (auto-increment keys) are handled in code rather than
//! in SQL files.

mod errors;

/// Schema definition and migration system.
pub mod schema;

use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Executor};

pub use errors::BackendError;

use crate::Result;

/// Extension trait for sqlx Result types to simplify error handling.
///
/// Similar to `anyhow::Context`, this trait adds a method to convert
/// sqlx errors to `BackendError::SqlxError` with a context message.
pub(crate) trait SqlxResultExt<T> {
    /// Convert sqlx error to BackendError with context message.
    fn sql_context(self, context: &str) -> Result<T>;
}

impl<T> SqlxResultExt<T> for std::result::Result<T, sqlx::Error> {
    fn sql_context(self, context: &str) -> Result<T> {
        self.map_err(|e| {
            BackendError::SqlxError {
                reason: format!("{context}: {e}"),
                source: Some(e),
            }
            .into()
        })
    }
}

/// Database kind for SQL dialect selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    /// SQLite database
    Sqlite,
    /// PostgreSQL database
    Postgres,
}

impl DbKind {
    /// Short lowercase name, used in health output and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbKind::Sqlite => "sqlite",
            DbKind::Postgres => "postgres",
        }
    }
}

/// Handle to the relational datastore.
///
/// Cloning is cheap: clones share the underlying connection pool, so every
/// store and request handler can hold its own copy.
#[derive(Clone, Debug)]
pub struct Database {
    pool: AnyPool,
    kind: DbKind,
}

impl Database {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Get the database kind.
    pub fn kind(&self) -> DbKind {
        self.kind
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// SQLite-specific implementations
#[cfg(feature = "sqlite")]
impl Database {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the database file and schema if they don't exist.
    pub async fn open_sqlite<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        // mode=rwc: read-write-create (create file if it doesn't exist)
        let url = format!("sqlite:{}?mode=rwc", path.as_ref().display());
        Self::connect_sqlite(&url).await
    }

    /// Connect to a SQLite database using a connection URL.
    pub async fn connect_sqlite(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let is_in_memory = url.contains("mode=memory");

        let mut pool_options = AnyPoolOptions::new().max_connections(5);
        if is_in_memory {
            // The shared in-memory database disappears with its last connection,
            // so keep one connection open for the lifetime of the pool.
            pool_options = pool_options
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        // Connection-scoped pragmas must be set on every pooled connection.
        let pool = pool_options
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute("PRAGMA foreign_keys = ON").await?;
                    conn.execute("PRAGMA busy_timeout = 5000").await?;
                    if !is_in_memory {
                        conn.execute("PRAGMA synchronous = NORMAL").await?;
                    }
                    Ok(())
                })
            })
            .connect(url)
            .await
            .sql_context("Failed to connect to SQLite")?;

        if !is_in_memory {
            // WAL lets readers proceed while a progress upsert is writing.
            // The journal mode is stored in the file, so once is enough.
            sqlx::query("PRAGMA journal_mode = WAL")
                .execute(&pool)
                .await
                .sql_context("Failed to configure SQLite")?;
        }

        let db = Self {
            pool,
            kind: DbKind::Sqlite,
        };

        schema::initialize(&db).await?;

        Ok(db)
    }

    /// Create an in-memory SQLite database.
    ///
    /// The database exists only for the lifetime of this handle and its clones.
    /// Each call gets a uniquely named database, so tests stay isolated.
    pub async fn sqlite_in_memory() -> Result<Self> {
        let unique_id = uuid::Uuid::new_v4();
        let url = format!("sqlite:file:mem_{unique_id}?mode=memory&cache=shared");
        Self::connect_sqlite(&url).await
    }
}

// PostgreSQL-specific implementations
#[cfg(feature = "postgres")]
impl Database {
    /// Connect to a PostgreSQL database using a connection URL.
    pub async fn connect_postgres(url: &str) -> Result<Self> {
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .sql_context("Failed to connect to PostgreSQL")?;

        let db = Self {
            pool,
            kind: DbKind::Postgres,
        };

        schema::initialize(&db).await?;

        Ok(db)
    }
}
