//! Datastore creation and utility functions.

use std::path::PathBuf;

use kidspark::Database;

use crate::cli::{Backend, BackendConfig};

const SQLITE_FILE: &str = "kidspark.db";

/// Redact credentials from a PostgreSQL connection URL for safe logging
pub fn redact_postgres_url(url: &str) -> String {
    let Ok(parsed) = url::Url::parse(url) else {
        return "postgres://***@<unparsable-url>".to_string();
    };
    let mut redacted = parsed.clone();
    if !parsed.username().is_empty() {
        let _ = redacted.set_username("***");
    }
    if parsed.password().is_some() {
        let _ = redacted.set_password(Some("***"));
    }
    redacted.to_string()
}

/// Open the configured datastore, creating the schema if needed.
pub async fn create_database(
    config: &BackendConfig,
) -> Result<Database, Box<dyn std::error::Error>> {
    match config.backend {
        Backend::Sqlite => {
            let data_dir = config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            tokio::fs::create_dir_all(&data_dir).await?;

            let db_path = data_dir.join(SQLITE_FILE);
            tracing::info!("Using SQLite database at {}", db_path.display());
            Ok(Database::open_sqlite(&db_path).await?)
        }
        Backend::Postgres => {
            let url = config
                .postgres_url
                .as_ref()
                .ok_or("PostgreSQL backend requires --postgres-url or KIDSPARK_POSTGRES_URL")?;

            let display_url = redact_postgres_url(url);
            tracing::info!("Connecting to PostgreSQL at {display_url}");

            Database::connect_postgres(url)
                .await
                .map_err(|e| format!("Failed to connect to PostgreSQL at {display_url}: {e}").into())
        }
    }
}

/// Short description of the configured datastore for human output.
pub fn backend_label(config: &BackendConfig) -> String {
    match config.backend {
        Backend::Sqlite => {
            let data_dir = config.data_dir.clone().unwrap_or_else(|| PathBuf::from("."));
            format!("sqlite ({})", data_dir.join(SQLITE_FILE).display())
        }
        Backend::Postgres => match &config.postgres_url {
            Some(url) => format!("postgres ({})", redact_postgres_url(url)),
            None => "postgres".to_string(),
        },
    }
}
