//! Family password management commands.

use std::sync::Arc;

use kidspark::{SystemClock, credential::CredentialStore};
use serde_json::json;

use crate::backend::{backend_label, create_database};
use crate::cli::PasswordCommand;
use crate::output::{OutputFormat, print_json, print_table};

/// Run a `password` subcommand
pub async fn run(
    command: PasswordCommand,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        PasswordCommand::Add {
            label,
            password,
            backend_config,
        } => {
            let db = create_database(&backend_config).await?;
            let store = CredentialStore::new(db.clone(), Arc::new(SystemClock));
            let credential = store.create(&label, &password).await?;
            db.close().await;

            match format {
                OutputFormat::Human => println!(
                    "Added password {} ({}) to {}",
                    credential.id,
                    credential.label,
                    backend_label(&backend_config)
                ),
                OutputFormat::Json => print_json(&credential)?,
            }
        }
        PasswordCommand::List { backend_config } => {
            let db = create_database(&backend_config).await?;
            let credentials = CredentialStore::new(db.clone(), Arc::new(SystemClock))
                .list()
                .await?;
            db.close().await;

            match format {
                OutputFormat::Human => {
                    let rows: Vec<Vec<String>> = credentials
                        .iter()
                        .map(|c| {
                            vec![
                                c.id.to_string(),
                                c.label.clone(),
                                c.created_at.to_rfc3339(),
                                c.last_used_at
                                    .map(|t| t.to_rfc3339())
                                    .unwrap_or_else(|| "never".to_string()),
                            ]
                        })
                        .collect();
                    print_table(
                        &["ID", "LABEL", "CREATED", "LAST USED"],
                        &rows,
                        "No family passwords.",
                    );
                }
                OutputFormat::Json => print_json(&credentials)?,
            }
        }
        PasswordCommand::Remove { id, backend_config } => {
            let db = create_database(&backend_config).await?;
            let revoked = CredentialStore::new(db.clone(), Arc::new(SystemClock))
                .delete(id)
                .await?;
            db.close().await;

            match format {
                OutputFormat::Human => {
                    println!("Removed password {id}; ended {revoked} kid session(s)")
                }
                OutputFormat::Json => {
                    print_json(&json!({ "id": id, "revoked_sessions": revoked }))?
                }
            }
        }
    }
    Ok(())
}
