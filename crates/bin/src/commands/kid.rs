//! Kid profile management commands.

use std::sync::Arc;

use kidspark::{
    SystemClock,
    kid::{KidStore, NewKid},
};
use serde_json::json;

use crate::backend::create_database;
use crate::cli::KidCommand;
use crate::output::{OutputFormat, print_json, print_table};

/// Run a `kid` subcommand
pub async fn run(command: KidCommand, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        KidCommand::Add {
            name,
            age,
            avatar,
            backend_config,
        } => {
            let db = create_database(&backend_config).await?;
            let kid = KidStore::new(db.clone(), Arc::new(SystemClock))
                .create(NewKid { name, age, avatar })
                .await?;
            db.close().await;

            match format {
                OutputFormat::Human => println!("Added kid {} ({}, {})", kid.id, kid.name, kid.age),
                OutputFormat::Json => print_json(&kid)?,
            }
        }
        KidCommand::List { backend_config } => {
            let db = create_database(&backend_config).await?;
            let kids = KidStore::new(db.clone(), Arc::new(SystemClock)).list().await?;
            db.close().await;

            match format {
                OutputFormat::Human => {
                    let rows: Vec<Vec<String>> = kids
                        .iter()
                        .map(|k| {
                            vec![
                                k.id.to_string(),
                                k.name.clone(),
                                k.age.to_string(),
                                k.avatar.clone().unwrap_or_default(),
                            ]
                        })
                        .collect();
                    print_table(&["ID", "NAME", "AGE", "AVATAR"], &rows, "No kids.");
                }
                OutputFormat::Json => print_json(&kids)?,
            }
        }
        KidCommand::Remove { id, backend_config } => {
            let db = create_database(&backend_config).await?;
            KidStore::new(db.clone(), Arc::new(SystemClock))
                .delete(id)
                .await?;
            db.close().await;

            match format {
                OutputFormat::Human => println!("Removed kid {id} with their sessions and progress"),
                OutputFormat::Json => print_json(&json!({ "id": id }))?,
            }
        }
    }
    Ok(())
}
