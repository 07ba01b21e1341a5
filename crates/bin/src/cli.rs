//! CLI argument definitions for the KidSpark binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Storage backend type
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    /// SQLite database file (default)
    Sqlite,
    /// PostgreSQL server
    Postgres,
}

/// KidSpark family learning server
#[derive(Parser, Debug)]
#[command(name = "kidspark")]
#[command(about = "KidSpark: family learning server and administration tool")]
#[command(version)]
pub struct Cli {
    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the KidSpark server
    Serve(ServeArgs),
    /// Check health of a running KidSpark server
    Health(HealthArgs),
    /// Manage family passwords
    #[command(subcommand)]
    Password(PasswordCommand),
    /// Manage kid profiles
    #[command(subcommand)]
    Kid(KidCommand),
}

/// Where the datastore lives. Shared by every command that opens it.
#[derive(clap::Args, Debug, Clone)]
pub struct BackendConfig {
    /// Storage backend to use
    #[arg(short, long, default_value = "sqlite", env = "KIDSPARK_BACKEND")]
    pub backend: Backend,

    /// Data directory holding kidspark.db (SQLite only)
    #[arg(short = 'D', long, env = "KIDSPARK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// PostgreSQL connection URL (required when backend=postgres)
    #[arg(long, env = "KIDSPARK_POSTGRES_URL")]
    pub postgres_url: Option<String>,
}

/// Arguments for the serve command
#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, default_value_t = 3000, env = "KIDSPARK_PORT")]
    pub port: u16,

    /// Bind address
    #[arg(long, default_value = "0.0.0.0", env = "KIDSPARK_HOST")]
    pub host: String,

    #[command(flatten)]
    pub backend_config: BackendConfig,

    /// Administrator password for the management API
    #[arg(long, env = "KIDSPARK_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,

    /// Seconds between sweeps of expired sessions
    #[arg(
        long,
        default_value_t = 3600,
        value_parser = clap::value_parser!(u64).range(1..),
        env = "KIDSPARK_PURGE_INTERVAL"
    )]
    pub purge_interval: u64,
}

/// Arguments for the health command
#[derive(clap::Args, Debug)]
pub struct HealthArgs {
    /// Server URL; `/health` is appended when missing
    #[arg(default_value = "http://127.0.0.1:3000", env = "KIDSPARK_URL")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value_t = 5)]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum PasswordCommand {
    /// Add a family password
    Add {
        /// Name shown to administrators, e.g. "Kitchen tablet"
        label: String,

        /// The password itself
        #[arg(long, env = "KIDSPARK_NEW_PASSWORD", hide_env_values = true)]
        password: String,

        #[command(flatten)]
        backend_config: BackendConfig,
    },
    /// List family passwords
    List {
        #[command(flatten)]
        backend_config: BackendConfig,
    },
    /// Remove a family password and end the kid sessions it unlocked
    Remove {
        id: i64,

        #[command(flatten)]
        backend_config: BackendConfig,
    },
}

#[derive(Subcommand, Debug)]
pub enum KidCommand {
    /// Add a kid profile
    Add {
        name: String,

        /// Age in years (1-17)
        age: i64,

        /// Avatar key
        #[arg(long)]
        avatar: Option<String>,

        #[command(flatten)]
        backend_config: BackendConfig,
    },
    /// List kid profiles
    List {
        #[command(flatten)]
        backend_config: BackendConfig,
    },
    /// Remove a kid profile with its sessions and progress
    Remove {
        id: i64,

        #[command(flatten)]
        backend_config: BackendConfig,
    },
}
