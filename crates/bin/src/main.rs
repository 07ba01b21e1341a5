mod backend;
mod cli;
mod commands;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use output::OutputFormat;

/// Log to stderr, filtered by `RUST_LOG` on top of `default_directive`.
fn init_tracing(default_directive: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let format = OutputFormat::from_flag(cli.json);

    match cli.command {
        Commands::Serve(args) => {
            init_tracing("kidspark=info")?;
            commands::serve::run(&args).await
        }
        Commands::Health(args) => commands::health::run(&args).await,
        Commands::Password(command) => {
            init_tracing("kidspark=warn")?;
            commands::password::run(command, format).await
        }
        Commands::Kid(command) => {
            init_tracing("kidspark=warn")?;
            commands::kid::run(command, format).await
        }
    }
}
