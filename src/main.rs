use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use scribe::commands;
use scribe::config::Config;

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Transcription record store and API", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API and background sweeper
    Serve {
        /// Config file (default: ./scribe.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override server.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Delete expired records and repair owner indexes once
    Sweep {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Validate and print the effective configuration
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, port } => {
            let config = Config::load(config.as_deref())?;
            commands::init_logging(&config.logging);
            commands::serve::execute(config, port).await
        },
        Commands::Sweep { config } => {
            let config = Config::load(config.as_deref())?;
            commands::init_logging(&config.logging);
            commands::sweep::execute(config).await
        },
        Commands::Config { config } => {
            let config = Config::load(config.as_deref())?;
            commands::config_cmd::execute(&config)
        },
    }
}
