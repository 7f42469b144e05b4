//! Virtual Wall CLI
//!
//! Command-line interface for a wall deployment and its delivery pipeline.

mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;

#[derive(Parser)]
#[command(name = "wall")]
#[command(about = "Virtual Wall CLI", long_about = None)]
struct Cli {
    /// Site URL serving the wall API
    #[arg(long, env = "WALL_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config {
        api_url: cli.api_url,
    };

    handle_command(cli.command, &config).await
}
