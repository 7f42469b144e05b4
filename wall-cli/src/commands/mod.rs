//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod pipeline;
mod wall;

pub use pipeline::PipelineCommands;
pub use wall::WallCommands;

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use wall_client::WallClient;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check that the API is alive
    Health,
    /// Wall management
    Wall {
        #[command(subcommand)]
        command: WallCommands,
    },
    /// Delivery pipeline topology
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Health => health(config).await,
        Commands::Wall { command } => wall::handle_wall_command(command, config).await,
        Commands::Pipeline { command } => pipeline::handle_pipeline_command(command),
    }
}

async fn health(config: &Config) -> Result<()> {
    let client = WallClient::new(&config.api_url);
    let status = client.health().await?;

    println!("{} {}", "✓".green().bold(), status.bold());
    println!("  URL: {}", client.base_url().dimmed());

    Ok(())
}
