//! Wall command handlers

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use colored::*;
use serde_json::Value;
use wall_client::{WallClient, WallSummary};

use crate::config::Config;

/// Wall subcommands
#[derive(Subcommand)]
pub enum WallCommands {
    /// Create an empty wall
    Create {
        /// Wall ID
        id: String,
    },
    /// Show how many objects a wall holds
    Count {
        /// Wall ID
        id: String,
    },
    /// Print the stored content of a wall
    Get {
        /// Wall ID
        id: String,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },
    /// Replace the content of a wall
    Put {
        /// Wall ID
        id: String,

        /// Read the content from a JSON file
        #[arg(short, long, conflicts_with = "json")]
        file: Option<String>,

        /// Inline JSON content
        #[arg(short, long)]
        json: Option<String>,
    },
}

/// Handle wall commands
pub async fn handle_wall_command(command: WallCommands, config: &Config) -> Result<()> {
    let client = WallClient::new(&config.api_url);

    match command {
        WallCommands::Create { id } => create_wall(&client, &id).await,
        WallCommands::Count { id } => count_wall(&client, &id).await,
        WallCommands::Get { id, pretty } => get_wall(&client, &id, pretty).await,
        WallCommands::Put { id, file, json } => {
            let content = read_content(file.as_deref(), json.as_deref())?;
            put_wall(&client, &id, &content).await
        }
    }
}

async fn create_wall(client: &WallClient, id: &str) -> Result<()> {
    let wall = match client.create_wall(id).await {
        Err(e) if e.is_conflict() => bail!("Wall {id} already exists"),
        result => result?,
    };

    println!("{}", "✓ Wall created successfully!".green().bold());
    print_summary(&wall);

    Ok(())
}

async fn count_wall(client: &WallClient, id: &str) -> Result<()> {
    let wall = client.get_wall_count(id).await?;
    print_summary(&wall);
    Ok(())
}

async fn get_wall(client: &WallClient, id: &str, pretty: bool) -> Result<()> {
    let content = client.get_wall_content(id).await?;

    if pretty {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        println!("{content}");
    }

    Ok(())
}

async fn put_wall(client: &WallClient, id: &str, content: &Value) -> Result<()> {
    let wall = client.put_wall_content(id, content).await?;

    println!("{}", "✓ Wall content replaced!".green().bold());
    print_summary(&wall);

    Ok(())
}

/// Content comes from exactly one of `--file` or `--json`
fn read_content(file: Option<&str>, json: Option<&str>) -> Result<Value> {
    let text = match (file, json) {
        (Some(path), None) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read content file: {path}"))?
        }
        (None, Some(inline)) => inline.to_string(),
        _ => bail!("Pass the content with either --file or --json"),
    };

    serde_json::from_str(&text).context("Content is not valid JSON")
}

fn print_summary(wall: &WallSummary) {
    println!("  Wall:    {}", wall.wall_id.cyan());
    println!("  Objects: {}", wall.count.to_string().bold());
}
