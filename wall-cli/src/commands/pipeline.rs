//! Pipeline command handlers
//!
//! Builds the delivery pipeline topology locally. Nothing here talks to the
//! API; `synth` prints the topology as JSON for a deployment tool and `plan`
//! shows the order stages and actions run in.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;
use wall_core::domain::environment::{Environment, ResourceNames};
use wall_core::domain::pipeline::{Action, ActionKind, PipelineTopology};
use wall_core::topology::{PipelineConfig, SourceConfig, build_pipeline};

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Print the pipeline topology as JSON
    Synth {
        #[command(flatten)]
        topology: TopologyArgs,

        /// Pretty-print the JSON
        #[arg(short, long)]
        pretty: bool,
    },
    /// Show stages and the waves their actions run in
    Plan {
        #[command(flatten)]
        topology: TopologyArgs,
    },
}

/// Inputs shared by every pipeline subcommand
#[derive(Args)]
pub struct TopologyArgs {
    /// Deploy environments in promotion order (e.g., --env test --env prod)
    #[arg(short, long = "env", value_delimiter = ',', default_values_t = [Environment::Test, Environment::Prod])]
    environments: Vec<Environment>,

    /// Application name used as the prefix of every resource
    #[arg(long)]
    app_name: Option<String>,

    /// Repository owner for the Source stage
    #[arg(long)]
    owner: Option<String>,

    /// Repository name for the Source stage
    #[arg(long)]
    repo: Option<String>,

    /// Branch the Source stage tracks
    #[arg(long)]
    branch: Option<String>,
}

impl TopologyArgs {
    fn into_config(self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        let source = SourceConfig {
            owner: self.owner.unwrap_or(defaults.source.owner),
            repo: self.repo.unwrap_or(defaults.source.repo),
            branch: self.branch.unwrap_or(defaults.source.branch),
            token_secret: defaults.source.token_secret,
        };

        PipelineConfig {
            app_name: self.app_name.unwrap_or(defaults.app_name),
            source,
            environments: self.environments,
        }
    }
}

/// Handle pipeline commands
pub fn handle_pipeline_command(command: PipelineCommands) -> Result<()> {
    match command {
        PipelineCommands::Synth { topology, pretty } => synth(topology.into_config(), pretty),
        PipelineCommands::Plan { topology } => plan(topology.into_config()),
    }
}

fn synth(config: PipelineConfig, pretty: bool) -> Result<()> {
    let topology = build(&config)?;

    let json = if pretty {
        serde_json::to_string_pretty(&topology)?
    } else {
        serde_json::to_string(&topology)?
    };
    println!("{json}");

    Ok(())
}

fn plan(config: PipelineConfig) -> Result<()> {
    let topology = build(&config)?;

    println!("{}", format!("Pipeline {}", topology.name()).bold());
    println!(
        "  Source: {}",
        format!(
            "{}/{}@{}",
            config.source.owner, config.source.repo, config.source.branch
        )
        .dimmed()
    );
    println!();

    for stage in topology.plan() {
        println!("  {} {}", "▸".cyan(), stage.name.bold());
        for wave in stage.waves {
            let actions = wave
                .actions
                .iter()
                .map(|action| describe(action))
                .collect::<Vec<_>>()
                .join(", ");
            println!("    {} {}", format!("[{}]", wave.run_order).yellow(), actions);
        }
    }

    println!();
    for &environment in &config.environments {
        print_resources(&ResourceNames::new(&config.app_name, environment));
    }

    Ok(())
}

fn build(config: &PipelineConfig) -> Result<PipelineTopology> {
    build_pipeline(config).context("Failed to build the pipeline topology")
}

/// One-line view of an action, e.g. `DeploySite (site -> virtual-wall-test-site)`
fn describe(action: &Action) -> String {
    let detail = match &action.kind {
        ActionKind::Source { owner, repo, branch, .. } => format!("{owner}/{repo}@{branch}"),
        ActionKind::Build { project, .. } => project.clone(),
        ActionKind::DeployStack { stack_name, .. } => stack_name.clone(),
        ActionKind::DeploySite { bucket, .. } => bucket.clone(),
    };
    format!("{} {}", action.name, format!("({detail})").dimmed())
}

fn print_resources(names: &ResourceNames) {
    println!("{}", format!("{} resources:", names.environment).bold());
    println!("  Stack:  {}", names.stack_name.cyan());
    println!("  Table:  {}", names.table_name);
    println!("  Bucket: {}", names.site_bucket);
    println!("  Role:   {}", names.deploy_role.dimmed());
}
