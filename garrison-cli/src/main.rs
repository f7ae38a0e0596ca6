//! GARRISON CLI - Command-line interface
//!
//! Commands:
//! - play: Play one game (AI vs AI, or against the AI from stdin)
//! - match: Play a batch of seeded AI games in parallel
//! - rules: Print a validated rule set as JSON
//! - deploy: Print a standard or random deployment as JSON
//! - validate: Check a deployment file against a rule set
//! - replay: Re-run a saved game record

mod common;
mod layout;
mod match_cmd;
mod play;
mod render;
mod replay;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use common::RulesArgs;

#[derive(Parser)]
#[command(name = "garrison")]
#[command(about = "GARRISON hidden-information strategy game")]
struct Cli {
    /// Seed for deployments and AI noise (random when omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game
    Play(play::PlayArgs),
    /// Play many AI games in parallel
    Match(match_cmd::MatchArgs),
    /// Print a rule set as JSON
    Rules {
        #[command(flatten)]
        rules: RulesArgs,
    },
    /// Print a deployment as JSON
    Deploy(layout::DeployArgs),
    /// Validate a deployment file
    Validate(layout::ValidateArgs),
    /// Replay a saved game record
    Replay(replay::ReplayArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play::run(args, cli.seed),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
        Commands::Rules { rules } => {
            let rules = rules.load()?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
            Ok(())
        }
        Commands::Deploy(args) => layout::run_deploy(args, cli.seed),
        Commands::Validate(args) => layout::run_validate(args),
        Commands::Replay(args) => replay::run(args),
    }
}
