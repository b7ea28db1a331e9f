//! Cadence CLI - maintenance commands for speech-model training runs
//!
//! Provides the `cadence` command for pruning, inspecting and restoring
//! generator/discriminator checkpoints and for preparing run configs.

mod commands;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;

use commands::checkpoint::{self, CheckpointCommand};
use commands::{config, prune};

/// Cadence CLI - checkpoint and config tooling for training runs
#[derive(Parser, Debug)]
#[command(
    name = "cadence",
    author,
    version,
    about = "Cadence - checkpoint and config tooling for speech-model training",
    long_about = "Cadence manages the model directory of a training run: pruning old G_/D_ checkpoints,\nrestoring checkpoints into changed architectures and preparing stage configs."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Delete old checkpoints, keeping the newest per role
    ///
    /// Baseline checkpoints (G_0 / D_0) are never deleted.
    Prune {
        /// Model directory containing G_<step>.pth / D_<step>.pth files
        dir: PathBuf,

        /// Number of checkpoints to keep per role
        #[arg(short = 'k', long, default_value = "2")]
        keep: usize,

        /// Ordering used to pick the oldest checkpoints (index, time)
        #[arg(long, default_value = "time")]
        sort: String,

        /// Roles to prune, comma-separated (G, D)
        #[arg(long, value_delimiter = ',', default_value = "G,D")]
        roles: Vec<String>,

        /// Only print what would be deleted
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the newest checkpoint matching a pattern
    Latest {
        /// Model directory
        dir: PathBuf,

        /// Glob pattern relative to the directory
        #[arg(long, default_value = "G_*.pth")]
        pattern: String,
    },

    /// Inspect or restore checkpoint files
    #[command(subcommand)]
    Checkpoint(CheckpointCommand),

    /// Load a training config and prepare its model directory
    ///
    /// Copies the config into the stage's checkpoint directory and prints the
    /// resulting hyperparameters.
    Config {
        /// JSON file for configuration
        #[arg(short = 'c', long, default_value = "./configs/config.json")]
        config: PathBuf,

        /// Training stage (1 or 2)
        #[arg(long, default_value = "1")]
        stage: u8,

        /// Pretrain directory
        #[arg(short = 'p', long)]
        pretrain: Option<String>,

        /// Resume step
        #[arg(long)]
        resume_step: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = cadence_training::parse_level(&args.log_level);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let command = if let Some(cmd) = args.command {
        cmd
    } else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Prune { dir, keep, sort, roles, dry_run, json } => {
            prune::execute(&dir, keep, &sort, &roles, dry_run, json)?;
        }
        Command::Latest { dir, pattern } => {
            checkpoint::latest(&dir, &pattern)?;
        }
        Command::Checkpoint(cmd) => {
            checkpoint::execute(cmd)?;
        }
        Command::Config { config, stage, pretrain, resume_step } => {
            config::execute(config, stage, pretrain, resume_step)?;
        }
    }

    Ok(())
}
