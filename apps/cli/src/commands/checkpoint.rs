//! Checkpoint commands for inspecting and restoring training snapshots.

use anyhow::{Context, Result};
use cadence_training::{
    latest_checkpoint_path, read_checkpoint, reconcile, write_checkpoint, Checkpoint, KeyOutcome, TracingSink,
};
use clap::Subcommand;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Checkpoint subcommands
#[derive(Subcommand, Debug)]
pub enum CheckpointCommand {
    /// Show iteration, learning rate and parameter shapes
    Inspect {
        /// Checkpoint file
        path: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load one checkpoint's parameters into another checkpoint's layout
    ///
    /// Parameters missing from the source or with a different shape keep the
    /// target's values. Iteration, learning rate and optimizer state come from
    /// the target.
    Restore {
        /// Checkpoint providing parameter values
        #[arg(long)]
        from: PathBuf,
        /// Checkpoint providing the parameter layout
        #[arg(long)]
        into: PathBuf,
        /// Where to write the reconciled checkpoint
        #[arg(long)]
        output: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Execute checkpoint command
pub fn execute(cmd: CheckpointCommand) -> Result<()> {
    match cmd {
        CheckpointCommand::Inspect { path, json } => inspect_command(&path, json),
        CheckpointCommand::Restore { from, into, output, json } => restore_command(&from, &into, &output, json),
    }
}

/// Print the newest checkpoint in `dir` matching `pattern`.
pub fn latest(dir: &Path, pattern: &str) -> Result<()> {
    let path = latest_checkpoint_path(dir, pattern)
        .with_context(|| format!("Failed to find a checkpoint in {}", dir.display()))?;
    println!("{}", path.display());
    Ok(())
}

fn load(path: &Path) -> Result<Checkpoint> {
    read_checkpoint(path).with_context(|| format!("Failed to read checkpoint {}", path.display()))
}

fn inspect_command(path: &Path, json: bool) -> Result<()> {
    let ckpt = load(path)?;

    if json {
        let out = serde_json::json!({
            "path": path,
            "iteration": ckpt.iteration,
            "learning_rate": ckpt.learning_rate,
            "has_optimizer": ckpt.optimizer.as_ref().is_some_and(|o| !o.is_null()),
            "parameters": ckpt.model.shapes(),
            "numel": ckpt.model.numel(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("{}", format!("Checkpoint {}", path.display()).bold().cyan());
    println!("  Iteration:     {}", ckpt.iteration);
    println!("  Learning rate: {}", ckpt.learning_rate);
    println!("  Parameters:    {} ({} values)", ckpt.model.len(), ckpt.model.numel());
    println!();
    println!("{:<48} {}", "Name", "Shape");
    println!("{}", "─".repeat(72));
    for (name, tensor) in ckpt.model.iter() {
        println!("{:<48} {}", name, format!("{:?}", tensor.shape()).dimmed());
    }
    println!();
    Ok(())
}

fn restore_command(from: &Path, into: &Path, output: &Path, json: bool) -> Result<()> {
    let source = load(from)?;
    let target = load(into)?;

    let result = reconcile(&target.model, &source.model, &TracingSink);
    let restored = Checkpoint {
        model: result.parameters,
        iteration: target.iteration,
        learning_rate: target.learning_rate,
        optimizer: target.optimizer,
    };
    let saved = write_checkpoint(&restored, output)
        .with_context(|| format!("Failed to write checkpoint {}", output.display()))?;

    if json {
        let out = serde_json::json!({
            "output": saved.path,
            "sha256": saved.sha256,
            "report": result.report,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let loaded = result.report.loaded().count();
    println!();
    println!("{}", "Checkpoint restored".bold().green());
    println!("  Loaded:    {}/{}", loaded, result.report.outcomes.len());
    for (name, outcome) in result.report.fallbacks() {
        let reason = match outcome {
            KeyOutcome::ShapeMismatch { expected, found } => format!("shape {:?} != {:?}", found, expected),
            _ => "missing".to_string(),
        };
        println!("  {} {} ({})", "kept".yellow(), name, reason.dimmed());
    }
    if !result.report.unexpected.is_empty() {
        println!("  Ignored:   {}", result.report.unexpected.join(", ").dimmed());
    }
    println!("  Output:    {}", saved.path.display().to_string().cyan());
    println!("  SHA-256:   {}", saved.sha256.dimmed());
    println!();
    Ok(())
}
