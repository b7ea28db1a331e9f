//! Config command implementation.

use anyhow::{Context, Result};
use cadence_training::{load_training_hparams, HParamsOptions, Stage};
use std::path::PathBuf;

/// Load the config, prepare the stage's model directory and print the result.
pub fn execute(config: PathBuf, stage: u8, pretrain: Option<String>, resume_step: Option<u64>) -> Result<()> {
    let options = HParamsOptions { config, pretrain, resume_step, stage: Stage::try_from(stage)? };

    let hparams = load_training_hparams(&options)
        .with_context(|| format!("Failed to load config {}", options.config.display()))?;

    println!("{}", serde_json::to_string_pretty(&hparams)?);
    Ok(())
}
