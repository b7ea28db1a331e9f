use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::{TrainingError, TrainingResult};
use crate::reconcile::{copy_state_dict, ReconcileReport, StateDict};
use crate::tensor::ParameterSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Optimizer seam. State is opaque JSON owned by the optimizer.
pub trait OptimizerState {
    fn state_dict(&self) -> serde_json::Value;

    fn load_state_dict(&mut self, state: serde_json::Value) -> TrainingResult<()>;
}

/// Document persisted for one checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub model: ParameterSet,
    pub iteration: u64,
    pub learning_rate: f64,
    #[serde(default)]
    pub optimizer: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct SavedCheckpoint {
    pub path: PathBuf,
    pub sha256: String,
}

#[derive(Debug, Clone)]
pub struct LoadedCheckpoint {
    pub iteration: u64,
    pub learning_rate: f64,
    pub report: ReconcileReport,
}

pub fn sha256_file(path: &Path) -> TrainingResult<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(hex::encode(hasher.finalize()))
}

pub fn write_checkpoint(checkpoint: &Checkpoint, path: &Path) -> TrainingResult<SavedCheckpoint> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec(checkpoint)?;
    std::fs::write(path, bytes)?;

    Ok(SavedCheckpoint { path: path.to_path_buf(), sha256: sha256_file(path)? })
}

pub fn read_checkpoint(path: &Path) -> TrainingResult<Checkpoint> {
    if !path.is_file() {
        return Err(TrainingError::CheckpointNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn save_checkpoint(
    model: &dyn StateDict,
    optimizer: Option<&dyn OptimizerState>,
    learning_rate: f64,
    iteration: u64,
    path: &Path,
    sink: &dyn DiagnosticSink,
) -> TrainingResult<SavedCheckpoint> {
    sink.emit(DiagnosticEvent::info(format!(
        "Saving model and optimizer state at iteration {iteration} to {}",
        path.display()
    )));

    let checkpoint = Checkpoint {
        model: model.state_dict(),
        iteration,
        learning_rate,
        optimizer: optimizer.map(|o| o.state_dict()),
    };
    write_checkpoint(&checkpoint, path)
}

/// Restores `model` (and optionally `optimizer`) from the checkpoint at `path`.
///
/// Parameters go through reconciliation, so an architecture change only
/// produces warnings for the affected names.
pub fn load_checkpoint(
    path: &Path,
    model: &mut dyn StateDict,
    optimizer: Option<&mut dyn OptimizerState>,
    skip_optimizer: bool,
    sink: &dyn DiagnosticSink,
) -> TrainingResult<LoadedCheckpoint> {
    let checkpoint = read_checkpoint(path)?;

    if let (Some(optimizer), false, Some(state)) = (optimizer, skip_optimizer, checkpoint.optimizer) {
        if !state.is_null() {
            optimizer.load_state_dict(state)?;
        }
    }

    let report = copy_state_dict(model, &checkpoint.model, sink)?;

    sink.emit(DiagnosticEvent::info(format!(
        "Loaded checkpoint '{}' (iteration {})",
        path.display(),
        checkpoint.iteration
    )));

    Ok(LoadedCheckpoint { iteration: checkpoint.iteration, learning_rate: checkpoint.learning_rate, report })
}
