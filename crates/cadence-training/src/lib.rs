//! Cadence Training
//!
//! Model-state lifecycle utilities for speech-model training runs:
//! - Reconciling a saved parameter snapshot with a model's layout (`reconcile`)
//! - Pruning old generator/discriminator checkpoints (`retention`)
//! - Saving and restoring checkpoints (`checkpoint`)
//! - Hyperparameter configs, summaries, file lists and log setup

pub mod checkpoint;
pub mod diagnostics;
pub mod error;
pub mod filelists;
pub mod hparams;
pub mod layout;
pub mod logging;
pub mod reconcile;
pub mod retention;
pub mod summary;
pub mod tensor;

pub use checkpoint::{
    load_checkpoint, read_checkpoint, save_checkpoint, write_checkpoint, Checkpoint, LoadedCheckpoint, OptimizerState,
    SavedCheckpoint,
};
pub use diagnostics::{DiagnosticEvent, DiagnosticLevel, DiagnosticSink, MemorySink, TracingSink};
pub use error::{TrainingError, TrainingResult};
pub use filelists::load_filepaths_and_text;
pub use hparams::{load_training_hparams, HParams, HParamsOptions, HValue, Stage};
pub use layout::{latest_checkpoint_path, CheckpointLayout, CheckpointName, Role};
pub use logging::{init_training_logger, parse_level};
pub use reconcile::{copy_state_dict, reconcile, KeyOutcome, ReconcileReport, Reconciliation, StateDict};
pub use retention::{plan_prune, prune, RetentionPolicy, SortKey};
pub use summary::{summarize, Image, JsonlSummaryWriter, Summary, SummaryWriter};
pub use tensor::{ParameterSet, Tensor};
