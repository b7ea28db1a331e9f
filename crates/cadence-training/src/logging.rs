use crate::error::{TrainingError, TrainingResult};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_LOG_FILE: &str = "train.log";

/// Parses a `--log-level` style string, defaulting to INFO.
#[must_use]
pub fn parse_level(level: &str) -> Level {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Installs the global subscriber for a training run: stdout plus an
/// appending log file at `<model_dir>/<file_name>`.
///
/// `RUST_LOG` overrides `level` when set. Returns the log file path.
pub fn init_training_logger(model_dir: &Path, file_name: &str, level: Level) -> TrainingResult<PathBuf> {
    std::fs::create_dir_all(model_dir)?;
    let path = model_dir.join(file_name);
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()
        .map_err(|e| TrainingError::Logging(e.to_string()))?;

    Ok(path)
}
