use crate::error::{TrainingError, TrainingResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const CHECKPOINT_EXTENSION: &str = "pth";

/// Checkpoint family, identified by its file name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "G")]
    Generator,
    #[serde(rename = "D")]
    Discriminator,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Generator, Self::Discriminator];

    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Generator => "G",
            Self::Discriminator => "D",
        }
    }

    #[must_use]
    pub fn checkpoint_file_name(self, step: u64) -> String {
        format!("{}_{step}.{CHECKPOINT_EXTENSION}", self.prefix())
    }

    #[must_use]
    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.prefix() == prefix)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.prefix())
    }
}

impl std::str::FromStr for Role {
    type Err = TrainingError;

    fn from_str(s: &str) -> TrainingResult<Self> {
        Self::from_prefix(s.trim()).ok_or_else(|| TrainingError::Config(format!("unknown checkpoint role: {s}")))
    }
}

/// Parsed `<prefix>_<digits>.<ext>` checkpoint file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckpointName {
    pub prefix: String,
    pub index: u64,
    pub extension: String,
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<prefix>[^_]+)_(?P<index>\d+)\.(?P<ext>[A-Za-z0-9]+)$")
            .unwrap_or_else(|e| unreachable!("checkpoint name pattern: {e}"))
    })
}

impl CheckpointName {
    pub fn parse(file_name: &str) -> TrainingResult<Self> {
        let invalid = || TrainingError::InvalidCheckpointName { name: file_name.to_string() };
        let caps = name_pattern().captures(file_name).ok_or_else(invalid)?;
        let index = caps["index"].parse::<u64>().map_err(|_| invalid())?;
        Ok(Self { prefix: caps["prefix"].to_string(), index, extension: caps["ext"].to_string() })
    }

    /// Index 0 marks a baseline checkpoint that retention never removes.
    #[must_use]
    pub fn is_baseline(&self) -> bool {
        self.index == 0
    }
}

/// Filesystem layout of one model directory.
///
/// `<model_dir>/G_<step>.pth`, `<model_dir>/D_<step>.pth`, `<model_dir>/config.json`
#[derive(Debug, Clone)]
pub struct CheckpointLayout {
    root: PathBuf,
}

impl CheckpointLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn checkpoint_path(&self, role: Role, step: u64) -> PathBuf {
        self.root.join(role.checkpoint_file_name(step))
    }

    #[must_use]
    pub fn generator_path(&self, step: u64) -> PathBuf {
        self.checkpoint_path(Role::Generator, step)
    }

    #[must_use]
    pub fn discriminator_path(&self, step: u64) -> PathBuf {
        self.checkpoint_path(Role::Discriminator, step)
    }

    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn ensure_dir(&self) -> TrainingResult<()> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }
}

fn file_name_digits(path: &Path) -> Option<u64> {
    let digits: String = path.file_name()?.to_str()?.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.parse() {
        Ok(index) => Some(index),
        Err(_) => {
            tracing::debug!(path = %path.display(), "Skipping checkpoint whose step does not fit in u64");
            None
        }
    }
}

/// Newest checkpoint in `dir` whose name matches the glob `pattern`, ranked by
/// the digits in the file name.
///
/// Names without digits, or whose digits exceed `u64::MAX`, are not candidates.
pub fn latest_checkpoint_path(dir: &Path, pattern: &str) -> TrainingResult<PathBuf> {
    let full = dir.join(pattern);
    let mut candidates = Vec::new();
    for entry in glob::glob(&full.to_string_lossy())? {
        let path = entry.map_err(|e| TrainingError::Io(e.into_error()))?;
        if let Some(index) = file_name_digits(&path) {
            candidates.push((index, path));
        }
    }

    candidates.sort();
    candidates
        .pop()
        .map(|(_, path)| path)
        .ok_or_else(|| TrainingError::NoCheckpointFound { dir: dir.to_path_buf(), pattern: pattern.to_string() })
}
