//! Pruning old checkpoints from a model directory.

use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use crate::error::{TrainingError, TrainingResult};
use crate::layout::{CheckpointName, Role};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Oldest modification time first.
    #[default]
    ModifiedTime,
    /// Lowest embedded step index first. Every role file must parse.
    Index,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub roles: Vec<Role>,
    /// Checkpoints kept per role, not counting baselines.
    pub keep_count: usize,
    pub sort: SortKey,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self { roles: Role::ALL.to_vec(), keep_count: 2, sort: SortKey::default() }
    }
}

#[derive(Debug)]
struct Candidate {
    path: PathBuf,
    index: Option<u64>,
    modified: SystemTime,
}

fn is_baseline(file_name: &str, parsed: Option<&CheckpointName>) -> bool {
    match parsed {
        Some(name) => name.is_baseline(),
        None => Path::new(file_name).file_stem().and_then(|s| s.to_str()).is_some_and(|s| s.ends_with("_0")),
    }
}

fn list_files(directory: &Path) -> TrainingResult<Vec<(String, PathBuf)>> {
    if !directory.is_dir() {
        return Err(TrainingError::DirectoryNotFound(directory.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        files.push((name, entry.path()));
    }
    Ok(files)
}

fn eligible_for_role(
    files: &[(String, PathBuf)],
    role: Role,
    sort: SortKey,
) -> TrainingResult<Vec<Candidate>> {
    let mut candidates = Vec::new();

    for (name, path) in files.iter().filter(|(n, _)| n.starts_with(role.prefix())) {
        let parsed = match sort {
            SortKey::Index => {
                let parsed = CheckpointName::parse(name)?;
                if parsed.prefix != role.prefix() {
                    return Err(TrainingError::InvalidCheckpointName { name: name.clone() });
                }
                Some(parsed)
            }
            SortKey::ModifiedTime => CheckpointName::parse(name).ok().filter(|p| p.prefix == role.prefix()),
        };
        if is_baseline(name, parsed.as_ref()) {
            continue;
        }
        let modified = match sort {
            SortKey::ModifiedTime => std::fs::metadata(path)?.modified()?,
            SortKey::Index => SystemTime::UNIX_EPOCH,
        };
        candidates.push(Candidate { path: path.clone(), index: parsed.map(|p| p.index), modified });
    }

    match sort {
        SortKey::Index => candidates.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.path.cmp(&b.path))),
        SortKey::ModifiedTime => {
            candidates.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
        }
    }
    Ok(candidates)
}

/// Paths `prune` would delete, without touching the filesystem.
pub fn plan_prune(directory: &Path, policy: &RetentionPolicy) -> TrainingResult<Vec<PathBuf>> {
    let files = list_files(directory)?;
    let mut doomed = Vec::new();
    let mut seen = Vec::with_capacity(policy.roles.len());

    for role in &policy.roles {
        if seen.contains(role) {
            continue;
        }
        seen.push(*role);
        let candidates = eligible_for_role(&files, *role, policy.sort)?;
        let cut = candidates.len().saturating_sub(policy.keep_count);
        doomed.extend(candidates.into_iter().take(cut).map(|c| c.path));
    }

    Ok(doomed)
}

/// Deletes all but the newest `keep_count` checkpoints of each role.
///
/// Baselines (step 0) are never candidates. Every name is validated before
/// the first deletion, so a malformed name in index mode removes nothing.
pub fn prune(directory: &Path, policy: &RetentionPolicy, sink: &dyn DiagnosticSink) -> TrainingResult<Vec<PathBuf>> {
    let doomed = plan_prune(directory, policy)?;

    for path in &doomed {
        sink.emit(DiagnosticEvent::info(format!(".. Free up space by deleting ckpt {}", path.display())));
        std::fs::remove_file(path)?;
    }

    Ok(doomed)
}
