use crate::error::TrainingResult;
use std::path::Path;

pub const DEFAULT_SPLIT: &str = "|";

/// Reads a `path|speaker|text`-style file list, one record per non-blank line.
pub fn load_filepaths_and_text(path: &Path, split: &str) -> TrainingResult<Vec<Vec<String>>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(split).map(str::to_string).collect())
        .collect())
}
