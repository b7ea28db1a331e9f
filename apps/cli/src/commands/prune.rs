//! Prune command implementation.

use anyhow::{bail, Context, Result};
use cadence_training::{plan_prune, prune, RetentionPolicy, Role, SortKey, TracingSink};
use colored::Colorize;
use std::path::Path;

fn parse_sort(sort: &str) -> Result<SortKey> {
    match sort.to_ascii_lowercase().as_str() {
        "index" | "name" => Ok(SortKey::Index),
        "time" | "mtime" => Ok(SortKey::ModifiedTime),
        other => bail!("Unknown sort order: {}. Supported: index, time", other),
    }
}

/// Execute the prune command.
///
/// Removes all but the newest `keep` checkpoints per role from `dir`.
pub fn execute(dir: &Path, keep: usize, sort: &str, roles: &[String], dry_run: bool, json: bool) -> Result<()> {
    let roles = roles.iter().map(|r| r.parse::<Role>()).collect::<Result<Vec<_>, _>>()?;
    let policy = RetentionPolicy { roles, keep_count: keep, sort: parse_sort(sort)? };

    let removed = if dry_run {
        plan_prune(dir, &policy)
    } else {
        prune(dir, &policy, &TracingSink)
    }
    .with_context(|| format!("Failed to prune checkpoints in {}", dir.display()))?;

    if json {
        let out = serde_json::json!({
            "dir": dir,
            "dry_run": dry_run,
            "keep": keep,
            "removed": removed,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let verb = if dry_run { "Would remove" } else { "Removed" };
    for path in &removed {
        println!("  {} {}", verb.dimmed(), path.display());
    }

    println!();
    if removed.is_empty() {
        println!("{}", "✓ Nothing to prune".green().bold());
    } else {
        println!("{}", format!("✓ {} {} checkpoints", verb, removed.len()).green().bold());
    }

    Ok(())
}
