//! Stage 3: consistency validation.
//!
//! Pulls a fresh copy of all custom content from the server and scans it for
//! residual old identifiers. Purely diagnostic: the only writes are the
//! validation scratch directory and, on failure, the not-fixed report.

use crate::checkpoint::Checkpoint;
use crate::config::MigrationConfig;
use crate::error::{FixidsError, Result};
use crate::io;
use crate::paths;
use crate::remote::Remote;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A downloaded file still carrying old identifiers, with every occurrence
/// in document order (duplicates retained).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Residual {
    pub path: String,
    #[serde(rename = "match")]
    pub matches: Vec<String>,
}

pub fn run(config: &MigrationConfig, remote: &dyn Remote) -> Result<()> {
    let checkpoint = Checkpoint::load(&config.checkpoint_path)?;

    let validation_dir = config.validation_dir();
    if validation_dir.exists() {
        std::fs::remove_dir_all(&validation_dir)?;
    }
    io::ensure_dir(&validation_dir)?;

    info!(dir = %validation_dir.display(), "downloading fresh custom content");
    remote.download_all(&validation_dir).report("download content");

    let pattern = old_id_pattern(&checkpoint)?;
    let exclusion = paths::exclusion_fragment(&config.name_suffix);
    let mut residuals = Vec::new();

    for file in io::walk_files(&validation_dir, &paths::CONTENT_EXTENSIONS) {
        let path_str = file.display().to_string();
        if path_str.contains(&exclusion) {
            debug!(file = %path_str, "retained migration artifact; skipping");
            continue;
        }
        let data = std::fs::read_to_string(&file)?;
        let matches: Vec<String> = pattern
            .find_iter(&data)
            .map(|m| m.as_str().to_string())
            .collect();
        if !matches.is_empty() {
            residuals.push(Residual {
                path: path_str,
                matches,
            });
        }
    }

    if residuals.is_empty() {
        info!("all identifiers and cross-references are consistent");
        return Ok(());
    }

    let count = residuals.len();
    let data = serde_json::to_string_pretty(&residuals)?;
    io::atomic_write(&config.not_fixed_path, data.as_bytes())?;
    info!(count, report = %config.not_fixed_path.display(), "residual references found");
    Err(FixidsError::ValidationFailed(count))
}

/// Alternation of the checkpoint's original old identifiers, escaped as
/// literals.
fn old_id_pattern(checkpoint: &Checkpoint) -> Result<Regex> {
    let pattern = checkpoint
        .old_ids()
        .iter()
        .map(|id| regex::escape(id))
        .collect::<Vec<_>>()
        .join("|");
    Ok(Regex::new(&pattern)?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
