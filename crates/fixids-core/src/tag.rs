//! Stage 1: suffix tagging.
//!
//! Finds every automation whose internal identifier diverges from its display
//! name, appends the temporary suffix to the display name on disk, and writes
//! the migration checkpoint the later stages run from. The whole pack is
//! backed up to a sibling directory before the first mutation.

use crate::automation::AutomationFile;
use crate::checkpoint::{Checkpoint, MigrationRecord};
use crate::config::MigrationConfig;
use crate::error::{FixidsError, Result};
use crate::io;
use crate::paths;
use crate::remote::Remote;
use std::path::Path;
use tracing::{debug, info};

pub fn run(config: &MigrationConfig, remote: &dyn Remote) -> Result<Checkpoint> {
    let automations_dir = config.automations_dir();
    if !automations_dir.is_dir() {
        return Err(FixidsError::AutomationsDirMissing(automations_dir));
    }

    backup_pack(config)?;

    let checkpoint = tag_automations(&automations_dir, &config.name_suffix)?;
    info!(records = checkpoint.len(), "automations in scope for migration");

    if !checkpoint.is_empty() {
        checkpoint.save(&config.checkpoint_path)?;
        info!(path = %automations_dir.display(), "uploading suffixed automations");
        remote.upload(&automations_dir).report("upload automations");
    }
    Ok(checkpoint)
}

/// Replace any previous backup with a full recursive copy of the pack.
/// This is the only safety net against partial failure in later stages.
fn backup_pack(config: &MigrationConfig) -> Result<()> {
    let backup = config.backup_dir();
    if backup.exists() {
        std::fs::remove_dir_all(&backup)?;
    }
    io::copy_dir_all(&config.pack_root, &backup)?;
    info!(backup = %backup.display(), "backed up content pack");
    Ok(())
}

/// Scan automation definitions and suffix the ones needing migration.
/// Automations whose id already equals their name are left untouched.
fn tag_automations(automations_dir: &Path, suffix: &str) -> Result<Checkpoint> {
    let mut checkpoint = Checkpoint::default();
    for path in io::walk_files(automations_dir, &paths::YAML_EXTENSIONS) {
        let mut automation = AutomationFile::load(&path)?;
        let id = automation.id()?.to_string();
        let name = automation.name()?.to_string();
        if id == name {
            debug!(path = %path.display(), "id already matches name; skipping");
            continue;
        }

        let suffixed = format!("{name}{suffix}");
        automation.set_name(&suffixed)?;
        automation.save()?;
        debug!(path = %path.display(), %id, %suffixed, "tagged automation");

        checkpoint.records.push(MigrationRecord {
            original_name: name,
            name: suffixed,
            id,
            path,
        });
    }
    Ok(checkpoint)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
