use crate::error::{FixidsError, Result};
use crate::io;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// One automation undergoing migration. Recorded by stage 1 iff the
/// automation's internal identifier differed from its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRecord {
    /// Display name before migration; becomes the new identifier in stage 2.
    pub original_name: String,
    /// Suffixed display name used during the transitional window.
    pub name: String,
    /// Pre-migration internal identifier to purge from cross-references.
    pub id: String,
    /// Definition file, reopened and mutated by stage 2.
    pub path: PathBuf,
}

/// Ordered record set bridging the three stage invocations. Written once by
/// stage 1 (overwriting any prior checkpoint), read-only afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    pub records: Vec<MigrationRecord>,
}

impl Checkpoint {
    /// Load the checkpoint written by stage 1. A missing file means stage 1
    /// never ran, which is a precondition failure for stages 2 and 3.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FixidsError::CheckpointMissing(path.to_path_buf()));
        }
        let data = std::fs::read_to_string(path)?;
        let checkpoint: Checkpoint = serde_json::from_str(&data)?;
        info!(path = %path.display(), records = checkpoint.records.len(), "loaded checkpoint");
        Ok(checkpoint)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.records)?;
        io::atomic_write(path, data.as_bytes())?;
        info!(path = %path.display(), records = self.records.len(), "saved checkpoint");
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// The identifiers that must no longer appear anywhere in the pack.
    pub fn old_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }

    /// Ephemeral old-id → new-id mapping used by stage 2's rewrite step.
    pub fn old_to_new(&self) -> HashMap<String, String> {
        self.records
            .iter()
            .map(|r| (r.id.clone(), r.original_name.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(id: &str, name: &str) -> MigrationRecord {
        MigrationRecord {
            original_name: name.to_string(),
            name: format!("{name}_migration"),
            id: id.to_string(),
            path: PathBuf::from(format!("Scripts/{name}.yml")),
        }
    }

    #[test]
    fn roundtrips_as_a_bare_json_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".fixids.cache.json");
        let checkpoint = Checkpoint {
            records: vec![record("ScriptA_internal", "ScriptA")],
        };
        checkpoint.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.trim_start().starts_with('['));

        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.records, checkpoint.records);
    }

    #[test]
    fn missing_checkpoint_is_a_precondition_failure() {
        let dir = TempDir::new().unwrap();
        let err = Checkpoint::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, FixidsError::CheckpointMissing(_)));
    }

    #[test]
    fn old_to_new_maps_id_to_original_name() {
        let checkpoint = Checkpoint {
            records: vec![record("a_id", "A"), record("b_id", "B")],
        };
        let map = checkpoint.old_to_new();
        assert_eq!(map["a_id"], "A");
        assert_eq!(map["b_id"], "B");
        assert_eq!(checkpoint.old_ids(), vec!["a_id", "b_id"]);
    }
}
