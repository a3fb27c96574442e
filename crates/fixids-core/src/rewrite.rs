//! Stage 2: reference rewriting.
//!
//! Step A reopens every recorded automation, sets both the internal
//! identifier and the display name to the original name (ending the suffixed
//! transitional window), and derives the old→new identifier map. Step B
//! rewrites every occurrence of an old identifier across the non-automation
//! content kinds and records the changes for audit.

use crate::automation::AutomationFile;
use crate::checkpoint::Checkpoint;
use crate::config::MigrationConfig;
use crate::error::{FixidsError, Result};
use crate::io;
use crate::paths;
use crate::remote::Remote;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// File path → ordered "old -> new" change descriptions.
pub type Changelog = BTreeMap<String, Vec<String>>;

pub fn run(config: &MigrationConfig, remote: &dyn Remote) -> Result<Changelog> {
    let checkpoint = Checkpoint::load(&config.checkpoint_path)?;

    info!("finalizing automation identifiers");
    let map_old_new = finalize_automations(&checkpoint)?;
    let automations_dir = config.automations_dir();
    remote.upload(&automations_dir).report("upload automations");

    info!("rewriting cross-references");
    let changelog = rewrite_references(config, &map_old_new)?;
    if changelog.is_empty() {
        return Err(FixidsError::NoChanges);
    }

    let data = serde_json::to_string_pretty(&changelog)?;
    io::atomic_write(&config.changelog_path, data.as_bytes())?;
    info!(files = changelog.len(), changelog = %config.changelog_path.display(), "rewrote references");

    remote.upload(&config.pack_root).report("upload pack");
    Ok(changelog)
}

/// Set each recorded automation's id and name to its original name and
/// return the old-id → new-id map. Stored records are never altered.
fn finalize_automations(checkpoint: &Checkpoint) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for record in &checkpoint.records {
        let mut automation = AutomationFile::load(&record.path)?;
        automation.set_id(&record.original_name)?;
        automation.set_name(&record.original_name)?;
        automation.save()?;
        debug!(path = %record.path.display(), old = %record.id, new = %record.original_name, "converged id and name");
        map.insert(record.id.clone(), record.original_name.clone());
    }
    Ok(map)
}

/// One alternation of all old identifiers, each escaped so incidental regex
/// metacharacters in an identifier match literally.
fn old_id_pattern<'a>(old_ids: impl Iterator<Item = &'a str>) -> Result<Regex> {
    let pattern = old_ids
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("|");
    debug!(%pattern, "compiled old-id pattern");
    Ok(Regex::new(&pattern)?)
}

/// Walk every content-kind directory (never the automations directory) and
/// substitute old identifiers in any file that mentions one. Untouched files
/// get no write and no changelog entry.
fn rewrite_references(
    config: &MigrationConfig,
    map_old_new: &HashMap<String, String>,
) -> Result<Changelog> {
    // An empty map would compile an empty alternation, which matches the
    // empty string everywhere. Nothing to substitute either way.
    if map_old_new.is_empty() {
        return Ok(Changelog::new());
    }
    let pattern = old_id_pattern(map_old_new.keys().map(String::as_str))?;
    let mut changelog = Changelog::new();

    for kind_dir in config.content_kind_dirs() {
        if !kind_dir.is_dir() {
            warn!(dir = %kind_dir.display(), "content kind absent; skipping");
            continue;
        }
        debug!(dir = %kind_dir.display(), "scanning content kind");

        for file in io::walk_files(&kind_dir, &paths::CONTENT_EXTENSIONS) {
            let mut data = std::fs::read_to_string(&file)?;
            let found: BTreeSet<&str> = pattern
                .find_iter(&data)
                .map(|m| m.as_str())
                .collect();
            if found.is_empty() {
                continue;
            }

            let entries = changelog.entry(file.display().to_string()).or_default();
            let found: Vec<String> = found.iter().map(|s| s.to_string()).collect();
            for old_id in &found {
                let new_id = &map_old_new[old_id];
                data = data.replace(old_id, new_id);
                entries.push(format!("{old_id} -> {new_id}"));
            }
            io::atomic_write(&file, data.as_bytes())?;
            debug!(file = %file.display(), replaced = found.len(), "rewrote file");
        }
    }
    Ok(changelog)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::MigrationRecord;
    use crate::config;
    use crate::remote::RecordingRemote;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup_pack(dir: &Path) -> MigrationConfig {
        let pack = dir.join("Packs/Migration");
        for sub in ["Scripts", "Playbooks", "Layouts"] {
            std::fs::create_dir_all(pack.join(sub)).unwrap();
        }
        config::scoped_to(dir, pack)
    }

    fn seed_checkpoint(cfg: &MigrationConfig, records: Vec<MigrationRecord>) {
        Checkpoint { records }.save(&cfg.checkpoint_path).unwrap();
    }

    fn tagged_automation(cfg: &MigrationConfig, file: &str, id: &str, name: &str) -> MigrationRecord {
        let path = cfg.automations_dir().join(file);
        std::fs::write(
            &path,
            format!(
                "commonfields:\n  id: {id}\n  version: -1\nname: {name}_migration\nscript: ''\n"
            ),
        )
        .unwrap();
        MigrationRecord {
            original_name: name.to_string(),
            name: format!("{name}_migration"),
            id: id.to_string(),
            path,
        }
    }

    #[test]
    fn missing_checkpoint_fails_with_zero_writes() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let playbook = cfg.pack_root.join("Playbooks/p.yml");
        std::fs::write(&playbook, "uses: ScriptA_internal\n").unwrap();

        let remote = RecordingRemote::default();
        let err = run(&cfg, &remote).unwrap_err();
        assert!(matches!(err, FixidsError::CheckpointMissing(_)));
        assert_eq!(
            std::fs::read_to_string(&playbook).unwrap(),
            "uses: ScriptA_internal\n"
        );
        assert!(remote.calls.borrow().is_empty());
    }

    #[test]
    fn converges_ids_and_rewrites_references() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let record = tagged_automation(&cfg, "a.yml", "ScriptA_internal", "ScriptA");
        seed_checkpoint(&cfg, vec![record.clone()]);

        let playbook = cfg.pack_root.join("Playbooks/p.yml");
        std::fs::write(
            &playbook,
            "tasks:\n  t1: ScriptA_internal\n  t2: ScriptA_internal\n  t3: ScriptA_internal\n",
        )
        .unwrap();

        let remote = RecordingRemote::default();
        let changelog = run(&cfg, &remote).unwrap();

        // automation finalized
        let auto = AutomationFile::load(&record.path).unwrap();
        assert_eq!(auto.id().unwrap(), "ScriptA");
        assert_eq!(auto.name().unwrap(), "ScriptA");

        // all three occurrences replaced, one changelog entry for the file
        let rewritten = std::fs::read_to_string(&playbook).unwrap();
        assert!(!rewritten.contains("ScriptA_internal"));
        assert_eq!(rewritten.matches("ScriptA").count(), 3);
        let entries = &changelog[&playbook.display().to_string()];
        assert_eq!(entries, &vec!["ScriptA_internal -> ScriptA".to_string()]);

        // persisted changelog matches the in-memory one
        let on_disk: Changelog =
            serde_json::from_str(&std::fs::read_to_string(&cfg.changelog_path).unwrap()).unwrap();
        assert_eq!(on_disk, changelog);

        // automations upload then whole-pack upload
        let calls = remote.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("Scripts"));
    }

    #[test]
    fn untouched_files_are_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let record = tagged_automation(&cfg, "a.yml", "a_id", "A");
        seed_checkpoint(&cfg, vec![record]);

        let hit = cfg.pack_root.join("Playbooks/hit.yml");
        let miss = cfg.pack_root.join("Layouts/miss.json");
        std::fs::write(&hit, "uses: a_id\n").unwrap();
        std::fs::write(&miss, "{\"layout\": \"unrelated\"}").unwrap();
        let miss_mtime = std::fs::metadata(&miss).unwrap().modified().unwrap();

        let remote = RecordingRemote::default();
        let changelog = run(&cfg, &remote).unwrap();
        assert_eq!(changelog.len(), 1);
        assert!(changelog.contains_key(&hit.display().to_string()));
        assert_eq!(
            std::fs::metadata(&miss).unwrap().modified().unwrap(),
            miss_mtime
        );
    }

    #[test]
    fn automations_dir_is_never_scanned_in_step_b() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let record = tagged_automation(&cfg, "a.yml", "a_id", "A");
        seed_checkpoint(&cfg, vec![record]);

        // a second automation file mentioning the old id stays as-is
        let bystander = cfg.automations_dir().join("other.yml");
        std::fs::write(
            &bystander,
            "commonfields:\n  id: other\n  version: -1\nname: other\ncomment: calls a_id\n",
        )
        .unwrap();
        let playbook = cfg.pack_root.join("Playbooks/p.yml");
        std::fs::write(&playbook, "uses: a_id\n").unwrap();

        let remote = RecordingRemote::default();
        let changelog = run(&cfg, &remote).unwrap();
        assert!(std::fs::read_to_string(&bystander)
            .unwrap()
            .contains("calls a_id"));
        assert!(!changelog.contains_key(&bystander.display().to_string()));
    }

    #[test]
    fn no_matches_anywhere_is_the_no_changes_failure() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let record = tagged_automation(&cfg, "a.yml", "a_id", "A");
        seed_checkpoint(&cfg, vec![record]);
        std::fs::write(cfg.pack_root.join("Playbooks/p.yml"), "uses: nothing\n").unwrap();

        let remote = RecordingRemote::default();
        let err = run(&cfg, &remote).unwrap_err();
        assert!(matches!(err, FixidsError::NoChanges));
        assert!(!cfg.changelog_path.exists());
    }

    #[test]
    fn empty_checkpoint_is_the_no_changes_failure_without_a_scan() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        std::fs::write(&cfg.checkpoint_path, "[]").unwrap();
        let playbook = cfg.pack_root.join("Playbooks/p.yml");
        std::fs::write(&playbook, "uses: anything\n").unwrap();

        let remote = RecordingRemote::default();
        let err = run(&cfg, &remote).unwrap_err();
        assert!(matches!(err, FixidsError::NoChanges));
        assert_eq!(
            std::fs::read_to_string(&playbook).unwrap(),
            "uses: anything\n"
        );
        assert!(!cfg.changelog_path.exists());
    }

    #[test]
    fn step_b_is_idempotent_on_substituted_content() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let playbook = cfg.pack_root.join("Playbooks/p.yml");
        std::fs::write(&playbook, "uses: ScriptA\n").unwrap();

        let map: HashMap<String, String> =
            [("ScriptA_internal".to_string(), "ScriptA".to_string())].into();
        let changelog = rewrite_references(&cfg, &map).unwrap();
        assert!(changelog.is_empty());
        assert_eq!(std::fs::read_to_string(&playbook).unwrap(), "uses: ScriptA\n");
    }

    #[test]
    fn identifiers_with_metacharacters_match_literally() {
        let dir = TempDir::new().unwrap();
        let cfg = setup_pack(dir.path());
        let playbook = cfg.pack_root.join("Playbooks/p.yml");
        std::fs::write(&playbook, "uses: Script (v2).old\nother: ScriptXv2Yold\n").unwrap();

        let map: HashMap<String, String> =
            [("Script (v2).old".to_string(), "ScriptV2".to_string())].into();
        let changelog = rewrite_references(&cfg, &map).unwrap();
        assert_eq!(changelog.len(), 1);
        let rewritten = std::fs::read_to_string(&playbook).unwrap();
        assert!(rewritten.contains("uses: ScriptV2"));
        // the dot and parens did not act as wildcards
        assert!(rewritten.contains("ScriptXv2Yold"));
    }
}
