use crate::paths;
use std::path::{Path, PathBuf};

/// Everything a stage needs to know about where the migration lives.
///
/// Passed explicitly into each stage entry point so tests can run against
/// scratch directories with their own suffixes and artifact paths.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Root of the content pack being migrated.
    pub pack_root: PathBuf,
    /// Temporary display-name suffix applied in stage 1 and reverted in stage 2.
    pub name_suffix: String,
    /// Persisted migration-record checkpoint bridging stage invocations.
    pub checkpoint_path: PathBuf,
    /// Stage-2 audit artifact: path → "old -> new" change descriptions.
    pub changelog_path: PathBuf,
    /// Stage-3 triage artifact: files still carrying old identifiers.
    pub not_fixed_path: PathBuf,
}

impl MigrationConfig {
    pub fn new(pack_root: impl Into<PathBuf>) -> Self {
        Self {
            pack_root: pack_root.into(),
            name_suffix: paths::NAME_SUFFIX.to_string(),
            checkpoint_path: PathBuf::from(paths::CHECKPOINT_FILE),
            changelog_path: PathBuf::from(paths::CHANGELOG_FILE),
            not_fixed_path: PathBuf::from(paths::NOT_FIXED_FILE),
        }
    }

    /// Directory holding automation definitions.
    pub fn automations_dir(&self) -> PathBuf {
        self.pack_root.join(paths::AUTOMATIONS_DIR)
    }

    /// Sibling copy of the whole pack taken before any stage-1 mutation.
    pub fn backup_dir(&self) -> PathBuf {
        paths::sibling_with_suffix(&self.pack_root, paths::BACKUP_DIR_SUFFIX)
    }

    /// Scratch directory stage 3 downloads a fresh content copy into.
    pub fn validation_dir(&self) -> PathBuf {
        paths::sibling_with_suffix(&self.pack_root, paths::VALIDATION_DIR_SUFFIX)
    }

    /// Content-kind directories scanned in stage 2's reference rewrite.
    pub fn content_kind_dirs(&self) -> impl Iterator<Item = PathBuf> + '_ {
        paths::CONTENT_KIND_DIRS
            .iter()
            .map(|d| self.pack_root.join(d))
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self::new(paths::DEFAULT_PACK_ROOT)
    }
}

/// Scope every artifact path under `dir`; test scaffolding and callers that
/// keep artifacts next to the pack rather than in the invoking directory.
pub fn scoped_to(dir: &Path, pack_root: impl Into<PathBuf>) -> MigrationConfig {
    let mut cfg = MigrationConfig::new(pack_root);
    cfg.checkpoint_path = dir.join(paths::CHECKPOINT_FILE);
    cfg.changelog_path = dir.join(paths::CHANGELOG_FILE);
    cfg.not_fixed_path = dir.join(paths::NOT_FIXED_FILE);
    cfg
}
