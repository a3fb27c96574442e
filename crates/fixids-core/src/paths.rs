use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Default locations and names
// ---------------------------------------------------------------------------

pub const DEFAULT_PACK_ROOT: &str = "./Packs/Migration";
pub const AUTOMATIONS_DIR: &str = "Scripts";

pub const NAME_SUFFIX: &str = "_migration";

pub const CHECKPOINT_FILE: &str = ".fixids.cache.json";
pub const CHANGELOG_FILE: &str = "changelog.json";
pub const NOT_FIXED_FILE: &str = "not-fixed.json";

pub const BACKUP_DIR_SUFFIX: &str = "-Backup";
pub const VALIDATION_DIR_SUFFIX: &str = "-Validate";

/// Content kinds scanned for cross-references in stage 2. The automations
/// directory is deliberately absent: it is finalized separately in step A.
pub const CONTENT_KIND_DIRS: [&str; 14] = [
    "Classifiers",
    "Dashboards",
    "IncidentFields",
    "IncidentTypes",
    "IndicatorFields",
    "IndicatorTypes",
    "Integrations",
    "Layouts",
    "Lists",
    "Playbooks",
    "PreProcessRules",
    "Reports",
    "TestPlaybooks",
    "Widgets",
];

/// Extensions holding automation definitions.
pub const YAML_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Extensions scanned as raw text for identifier occurrences.
pub const CONTENT_EXTENSIONS: [&str; 3] = ["yml", "yaml", "json"];

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Sibling of `dir` whose final component carries an extra suffix,
/// e.g. `Packs/Migration` + `-Backup` → `Packs/Migration-Backup`.
pub fn sibling_with_suffix(dir: &Path, suffix: &str) -> PathBuf {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.with_file_name(format!("{name}{suffix}"))
}

/// Path fragment marking intentionally-retained migration artifacts in the
/// stage-3 download: the temporary suffix stripped of its separator, followed
/// by a path separator.
pub fn exclusion_fragment(name_suffix: &str) -> String {
    format!(
        "{}{}",
        name_suffix.replace('_', ""),
        std::path::MAIN_SEPARATOR
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
