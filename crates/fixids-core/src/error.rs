use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixidsError {
    #[error("automations directory not found: {0}")]
    AutomationsDirMissing(PathBuf),

    #[error("checkpoint not found at {0}: run s1-add-suffixes first")]
    CheckpointMissing(PathBuf),

    #[error("no content file referenced any migrated identifier")]
    NoChanges,

    #[error("{0} file(s) still reference old identifiers")]
    ValidationFailed(usize),

    #[error("automation {path} is missing field '{field}'")]
    MalformedAutomation { path: PathBuf, field: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Pattern(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, FixidsError>;

impl FixidsError {
    /// Process exit code reported to the invoking shell for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            FixidsError::AutomationsDirMissing(_) => 2,
            FixidsError::CheckpointMissing(_) => 3,
            FixidsError::NoChanges => 4,
            FixidsError::ValidationFailed(_) => 5,
            _ => 1,
        }
    }
}
