//! The remote content-management system, seen through the narrow interface
//! the stages need: push a mutated subtree, pull a fresh full copy.
//!
//! Failures are captured, not raised. The original tool treated a non-zero
//! exit from the server CLI as log-and-continue, and that leniency is kept:
//! callers emit a WARN and move on.

use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Result of one remote invocation: exit status plus combined output.
#[derive(Debug, Clone)]
pub struct RemoteOutcome {
    pub success: bool,
    pub log: String,
}

impl RemoteOutcome {
    /// Log the outcome; WARN on failure, DEBUG detail otherwise.
    pub fn report(&self, operation: &str) {
        if self.success {
            debug!(operation, log = %self.log, "remote call succeeded");
        } else {
            warn!(operation, log = %self.log, "remote call failed; continuing");
        }
    }
}

/// What the stages require from the content-management server.
pub trait Remote {
    /// Push the local state of `path` (a content subtree) to the server.
    fn upload(&self, path: &Path) -> RemoteOutcome;

    /// Pull a fresh copy of all custom content into `dest`.
    fn download_all(&self, dest: &Path) -> RemoteOutcome;
}

/// Production implementation shelling out to the `demisto-sdk` CLI.
pub struct DemistoSdk {
    binary: PathBuf,
}

impl DemistoSdk {
    pub fn new() -> Self {
        let binary =
            which::which("demisto-sdk").unwrap_or_else(|_| PathBuf::from("demisto-sdk"));
        Self { binary }
    }

    fn run(&self, args: &[&str]) -> RemoteOutcome {
        debug!(binary = %self.binary.display(), ?args, "invoking remote cli");
        match Command::new(&self.binary).args(args).output() {
            Ok(output) => {
                let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
                log.push_str(&String::from_utf8_lossy(&output.stderr));
                RemoteOutcome {
                    success: output.status.success(),
                    log: log.trim().to_string(),
                }
            }
            Err(e) => RemoteOutcome {
                success: false,
                log: format!("failed to invoke {}: {e}", self.binary.display()),
            },
        }
    }
}

impl Default for DemistoSdk {
    fn default() -> Self {
        Self::new()
    }
}

impl Remote for DemistoSdk {
    fn upload(&self, path: &Path) -> RemoteOutcome {
        self.run(&["upload", "--insecure", "-i", &path.to_string_lossy()])
    }

    fn download_all(&self, dest: &Path) -> RemoteOutcome {
        self.run(&["download", "--insecure", "-a", "-o", &dest.to_string_lossy()])
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Records every call; uploads and downloads always succeed. Downloads can
/// seed the destination with canned files.
#[derive(Default)]
pub struct RecordingRemote {
    pub calls: std::cell::RefCell<Vec<String>>,
    /// Relative path → content, materialized under `dest` on download.
    pub download_files: Vec<(PathBuf, String)>,
}

impl Remote for RecordingRemote {
    fn upload(&self, path: &Path) -> RemoteOutcome {
        self.calls
            .borrow_mut()
            .push(format!("upload {}", path.display()));
        RemoteOutcome {
            success: true,
            log: String::new(),
        }
    }

    fn download_all(&self, dest: &Path) -> RemoteOutcome {
        self.calls
            .borrow_mut()
            .push(format!("download {}", dest.display()));
        for (rel, content) in &self.download_files {
            let target = dest.join(rel);
            if let Some(parent) = target.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            let _ = std::fs::write(target, content);
        }
        RemoteOutcome {
            success: true,
            log: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn spawn_failure_is_captured_not_raised() {
        let sdk = DemistoSdk {
            binary: PathBuf::from("/nonexistent/demisto-sdk"),
        };
        let outcome = sdk.upload(Path::new("Scripts"));
        assert!(!outcome.success);
        assert!(outcome.log.contains("failed to invoke"));
    }

    #[test]
    fn recording_remote_materializes_download_files() {
        let dir = TempDir::new().unwrap();
        let remote = RecordingRemote {
            download_files: vec![(PathBuf::from("Playbooks/p.yml"), "id: x".to_string())],
            ..Default::default()
        };
        let outcome = remote.download_all(dir.path());
        assert!(outcome.success);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("Playbooks/p.yml")).unwrap(),
            "id: x"
        );
        assert_eq!(remote.calls.borrow().len(), 1);
    }
}
