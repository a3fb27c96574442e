use crate::error::{FixidsError, Result};
use crate::io;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// An automation definition file held as a parsed YAML document.
///
/// Only `commonfields.id` and `name` are ever read or rewritten; every other
/// field passes through the `Value` round-trip untouched.
#[derive(Debug)]
pub struct AutomationFile {
    path: PathBuf,
    doc: Value,
}

impl AutomationFile {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let doc: Value = serde_yaml::from_str(&data)?;
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The automation's internal identifier (`commonfields.id`).
    pub fn id(&self) -> Result<&str> {
        self.doc
            .get("commonfields")
            .and_then(|c| c.get("id"))
            .and_then(Value::as_str)
            .ok_or_else(|| self.malformed("commonfields.id"))
    }

    /// The automation's human-facing display name (`name`).
    pub fn name(&self) -> Result<&str> {
        self.doc
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| self.malformed("name"))
    }

    pub fn set_name(&mut self, name: &str) -> Result<()> {
        match self.doc.as_mapping_mut() {
            Some(mapping) => {
                mapping.insert(Value::from("name"), Value::from(name));
                Ok(())
            }
            None => Err(FixidsError::MalformedAutomation {
                path: self.path.clone(),
                field: "name",
            }),
        }
    }

    pub fn set_id(&mut self, id: &str) -> Result<()> {
        match self.doc.get_mut("commonfields").and_then(Value::as_mapping_mut) {
            Some(common) => {
                common.insert(Value::from("id"), Value::from(id));
                Ok(())
            }
            None => Err(FixidsError::MalformedAutomation {
                path: self.path.clone(),
                field: "commonfields.id",
            }),
        }
    }

    pub fn save(&self) -> Result<()> {
        let data = serde_yaml::to_string(&self.doc)?;
        io::atomic_write(&self.path, data.as_bytes())
    }

    fn malformed(&self, field: &'static str) -> FixidsError {
        FixidsError::MalformedAutomation {
            path: self.path.clone(),
            field,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
