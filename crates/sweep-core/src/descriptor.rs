//! Job descriptor loading.
//!
//! A descriptor is one JSON file per sweep leaf: a flat object mapping
//! parameter names to string values, written by the sweep generator and
//! read-only here. The directory containing the file is the job's
//! working directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// One point in a parameter sweep, loaded from a JSON file.
#[derive(Debug, Clone, PartialEq)]
pub struct JobDescriptor {
    /// Path of the JSON file this was loaded from.
    pub path: PathBuf,
    /// Parameter name → string value. Flat; nested JSON is rejected.
    pub values: BTreeMap<String, String>,
}

impl JobDescriptor {
    /// Load and validate a descriptor file.
    ///
    /// Fails with `MalformedDescriptor` if the file is not a JSON object
    /// of string values.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let values: BTreeMap<String, String> =
            serde_json::from_str(&content).map_err(|err| CoreError::MalformedDescriptor {
                path: path.to_path_buf(),
                reason: err.to_string(),
            })?;

        Ok(JobDescriptor {
            path: path.to_path_buf(),
            values,
        })
    }

    /// The job's working directory: the directory holding the descriptor
    /// file, or `.` for a bare filename.
    pub fn dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from("."),
        }
    }
}
