//! File-backed store for the opaque filesystem array

use std::path::PathBuf;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{Result, StoreError};

/// Loads and saves the virtual filesystem as a single JSON document
pub struct FsStore {
    path: PathBuf,
}

impl FsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load the stored array.
    ///
    /// A missing or whitespace-only file is an empty filesystem, not an
    /// error; unparseable content is a corrupt-data error so the caller can
    /// refuse to overwrite it blindly.
    pub fn load(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no filesystem data yet, returning empty");
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(StoreError::Read)?;
        if content.trim().is_empty() {
            warn!(path = %self.path.display(), "filesystem data file is empty");
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(StoreError::Corrupt)
    }

    /// Replace the stored array wholesale
    pub fn save(&self, entries: &[Value]) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::Write(std::io::Error::other(e)))?;
        std::fs::write(&self.path, content).map_err(StoreError::Write)
    }
}
