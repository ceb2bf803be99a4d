//! Durable copy of the most recent item descriptor.

use crate::models::TrackedItem;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub struct DescriptorStore {
    path: PathBuf,
}

impl DescriptorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the stored descriptor.
    ///
    /// Writes a sibling `.tmp` file and renames it over the target so a
    /// reader never sees a half-written record.
    pub fn persist(&self, item: &TrackedItem) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(item).context("Failed to serialize descriptor")?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write descriptor: {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace descriptor: {}", self.path.display()))?;

        Ok(())
    }

    /// The stored descriptor, or `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<TrackedItem>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read descriptor: {}", self.path.display()))?;
        let item = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse descriptor: {}", self.path.display()))?;
        Ok(Some(item))
    }
}
