// SPDX-License-Identifier: MIT OR Apache-2.0
//! Local persistence of the event filter.

use crate::filter::EventFilter;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the stored filter
pub const FILTER_FILE_NAME: &str = "eventsDashboard.json";

/// Errors from reading or writing the filter file
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("filter store I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON encode/decode error
    #[error("filter store format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Default location: `<config dir>/streali/eventsDashboard.json`
pub fn default_filter_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("streali")
        .join(FILTER_FILE_NAME)
}

/// Event filter backed by a JSON file.
///
/// Every change is written through immediately.
#[derive(Debug)]
pub struct FilterStore {
    path: PathBuf,
    filter: EventFilter,
}

impl FilterStore {
    /// Load from `path`.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file
    /// logs a warning and also yields the defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filter = match Self::read(&path) {
            Ok(Some(filter)) => filter,
            Ok(None) => {
                tracing::debug!("No stored event filter at {:?}, using defaults", path);
                EventFilter::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load event filter from {:?}: {}, using defaults", path, e);
                EventFilter::default()
            }
        };
        Self { path, filter }
    }

    fn read(path: &Path) -> StoreResult<Option<EventFilter>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Current filter
    pub fn filter(&self) -> &EventFilter {
        &self.filter
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Toggle one entry and persist if it changed
    pub fn set_checked(&mut self, label: &str, value: bool) -> StoreResult<()> {
        if self.filter.set_checked(label, value) {
            self.save()?;
        }
        Ok(())
    }

    /// Reset to the default list and persist
    pub fn select_all(&mut self) -> StoreResult<()> {
        self.filter.select_all();
        self.save()
    }

    /// Write the current filter to disk
    pub fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(&self.filter)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!("Saved event filter to {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = TempDir::new().unwrap();
        let store = FilterStore::open(dir.path().join(FILTER_FILE_NAME));
        assert_eq!(store.filter(), &EventFilter::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_changes_are_written_through() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(FILTER_FILE_NAME);

        let mut store = FilterStore::open(&path);
        store.set_checked("Bits", false).unwrap();
        assert!(path.exists());

        let reopened = FilterStore::open(&path);
        assert!(!reopened.filter().allows(20));
        assert!(reopened.filter().allows(10));
    }

    #[test]
    fn test_select_all_persists_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILTER_FILE_NAME);

        let mut store = FilterStore::open(&path);
        store.set_checked("Follow", false).unwrap();
        store.select_all().unwrap();

        let reopened = FilterStore::open(&path);
        assert_eq!(reopened.filter(), &EventFilter::default());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(FILTER_FILE_NAME);
        std::fs::write(&path, "{not json").unwrap();

        let store = FilterStore::open(&path);
        assert_eq!(store.filter(), &EventFilter::default());
    }
}
