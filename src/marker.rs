//! Record of the last successfully installed release tag.

use crate::error::{Result, UpdaterError};
use std::fs;
use std::path::{Path, PathBuf};

/// Plain-text version marker kept inside the target directory.
///
/// Reading never fails: an absent or unreadable marker means "nothing
/// installed yet" and yields an empty string. Writing failures are fatal.
#[derive(Debug, Clone)]
pub struct VersionMarkerStore {
    path: PathBuf,
}

impl VersionMarkerStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                log::info!(
                    "couldn't determine the installed version from {}: {}",
                    self.path.display(),
                    e
                );
                String::new()
            }
        }
    }

    pub fn write(&self, tag: &str) -> Result<()> {
        fs::write(&self.path, tag).map_err(|source| {
            log::error!(
                "failed to write version marker {}: {}",
                self.path.display(),
                source
            );
            UpdaterError::VersionMarkerWrite {
                path: self.path.display().to_string(),
                source,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_marker_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = VersionMarkerStore::new(dir.path().join(".neversink-updater"));

        store.write("3.1.0").unwrap();
        assert_eq!(store.read(), "3.1.0");
    }

    #[test]
    fn test_missing_marker_reads_empty() {
        let dir = TempDir::new().unwrap();
        let store = VersionMarkerStore::new(dir.path().join("absent"));

        assert_eq!(store.read(), "");
    }

    #[test]
    fn test_write_overwrites_previous_tag() {
        let dir = TempDir::new().unwrap();
        let store = VersionMarkerStore::new(dir.path().join(".marker"));

        store.write("7.9.0").unwrap();
        store.write("7.10.0").unwrap();
        assert_eq!(store.read(), "7.10.0");
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "7.10.0");
    }

    #[test]
    fn test_read_ignores_trailing_newline() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".marker");
        fs::write(&path, "3.0.0\n").unwrap();

        assert_eq!(VersionMarkerStore::new(path).read(), "3.0.0");
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = VersionMarkerStore::new(dir.path().join("missing").join(".marker"));

        let result = store.write("3.1.0");
        assert!(matches!(
            result,
            Err(UpdaterError::VersionMarkerWrite { .. })
        ));
    }
}
