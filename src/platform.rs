//! Lookup of the user's documents folder.
//!
//! The game keeps its settings under the documents folder, so every
//! install path is derived from it. Resolution goes through the
//! [`DocumentsLocator`] trait so tests never depend on the host layout.

use std::path::PathBuf;

/// Capability for finding the user's documents directory.
pub trait DocumentsLocator {
    /// Return the documents directory, or `None` when the platform does
    /// not define one.
    fn documents_dir(&self) -> Option<PathBuf>;
}

/// OS-backed locator (`Documents` known folder on Windows, XDG
/// `DOCUMENTS` on Linux, `~/Documents` on macOS).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDocumentsLocator;

impl DocumentsLocator for SystemDocumentsLocator {
    fn documents_dir(&self) -> Option<PathBuf> {
        dirs::document_dir()
    }
}

/// Locator that always answers with a fixed directory.
#[derive(Debug, Clone)]
pub struct FixedDocumentsLocator {
    path: PathBuf,
}

impl FixedDocumentsLocator {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl DocumentsLocator for FixedDocumentsLocator {
    fn documents_dir(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_locator_returns_its_path() {
        let locator = FixedDocumentsLocator::new("/home/exile/Documents");
        assert_eq!(
            locator.documents_dir(),
            Some(PathBuf::from("/home/exile/Documents"))
        );
    }
}
