use crate::archive::ExtractedFile;
use crate::release::Release;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Result of comparing the installed version with the latest release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCheck {
    /// Recorded version; empty when nothing has been installed yet.
    pub installed: String,
    pub release: Release,
    pub update_needed: bool,
}

impl UpdateCheck {
    pub fn installed_version(&self) -> Option<&str> {
        if self.installed.is_empty() {
            None
        } else {
            Some(&self.installed)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseSummary {
    pub tag: String,
    pub name: Option<String>,
    pub html_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub notes: String,
}

impl From<&Release> for ReleaseSummary {
    fn from(release: &Release) -> Self {
        Self {
            tag: release.tag.clone(),
            name: release.name.clone(),
            html_url: release.html_url.clone(),
            published_at: release.published_at,
            notes: release.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateReport {
    pub release: ReleaseSummary,
    pub previous_version: Option<String>,
    pub style: Option<String>,
    pub target_directory: PathBuf,
    pub files: Vec<ExtractedFile>,
    pub total_bytes: u64,
    pub duration: Duration,
    pub updated_at: DateTime<Utc>,
}

impl UpdateReport {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

#[derive(Debug, Clone)]
pub enum UpdateOutcome {
    /// The recorded version already matches the latest release.
    UpToDate { version: String },
    Updated(UpdateReport),
}

impl UpdateOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}
