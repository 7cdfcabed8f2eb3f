use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpdaterError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Target directory does not exist: {path}")]
    TargetDirectoryMissing { path: String },

    #[error("Could not determine the user documents directory")]
    DocumentsDirectoryUnavailable,

    #[error("No published release found for {repository}")]
    ReleaseNotFound { repository: String },

    #[error("Network error while requesting {url}: {message}")]
    NetworkError { url: String, message: String },

    #[error("Archive download failed for {url}")]
    DownloadFailed { url: String, status: Option<u16> },

    #[error("Invalid archive {path}: {message}")]
    InvalidArchive { path: String, message: String },

    #[error("No filter files were extracted")]
    NoFilesExtracted { style: Option<String> },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to record installed version in {path}: {source}")]
    VersionMarkerWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid filter style: {style}")]
    InvalidStyle { style: String },
}

impl UpdaterError {
    pub fn file_write(path: &Path, source: std::io::Error) -> Self {
        UpdaterError::FileWrite {
            path: path.display().to_string(),
            source,
        }
    }

    /// Process exit code for this failure. Every failure maps to 1; success
    /// and "already up to date" both exit with 0.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for UpdaterError {
    fn user_message(&self) -> String {
        match self {
            UpdaterError::TargetDirectoryMissing { path } => {
                format!("Path of Exile folder does not exist: {}", path)
            }
            UpdaterError::ReleaseNotFound { repository } => {
                format!("No release has been published for {}", repository)
            }
            UpdaterError::NetworkError { message, .. } => {
                format!("Network error: {}", message)
            }
            UpdaterError::DownloadFailed { url, status } => match status {
                Some(code) => format!(
                    "The archive couldn't be downloaded (HTTP {}) from {}",
                    code, url
                ),
                None => format!("The archive couldn't be downloaded from {}", url),
            },
            UpdaterError::NoFilesExtracted { style } => match style {
                Some(style) => format!(
                    "No files were unzipped. Is \"{}\" the correct filter style?",
                    style
                ),
                None => "No files were unzipped. The release archive contains no top-level filter files."
                    .to_string(),
            },
            UpdaterError::InvalidStyle { style } => {
                format!("\"{}\" is not a valid filter style name", style)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            UpdaterError::TargetDirectoryMissing { .. } => Some(
                "Make sure Path of Exile is installed and has been started at least once, or point --target-dir at its settings folder.".to_string()
            ),
            UpdaterError::DocumentsDirectoryUnavailable => Some(
                "Pass --target-dir or set install.target_dir in the configuration file.".to_string()
            ),
            UpdaterError::ReleaseNotFound { .. } => Some(
                "Check release.owner and release.repository in your configuration.".to_string()
            ),
            UpdaterError::NetworkError { .. } => Some(
                "Check your internet connection and try again. If you are rate limited, set the GITHUB_TOKEN environment variable.".to_string()
            ),
            UpdaterError::DownloadFailed { .. } => Some(
                "This probably isn't your fault. Try again later.".to_string()
            ),
            UpdaterError::InvalidArchive { .. } => Some(
                "The downloaded archive looks corrupt. Run the updater again to download a fresh copy.".to_string()
            ),
            UpdaterError::NoFilesExtracted { style: Some(_) } => Some(
                "Style names match the \"(STYLE) <NAME>\" folders of the release, e.g. blue, purple, slick or streamsound.".to_string()
            ),
            UpdaterError::FileWrite { .. } | UpdaterError::VersionMarkerWrite { .. } => Some(
                "Ensure you have write permission for the target directory and enough free disk space.".to_string()
            ),
            UpdaterError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            UpdaterError::InvalidStyle { .. } => Some(
                "Style names may only contain letters, digits, spaces, '-' and '_'.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for UpdaterError {
    fn from(error: zip::result::ZipError) -> Self {
        match error {
            zip::result::ZipError::Io(io) => UpdaterError::Io(io),
            other => UpdaterError::InvalidArchive {
                path: "archive".to_string(),
                message: other.to_string(),
            },
        }
    }
}

impl From<url::ParseError> for UpdaterError {
    fn from(error: url::ParseError) -> Self {
        UpdaterError::Config {
            message: format!("invalid URL: {}", error),
        }
    }
}

impl From<toml::de::Error> for UpdaterError {
    fn from(error: toml::de::Error) -> Self {
        UpdaterError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UpdaterError>;
