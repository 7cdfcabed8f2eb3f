use crate::archive::is_valid_style_name;
use crate::error::{Result, UpdaterError};
use crate::platform::DocumentsLocator;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub release: ReleaseConfig,
    pub install: InstallConfig,
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReleaseConfig {
    pub owner: String,
    pub repository: String,
    pub api_base_url: String,
    pub timeout: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InstallConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,
    pub game_directory: PathBuf,
    pub marker_file: String,
    pub filter_suffix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub pause_on_exit: bool,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            owner: "NeverSinkDev".to_string(),
            repository: "NeverSink-Filter".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            timeout: 60,
            user_agent: format!("neversink-updater/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ReleaseConfig {
    /// Global timeout for release-feed requests.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            target_dir: None,
            game_directory: PathBuf::from("My Games").join("Path of Exile"),
            marker_file: ".neversink-updater".to_string(),
            filter_suffix: ".filter".to_string(),
            style: None,
        }
    }
}

/// Filesystem locations resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPaths {
    pub target_dir: PathBuf,
    pub marker_path: PathBuf,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(UpdaterError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| UpdaterError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| UpdaterError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                for candidate in Self::default_locations() {
                    if candidate.exists() {
                        return Self::load_from_file(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![
            PathBuf::from("neversink-updater.toml"),
            PathBuf::from(".neversink-updater.toml"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("neversink-updater").join("config.toml"));
        }

        locations
    }

    pub fn merge_with_cli_args(&mut self, overrides: &CliOverrides) {
        if let Some(ref target_dir) = overrides.target_dir {
            self.install.target_dir = Some(target_dir.clone());
        }

        if let Some(ref style) = overrides.style {
            let style = style.trim();
            self.install.style = if style.is_empty() {
                None
            } else {
                Some(style.to_string())
            };
        }

        if overrides.pause_on_exit {
            self.ui.pause_on_exit = true;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| UpdaterError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| UpdaterError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.release.owner.trim().is_empty() || self.release.repository.trim().is_empty() {
            return Err(UpdaterError::Config {
                message: "Release owner and repository must both be specified".to_string(),
            });
        }

        if self.release.timeout == 0 {
            return Err(UpdaterError::Config {
                message: "Release timeout must be greater than 0".to_string(),
            });
        }

        let api = Url::parse(&self.release.api_base_url)?;
        if !matches!(api.scheme(), "https" | "http") {
            return Err(UpdaterError::Config {
                message: format!(
                    "Release API URL must use http or https: {}",
                    self.release.api_base_url
                ),
            });
        }

        if self.install.filter_suffix.is_empty() {
            return Err(UpdaterError::Config {
                message: "Filter file suffix must not be empty".to_string(),
            });
        }

        if let Some(ref style) = self.install.style {
            if !is_valid_style_name(style) {
                return Err(UpdaterError::InvalidStyle {
                    style: style.clone(),
                });
            }
        }

        // The marker lives directly inside the target directory.
        let marker = Path::new(&self.install.marker_file);
        if self.install.marker_file.is_empty()
            || marker.components().count() != 1
            || marker.file_name().is_none()
        {
            return Err(UpdaterError::Config {
                message: format!(
                    "Version marker must be a plain file name: {:?}",
                    self.install.marker_file
                ),
            });
        }

        Ok(())
    }

    /// Resolve the target directory and marker path.
    ///
    /// An explicit `target_dir` wins; otherwise the game directory is joined
    /// onto the documents folder reported by `locator`. The directory is not
    /// checked for existence here.
    pub fn resolve_paths(&self, locator: &dyn DocumentsLocator) -> Result<InstallPaths> {
        let target_dir = match self.install.target_dir {
            Some(ref dir) => dir.clone(),
            None => locator
                .documents_dir()
                .ok_or(UpdaterError::DocumentsDirectoryUnavailable)?
                .join(&self.install.game_directory),
        };

        let marker_path = target_dir.join(&self.install.marker_file);

        Ok(InstallPaths {
            target_dir,
            marker_path,
        })
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub target_dir: Option<PathBuf>,
    pub style: Option<String>,
    pub pause_on_exit: bool,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_dir(mut self, target_dir: Option<PathBuf>) -> Self {
        self.target_dir = target_dir;
        self
    }

    pub fn with_style(mut self, style: Option<String>) -> Self {
        self.style = style;
        self
    }

    pub fn with_pause_on_exit(mut self, pause: bool) -> Self {
        self.pause_on_exit = pause;
        self
    }
}
