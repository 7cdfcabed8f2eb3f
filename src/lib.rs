pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod marker;
pub mod platform;
pub mod release;
pub mod report;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, InstallConfig, InstallPaths, ReleaseConfig, UiConfig};
pub use error::{Result, UpdaterError, UserFriendlyError};

// Core functionality re-exports
pub use archive::{EntryFilter, ExtractedFile, FilterCriterion, FilterExtractor};
pub use marker::VersionMarkerStore;
pub use platform::{DocumentsLocator, FixedDocumentsLocator, SystemDocumentsLocator};
pub use release::{ArchiveFetcher, GithubReleaseLocator, HttpArchiveFetcher, Release, ReleaseLocator};
pub use report::{ReleaseSummary, UpdateCheck, UpdateOutcome, UpdateReport};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use chrono::Utc;
use std::path::Path;
use std::time::Instant;

/// Main library interface: one update run against one install directory.
pub struct FilterUpdater {
    config: Config,
    paths: InstallPaths,
    locator: Box<dyn ReleaseLocator>,
    fetcher: Box<dyn ArchiveFetcher>,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    force: bool,
}

impl FilterUpdater {
    /// Create an updater talking to the configured release feed, installing
    /// into the directory resolved from `config` and the user's documents
    /// folder.
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let paths = config.resolve_paths(&SystemDocumentsLocator)?;
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        let locator = GithubReleaseLocator::from_config(&config.release);
        let fetcher = HttpArchiveFetcher::new(progress_manager.clone())
            .with_user_agent(config.release.user_agent.clone());

        Ok(Self {
            config,
            paths,
            locator: Box::new(locator),
            fetcher: Box::new(fetcher),
            output_formatter,
            progress_manager,
            force: false,
        })
    }

    /// Assemble an updater from explicit parts. Progress bars are disabled.
    pub fn with_components(
        config: Config,
        paths: InstallPaths,
        locator: Box<dyn ReleaseLocator>,
        fetcher: Box<dyn ArchiveFetcher>,
        output_formatter: OutputFormatter,
    ) -> Self {
        Self {
            config,
            paths,
            locator,
            fetcher,
            output_formatter,
            progress_manager: ProgressManager::new(false),
            force: false,
        }
    }

    /// Create an updater from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;

        Ok(Self::new(config, cli_args.output_mode(), cli_args.verbose, cli_args.quiet)?
            .with_force(cli_args.force))
    }

    /// Reinstall even when the recorded version matches the latest release.
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Locate the latest release and compare it with the recorded version.
    /// Nothing is downloaded or written.
    pub fn check_for_update(&self) -> Result<UpdateCheck> {
        self.ensure_target_directory()?;

        let release = self.locate_latest_release()?;
        let installed = self.marker_store().read();

        self.output_formatter.info(&installed_version_message(&installed));

        let update_needed = self.force || installed != release.tag;

        log::debug!(
            "installed version {:?}, latest {:?}, update needed: {}",
            installed,
            release.tag,
            update_needed
        );

        Ok(UpdateCheck {
            installed,
            release,
            update_needed,
        })
    }

    /// Run the full update: check, download, extract, record the version.
    ///
    /// The version marker is only rewritten after at least one filter file
    /// has been extracted.
    pub fn run(&self) -> Result<UpdateOutcome> {
        let start_time = Instant::now();
        let check = self.check_for_update()?;

        if !check.update_needed {
            self.output_formatter.info("There no need to update.");
            return Ok(UpdateOutcome::UpToDate {
                version: check.installed,
            });
        }

        let release = check.release;
        if check.installed == release.tag {
            self.output_formatter
                .warning(&format!("Reinstalling {} (--force)", release.tag));
        }

        let archive = tempfile::Builder::new()
            .prefix("neversink-updater")
            .suffix(".zip")
            .tempfile()?;

        self.output_formatter.start_operation("Downloading the archive...");
        let downloaded = self.fetcher.fetch_to(&release.archive_url, archive.path())?;
        self.output_formatter
            .debug(&format!("Downloaded {} bytes to {}", downloaded, archive.path().display()));

        let filter = EntryFilter::from_config(&self.config.install);
        let style = filter.criterion().style_name().map(str::to_string);

        let files = self.extract_filters(filter, archive.path())?;
        if files.is_empty() {
            return Err(UpdaterError::NoFilesExtracted { style });
        }

        let marker = self.marker_store();
        marker.write(&release.tag)?;
        log::debug!("recorded {} in {}", release.tag, marker.path().display());

        let total_bytes = files.iter().map(|f| f.bytes).sum();
        let previous_version = if check.installed.is_empty() {
            None
        } else {
            Some(check.installed)
        };

        Ok(UpdateOutcome::Updated(UpdateReport {
            release: ReleaseSummary::from(&release),
            previous_version,
            style,
            target_directory: self.paths.target_dir.clone(),
            files,
            total_bytes,
            duration: start_time.elapsed(),
            updated_at: Utc::now(),
        }))
    }

    fn ensure_target_directory(&self) -> Result<()> {
        if self.paths.target_dir.is_dir() {
            Ok(())
        } else {
            Err(UpdaterError::TargetDirectoryMissing {
                path: self.paths.target_dir.display().to_string(),
            })
        }
    }

    fn locate_latest_release(&self) -> Result<Release> {
        self.output_formatter.start_operation("Fetching the latest release...");

        let spinner = self
            .progress_manager
            .create_spinner("Fetching the latest release...");
        let located = self
            .locator
            .latest_release(&self.config.release.owner, &self.config.release.repository);
        spinner.finish_and_clear();

        let release = located?;
        self.output_formatter.info(&format!("It is: {}", release.tag));
        Ok(release)
    }

    fn extract_filters(&self, filter: EntryFilter, archive_path: &Path) -> Result<Vec<ExtractedFile>> {
        let extractor = FilterExtractor::new(filter);
        let callback = |file: &ExtractedFile| {
            self.output_formatter
                .debug(&format!("Unzipped {} ({} bytes)", file.file_name, file.bytes));
        };

        extractor.extract_archive(archive_path, &self.paths.target_dir, Some(&callback))
    }

    fn marker_store(&self) -> VersionMarkerStore {
        VersionMarkerStore::new(&self.paths.marker_path)
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        Config::default().save_to_file(output_path)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &UpdaterError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

fn installed_version_message(installed: &str) -> String {
    if installed.is_empty() {
        "Couldn't determine the latest installed version.".to_string()
    } else {
        format!("Your current version is {}.", installed)
    }
}

/// Get build information
pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "neversink-updater {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}
