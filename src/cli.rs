use crate::archive::is_valid_style_name;
use crate::config::{CliOverrides, Config};
use crate::error::Result;
use crate::ui::OutputMode;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "neversink-updater")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Keep NeverSink's Path of Exile item filters up to date")]
#[command(
    long_about = "Checks the latest NeverSink-Filter release, and when it differs from the \
                  installed one downloads it and unpacks the filter files of the chosen style \
                  into the Path of Exile settings directory."
)]
#[command(after_help = "EXAMPLES:\n  \
    neversink-updater\n  \
    neversink-updater blue\n  \
    neversink-updater \"stream sound\" --target-dir ~/poe-filters\n  \
    neversink-updater purple --dry-run\n  \
    neversink-updater --generate-config --config neversink-updater.toml")]
pub struct Cli {
    /// Filter style to install (e.g. blue, purple, slick); omit for the default filters
    #[arg(value_parser = validate_style)]
    pub style: Option<String>,

    /// Directory the filters are installed into
    #[arg(
        short,
        long,
        help = "Install directory (default: <Documents>/My Games/Path of Exile)"
    )]
    pub target_dir: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Reinstall even when the installed version is the latest
    #[arg(long, help = "Install the latest release even if it is already installed")]
    pub force: bool,

    /// Dry run (check for an update without installing it)
    #[arg(long, help = "Only report whether an update is available")]
    pub dry_run: bool,

    /// Wait for a key press before exiting
    #[arg(long, help = "Wait for a key press before exiting")]
    pub pause: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl From<&OutputFormat> for OutputMode {
    fn from(format: &OutputFormat) -> Self {
        match format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        }
    }
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        OutputMode::from(&self.output_format)
    }

    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_target_dir(self.target_dir.clone())
            .with_style(self.style.clone())
            .with_pause_on_exit(self.pause)
    }

    /// Default `log` level for the verbosity flags; `RUST_LOG` still wins.
    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Error;
        }

        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

pub fn validate_style(s: &str) -> std::result::Result<String, String> {
    if !is_valid_style_name(s) {
        return Err(
            "Style names may only contain letters, digits, spaces, hyphens and underscores"
                .to_string(),
        );
    }

    if s.len() > 64 {
        return Err("Style name must be 64 characters or less".to_string());
    }

    Ok(s.to_string())
}
