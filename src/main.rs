use clap::Parser;
use neversink_updater::{
    Cli, Config, FilterUpdater, OutputFormatter, UpdateOutcome, UpdaterError, UserFriendlyError,
};
use std::process;

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli);
    log::debug!("{}", neversink_updater::build_info());

    let (exit_code, pause) = run(&cli);

    if pause {
        pause_before_exit(&cli);
    }

    process::exit(exit_code);
}

/// Returns the exit code and whether to wait for a key press before exiting.
fn run(cli: &Cli) -> (i32, bool) {
    // Handle special commands first
    if cli.generate_config {
        return (handle_generate_config(cli), cli.pause);
    }

    let updater = match FilterUpdater::from_cli(cli) {
        Ok(updater) => updater,
        Err(e) => {
            print_startup_error(cli, &e);
            return (e.exit_code(), pause_requested(cli));
        }
    };

    let exit_code = if cli.dry_run {
        handle_dry_run(&updater)
    } else {
        handle_update(&updater)
    };

    (exit_code, updater.config().ui.pause_on_exit)
}

/// Pause setting when the updater could not be built. The configuration may
/// be invalid, so only the raw file is consulted.
fn pause_requested(cli: &Cli) -> bool {
    cli.pause
        || Config::load_with_defaults(cli.config.as_ref())
            .map(|config| config.ui.pause_on_exit)
            .unwrap_or(false)
}

fn handle_update(updater: &FilterUpdater) -> i32 {
    match updater.run() {
        Ok(UpdateOutcome::UpToDate { version }) => {
            log::info!("installed version {} is current", version);
            0
        }
        Ok(UpdateOutcome::Updated(report)) => {
            updater.output_formatter().print_update_report(&report);
            0
        }
        Err(e) => {
            log::debug!("update failed: {:?}", e);
            updater.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_dry_run(updater: &FilterUpdater) -> i32 {
    let formatter = updater.output_formatter();
    formatter.info("DRY RUN MODE - nothing will be downloaded or written");

    match updater.check_for_update() {
        Ok(check) => {
            formatter.print_update_check(&check);
            0
        }
        Err(e) => {
            updater.handle_error(&e);
            e.exit_code()
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "neversink-updater.toml".to_string());

    match FilterUpdater::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  neversink-updater --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            e.exit_code()
        }
    }
}

fn print_startup_error(cli: &Cli, error: &UpdaterError) {
    // The updater could not be built, so neither could its formatter.
    let formatter = OutputFormatter::new(cli.output_mode(), 0, false);
    formatter.print_user_friendly_error(error);
}

fn pause_before_exit(cli: &Cli) {
    OutputFormatter::new(cli.output_mode(), 0, false).wait_for_key();
}

fn setup_logging(cli: &Cli) {
    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .format_timestamp(None)
        .init();
}
