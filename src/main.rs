use clap::Parser;
use sortbox::cli::{Cli, load_config, run_with_config};
use sortbox::logging;
use sortbox::output::OutputFormatter;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let options = cli.options();

    let config = match load_config(&options, cli.folder.as_deref(), cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init(cli.verbose, None);
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::FAILURE;
        }
    };

    // Dry runs leave no trace on disk, log file included.
    let _log_guard = if options.dry_run {
        logging::init(cli.verbose, None);
        None
    } else {
        match logging::open_log_writer(Path::new(&config.logs_folder)) {
            Ok((writer, guard, path)) => {
                logging::init(cli.verbose, Some(writer));
                tracing::info!(path = %path.display(), "writing run log");
                Some(guard)
            }
            Err(e) => {
                logging::init(cli.verbose, None);
                tracing::warn!(error = %e, "could not create log file, logging to console only");
                None
            }
        }
    };

    match run_with_config(&options, &config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {}", e));
            ExitCode::FAILURE
        }
    }
}
