//! Command-line interface module for sortbox.
//!
//! This module handles argument parsing, applying command-line overrides to
//! the loaded configuration, and orchestrating a run (real or dry) with
//! terminal output.

use crate::action_log::TracingLog;
use crate::config::{Config, ConfigError};
use crate::output::OutputFormatter;
use crate::pipeline::{Pipeline, PlannedMove};
use crate::reporter::Statistics;
use crate::scanner::ScanError;
use clap::{ArgAction, Parser};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Markdown report written into the organized folder.
pub const SUMMARY_FILE: &str = "summary.md";
/// JSON report written next to it with `--json`.
pub const SUMMARY_JSON_FILE: &str = "summary.json";

#[derive(Parser, Debug)]
#[command(
    name = "sortbox",
    version,
    about = "Sort a cluttered downloads folder into category subfolders"
)]
pub struct Cli {
    /// Folder to organize (default: configured or auto-detected downloads folder)
    pub folder: Option<PathBuf>,
    #[arg(long, value_name = "PATH", help = "Configuration file (TOML)")]
    pub config: Option<PathBuf>,
    #[arg(long, help = "Show what would be moved without touching any file")]
    pub dry_run: bool,
    #[arg(long, help = "Also write summary.json next to summary.md")]
    pub json: bool,
    #[arg(long, help = "Disable filename keyword heuristics")]
    pub no_heuristics: bool,
    #[arg(long, value_name = "X", help = "Ambiguity threshold between 0.0 and 1.0")]
    pub threshold: Option<f64>,
    #[arg(short, long, action = ArgAction::Count, help = "Increase log verbosity (-v, -vv)")]
    pub verbose: u8,
}

impl Cli {
    pub fn options(&self) -> RunOptions {
        RunOptions {
            dry_run: self.dry_run,
            json: self.json,
            no_heuristics: self.no_heuristics,
            threshold: self.threshold,
        }
    }
}

/// Flags that change how a run behaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
    pub json: bool,
    pub no_heuristics: bool,
    pub threshold: Option<f64>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Failed to write report {}: {source}", path.display())]
    Report { path: PathBuf, source: io::Error },
}

/// What a finished run produced.
#[derive(Debug)]
pub enum RunReport {
    DryRun {
        planned: Vec<PlannedMove>,
    },
    Completed {
        statistics: Statistics,
        summary_path: PathBuf,
        json_path: Option<PathBuf>,
    },
}

/// Loads configuration and applies command-line overrides, then validates
/// the result again.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or an override is invalid.
pub fn load_config(
    options: &RunOptions,
    folder: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<Config, CliError> {
    let mut config = Config::load(config_path)?;
    if let Some(folder) = folder {
        config.downloads_folder = Some(folder.to_path_buf());
    }
    if options.no_heuristics {
        config.heuristics.enabled = false;
    }
    if let Some(threshold) = options.threshold {
        config.heuristics.ambiguity_threshold = threshold;
    }
    config.validate()?;
    Ok(config)
}

/// Loads configuration and runs.
///
/// # Examples
///
/// ```no_run
/// use sortbox::cli::{run_cli_with_config, RunOptions};
/// use std::path::Path;
///
/// let options = RunOptions { dry_run: true, ..RunOptions::default() };
/// match run_cli_with_config(&options, Some(Path::new("/path/to/downloads")), None) {
///     Ok(report) => println!("{:?}", report),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli_with_config(
    options: &RunOptions,
    folder: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<RunReport, CliError> {
    let config = load_config(options, folder, config_path)?;
    run_with_config(options, &config)
}

/// Runs against an already validated configuration.
pub fn run_with_config(options: &RunOptions, config: &Config) -> Result<RunReport, CliError> {
    let pipeline = Pipeline::new(config)?;
    if options.dry_run {
        dry_run(&pipeline)
    } else {
        organize(&pipeline, options)
    }
}

fn organize(pipeline: &Pipeline, options: &RunOptions) -> Result<RunReport, CliError> {
    OutputFormatter::info(&format!(
        "Organizing contents of: {}",
        pipeline.root().display()
    ));

    let pb = OutputFormatter::create_progress_bar(0);
    let reporter = pipeline.run(&mut TracingLog, |progress| {
        pb.set_length(progress.total as u64);
        OutputFormatter::operation(&pb, progress.operation);
        pb.inc(1);
    })?;
    pb.finish_and_clear();

    let summary_path = pipeline.output_root().join(SUMMARY_FILE);
    reporter
        .write_summary(&summary_path)
        .map_err(|source| CliError::Report {
            path: summary_path.clone(),
            source,
        })?;

    let json_path = if options.json {
        let path = pipeline.output_root().join(SUMMARY_JSON_FILE);
        reporter
            .write_json(&path)
            .map_err(|source| CliError::Report {
                path: path.clone(),
                source,
            })?;
        Some(path)
    } else {
        None
    };

    let statistics = reporter.statistics();
    if statistics.total_processed == 0 {
        OutputFormatter::plain("No files found to organize.");
    } else {
        OutputFormatter::summary_table(&statistics.category_breakdown, statistics.total_moved);
    }
    if statistics.total_skipped > 0 {
        OutputFormatter::warning(&format!(
            "{} file(s) could not be organized. See the Errors section of the report.",
            statistics.total_skipped
        ));
    }
    OutputFormatter::success(&format!("Summary report: {}", summary_path.display()));

    Ok(RunReport::Completed {
        statistics,
        summary_path,
        json_path,
    })
}

fn dry_run(pipeline: &Pipeline) -> Result<RunReport, CliError> {
    OutputFormatter::dry_run_notice(&format!(
        "Analyzing contents of: {}",
        pipeline.root().display()
    ));

    let records = pipeline.scan(&mut TracingLog)?;
    if records.is_empty() {
        OutputFormatter::plain("No files found to organize.");
        return Ok(RunReport::DryRun {
            planned: Vec::new(),
        });
    }

    OutputFormatter::header("Files would be organized as follows:");
    let planned = pipeline.plan(&records);
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for planned_move in &planned {
        OutputFormatter::planned_move(planned_move, pipeline.root());
        *category_counts
            .entry(planned_move.classification.category.clone())
            .or_insert(0) += 1;
    }

    OutputFormatter::summary_table(&category_counts, planned.len());
    OutputFormatter::success("Dry run complete. No files were modified.");

    Ok(RunReport::DryRun { planned })
}
