//! sortbox - sort a cluttered downloads folder into category subfolders
//!
//! Files are classified by extension and MIME type, with filename keyword
//! heuristics consulted for low-confidence results, then moved into
//! `<folder>/organized/<Category>/` and summarised in a cleanup report.

pub mod action_log;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod file_organizer;
pub mod heuristic;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod reporter;
pub mod rule_classifier;
pub mod scanner;

pub use action_log::{ActionLog, LogEntry, MemoryLog, TracingLog};
pub use classifier::{ClassificationEngine, ClassificationResult, Method};
pub use config::{CompiledFilters, Config, ConfigError, DuplicateStrategy};
pub use file_organizer::{FileOperation, FileOrganizer, OrganizeError, OrganizeErrorKind};
pub use pipeline::Pipeline;
pub use reporter::{Reporter, Statistics, Summary};
pub use scanner::{FileRecord, FileScanner, ScanError};

pub use cli::{RunOptions, RunReport, run_cli_with_config};
