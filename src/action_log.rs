//! Logging sink handed to the pipeline.
//!
//! The pipeline reports what it does through an [`ActionLog`] instead of a
//! global logger. [`TracingLog`] forwards to `tracing`; [`MemoryLog`] keeps
//! entries in memory for tests and for callers embedding the library.

use crate::classifier::ClassificationResult;
use crate::file_organizer::FileOperation;
use crate::scanner::FileRecord;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info};

/// Receives one callback per pipeline event.
pub trait ActionLog {
    fn run_started(&mut self);
    fn scan_started(&mut self, folder: &Path);
    fn scan_completed(&mut self, file_count: usize);
    fn classified(&mut self, record: &FileRecord, result: &ClassificationResult);
    fn operation_recorded(&mut self, operation: &FileOperation);
    fn unexpected_error(&mut self, path: Option<&Path>, message: &str);
    fn run_completed(&mut self, moved: usize, errors: usize);
}

fn operation_message(operation: &FileOperation) -> String {
    match operation.error_message() {
        None => format!(
            "Moved: {} → {}",
            operation.source_name(),
            operation.destination_path.display()
        ),
        Some(message) => format!("Failed to move {}: {}", operation.source_name(), message),
    }
}

/// Forwards every event to the global `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl ActionLog for TracingLog {
    fn run_started(&mut self) {
        info!("Starting cleanup operation");
    }

    fn scan_started(&mut self, folder: &Path) {
        info!(folder = %folder.display(), "Scanning folder");
    }

    fn scan_completed(&mut self, file_count: usize) {
        info!(file_count, "Found {file_count} files to process");
    }

    fn classified(&mut self, record: &FileRecord, result: &ClassificationResult) {
        debug!(
            file = %record.name,
            category = %result.category,
            confidence = result.confidence,
            method = %result.method,
            explanation = %result.explanation,
            "classified"
        );
    }

    fn operation_recorded(&mut self, operation: &FileOperation) {
        let message = operation_message(operation);
        match &operation.error {
            None => info!(category = %operation.category, "{message}"),
            Some(err) => error!(
                category = %operation.category,
                kind = err.kind.as_str(),
                "{message}"
            ),
        }
    }

    fn unexpected_error(&mut self, path: Option<&Path>, message: &str) {
        match path {
            Some(path) => error!(path = %path.display(), "{message}"),
            None => error!("{message}"),
        }
    }

    fn run_completed(&mut self, moved: usize, errors: usize) {
        info!(moved, errors, "Cleanup complete: {moved} files moved, {errors} errors");
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: Level,
    pub message: String,
    pub path: Option<PathBuf>,
    pub category: Option<String>,
}

/// Keeps every event in order.
#[derive(Debug, Default, Clone)]
pub struct MemoryLog {
    entries: Vec<LogEntry>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries at `level`, in order.
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level == level)
    }

    fn push(
        &mut self,
        level: Level,
        message: String,
        path: Option<PathBuf>,
        category: Option<String>,
    ) {
        self.entries.push(LogEntry {
            timestamp: Local::now(),
            level,
            message,
            path,
            category,
        });
    }
}

impl ActionLog for MemoryLog {
    fn run_started(&mut self) {
        self.push(Level::INFO, "Starting cleanup operation".into(), None, None);
    }

    fn scan_started(&mut self, folder: &Path) {
        self.push(
            Level::INFO,
            format!("Scanning folder: {}", folder.display()),
            Some(folder.to_path_buf()),
            None,
        );
    }

    fn scan_completed(&mut self, file_count: usize) {
        self.push(
            Level::INFO,
            format!("Found {file_count} files to process"),
            None,
            None,
        );
    }

    fn classified(&mut self, record: &FileRecord, result: &ClassificationResult) {
        self.push(
            Level::DEBUG,
            format!(
                "{} classified as {} (confidence: {:.2}, method: {}): {}",
                record.name, result.category, result.confidence, result.method, result.explanation
            ),
            Some(record.path.clone()),
            Some(result.category.clone()),
        );
    }

    fn operation_recorded(&mut self, operation: &FileOperation) {
        let level = if operation.success() {
            Level::INFO
        } else {
            Level::ERROR
        };
        self.push(
            level,
            operation_message(operation),
            Some(operation.source_path.clone()),
            Some(operation.category.clone()),
        );
    }

    fn unexpected_error(&mut self, path: Option<&Path>, message: &str) {
        self.push(
            Level::ERROR,
            message.to_string(),
            path.map(Path::to_path_buf),
            None,
        );
    }

    fn run_completed(&mut self, moved: usize, errors: usize) {
        self.push(
            Level::INFO,
            format!("Cleanup complete: {moved} files moved, {errors} errors"),
            None,
            None,
        );
    }
}
