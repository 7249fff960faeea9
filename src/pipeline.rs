//! The per-run driver: scan, then classify and organize each file in turn.

use crate::action_log::ActionLog;
use crate::classifier::{ClassificationEngine, ClassificationResult};
use crate::config::{Config, ConfigError};
use crate::file_organizer::{FileOperation, FileOrganizer};
use crate::reporter::Reporter;
use crate::scanner::{FileRecord, FileScanner, ScanError};
use chrono::Local;
use std::path::{Path, PathBuf};

/// Passed to the per-file callback after each operation.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    pub operation: &'a FileOperation,
    /// 1-based index of this file.
    pub position: usize,
    pub total: usize,
}

/// A move that would happen, computed without touching the filesystem.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    pub record: FileRecord,
    pub classification: ClassificationResult,
    pub destination: PathBuf,
}

pub struct Pipeline {
    root: PathBuf,
    scanner: FileScanner,
    engine: ClassificationEngine,
    organizer: FileOrganizer,
}

impl Pipeline {
    /// Builds every stage from a validated configuration.
    ///
    /// # Errors
    ///
    /// Fails only if the scanner filters do not compile.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            root: config.root_folder(),
            scanner: FileScanner::new(config.compile_filters()?),
            engine: ClassificationEngine::new(config),
            organizer: FileOrganizer::new(config),
        })
    }

    /// The folder being organized.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_root(&self) -> &Path {
        self.organizer.output_root()
    }

    pub fn scan(&self, log: &mut dyn ActionLog) -> Result<Vec<FileRecord>, ScanError> {
        log.scan_started(&self.root);
        let records = self.scanner.scan(&self.root)?;
        log.scan_completed(records.len());
        Ok(records)
    }

    /// Classifies and organizes one file. Always yields an operation.
    pub fn process_file(&self, record: &FileRecord, log: &mut dyn ActionLog) -> FileOperation {
        let classification = self.engine.classify(record);
        log.classified(record, &classification);

        let operation = self.organizer.organize(record, &classification);
        log.operation_recorded(&operation);
        operation
    }

    /// Processes `records` in order, appending one operation per record to
    /// `reporter`. A failing file never stops the ones after it.
    pub fn process_all<F>(
        &self,
        records: &[FileRecord],
        log: &mut dyn ActionLog,
        reporter: &mut Reporter,
        mut on_file: F,
    ) where
        F: FnMut(Progress<'_>),
    {
        let total = records.len();
        for (index, record) in records.iter().enumerate() {
            let operation = self.process_file(record, log);
            on_file(Progress {
                operation: &operation,
                position: index + 1,
                total,
            });
            reporter.add_operation(operation);
        }
    }

    /// Full run: scan, process, time-stamp. The returned reporter holds every
    /// operation.
    ///
    /// # Errors
    ///
    /// Fails only if the root folder cannot be scanned; no file is touched then.
    pub fn run<F>(&self, log: &mut dyn ActionLog, on_file: F) -> Result<Reporter, ScanError>
    where
        F: FnMut(Progress<'_>),
    {
        let mut reporter = Reporter::new(&self.root);
        reporter.set_start_time(Local::now());
        log.run_started();

        let records = match self.scan(log) {
            Ok(records) => records,
            Err(e) => {
                log.unexpected_error(Some(&self.root), &e.to_string());
                return Err(e);
            }
        };

        self.process_all(&records, log, &mut reporter, on_file);
        reporter.set_end_time(Local::now());

        let stats = reporter.statistics();
        log.run_completed(stats.total_moved, stats.total_skipped);
        Ok(reporter)
    }

    /// Classifies every record and computes its destination without moving anything.
    pub fn plan(&self, records: &[FileRecord]) -> Vec<PlannedMove> {
        records
            .iter()
            .map(|record| {
                let classification = self.engine.classify(record);
                let destination = self.organizer.preview(record, &classification);
                PlannedMove {
                    record: record.clone(),
                    classification,
                    destination,
                }
            })
            .collect()
    }
}
