//! Run accounting and the cleanup summary.
//!
//! The [`Reporter`] owns the ordered log of every [`FileOperation`] in a run.
//! Statistics and the summary are always recomputed from that log.

use crate::file_organizer::FileOperation;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Maximum number of sample operations shown per category.
pub const SAMPLES_PER_CATEGORY: usize = 2;

/// Aggregate numbers derived from the operation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_processed: usize,
    pub total_moved: usize,
    pub total_skipped: usize,
    /// Successful operations per category; categories without one are absent.
    pub category_breakdown: BTreeMap<String, usize>,
    pub duration_seconds: f64,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub category: String,
    pub moved: usize,
    /// Share of all moved files, 0 when nothing moved.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub source_name: String,
    /// Relative to the organized folder's parent when possible.
    pub destination: PathBuf,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleGroup {
    pub category: String,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    pub source_name: String,
    pub message: String,
}

/// Structured report payload, ready for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub date: DateTime<Local>,
    pub duration_seconds: f64,
    pub total_processed: usize,
    pub total_moved: usize,
    pub total_skipped: usize,
    pub breakdown: Vec<BreakdownRow>,
    pub samples: Vec<SampleGroup>,
    pub errors: Vec<ErrorEntry>,
}

impl Summary {
    /// Renders the summary as markdown, leaving out empty sections.
    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# Cleanup Summary".to_string(),
            String::new(),
            format!("**Date:** {}", self.date.format("%Y-%m-%d %H:%M:%S")),
            format!("**Duration:** {:.1} seconds", self.duration_seconds),
            format!("**Total Files Processed:** {}", self.total_processed),
            format!("**Total Files Moved:** {}", self.total_moved),
            format!("**Files Skipped:** {}", self.total_skipped),
            String::new(),
        ];

        if !self.breakdown.is_empty() {
            lines.push("## Category Breakdown".to_string());
            lines.push(String::new());
            lines.push("| Category | Files Moved | Percentage |".to_string());
            lines.push("|----------|-------------|------------|".to_string());
            for row in &self.breakdown {
                lines.push(format!(
                    "| {} | {} | {:.1}% |",
                    row.category, row.moved, row.percentage
                ));
            }
            lines.push(String::new());
        }

        if !self.samples.is_empty() {
            lines.push("## Sample Operations".to_string());
            lines.push(String::new());
            for group in &self.samples {
                lines.push(format!("### {}", group.category));
                for sample in &group.samples {
                    lines.push(format!(
                        "- `{}` → {} ({})",
                        sample.source_name,
                        sample.destination.display(),
                        sample.explanation
                    ));
                }
                lines.push(String::new());
            }
        }

        if !self.errors.is_empty() {
            lines.push("## Errors".to_string());
            lines.push(String::new());
            for error in &self.errors {
                lines.push(format!("- `{}`: {}", error.source_name, error.message));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

/// Accumulates operations for one run.
#[derive(Debug, Clone)]
pub struct Reporter {
    root: PathBuf,
    operations: Vec<FileOperation>,
    start_time: DateTime<Local>,
    end_time: DateTime<Local>,
}

impl Reporter {
    /// `root` is the folder sample destinations are shown relative to.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let now = Local::now();
        Self {
            root: root.into(),
            operations: Vec::new(),
            start_time: now,
            end_time: now,
        }
    }

    pub fn set_start_time(&mut self, start_time: DateTime<Local>) {
        self.start_time = start_time;
    }

    pub fn set_end_time(&mut self, end_time: DateTime<Local>) {
        self.end_time = end_time;
    }

    pub fn add_operation(&mut self, operation: FileOperation) {
        self.operations.push(operation);
    }

    pub fn operations(&self) -> &[FileOperation] {
        &self.operations
    }

    pub fn statistics(&self) -> Statistics {
        let total_moved = self.operations.iter().filter(|op| op.success()).count();

        let mut category_breakdown = BTreeMap::new();
        for op in self.operations.iter().filter(|op| op.success()) {
            *category_breakdown.entry(op.category.clone()).or_insert(0) += 1;
        }

        let duration_seconds =
            (self.end_time - self.start_time).num_milliseconds() as f64 / 1000.0;

        Statistics {
            total_processed: self.operations.len(),
            total_moved,
            total_skipped: self.operations.len() - total_moved,
            category_breakdown,
            duration_seconds,
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }

    pub fn summary(&self) -> Summary {
        let stats = self.statistics();

        let breakdown = stats
            .category_breakdown
            .iter()
            .map(|(category, &moved)| BreakdownRow {
                category: category.clone(),
                moved,
                percentage: if stats.total_moved > 0 {
                    moved as f64 / stats.total_moved as f64 * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        let mut grouped: BTreeMap<&str, Vec<Sample>> = BTreeMap::new();
        for op in self.operations.iter().filter(|op| op.success()) {
            let samples = grouped.entry(op.category.as_str()).or_default();
            if samples.len() < SAMPLES_PER_CATEGORY {
                samples.push(Sample {
                    source_name: op.source_name(),
                    destination: self.display_destination(&op.destination_path),
                    explanation: op.classification.explanation.clone(),
                });
            }
        }
        let samples = grouped
            .into_iter()
            .map(|(category, samples)| SampleGroup {
                category: category.to_string(),
                samples,
            })
            .collect();

        let errors = self
            .operations
            .iter()
            .filter(|op| !op.success())
            .map(|op| ErrorEntry {
                source_name: op.source_name(),
                message: op.error_message().unwrap_or_default().to_string(),
            })
            .collect();

        Summary {
            date: stats.start_time,
            duration_seconds: stats.duration_seconds,
            total_processed: stats.total_processed,
            total_moved: stats.total_moved,
            total_skipped: stats.total_skipped,
            breakdown,
            samples,
            errors,
        }
    }

    fn display_destination(&self, destination: &Path) -> PathBuf {
        destination
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| destination.to_path_buf())
    }

    /// Writes the markdown summary, creating parent directories.
    pub fn write_summary(&self, path: &Path) -> io::Result<()> {
        write_creating_parent(path, &self.summary().to_markdown())
    }

    /// Writes the summary payload as pretty JSON, creating parent directories.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.summary())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        write_creating_parent(path, &json)
    }
}

fn write_creating_parent(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
