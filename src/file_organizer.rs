/// File organization: moving classified files into category directories.
///
/// This module creates category subdirectories under the output root,
/// resolves name collisions, moves files while keeping their modification
/// time, and records every attempt as a [`FileOperation`]. Failures are data:
/// [`FileOrganizer::organize`] never returns an error.
use crate::classifier::ClassificationResult;
use crate::config::{Config, DuplicateStrategy, SUFFIX_PLACEHOLDER};
use crate::scanner::FileRecord;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;
use tracing::{debug, warn};

/// Coarse failure category, so callers can branch without matching on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeErrorKind {
    PermissionDenied,
    NotFound,
    Filesystem,
    Duplicate,
    Unexpected,
}

impl OrganizeErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::NotFound => "not_found",
            Self::Filesystem => "filesystem",
            Self::Duplicate => "duplicate",
            Self::Unexpected => "unexpected",
        }
    }

    fn from_io(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::PermissionDenied => Self::PermissionDenied,
            ErrorKind::NotFound => Self::NotFound,
            _ => Self::Filesystem,
        }
    }
}

/// Errors that can occur during file organization operations.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Failed to create a category directory.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The source file could not be inspected before moving.
    #[error("Cannot read source file {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to move a file to its category directory.
    #[error("Failed to move {} to {}: {source}", from.display(), to.display())]
    FileMoveFailure {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// Destination is taken and the duplicate strategy is `skip`.
    #[error("Destination already exists: {}", .0.display())]
    DuplicateSkipped(PathBuf),
    /// The record has no usable file name.
    #[error("File has no name component: {}", .0.display())]
    InvalidFileName(PathBuf),
}

impl OrganizeError {
    pub fn kind(&self) -> OrganizeErrorKind {
        match self {
            Self::DirectoryCreationFailed { source, .. }
            | Self::SourceUnavailable { source, .. }
            | Self::FileMoveFailure { source, .. } => OrganizeErrorKind::from_io(source.kind()),
            Self::DuplicateSkipped(_) => OrganizeErrorKind::Duplicate,
            Self::InvalidFileName(_) => OrganizeErrorKind::Unexpected,
        }
    }
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why an operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationError {
    pub kind: OrganizeErrorKind,
    pub message: String,
}

impl From<&OrganizeError> for OperationError {
    fn from(err: &OrganizeError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// The outcome of attempting to relocate one file.
///
/// A successful operation has no error; a failed one always has one and its
/// destination equals its source.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOperation {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub category: String,
    pub classification: ClassificationResult,
    pub timestamp: DateTime<Local>,
    pub error: Option<OperationError>,
}

impl FileOperation {
    pub fn succeeded(
        source_path: PathBuf,
        destination_path: PathBuf,
        classification: ClassificationResult,
    ) -> Self {
        Self {
            source_path,
            destination_path,
            category: classification.category.clone(),
            classification,
            timestamp: Local::now(),
            error: None,
        }
    }

    pub fn failed(
        source_path: PathBuf,
        classification: ClassificationResult,
        error: OperationError,
    ) -> Self {
        Self {
            destination_path: source_path.clone(),
            source_path,
            category: classification.category.clone(),
            classification,
            timestamp: Local::now(),
            error: Some(error),
        }
    }

    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Base name of the source file.
    pub fn source_name(&self) -> String {
        self.source_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.source_path.display().to_string())
    }
}

/// Moves files into `<output root>/<category>/`.
#[derive(Debug, Clone)]
pub struct FileOrganizer {
    output_root: PathBuf,
    strategy: DuplicateStrategy,
    suffix_pattern: String,
}

impl FileOrganizer {
    pub fn new(config: &Config) -> Self {
        Self::with_root(
            config.output_root(),
            config.duplicates.strategy,
            &config.duplicates.suffix_pattern,
        )
    }

    pub fn with_root(
        output_root: impl Into<PathBuf>,
        strategy: DuplicateStrategy,
        suffix_pattern: &str,
    ) -> Self {
        Self {
            output_root: output_root.into(),
            strategy,
            suffix_pattern: suffix_pattern.to_string(),
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Creates the category directory if needed and returns its path.
    ///
    /// Calling this repeatedly for the same category is harmless.
    pub fn create_category_folder(&self, category: &str) -> OrganizeResult<PathBuf> {
        let category_path = self.output_root.join(category);
        fs::create_dir_all(&category_path).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: category_path.clone(),
            source: e,
        })?;
        Ok(category_path)
    }

    /// Returns `destination` if it is free, otherwise the first free
    /// `<stem><suffix><.ext>` with the counter starting at 1.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sortbox::config::DuplicateStrategy;
    /// use sortbox::file_organizer::FileOrganizer;
    /// use std::path::Path;
    ///
    /// let organizer = FileOrganizer::with_root("/inbox/organized", DuplicateStrategy::Rename, "_{n}");
    /// // With report.pdf already present this yields report_1.pdf.
    /// let free = organizer.resolve_duplicate(Path::new("/inbox/organized/Work/report.pdf"));
    /// ```
    pub fn resolve_duplicate(&self, destination: &Path) -> PathBuf {
        if !destination.exists() {
            return destination.to_path_buf();
        }

        let stem = destination
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = destination
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let parent = destination.parent().unwrap_or_else(|| Path::new(""));

        // Check-then-use: not safe against concurrent writers in the same directory.
        (1u64..)
            .map(|n| {
                let suffix = self.suffix_pattern.replace(SUFFIX_PLACEHOLDER, &n.to_string());
                parent.join(format!("{stem}{suffix}{extension}"))
            })
            .find(|candidate| !candidate.exists())
            .unwrap_or_else(|| destination.to_path_buf())
    }

    /// Where `record` would end up, without touching the filesystem.
    pub fn preview(&self, record: &FileRecord, classification: &ClassificationResult) -> PathBuf {
        let destination = self
            .output_root
            .join(&classification.category)
            .join(&record.name);
        match self.strategy {
            DuplicateStrategy::Rename => self.resolve_duplicate(&destination),
            DuplicateStrategy::Skip | DuplicateStrategy::Overwrite => destination,
        }
    }

    /// Moves the file and records the outcome. Never fails outward.
    pub fn organize(&self, record: &FileRecord, classification: &ClassificationResult) -> FileOperation {
        match self.try_organize(record, classification) {
            Ok(destination) => {
                FileOperation::succeeded(record.path.clone(), destination, classification.clone())
            }
            Err(err) => {
                debug!(path = %record.path.display(), error = %err, "organize failed");
                FileOperation::failed(record.path.clone(), classification.clone(), (&err).into())
            }
        }
    }

    fn try_organize(
        &self,
        record: &FileRecord,
        classification: &ClassificationResult,
    ) -> OrganizeResult<PathBuf> {
        let file_name = record
            .path
            .file_name()
            .ok_or_else(|| OrganizeError::InvalidFileName(record.path.clone()))?;

        let category_path = self.create_category_folder(&classification.category)?;
        let naive = category_path.join(file_name);

        let destination = match self.strategy {
            DuplicateStrategy::Rename => self.resolve_duplicate(&naive),
            DuplicateStrategy::Skip if naive.exists() => {
                return Err(OrganizeError::DuplicateSkipped(naive));
            }
            DuplicateStrategy::Skip | DuplicateStrategy::Overwrite => naive,
        };

        Self::move_file_safely(&record.path, &destination)?;
        Ok(destination)
    }

    /// Moves `source` to `destination` and reapplies the source's modification time.
    ///
    /// Falls back to copy-and-delete when the two paths are on different devices.
    pub fn move_file_safely(source: &Path, destination: &Path) -> OrganizeResult<()> {
        let modified = fs::metadata(source)
            .and_then(|m| m.modified())
            .map_err(|e| OrganizeError::SourceUnavailable {
                path: source.to_path_buf(),
                source: e,
            })?;

        let renamed = fs::rename(source, destination);
        complete_move(source, destination, renamed).map_err(|e| OrganizeError::FileMoveFailure {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
            source: e,
        })?;

        reapply_modified_time(destination, modified);
        Ok(())
    }
}

/// Finishes a move given the outcome of `fs::rename`, falling back to
/// copy-and-delete when the paths are on different devices.
fn complete_move(source: &Path, destination: &Path, renamed: io::Result<()>) -> io::Result<()> {
    match renamed {
        Err(e) if e.kind() == ErrorKind::CrossesDevices => copy_then_remove(source, destination),
        other => other,
    }
}

/// On failure, a destination this call created is removed again so no
/// partial or orphaned copy is left behind.
fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    let existed = destination.exists();
    let result = fs::copy(source, destination).and_then(|_| fs::remove_file(source));
    if result.is_err() && !existed {
        let _ = fs::remove_file(destination);
    }
    result
}

/// Returns whether the timestamp was restored. A failure is only logged:
/// the file has already been relocated.
fn reapply_modified_time(path: &Path, modified: SystemTime) -> bool {
    match restore_modified_time(path, modified) {
        Ok(()) => true,
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "moved file but could not restore its modification time"
            );
            false
        }
    }
}

// futimens only needs ownership on unix, so a read-only handle works even
// for files without write permission. Windows needs write-attribute access.
#[cfg(unix)]
fn restore_modified_time(path: &Path, modified: SystemTime) -> io::Result<()> {
    fs::File::open(path)?.set_modified(modified)
}

#[cfg(not(unix))]
fn restore_modified_time(path: &Path, modified: SystemTime) -> io::Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .open(path)?
        .set_modified(modified)
}
