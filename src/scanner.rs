//! Folder scanning and per-file metadata extraction.
//!
//! The scanner is the only place that enumerates the folder being organized.
//! It hands the rest of the pipeline an ordered list of [`FileRecord`]s that
//! already excludes directories, hidden files and system files.

use crate::config::CompiledFilters;
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// MIME type reported for extensions the lookup table does not know.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

/// Identity and attributes of one file to be organized.
#[derive(Debug, Clone, PartialEq)]
pub struct FileRecord {
    /// Absolute (or caller-supplied) path to the file.
    pub path: PathBuf,
    /// Base name including the extension.
    pub name: String,
    /// Lower-cased extension without the dot; empty when there is none.
    pub extension: String,
    pub mime_type: String,
    pub size: u64,
    pub modified: DateTime<Local>,
    /// Hidden or system file according to the platform.
    pub is_hidden: bool,
}

impl FileRecord {
    /// Derives name, extension, MIME type and hidden flag from the path alone.
    ///
    /// No file content is read. Dot-files such as `.bashrc` have no extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Local;
    /// use sortbox::scanner::FileRecord;
    ///
    /// let record = FileRecord::describe("/tmp/Report.PDF", 10, Local::now());
    /// assert_eq!(record.name, "Report.PDF");
    /// assert_eq!(record.extension, "pdf");
    /// assert_eq!(record.mime_type, "application/pdf");
    /// ```
    pub fn describe(path: impl Into<PathBuf>, size: u64, modified: DateTime<Local>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = Path::new(&name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let mime_type = mime_for_extension(&extension).to_string();
        let is_hidden = name.starts_with('.');

        Self {
            path,
            name,
            extension,
            mime_type,
            size,
            modified,
            is_hidden,
        }
    }
}

/// Errors that stop a scan before any file is processed.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Folder not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("Cannot read folder {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Enumerates the top level of a folder into [`FileRecord`]s.
pub struct FileScanner {
    filters: CompiledFilters,
}

impl FileScanner {
    pub fn new(filters: CompiledFilters) -> Self {
        Self { filters }
    }

    /// Whether the file at `path` should be left alone.
    pub fn is_system_file(&self, path: &Path) -> bool {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.filters.is_system_file(&name, is_hidden(path))
    }

    /// Reads size and modification time from disk and builds the record.
    pub fn extract_metadata(&self, path: &Path) -> std::io::Result<FileRecord> {
        let metadata = fs::metadata(path)?;
        let modified: DateTime<Local> = metadata.modified()?.into();
        let mut record = FileRecord::describe(path, metadata.len(), modified);
        record.is_hidden = is_hidden(path);
        Ok(record)
    }

    /// Lists every processable file directly inside `folder`, sorted by name.
    ///
    /// Directories, links to directories and system files are skipped. Entries
    /// whose type or metadata cannot be read are skipped with a warning
    /// rather than failing the scan.
    ///
    /// # Errors
    ///
    /// Fails if `folder` does not exist, is not a directory, or cannot be listed.
    pub fn scan(&self, folder: &Path) -> Result<Vec<FileRecord>, ScanError> {
        if !folder.exists() {
            return Err(ScanError::NotFound(folder.to_path_buf()));
        }
        if !folder.is_dir() {
            return Err(ScanError::NotADirectory(folder.to_path_buf()));
        }

        let entries = fs::read_dir(folder).map_err(|e| ScanError::Unreadable {
            path: folder.to_path_buf(),
            source: e,
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(folder = %folder.display(), error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping entry with unknown file type");
                    continue;
                }
            };
            // Links to directories count as directories.
            if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
                continue;
            }
            if self.is_system_file(&path) {
                debug!(path = %path.display(), "skipping system file");
                continue;
            }

            match self.extract_metadata(&path) {
                Ok(record) => records.push(record),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable file"),
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }
}

#[cfg(windows)]
fn is_hidden(path: &Path) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;

    let dot_file = path
        .file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'));
    dot_file
        || fs::metadata(path)
            .map(|m| m.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
            .unwrap_or(false)
}

#[cfg(not(windows))]
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

/// Maps a lower-case extension to its MIME type.
///
/// # Examples
///
/// ```
/// use sortbox::scanner::mime_for_extension;
///
/// assert_eq!(mime_for_extension("png"), "image/png");
/// assert_eq!(mime_for_extension("xyz"), "application/octet-stream");
/// ```
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        // Images
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "ico" => "image/vnd.microsoft.icon",
        "heic" => "image/heic",

        // Audio
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",

        // Video
        "mp4" => "video/mp4",
        "mpeg" | "mpg" => "video/mpeg",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "webm" => "video/webm",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "3gp" => "video/3gpp",

        // Documents
        "pdf" => "application/pdf",
        "txt" | "text" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "csv" => "text/csv",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "odt" => "application/vnd.oasis.opendocument.text",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",

        // Archives
        "zip" => "application/zip",
        "rar" => "application/x-rar-compressed",
        "7z" => "application/x-7z-compressed",
        "tar" => "application/x-tar",
        "gz" | "tgz" => "application/gzip",
        "bz2" => "application/x-bzip2",

        // Code and data
        "py" => "text/x-python",
        "js" | "mjs" => "text/javascript",
        "c" | "h" => "text/x-c",
        "java" => "text/x-java",
        "sh" => "application/x-sh",
        "json" => "application/json",
        "xml" => "application/xml",

        _ => UNKNOWN_MIME,
    }
}
