//! Configuration loading, validation and compiled scanner filters.
//!
//! Configuration is stored in TOML. Every field is optional; anything left out
//! falls back to the built-in defaults.
//!
//! ```toml
//! organized_folder = "organized"
//!
//! [categories]
//! Documents = ["pdf", "docx"]
//! Images = ["png", "jpg"]
//!
//! [filters]
//! system_file_patterns = [".tmp", ".part"]
//! exclude_patterns = ["*.iso"]
//!
//! [heuristics]
//! enabled = true
//! ambiguity_threshold = 0.7
//!
//! [duplicates]
//! strategy = "rename"
//! suffix_pattern = "_{n}"
//! ```

use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Placeholder replaced by the collision counter in `suffix_pattern`.
pub const SUFFIX_PLACEHOLDER: &str = "{n}";

/// File name looked up in the working directory when no config path is given.
pub const LOCAL_CONFIG_FILE: &str = ".sortboxrc.toml";

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
    /// One or more semantic checks failed.
    #[error("Configuration validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),
}

/// How to treat a file whose destination name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    /// Append the suffix pattern with an increasing counter.
    #[default]
    Rename,
    /// Leave the file where it is and record a failed operation.
    Skip,
    /// Replace the existing destination.
    Overwrite,
}

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder to organize. `None` means the platform downloads folder.
    pub downloads_folder: Option<PathBuf>,
    /// Name of the output folder created inside the downloads folder.
    pub organized_folder: String,
    /// Folder receiving per-run log files.
    pub logs_folder: String,
    /// Category name to the extensions it claims.
    pub categories: BTreeMap<String, Vec<String>>,
    pub filters: FilterRules,
    pub heuristics: HeuristicSettings,
    pub duplicates: DuplicateSettings,
}

/// Rules deciding which files the scanner hands to the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    /// Names equal to or ending with one of these are system files.
    pub system_file_patterns: Vec<String>,
    /// Whether to include hidden files (starting with "."). Defaults to false.
    pub enable_hidden_files: bool,
    /// Glob patterns matched against the file name.
    pub exclude_patterns: Vec<String>,
    /// Regex patterns matched against the file name.
    pub exclude_regex: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicSettings {
    pub enabled: bool,
    /// Rule confidence strictly below this consults the heuristic classifier.
    pub ambiguity_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateSettings {
    pub strategy: DuplicateStrategy,
    pub suffix_pattern: String,
}

impl Default for Config {
    fn default() -> Self {
        let categories = [
            ("Documents", &["pdf", "doc", "docx", "txt", "rtf", "odt"][..]),
            ("Images", &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"]),
            ("Videos", &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm"]),
            ("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2"]),
            ("Code", &["py", "js", "html", "css", "java", "cpp", "c", "h"]),
            ("Installers", &["exe", "msi", "dmg", "pkg", "deb", "rpm"]),
            ("Work", &[]),
            ("Study", &[]),
            ("Miscellaneous", &[]),
        ]
        .into_iter()
        .map(|(name, exts)| {
            (
                name.to_string(),
                exts.iter().map(|e| e.to_string()).collect(),
            )
        })
        .collect();

        Self {
            downloads_folder: None,
            organized_folder: "organized".to_string(),
            logs_folder: "logs".to_string(),
            categories,
            filters: FilterRules::default(),
            heuristics: HeuristicSettings::default(),
            duplicates: DuplicateSettings::default(),
        }
    }
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            system_file_patterns: [".tmp", ".part", ".DS_Store", ".crdownload"]
                .iter()
                .map(|p| p.to_string())
                .collect(),
            enable_hidden_files: false,
            exclude_patterns: Vec::new(),
            exclude_regex: Vec::new(),
        }
    }
}

impl Default for HeuristicSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ambiguity_threshold: 0.7,
        }
    }
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            strategy: DuplicateStrategy::Rename,
            suffix_pattern: "_{n}".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.sortboxrc.toml` in the current directory
    /// 3. Look for `~/.config/sortbox/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// The result is validated before it is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// if any discovered file is malformed, or if validation fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match Self::discover(config_path) {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn discover(config_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = config_path {
            return Some(path.to_path_buf());
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let home_config = home_dir()?
            .join(".config")
            .join("sortbox")
            .join("config.toml");
        home_config.exists().then_some(home_config)
    }

    /// Load configuration from a specific file without validating it.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Collects every semantic problem, then fails once with all of them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.categories.is_empty() {
            errors.push("configuration must include at least one category".to_string());
        }

        let mut owners: HashMap<String, &str> = HashMap::new();
        for (category, extensions) in &self.categories {
            if !is_valid_category_name(category) {
                errors.push(format!("category name '{}' is not a valid folder name", category));
            }
            for ext in extensions {
                let ext = normalize_extension(ext);
                if let Some(previous) = owners.insert(ext.clone(), category)
                    && previous != category.as_str()
                {
                    errors.push(format!(
                        "extension '{}' is claimed by both {} and {}",
                        ext, previous, category
                    ));
                }
            }
        }

        let threshold = self.heuristics.ambiguity_threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            errors.push("ambiguity threshold must be between 0.0 and 1.0".to_string());
        }

        if self.organized_folder.trim().is_empty() {
            errors.push("organized folder name cannot be empty".to_string());
        } else if !is_contained_relative_path(&self.organized_folder) {
            errors.push(format!(
                "organized folder '{}' must be a relative path inside the folder being organized",
                self.organized_folder
            ));
        }
        if self.logs_folder.trim().is_empty() {
            errors.push("logs folder name cannot be empty".to_string());
        }

        let placeholders = self.duplicates.suffix_pattern.matches(SUFFIX_PLACEHOLDER).count();
        if placeholders != 1 {
            errors.push(format!(
                "duplicate suffix pattern must contain exactly one '{}' placeholder",
                SUFFIX_PLACEHOLDER
            ));
        }
        if self.duplicates.suffix_pattern.contains(['/', '\\']) {
            errors.push("duplicate suffix pattern cannot contain path separators".to_string());
        }

        if let Err(e) = CompiledFilters::new(&self.filters) {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// The folder being organized, falling back to the platform downloads folder.
    pub fn root_folder(&self) -> PathBuf {
        self.downloads_folder
            .clone()
            .unwrap_or_else(default_downloads_folder)
    }

    /// `root_folder()/organized_folder`.
    pub fn output_root(&self) -> PathBuf {
        self.root_folder().join(&self.organized_folder)
    }

    /// Compile the scanner filters.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

fn is_valid_category_name(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}

/// True for a relative path with no `..` component.
fn is_contained_relative_path(path: &str) -> bool {
    let path = Path::new(path);
    !path.is_absolute()
        && !path.has_root()
        && !path.components().any(|c| c == Component::ParentDir)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}

/// `~/Downloads`, or `~/downloads` on Linux when only the lowercase one exists.
pub fn default_downloads_folder() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    let downloads = home.join("Downloads");
    if cfg!(target_os = "linux") && !downloads.exists() {
        let lower = home.join("downloads");
        if lower.exists() {
            return lower;
        }
    }
    downloads
}

/// Compiled, optimized filter structures for efficient file matching.
///
/// Glob and regex patterns are parsed once here rather than on each file.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    system_file_patterns: Vec<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude_regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            system_file_patterns: rules.system_file_patterns.clone(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if a file is a system file that must not be organized.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Hidden file filter - if hidden and disabled, exclude
    /// 2. System file patterns - exact name or suffix match
    /// 3. Glob pattern match on the file name
    /// 4. Regex pattern match on the file name
    pub fn is_system_file(&self, file_name: &str, hidden: bool) -> bool {
        if hidden && !self.enable_hidden_files {
            return true;
        }

        if self
            .system_file_patterns
            .iter()
            .any(|pattern| file_name == pattern || file_name.ends_with(pattern.as_str()))
        {
            return true;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(file_name))
        {
            return true;
        }

        self.exclude_regexes
            .iter()
            .any(|regex| regex.is_match(file_name))
    }
}
