/// Rule-based classification by extension and MIME type.
///
/// This module maps a file's extension, or failing that its MIME type, to a
/// category. It never fails: anything unrecognised lands in
/// [`FALLBACK_CATEGORY`] with low confidence.
use crate::classifier::{ClassificationResult, Method};
use crate::scanner::FileRecord;
use std::collections::{BTreeMap, HashMap};

/// Category used when neither rules nor heuristics recognise a file.
pub const FALLBACK_CATEGORY: &str = "Miscellaneous";

pub const EXTENSION_CONFIDENCE: f64 = 1.0;
pub const MIME_CONFIDENCE: f64 = 0.8;
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

const DOCUMENT_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-rar-compressed",
    "application/x-7z-compressed",
    "application/x-tar",
    "application/gzip",
    "application/x-bzip2",
];

/// Maps extensions and MIME types to categories.
#[derive(Debug, Clone)]
pub struct RuleClassifier {
    extension_map: HashMap<String, String>,
}

impl RuleClassifier {
    /// Inverts a category → extensions table into extension → category.
    ///
    /// Extensions are lower-cased and stripped of a leading dot.
    pub fn new(categories: &BTreeMap<String, Vec<String>>) -> Self {
        let mut classifier = Self {
            extension_map: HashMap::new(),
        };
        for (category, extensions) in categories {
            for ext in extensions {
                classifier.add_extension_mapping(ext, category);
            }
        }
        classifier
    }

    /// Adds a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: &str) {
        self.extension_map
            .insert(ext.trim_start_matches('.').to_lowercase(), category.to_string());
    }

    /// Maps a file extension to a category.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortbox::config::Config;
    /// use sortbox::rule_classifier::RuleClassifier;
    ///
    /// let rules = RuleClassifier::new(&Config::default().categories);
    /// assert_eq!(rules.extension_to_category("PDF"), Some("Documents"));
    /// assert_eq!(rules.extension_to_category(""), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<&str> {
        if ext.is_empty() {
            return None;
        }
        self.extension_map
            .get(&ext.to_lowercase())
            .map(String::as_str)
    }

    /// Maps a MIME type to one of the fixed MIME-derived categories.
    ///
    /// # Examples
    ///
    /// ```
    /// use sortbox::rule_classifier::RuleClassifier;
    ///
    /// assert_eq!(RuleClassifier::mime_to_category("image/png"), Some("Images"));
    /// assert_eq!(RuleClassifier::mime_to_category("application/x-tar"), Some("Archives"));
    /// assert_eq!(RuleClassifier::mime_to_category("audio/mpeg"), None);
    /// ```
    pub fn mime_to_category(mime_type: &str) -> Option<&'static str> {
        let mime = mime_type.to_lowercase();

        if mime.starts_with("image/") {
            Some("Images")
        } else if mime.starts_with("video/") {
            Some("Videos")
        } else if mime.starts_with("text/") || DOCUMENT_MIME_TYPES.contains(&mime.as_str()) {
            Some("Documents")
        } else if ARCHIVE_MIME_TYPES.contains(&mime.as_str()) {
            Some("Archives")
        } else {
            None
        }
    }

    /// Extension table first, then MIME rules, then the fallback.
    pub fn classify(&self, record: &FileRecord) -> ClassificationResult {
        if let Some(category) = self.extension_to_category(&record.extension) {
            return ClassificationResult::new(
                category,
                EXTENSION_CONFIDENCE,
                Method::Rule,
                format!("File extension '.{}' maps to {}", record.extension, category),
            );
        }

        if let Some(category) = Self::mime_to_category(&record.mime_type) {
            return ClassificationResult::new(
                category,
                MIME_CONFIDENCE,
                Method::Rule,
                format!("MIME type '{}' indicates {}", record.mime_type, category),
            );
        }

        ClassificationResult::new(
            FALLBACK_CATEGORY,
            FALLBACK_CONFIDENCE,
            Method::Rule,
            "Unknown file type",
        )
    }
}
