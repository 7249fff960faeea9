//! Filename keyword heuristics for telling study material from work material.
//!
//! Matching is plain substring search over the lower-cased file name, so a
//! name like `classroom.xyz` matches `class`.

use crate::classifier::{ClassificationResult, Method};
use crate::rule_classifier::FALLBACK_CATEGORY;
use crate::scanner::FileRecord;

pub const STUDY_CATEGORY: &str = "Study";
pub const WORK_CATEGORY: &str = "Work";

pub const KEYWORD_CONFIDENCE: f64 = 0.85;
pub const NO_MATCH_CONFIDENCE: f64 = 0.4;

/// Academic vocabulary, checked before [`WORK_KEYWORDS`].
pub const STUDY_KEYWORDS: &[&str] = &[
    "assignment",
    "homework",
    "lecture",
    "notes",
    "study",
    "exam",
    "quiz",
    "course",
    "class",
    "tutorial",
    "lab",
    "project",
    "thesis",
    "dissertation",
    "research",
];

pub const WORK_KEYWORDS: &[&str] = &[
    "invoice",
    "contract",
    "meeting",
    "report",
    "proposal",
    "presentation",
    "budget",
    "financial",
    "business",
    "client",
    "memo",
    "agenda",
    "minutes",
    "quarterly",
    "annual",
];

/// Guesses a purpose category from the file name.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn classify(&self, record: &FileRecord) -> ClassificationResult {
        let name = record.name.to_lowercase();

        if let Some(keyword) = STUDY_KEYWORDS.iter().find(|k| name.contains(*k)) {
            return ClassificationResult::new(
                STUDY_CATEGORY,
                KEYWORD_CONFIDENCE,
                Method::Heuristic,
                format!("Filename contains '{}' indicating academic work", keyword),
            );
        }

        if let Some(keyword) = WORK_KEYWORDS.iter().find(|k| name.contains(*k)) {
            return ClassificationResult::new(
                WORK_CATEGORY,
                KEYWORD_CONFIDENCE,
                Method::Heuristic,
                format!("Filename contains '{}' indicating work-related content", keyword),
            );
        }

        ClassificationResult::new(
            FALLBACK_CATEGORY,
            NO_MATCH_CONFIDENCE,
            Method::Heuristic,
            "No clear purpose indicators found in filename",
        )
    }

    /// True when the rule result is not confident enough to stand alone.
    pub fn is_ambiguous(rule_result: &ClassificationResult, threshold: f64) -> bool {
        rule_result.confidence < threshold
    }
}
