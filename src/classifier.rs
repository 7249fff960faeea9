//! Hybrid classification: rule lookup first, filename heuristics for the
//! ambiguous remainder, merged by confidence.
//!
//! # Examples
//!
//! ```
//! use chrono::Local;
//! use sortbox::classifier::{ClassificationEngine, Method};
//! use sortbox::config::Config;
//! use sortbox::scanner::FileRecord;
//!
//! let engine = ClassificationEngine::new(&Config::default());
//! let result = engine.classify(&FileRecord::describe("/inbox/photo.jpg", 0, Local::now()));
//! assert_eq!(result.category, "Images");
//! assert_eq!(result.confidence, 1.0);
//! assert_eq!(result.method, Method::Rule);
//! ```

use crate::config::Config;
use crate::heuristic::HeuristicClassifier;
use crate::rule_classifier::RuleClassifier;
use crate::scanner::FileRecord;
use serde::Serialize;
use std::fmt;

/// Which stage produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Rule,
    Heuristic,
    Merged,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Rule => "rule",
            Method::Heuristic => "heuristic",
            Method::Merged => "merged",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category verdict for one file.
///
/// Confidence is always within `[0.0, 1.0]`; [`ClassificationResult::new`]
/// clamps anything outside that range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category: String,
    pub confidence: f64,
    pub method: Method,
    pub explanation: String,
}

impl ClassificationResult {
    pub fn new(
        category: impl Into<String>,
        confidence: f64,
        method: Method,
        explanation: impl Into<String>,
    ) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Self {
            category: category.into(),
            confidence,
            method,
            explanation: explanation.into(),
        }
    }
}

/// Combines a rule result with a heuristic result.
///
/// The side with strictly higher confidence wins; on a tie the rule result is
/// kept. The winner's category and confidence are copied verbatim and the
/// method becomes [`Method::Merged`].
pub fn merge(rule: &ClassificationResult, heuristic: &ClassificationResult) -> ClassificationResult {
    let (winner, source) = if heuristic.confidence > rule.confidence {
        (heuristic, "Heuristic")
    } else {
        (rule, "Rule-based")
    };

    ClassificationResult::new(
        winner.category.clone(),
        winner.confidence,
        Method::Merged,
        format!(
            "{} classification (confidence {:.2}): {}",
            source, winner.confidence, winner.explanation
        ),
    )
}

/// The engine's single entry point: rule stage, ambiguity gate, merge.
#[derive(Debug, Clone)]
pub struct ClassificationEngine {
    rules: RuleClassifier,
    heuristics: HeuristicClassifier,
    heuristics_enabled: bool,
    ambiguity_threshold: f64,
}

impl ClassificationEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            rules: RuleClassifier::new(&config.categories),
            heuristics: HeuristicClassifier,
            heuristics_enabled: config.heuristics.enabled,
            ambiguity_threshold: config.heuristics.ambiguity_threshold,
        }
    }

    pub fn ambiguity_threshold(&self) -> f64 {
        self.ambiguity_threshold
    }

    pub fn classify(&self, record: &FileRecord) -> ClassificationResult {
        let rule_result = self.rules.classify(record);

        if self.heuristics_enabled
            && HeuristicClassifier::is_ambiguous(&rule_result, self.ambiguity_threshold)
        {
            let heuristic_result = self.heuristics.classify(record);
            return merge(&rule_result, &heuristic_result);
        }

        rule_result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn record(name: &str) -> FileRecord {
        FileRecord::describe(format!("/inbox/{name}"), 0, Local::now())
    }

    fn engine(enabled: bool, threshold: f64) -> ClassificationEngine {
        let mut config = Config::default();
        config.heuristics.enabled = enabled;
        config.heuristics.ambiguity_threshold = threshold;
        ClassificationEngine::new(&config)
    }

    #[test]
    fn test_new_clamps_confidence() {
        assert_eq!(ClassificationResult::new("A", 1.7, Method::Rule, "x").confidence, 1.0);
        assert_eq!(ClassificationResult::new("A", -0.2, Method::Rule, "x").confidence, 0.0);
        assert_eq!(ClassificationResult::new("A", f64::NAN, Method::Rule, "x").confidence, 0.0);
    }

    #[test]
    fn test_method_display() {
        assert_eq!(Method::Rule.to_string(), "rule");
        assert_eq!(Method::Heuristic.to_string(), "heuristic");
        assert_eq!(Method::Merged.to_string(), "merged");
    }

    #[test]
    fn test_merge_tie_keeps_rule_result() {
        let rule = ClassificationResult::new("Documents", 0.85, Method::Rule, "rule says so");
        let heuristic = ClassificationResult::new("Work", 0.85, Method::Heuristic, "kw");

        let merged = merge(&rule, &heuristic);
        assert_eq!(merged.category, "Documents");
        assert_eq!(merged.confidence, 0.85);
        assert_eq!(merged.method, Method::Merged);
        assert_eq!(
            merged.explanation,
            "Rule-based classification (confidence 0.85): rule says so"
        );
    }

    #[test]
    fn test_merge_higher_heuristic_wins() {
        let rule = ClassificationResult::new("Miscellaneous", 0.3, Method::Rule, "Unknown file type");
        let heuristic = ClassificationResult::new("Study", 0.85, Method::Heuristic, "homework");

        let merged = merge(&rule, &heuristic);
        assert_eq!(merged.category, "Study");
        assert_eq!(merged.confidence, 0.85);
        assert_eq!(merged.method, Method::Merged);
        assert!(merged.explanation.starts_with("Heuristic classification (confidence 0.85)"));
    }

    #[test]
    fn test_merge_higher_rule_wins() {
        let rule = ClassificationResult::new("Images", 0.8, Method::Rule, "mime");
        let heuristic = ClassificationResult::new("Miscellaneous", 0.4, Method::Heuristic, "none");

        let merged = merge(&rule, &heuristic);
        assert_eq!(merged.category, "Images");
        assert_eq!(merged.confidence, 0.8);
    }

    #[test]
    fn test_known_extension_skips_heuristics() {
        let result = engine(true, 0.7).classify(&record("homework.pdf"));
        assert_eq!(result.category, "Documents");
        assert_eq!(result.confidence, 1.0);
        assert_eq!(result.method, Method::Rule);
    }

    #[test]
    fn test_ambiguous_file_is_merged() {
        let result = engine(true, 0.7).classify(&record("homework_week3.xyz"));
        assert_eq!(result.category, "Study");
        assert_eq!(result.confidence, 0.85);
        assert_eq!(result.method, Method::Merged);
    }

    #[test]
    fn test_heuristics_disabled_returns_rule_result() {
        let result = engine(false, 0.7).classify(&record("homework_week3.xyz"));
        assert_eq!(result.category, "Miscellaneous");
        assert_eq!(result.confidence, 0.3);
        assert_eq!(result.method, Method::Rule);
    }

    #[test]
    fn test_confidence_exactly_at_threshold_is_not_ambiguous() {
        // MIME rule hit gives 0.8; a threshold of 0.8 is not strictly above it.
        let result = engine(true, 0.8).classify(&record("meeting_notes.md"));
        assert_eq!(result.category, "Documents");
        assert_eq!(result.confidence, 0.8);
        assert_eq!(result.method, Method::Rule);
    }

    #[test]
    fn test_confidence_just_below_threshold_is_merged() {
        let result = engine(true, 0.81).classify(&record("meeting_notes.md"));
        assert_eq!(result.method, Method::Merged);
        assert_eq!(result.category, "Study");
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_unknown_without_keywords_stays_low_confidence() {
        let result = engine(true, 0.7).classify(&record("unknown.xyz"));
        assert_eq!(result.category, "Miscellaneous");
        assert_eq!(result.method, Method::Merged);
        assert!(result.confidence <= 0.4);
    }

    #[test]
    fn test_threshold_zero_never_consults_heuristics() {
        let result = engine(true, 0.0).classify(&record("invoice.xyz"));
        assert_eq!(result.method, Method::Rule);
        assert_eq!(result.category, "Miscellaneous");
    }
}
