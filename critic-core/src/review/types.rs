//! Review data model: categories, severities, comments, and the final review
//!
//! These types are created once per request and never mutated afterwards;
//! the [`Review`] is the terminal artifact returned to the caller.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a review finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Logic,
    Readability,
    Performance,
    Security,
    BestPractices,
    Testing,
    /// Fallback for categories the model invented
    Unknown,
}

impl Category {
    /// All categories a finding may carry
    pub fn all() -> &'static [Category] {
        &[
            Category::Logic,
            Category::Readability,
            Category::Performance,
            Category::Security,
            Category::BestPractices,
            Category::Testing,
            Category::Unknown,
        ]
    }

    /// Get the wire name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Category::Logic => "logic",
            Category::Readability => "readability",
            Category::Performance => "performance",
            Category::Security => "security",
            Category::BestPractices => "best_practices",
            Category::Testing => "testing",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "logic" => Ok(Category::Logic),
            "readability" => Ok(Category::Readability),
            "performance" => Ok(Category::Performance),
            "security" => Ok(Category::Security),
            "best_practices" | "best-practices" => Ok(Category::BestPractices),
            "testing" => Ok(Category::Testing),
            "unknown" => Ok(Category::Unknown),
            _ => Err(format!("Unknown category: {}", s)),
        }
    }
}

/// Severity of a review finding
///
/// Variants are declared least-severe first so the derived `Ord` agrees
/// with the total order suggestion < minor < major < critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Suggestion,
    Minor,
    Major,
    Critical,
}

impl Severity {
    /// All severities, most severe first
    pub fn all() -> &'static [Severity] {
        &[
            Severity::Critical,
            Severity::Major,
            Severity::Minor,
            Severity::Suggestion,
        ]
    }

    /// Get the wire name for this severity
    pub fn name(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
            Severity::Suggestion => "suggestion",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(Severity::Critical),
            "major" => Ok(Severity::Major),
            "minor" => Ok(Severity::Minor),
            "suggestion" => Ok(Severity::Suggestion),
            _ => Err(format!("Unknown severity: {}", s)),
        }
    }
}

/// A single review finding produced by one agent for one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewComment {
    /// Path of the file the finding refers to
    pub file_path: String,
    /// Line number in the new file, if the finding is line-anchored
    pub line_number: Option<u32>,
    /// Category of the finding
    pub category: Category,
    /// Severity of the finding
    pub severity: Severity,
    /// Brief title
    pub title: String,
    /// Detailed description
    pub description: String,
    /// Relevant code snippet, if the model supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_snippet: Option<String>,
    /// Suggested fix, if the model supplied one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

/// The aggregated result of one review request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    /// Identifier of the reviewed subject ("owner/repo#N" or "diff")
    pub subject_id: String,
    /// Number of files the diff touched, including files skipped by the cap
    pub total_files_changed: usize,
    /// Number of comments after deduplication
    pub total_comments: usize,
    /// Comments sorted by severity descending, then file path, then line
    pub comments: Vec<ReviewComment>,
    /// Short count-by-severity summary
    pub summary: String,
    /// True when at least one (file, agent) pair failed
    pub partial: bool,
    /// Request metadata (PR title, author, files changed, ...)
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Stage a review request is in, used for tracing and error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStage {
    Received,
    Parsing,
    Dispatching,
    Aggregating,
    Completed,
    Failed,
}

impl fmt::Display for ReviewStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReviewStage::Received => "received",
            ReviewStage::Parsing => "parsing",
            ReviewStage::Dispatching => "dispatching",
            ReviewStage::Aggregating => "aggregating",
            ReviewStage::Completed => "completed",
            ReviewStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_total_order() {
        assert!(Severity::Critical > Severity::Major);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Minor > Severity::Suggestion);
    }

    #[test]
    fn test_severity_from_str() {
        assert_eq!("critical".parse::<Severity>().unwrap(), Severity::Critical);
        assert_eq!("MAJOR".parse::<Severity>().unwrap(), Severity::Major);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("logic".parse::<Category>().unwrap(), Category::Logic);
        assert_eq!(
            "best_practices".parse::<Category>().unwrap(),
            Category::BestPractices
        );
        assert!("style".parse::<Category>().is_err());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Category::BestPractices).unwrap();
        assert_eq!(json, "\"best_practices\"");
        let json = serde_json::to_string(&Severity::Suggestion).unwrap();
        assert_eq!(json, "\"suggestion\"");
    }

    #[test]
    fn test_comment_roundtrip() {
        let comment = ReviewComment {
            file_path: "src/lib.rs".to_string(),
            line_number: Some(42),
            category: Category::Security,
            severity: Severity::Critical,
            title: "Hardcoded credential".to_string(),
            description: "The token is embedded in source".to_string(),
            code_snippet: None,
            suggestion: Some("Load it from the environment".to_string()),
        };

        let json = serde_json::to_string(&comment).unwrap();
        assert!(!json.contains("code_snippet"));
        let parsed: ReviewComment = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, comment);
    }
}
