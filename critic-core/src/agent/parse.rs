//! Extraction of structured findings from free-form model output
//!
//! Models wrap their JSON in prose, markdown fences, or both. Extraction
//! takes the span between the first `{` and the last `}`; if that span
//! fails to parse, a fenced ```json block is tried before giving up.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::review::{Category, ReviewComment, Severity};

use super::AgentKind;

/// Wire shape of one item in the model's `comments` array
///
/// Every field is optional here; validation decides what survives.
#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    line_number: Option<serde_json::Value>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    code_snippet: Option<String>,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    #[serde(default)]
    comments: Vec<RawComment>,
}

/// Parse one model response into validated comments
///
/// Returns an empty vec when no JSON object can be recovered; a chatty
/// response with no findings is treated the same as an explicit empty
/// comments array.
pub fn parse_response(raw: &str, agent: AgentKind, file_path: &str) -> Vec<ReviewComment> {
    let Some(envelope) = extract_envelope(raw) else {
        warn!(agent = agent.name(), file = file_path, "no JSON object found in response");
        return Vec::new();
    };

    let total = envelope.comments.len();
    let comments: Vec<ReviewComment> = envelope
        .comments
        .into_iter()
        .filter_map(|item| validate_comment(item, agent, file_path))
        .collect();

    if comments.len() < total {
        debug!(
            agent = agent.name(),
            file = file_path,
            dropped = total - comments.len(),
            "dropped malformed comments"
        );
    }
    comments
}

fn extract_envelope(raw: &str) -> Option<RawEnvelope> {
    if let Some(span) = brace_span(raw) {
        if let Ok(envelope) = serde_json::from_str(span) {
            return Some(envelope);
        }
    }
    if let Some(block) = fenced_json_block(raw) {
        if let Some(span) = brace_span(block) {
            if let Ok(envelope) = serde_json::from_str(span) {
                return Some(envelope);
            }
        }
    }
    None
}

/// The substring between the first `{` and the last `}`, inclusive
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// The body of the first ```json fenced block, if any
fn fenced_json_block(text: &str) -> Option<&str> {
    let open = text.find("```json")?;
    let body = &text[open + "```json".len()..];
    let close = body.find("```")?;
    Some(&body[..close])
}

/// Validate one raw item, or drop it
///
/// Title and description are required, severity must be one of the four
/// known names. A category the model invented falls back to `Unknown`;
/// a missing category inherits the agent's own.
fn validate_comment(raw: RawComment, agent: AgentKind, file_path: &str) -> Option<ReviewComment> {
    let title = raw.title.filter(|t| !t.trim().is_empty())?;
    let description = raw.description.filter(|d| !d.trim().is_empty())?;
    let severity: Severity = raw.severity.as_deref()?.parse().ok()?;

    let category = match raw.category.as_deref() {
        None => agent.category(),
        Some(s) => s.parse::<Category>().unwrap_or(Category::Unknown),
    };

    Some(ReviewComment {
        file_path: file_path.to_string(),
        line_number: raw.line_number.and_then(coerce_line_number),
        category,
        severity,
        title,
        description,
        code_snippet: raw.code_snippet.filter(|s| !s.trim().is_empty()),
        suggestion: raw.suggestion.filter(|s| !s.trim().is_empty()),
    })
}

/// Accept line numbers as integers or numeric strings; reject the rest
fn coerce_line_number(value: serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"Here is my review:
{"comments": [{"line_number": 3, "severity": "major", "title": "Off by one",
"description": "Loop misses the last element", "suggestion": "Use ..="}]}
Hope that helps!"#;

    #[test]
    fn test_parses_json_embedded_in_prose() {
        let comments = parse_response(VALID, AgentKind::Logic, "src/main.rs");
        assert_eq!(comments.len(), 1);
        let c = &comments[0];
        assert_eq!(c.file_path, "src/main.rs");
        assert_eq!(c.line_number, Some(3));
        assert_eq!(c.severity, Severity::Major);
        assert_eq!(c.category, Category::Logic);
        assert_eq!(c.title, "Off by one");
        assert_eq!(c.suggestion.as_deref(), Some("Use ..="));
        assert!(c.code_snippet.is_none());
    }

    #[test]
    fn test_fenced_block_fallback() {
        // The brace span over the whole text is invalid JSON because of
        // the stray brace in prose; the fenced block still parses.
        let raw = "A stray { brace.\n```json\n{\"comments\": [{\"severity\": \"minor\", \
                   \"title\": \"t\", \"description\": \"d\"}]}\n```";
        let comments = parse_response(raw, AgentKind::Security, "a.rs");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].severity, Severity::Minor);
    }

    #[test]
    fn test_no_json_yields_empty() {
        let comments = parse_response("I found no issues.", AgentKind::Logic, "a.rs");
        assert!(comments.is_empty());
    }

    #[test]
    fn test_empty_comments_array() {
        let comments = parse_response(r#"{"comments": []}"#, AgentKind::Logic, "a.rs");
        assert!(comments.is_empty());
    }

    #[test]
    fn test_unknown_severity_drops_item() {
        let raw = r#"{"comments": [
            {"severity": "catastrophic", "title": "t", "description": "d"},
            {"severity": "critical", "title": "real", "description": "d"}
        ]}"#;
        let comments = parse_response(raw, AgentKind::Security, "a.rs");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].title, "real");
    }

    #[test]
    fn test_missing_title_or_description_drops_item() {
        let raw = r#"{"comments": [
            {"severity": "minor", "description": "no title"},
            {"severity": "minor", "title": "no description"},
            {"severity": "minor", "title": " ", "description": "blank title"}
        ]}"#;
        let comments = parse_response(raw, AgentKind::Readability, "a.rs");
        assert!(comments.is_empty());
    }

    #[test]
    fn test_unrecognized_category_falls_back_to_unknown() {
        let raw = r#"{"comments": [{"severity": "minor", "category": "vibes",
            "title": "t", "description": "d"}]}"#;
        let comments = parse_response(raw, AgentKind::Performance, "a.rs");
        assert_eq!(comments[0].category, Category::Unknown);
    }

    #[test]
    fn test_missing_category_inherits_agent() {
        let raw = r#"{"comments": [{"severity": "minor", "title": "t", "description": "d"}]}"#;
        let comments = parse_response(raw, AgentKind::Performance, "a.rs");
        assert_eq!(comments[0].category, Category::Performance);
    }

    #[test]
    fn test_line_number_as_string() {
        let raw = r#"{"comments": [{"line_number": "17", "severity": "minor",
            "title": "t", "description": "d"}]}"#;
        let comments = parse_response(raw, AgentKind::Logic, "a.rs");
        assert_eq!(comments[0].line_number, Some(17));
    }

    #[test]
    fn test_non_numeric_line_number_dropped_but_comment_kept() {
        let raw = r#"{"comments": [{"line_number": "around the top", "severity": "minor",
            "title": "t", "description": "d"}]}"#;
        let comments = parse_response(raw, AgentKind::Logic, "a.rs");
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].line_number, None);
    }
}
