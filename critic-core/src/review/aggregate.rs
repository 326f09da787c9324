//! Merging agent findings into the final review
//!
//! Two findings are duplicates when they share a file and category and
//! their line anchors are within the configured tolerance. The higher
//! severity survives; on equal severity the first encountered wins.

use std::collections::BTreeMap;

use tracing::debug;

use crate::review::{ReviewComment, Severity};

/// Deduplicate and sort findings in place of the raw agent output
pub fn aggregate(mut comments: Vec<ReviewComment>, line_tolerance: u32) -> Vec<ReviewComment> {
    let before = comments.len();
    comments = dedup(comments, line_tolerance);
    if comments.len() < before {
        debug!(dropped = before - comments.len(), "deduplicated findings");
    }
    sort(&mut comments);
    comments
}

fn dedup(comments: Vec<ReviewComment>, tolerance: u32) -> Vec<ReviewComment> {
    let mut kept: Vec<ReviewComment> = Vec::with_capacity(comments.len());

    'next: for candidate in comments {
        for existing in kept.iter_mut() {
            if is_duplicate(existing, &candidate, tolerance) {
                if candidate.severity > existing.severity {
                    *existing = candidate;
                }
                continue 'next;
            }
        }
        kept.push(candidate);
    }

    kept
}

fn is_duplicate(a: &ReviewComment, b: &ReviewComment, tolerance: u32) -> bool {
    if a.file_path != b.file_path || a.category != b.category {
        return false;
    }
    match (a.line_number, b.line_number) {
        (Some(la), Some(lb)) => la.abs_diff(lb) <= tolerance,
        (None, None) => true,
        _ => false,
    }
}

/// Severity descending, then file path, then line number with unanchored last
fn sort(comments: &mut [ReviewComment]) {
    comments.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.file_path.cmp(&b.file_path))
            .then_with(|| match (a.line_number, b.line_number) {
                (Some(la), Some(lb)) => la.cmp(&lb),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            })
    });
}

/// One-sentence count-by-severity summary
pub fn summarize(comments: &[ReviewComment]) -> String {
    if comments.is_empty() {
        return "No issues found.".to_string();
    }

    let mut counts: BTreeMap<Severity, usize> = BTreeMap::new();
    for comment in comments {
        *counts.entry(comment.severity).or_default() += 1;
    }

    let parts: Vec<String> = counts
        .into_iter()
        .rev()
        .map(|(severity, count)| format!("{} {}", count, severity))
        .collect();

    format!("Found {} issues: {}.", comments.len(), parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::review::{Category, Severity};

    fn comment(
        path: &str,
        line: Option<u32>,
        category: Category,
        severity: Severity,
        title: &str,
    ) -> ReviewComment {
        ReviewComment {
            file_path: path.to_string(),
            line_number: line,
            category,
            severity,
            title: title.to_string(),
            description: "d".to_string(),
            code_snippet: None,
            suggestion: None,
        }
    }

    #[test]
    fn test_dedup_adjacent_lines_keeps_higher_severity() {
        let comments = vec![
            comment("a.rs", Some(10), Category::Logic, Severity::Minor, "first"),
            comment("a.rs", Some(11), Category::Logic, Severity::Major, "second"),
        ];
        let merged = aggregate(comments, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::Major);
        assert_eq!(merged[0].title, "second");
    }

    #[test]
    fn test_dedup_equal_severity_first_wins() {
        let comments = vec![
            comment("a.rs", Some(10), Category::Logic, Severity::Minor, "first"),
            comment("a.rs", Some(10), Category::Logic, Severity::Minor, "second"),
        ];
        let merged = aggregate(comments, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "first");
    }

    #[test]
    fn test_no_dedup_across_categories_or_files() {
        let comments = vec![
            comment("a.rs", Some(10), Category::Logic, Severity::Minor, "logic"),
            comment("a.rs", Some(10), Category::Security, Severity::Minor, "security"),
            comment("b.rs", Some(10), Category::Logic, Severity::Minor, "other file"),
        ];
        let merged = aggregate(comments, 1);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn test_no_dedup_beyond_tolerance() {
        let comments = vec![
            comment("a.rs", Some(10), Category::Logic, Severity::Minor, "a"),
            comment("a.rs", Some(12), Category::Logic, Severity::Minor, "b"),
        ];
        let merged = aggregate(comments, 1);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_unanchored_pair_deduplicates() {
        let comments = vec![
            comment("a.rs", None, Category::Logic, Severity::Minor, "a"),
            comment("a.rs", None, Category::Logic, Severity::Critical, "b"),
        ];
        let merged = aggregate(comments, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].severity, Severity::Critical);
    }

    #[test]
    fn test_anchored_and_unanchored_are_distinct() {
        let comments = vec![
            comment("a.rs", Some(5), Category::Logic, Severity::Minor, "a"),
            comment("a.rs", None, Category::Logic, Severity::Minor, "b"),
        ];
        let merged = aggregate(comments, 1);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_sort_order() {
        let comments = vec![
            comment("b.rs", Some(1), Category::Logic, Severity::Minor, "x"),
            comment("a.rs", None, Category::Logic, Severity::Minor, "unanchored"),
            comment("a.rs", Some(20), Category::Logic, Severity::Minor, "late line"),
            comment("a.rs", Some(3), Category::Logic, Severity::Minor, "early line"),
            comment("z.rs", Some(9), Category::Security, Severity::Critical, "worst"),
        ];
        let merged = aggregate(comments, 0);
        assert_eq!(merged[0].title, "worst");
        assert_eq!(merged[1].title, "early line");
        assert_eq!(merged[2].title, "late line");
        assert_eq!(merged[3].title, "unanchored");
        assert_eq!(merged[4].title, "x");
    }

    #[test]
    fn test_dedup_idempotent() {
        let comments = vec![
            comment("a.rs", Some(10), Category::Logic, Severity::Minor, "a"),
            comment("a.rs", Some(11), Category::Logic, Severity::Major, "b"),
            comment("b.rs", None, Category::Security, Severity::Critical, "c"),
        ];
        let once = aggregate(comments, 1);
        let twice = aggregate(once.clone(), 1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_summary_empty() {
        assert_eq!(summarize(&[]), "No issues found.");
    }

    #[test]
    fn test_summary_counts_by_severity() {
        let comments = vec![
            comment("a.rs", Some(1), Category::Logic, Severity::Critical, "a"),
            comment("a.rs", Some(2), Category::Logic, Severity::Minor, "b"),
            comment("a.rs", Some(3), Category::Logic, Severity::Minor, "c"),
        ];
        let summary = summarize(&comments);
        assert_eq!(summary, "Found 3 issues: 1 critical, 2 minor.");
    }
}
