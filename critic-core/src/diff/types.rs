//! Structured model of a unified diff: files, hunks, and lines

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// How a diff line changed the file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Added,
    Removed,
    Context,
}

/// A single line within a hunk
///
/// Pure additions have no old line number and pure removals have no new
/// line number; context lines carry both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub kind: LineKind,
    pub old_line_no: Option<u32>,
    pub new_line_no: Option<u32>,
    pub content: String,
}

/// One contiguous changed region of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hunk {
    pub old_start: u32,
    pub old_count: u32,
    pub new_start: u32,
    pub new_count: u32,
    pub lines: Vec<Line>,
}

impl Hunk {
    /// Check the header counts against the lines actually parsed
    ///
    /// Replaying the hunk must produce `old_count` removed/context lines
    /// and `new_count` added/context lines.
    pub fn counts_match(&self) -> bool {
        let mut old = 0u32;
        let mut new = 0u32;
        for line in &self.lines {
            match line.kind {
                LineKind::Added => new += 1,
                LineKind::Removed => old += 1,
                LineKind::Context => {
                    old += 1;
                    new += 1;
                }
            }
        }
        old == self.old_count && new == self.new_count
    }

    /// Number of added plus removed lines in this hunk
    pub fn changed_line_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|l| l.kind != LineKind::Context)
            .count()
    }
}

/// All changes to a single file within a diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Destination path (source path for deleted files)
    pub path: String,
    /// Source path, present when the file was renamed
    pub old_path: Option<String>,
    pub is_binary: bool,
    pub is_renamed: bool,
    /// Parsed hunks; empty for binary files
    pub hunks: Vec<Hunk>,
}

impl FileChange {
    /// Total added plus removed lines across all hunks
    pub fn changed_line_count(&self) -> usize {
        self.hunks.iter().map(Hunk::changed_line_count).sum()
    }

    /// Whether this file carries anything an agent could analyze
    pub fn is_reviewable(&self) -> bool {
        !self.is_binary && !self.hunks.is_empty()
    }

    /// Re-render the parsed hunks as unified diff text
    ///
    /// Used to build agent prompts; truncation happens at whole-hunk
    /// granularity so the output here is always well formed.
    pub fn diff_text(&self) -> String {
        self.render_hunks(&self.hunks)
    }

    /// Render a subset of this file's hunks as unified diff text
    pub fn render_hunks(&self, hunks: &[Hunk]) -> String {
        let mut out = String::new();
        let old = self.old_path.as_deref().unwrap_or(&self.path);
        let _ = writeln!(out, "--- a/{}", old);
        let _ = writeln!(out, "+++ b/{}", self.path);
        for hunk in hunks {
            let _ = writeln!(
                out,
                "@@ -{},{} +{},{} @@",
                hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count
            );
            for line in &hunk.lines {
                let marker = match line.kind {
                    LineKind::Added => '+',
                    LineKind::Removed => '-',
                    LineKind::Context => ' ',
                };
                let _ = writeln!(out, "{}{}", marker, line.content);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(kind: LineKind, old: Option<u32>, new: Option<u32>, content: &str) -> Line {
        Line {
            kind,
            old_line_no: old,
            new_line_no: new,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_counts_match() {
        let hunk = Hunk {
            old_start: 1,
            old_count: 2,
            new_start: 1,
            new_count: 2,
            lines: vec![
                line(LineKind::Context, Some(1), Some(1), "a"),
                line(LineKind::Removed, Some(2), None, "b"),
                line(LineKind::Added, None, Some(2), "c"),
            ],
        };
        assert!(hunk.counts_match());
    }

    #[test]
    fn test_counts_mismatch() {
        let hunk = Hunk {
            old_start: 1,
            old_count: 3,
            new_start: 1,
            new_count: 1,
            lines: vec![line(LineKind::Context, Some(1), Some(1), "a")],
        };
        assert!(!hunk.counts_match());
    }

    #[test]
    fn test_changed_line_count() {
        let file = FileChange {
            path: "a.rs".to_string(),
            old_path: None,
            is_binary: false,
            is_renamed: false,
            hunks: vec![Hunk {
                old_start: 1,
                old_count: 1,
                new_start: 1,
                new_count: 2,
                lines: vec![
                    line(LineKind::Context, Some(1), Some(1), "a"),
                    line(LineKind::Added, None, Some(2), "b"),
                ],
            }],
        };
        assert_eq!(file.changed_line_count(), 1);
        assert!(file.is_reviewable());
    }

    #[test]
    fn test_binary_not_reviewable() {
        let file = FileChange {
            path: "logo.png".to_string(),
            old_path: None,
            is_binary: true,
            is_renamed: false,
            hunks: vec![],
        };
        assert!(!file.is_reviewable());
    }

    #[test]
    fn test_diff_text_render() {
        let file = FileChange {
            path: "b.rs".to_string(),
            old_path: Some("a.rs".to_string()),
            is_binary: false,
            is_renamed: true,
            hunks: vec![Hunk {
                old_start: 1,
                old_count: 1,
                new_start: 1,
                new_count: 1,
                lines: vec![
                    line(LineKind::Removed, Some(1), None, "old"),
                    line(LineKind::Added, None, Some(1), "new"),
                ],
            }],
        };
        let text = file.diff_text();
        assert!(text.starts_with("--- a/a.rs\n+++ b/b.rs\n"));
        assert!(text.contains("@@ -1,1 +1,1 @@"));
        assert!(text.contains("-old\n+new\n"));
    }
}
