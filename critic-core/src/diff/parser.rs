//! Unified diff parser
//!
//! Parsing is best-effort per file: a malformed hunk is dropped with a
//! warning and the surrounding file keeps whatever parsed cleanly. The
//! whole parse fails only when the input contains no recognizable file
//! or hunk markers at all.

use tracing::warn;

use crate::{Error, Result};

use super::{FileChange, Hunk, Line, LineKind};

/// Parse unified diff text into per-file changes
///
/// Accepts both the full multi-file `diff --git` envelope and a bare
/// single-file diff (`---`/`+++` headers or hunks only). When the same
/// path appears more than once, the later occurrence wins.
pub fn parse(diff_text: &str) -> Result<Vec<FileChange>> {
    let lines: Vec<&str> = diff_text.lines().collect();

    let mut section_starts: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with("diff --git "))
        .map(|(i, _)| i)
        .collect();

    let mut files = Vec::new();

    if section_starts.is_empty() {
        // No envelope: accept a single bare file section.
        if !has_any_marker(&lines) {
            return Err(Error::Parse(
                "no file or hunk markers found in diff text".to_string(),
            ));
        }
        if let Some(file) = parse_section(&lines) {
            files.push(file);
        }
    } else {
        section_starts.push(lines.len());
        for window in section_starts.windows(2) {
            let section = &lines[window[0]..window[1]];
            if let Some(file) = parse_section(section) {
                files.push(file);
            }
        }
    }

    if files.is_empty() {
        return Err(Error::Parse(
            "no file sections could be parsed from diff text".to_string(),
        ));
    }

    dedupe_last_wins(&mut files);
    Ok(files)
}

/// Parse a headerless hunk-only body as a single file's changes
///
/// Used for manually supplied diffs where the caller names the file.
/// Falls back to [`parse`] when the body turns out to carry its own
/// envelope, in which case the supplied path is ignored.
pub fn parse_single(diff_text: &str, path: &str) -> Result<Vec<FileChange>> {
    if diff_text
        .lines()
        .any(|l| l.starts_with("diff --git ") || l.starts_with("--- "))
    {
        return parse(diff_text);
    }

    let lines: Vec<&str> = diff_text.lines().collect();
    if !lines.iter().any(|l| l.starts_with("@@ ")) {
        return Err(Error::Parse(
            "no hunk markers found in diff text".to_string(),
        ));
    }

    let hunks = parse_hunks(&lines, path);
    Ok(vec![FileChange {
        path: path.to_string(),
        old_path: None,
        is_binary: false,
        is_renamed: false,
        hunks,
    }])
}

fn has_any_marker(lines: &[&str]) -> bool {
    lines
        .iter()
        .any(|l| l.starts_with("--- ") || l.starts_with("+++ ") || l.starts_with("@@ "))
}

fn dedupe_last_wins(files: &mut Vec<FileChange>) {
    let mut seen = std::collections::HashSet::new();
    // Walk backwards so the last occurrence of a path is the one kept.
    for i in (0..files.len()).rev() {
        if !seen.insert(files[i].path.clone()) {
            warn!(path = %files[i].path, "duplicate file section in diff, keeping later occurrence");
            files.remove(i);
        }
    }
}

/// Parse one file section (from its `diff --git` line, or the whole
/// input for bare diffs) into a `FileChange`
fn parse_section(lines: &[&str]) -> Option<FileChange> {
    let mut header_old: Option<String> = None;
    let mut header_new: Option<String> = None;
    let mut rename_from: Option<String> = None;
    let mut rename_to: Option<String> = None;
    let mut minus_path: Option<String> = None;
    let mut plus_path: Option<String> = None;
    let mut is_binary = false;

    for line in lines {
        if let Some(rest) = line.strip_prefix("diff --git ") {
            let mut parts = rest.split_whitespace();
            if let (Some(a), Some(b)) = (parts.next(), parts.next()) {
                header_old = a.strip_prefix("a/").map(str::to_string);
                header_new = b.strip_prefix("b/").map(str::to_string);
            }
        } else if let Some(rest) = line.strip_prefix("rename from ") {
            rename_from = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("rename to ") {
            rename_to = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("--- ") {
            minus_path = strip_diff_path(rest);
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            plus_path = strip_diff_path(rest);
        } else if line.starts_with("Binary files ") || line.starts_with("GIT binary patch") {
            is_binary = true;
        } else if line.starts_with("@@ ") {
            break;
        }
    }

    let old_path = rename_from.or(minus_path).or(header_old);
    let new_path = rename_to.or(plus_path).or(header_new);

    // Deleted files have no destination; keep the source path.
    let path = new_path.clone().or_else(|| old_path.clone())?;
    let is_renamed = matches!((&old_path, &new_path), (Some(o), Some(n)) if o != n);

    let hunks = if is_binary {
        Vec::new()
    } else {
        parse_hunks(lines, &path)
    };

    Some(FileChange {
        path,
        old_path: if is_renamed { old_path } else { None },
        is_binary,
        is_renamed,
        hunks,
    })
}

/// Strip the `a/` / `b/` prefix from a `---`/`+++` path; `/dev/null`
/// means the side does not exist
fn strip_diff_path(rest: &str) -> Option<String> {
    let rest = rest.trim_end();
    if rest == "/dev/null" {
        return None;
    }
    let stripped = rest
        .strip_prefix("a/")
        .or_else(|| rest.strip_prefix("b/"))
        .unwrap_or(rest);
    Some(stripped.to_string())
}

/// Parse all hunks in a section, dropping any whose line counts do not
/// match their header
fn parse_hunks(lines: &[&str], path: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(header) = parse_hunk_header(lines[i]) else {
            i += 1;
            continue;
        };
        let (old_start, old_count, new_start, new_count) = header;

        let mut hunk = Hunk {
            old_start,
            old_count,
            new_start,
            new_count,
            lines: Vec::new(),
        };
        let mut old_line = old_start;
        let mut new_line = new_start;

        i += 1;
        while i < lines.len() {
            // Stop once the header's counts are satisfied so trailing
            // non-diff lines are not swallowed into the hunk.
            if old_line - old_start >= old_count && new_line - new_start >= new_count {
                break;
            }
            let line = lines[i];
            if line.starts_with("@@ ") || line.starts_with("diff --git ") {
                break;
            }
            if let Some(content) = line.strip_prefix('+') {
                hunk.lines.push(Line {
                    kind: LineKind::Added,
                    old_line_no: None,
                    new_line_no: Some(new_line),
                    content: content.to_string(),
                });
                new_line += 1;
            } else if let Some(content) = line.strip_prefix('-') {
                hunk.lines.push(Line {
                    kind: LineKind::Removed,
                    old_line_no: Some(old_line),
                    new_line_no: None,
                    content: content.to_string(),
                });
                old_line += 1;
            } else if let Some(content) = line.strip_prefix(' ') {
                hunk.lines.push(Line {
                    kind: LineKind::Context,
                    old_line_no: Some(old_line),
                    new_line_no: Some(new_line),
                    content: content.to_string(),
                });
                old_line += 1;
                new_line += 1;
            } else if line.starts_with('\\') {
                // "\ No newline at end of file"
            } else if line.is_empty() {
                // Some tools emit context lines with the leading space
                // trimmed; treat a fully empty line as empty context.
                hunk.lines.push(Line {
                    kind: LineKind::Context,
                    old_line_no: Some(old_line),
                    new_line_no: Some(new_line),
                    content: String::new(),
                });
                old_line += 1;
                new_line += 1;
            } else {
                break;
            }
            i += 1;
        }

        if hunk.counts_match() {
            hunks.push(hunk);
        } else {
            warn!(
                path,
                old_start, new_start, "hunk line counts do not match header, dropping hunk"
            );
        }
    }

    hunks
}

/// Parse `@@ -old_start[,old_count] +new_start[,new_count] @@`
///
/// Omitted counts default to 1.
fn parse_hunk_header(line: &str) -> Option<(u32, u32, u32, u32)> {
    let rest = line.strip_prefix("@@ ")?;
    let end = rest.find(" @@")?;
    let mut parts = rest[..end].split(' ');
    let (old_start, old_count) = parse_range(parts.next()?.strip_prefix('-')?)?;
    let (new_start, new_count) = parse_range(parts.next()?.strip_prefix('+')?)?;
    Some((old_start, old_count, new_start, new_count))
}

fn parse_range(range: &str) -> Option<(u32, u32)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_DIFF: &str = "diff --git a/file.py b/file.py\n@@ -1,2 +1,3 @@\n context\n-old\n+new\n+added";

    #[test]
    fn test_parse_simple_diff() {
        let files = parse(SIMPLE_DIFF).unwrap();
        assert_eq!(files.len(), 1);

        let file = &files[0];
        assert_eq!(file.path, "file.py");
        assert!(!file.is_binary);
        assert!(!file.is_renamed);
        assert_eq!(file.hunks.len(), 1);

        let hunk = &file.hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_count, hunk.new_start, hunk.new_count),
            (1, 2, 1, 3)
        );
        assert_eq!(hunk.lines.len(), 4);

        assert_eq!(hunk.lines[0].kind, LineKind::Context);
        assert_eq!(hunk.lines[0].old_line_no, Some(1));
        assert_eq!(hunk.lines[0].new_line_no, Some(1));

        assert_eq!(hunk.lines[1].kind, LineKind::Removed);
        assert_eq!(hunk.lines[1].old_line_no, Some(2));
        assert_eq!(hunk.lines[1].new_line_no, None);

        assert_eq!(hunk.lines[2].kind, LineKind::Added);
        assert_eq!(hunk.lines[2].new_line_no, Some(2));
        assert_eq!(hunk.lines[3].kind, LineKind::Added);
        assert_eq!(hunk.lines[3].new_line_no, Some(3));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse("this is not a diff\nnothing to see here").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn test_parse_multi_file() {
        let diff = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -x\n\
                    +y\n\
                    diff --git a/b.rs b/b.rs\n\
                    --- a/b.rs\n\
                    +++ b/b.rs\n\
                    @@ -1 +1,2 @@\n \
                    z\n\
                    +w\n";
        let files = parse(diff).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].path, "a.rs");
        assert_eq!(files[1].path, "b.rs");
        // Omitted count defaults to 1
        assert_eq!(files[1].hunks[0].old_count, 1);
        assert_eq!(files[1].hunks[0].new_count, 2);
    }

    #[test]
    fn test_parse_without_envelope() {
        let diff = "--- a/src/main.rs\n\
                    +++ b/src/main.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -old\n\
                    +new\n";
        let files = parse(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "src/main.rs");
        assert_eq!(files[0].hunks.len(), 1);
    }

    #[test]
    fn test_parse_single_hunks_only() {
        let diff = "@@ -1,1 +1,2 @@\n context\n+added\n";
        let files = parse_single(diff, "lib.rs").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, "lib.rs");
        assert_eq!(files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_parse_single_with_envelope_ignores_path() {
        let files = parse_single(SIMPLE_DIFF, "ignored.rs").unwrap();
        assert_eq!(files[0].path, "file.py");
    }

    #[test]
    fn test_parse_rename() {
        let diff = "diff --git a/old_name.rs b/new_name.rs\n\
                    rename from old_name.rs\n\
                    rename to new_name.rs\n\
                    --- a/old_name.rs\n\
                    +++ b/new_name.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -a\n\
                    +b\n";
        let files = parse(diff).unwrap();
        assert!(files[0].is_renamed);
        assert_eq!(files[0].path, "new_name.rs");
        assert_eq!(files[0].old_path.as_deref(), Some("old_name.rs"));
    }

    #[test]
    fn test_parse_binary_file() {
        let diff = "diff --git a/logo.png b/logo.png\n\
                    Binary files a/logo.png and b/logo.png differ\n";
        let files = parse(diff).unwrap();
        assert!(files[0].is_binary);
        assert!(files[0].hunks.is_empty());
    }

    #[test]
    fn test_parse_new_file() {
        let diff = "diff --git a/new.rs b/new.rs\n\
                    --- /dev/null\n\
                    +++ b/new.rs\n\
                    @@ -0,0 +1,2 @@\n\
                    +fn main() {}\n\
                    +// done\n";
        let files = parse(diff).unwrap();
        let file = &files[0];
        assert_eq!(file.path, "new.rs");
        assert!(!file.is_renamed);
        assert_eq!(file.hunks[0].old_count, 0);
        assert_eq!(file.hunks[0].lines[0].new_line_no, Some(1));
        assert_eq!(file.hunks[0].lines[1].new_line_no, Some(2));
    }

    #[test]
    fn test_parse_deleted_file_keeps_source_path() {
        let diff = "diff --git a/gone.rs b/gone.rs\n\
                    --- a/gone.rs\n\
                    +++ /dev/null\n\
                    @@ -1,1 +0,0 @@\n\
                    -fn main() {}\n";
        let files = parse(diff).unwrap();
        assert_eq!(files[0].path, "gone.rs");
        assert_eq!(files[0].hunks[0].new_count, 0);
    }

    #[test]
    fn test_malformed_hunk_dropped_file_kept() {
        // Second hunk claims 5 old lines but only has 1.
        let diff = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -x\n\
                    +y\n\
                    @@ -10,5 +10,5 @@\n \
                    only one line\n";
        let files = parse(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hunks.len(), 1);
        assert_eq!(files[0].hunks[0].old_start, 1);
    }

    #[test]
    fn test_consecutive_hunks() {
        let diff = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -x\n\
                    +y\n\
                    @@ -10,1 +10,2 @@\n \
                    ctx\n\
                    +added\n";
        let files = parse(diff).unwrap();
        assert_eq!(files[0].hunks.len(), 2);
        assert_eq!(files[0].hunks[1].lines[1].new_line_no, Some(11));
    }

    #[test]
    fn test_duplicate_file_later_wins() {
        let diff = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -first\n\
                    +version\n\
                    diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -1,1 +1,2 @@\n\
                    -second\n\
                    +version\n\
                    +extra\n";
        let files = parse(diff).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hunks[0].new_count, 2);
    }

    #[test]
    fn test_no_newline_marker_ignored() {
        let diff = "diff --git a/a.txt b/a.txt\n\
                    --- a/a.txt\n\
                    +++ b/a.txt\n\
                    @@ -1,1 +1,1 @@\n\
                    -old\n\
                    \\ No newline at end of file\n\
                    +new\n\
                    \\ No newline at end of file";
        let files = parse(diff).unwrap();
        assert_eq!(files[0].hunks[0].lines.len(), 2);
    }

    #[test]
    fn test_roundtrip_counts() {
        // Replaying added+context lines of each hunk reconstructs the
        // destination region implied by new_start,new_count.
        let diff = "diff --git a/a.rs b/a.rs\n\
                    --- a/a.rs\n\
                    +++ b/a.rs\n\
                    @@ -3,4 +3,5 @@\n \
                    one\n\
                    -two\n\
                    +two fixed\n\
                    +two and a half\n \
                    three\n \
                    four\n";
        let files = parse(diff).unwrap();
        let hunk = &files[0].hunks[0];
        let new_side: Vec<&Line> = hunk
            .lines
            .iter()
            .filter(|l| l.kind != LineKind::Removed)
            .collect();
        assert_eq!(new_side.len(), hunk.new_count as usize);
        for (offset, line) in new_side.iter().enumerate() {
            assert_eq!(line.new_line_no, Some(hunk.new_start + offset as u32));
        }
    }

    #[test]
    fn test_hunk_header_parsing() {
        assert_eq!(parse_hunk_header("@@ -1,2 +3,4 @@"), Some((1, 2, 3, 4)));
        assert_eq!(parse_hunk_header("@@ -1 +3 @@ fn main()"), Some((1, 1, 3, 1)));
        assert_eq!(parse_hunk_header("@@ -0,0 +1,5 @@"), Some((0, 0, 1, 5)));
        assert_eq!(parse_hunk_header("@@ bogus @@"), None);
        assert_eq!(parse_hunk_header("not a header"), None);
    }
}
