//! Bounded prompt construction for one (file, agent) pair
//!
//! The diff portion of a prompt is capped at a character budget. When a
//! file's diff exceeds it, whole hunks are truncated from the end so the
//! oldest hunks are kept, and the prompt is flagged so the findings
//! carry a partial-view caveat.

use crate::diff::FileChange;

use super::AgentKind;

/// A prompt ready for dispatch through a provider
#[derive(Debug, Clone)]
pub struct BuiltPrompt {
    /// User-role content: the file's diff and output instructions
    pub content: String,
    /// Whether hunks were dropped to fit the budget
    pub truncated: bool,
}

/// Build the user-role prompt for one (file, agent) pair
///
/// `max_diff_chars` bounds the diff portion only; the fixed instruction
/// scaffolding around it is small and constant.
pub fn build_prompt(file: &FileChange, agent: AgentKind, max_diff_chars: usize) -> BuiltPrompt {
    let (diff_text, truncated) = bounded_diff_text(file, max_diff_chars);

    let content = format!(
        "Please review the following code changes and identify issues related to {category}.\n\
         \n\
         File: {path}\n\
         \n\
         Diff:\n\
         {diff}\n\
         Provide your review in the following JSON format:\n\
         {{\n\
         \x20   \"comments\": [\n\
         \x20       {{\n\
         \x20           \"line_number\": <line number>,\n\
         \x20           \"severity\": \"<critical|major|minor|suggestion>\",\n\
         \x20           \"title\": \"<brief title>\",\n\
         \x20           \"description\": \"<detailed description>\",\n\
         \x20           \"code_snippet\": \"<relevant code snippet>\",\n\
         \x20           \"suggestion\": \"<suggested fix>\"\n\
         \x20       }}\n\
         \x20   ]\n\
         }}\n\
         \n\
         Only include issues that are relevant to {category}. If no issues \
         are found, return an empty comments array.",
        category = agent.category(),
        path = file.path,
        diff = diff_text,
    );

    BuiltPrompt { content, truncated }
}

/// Render the file's diff, dropping trailing hunks to fit the budget
fn bounded_diff_text(file: &FileChange, max_diff_chars: usize) -> (String, bool) {
    let full = file.diff_text();
    if full.len() <= max_diff_chars {
        return (full, false);
    }

    let mut kept = file.hunks.len();
    while kept > 1 {
        kept -= 1;
        let candidate = file.render_hunks(&file.hunks[..kept]);
        if candidate.len() <= max_diff_chars {
            let text = format!("{}... (diff truncated for review)\n", candidate);
            return (text, true);
        }
    }

    // Even one hunk overflows; cut within it at a line boundary.
    let single = file.render_hunks(&file.hunks[..1.min(file.hunks.len())]);
    let cut = single
        .char_indices()
        .take_while(|(i, _)| *i < max_diff_chars)
        .filter(|(_, c)| *c == '\n')
        .map(|(i, _)| i)
        .last()
        .unwrap_or(0);
    let text = format!("{}\n... (diff truncated for review)\n", &single[..cut]);
    (text, true)
}
