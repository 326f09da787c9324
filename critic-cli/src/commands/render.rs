//! Human-readable review output

use critic_core::Review;

/// Print a review to stdout
///
/// With `json` set, the serialized review is printed instead of the
/// human-readable report.
pub fn print_review(review: &Review, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(review)?);
        return Ok(());
    }

    println!("Review: {}", review.subject_id);
    println!("========{}", "=".repeat(review.subject_id.len()));
    println!();
    if let Some(title) = review.metadata.get("title").and_then(|v| v.as_str()) {
        println!("Title: {}", title);
    }
    if let Some(author) = review.metadata.get("author").and_then(|v| v.as_str()) {
        println!("Author: {}", author);
    }
    println!("Files changed: {}", review.total_files_changed);
    println!();
    println!("{}", review.summary);
    if review.partial {
        println!("Note: some review agents failed; results may be incomplete.");
    }
    println!();

    for comment in &review.comments {
        let location = match comment.line_number {
            Some(line) => format!("{}:{}", comment.file_path, line),
            None => comment.file_path.clone(),
        };
        println!(
            "[{}] {} ({}) - {}",
            comment.severity, location, comment.category, comment.title
        );
        println!("    {}", comment.description);
        if let Some(snippet) = &comment.code_snippet {
            println!("    > {}", snippet.replace('\n', "\n    > "));
        }
        if let Some(suggestion) = &comment.suggestion {
            println!("    Suggestion: {}", suggestion);
        }
        println!();
    }

    Ok(())
}
