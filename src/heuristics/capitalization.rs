use tracing::debug;

use crate::models::Issue;

use super::replace::{capitalize_first, replace_word};
use super::word_pair::extract_word_pair;

/// Apply a capitalization issue to trimmed line text
///
/// Uses a mined word pair when there is one; otherwise a fix that says
/// "capitalize" capitalizes the start of the line.
pub fn apply_capitalization_fix(text: &str, issue: &Issue) -> String {
    if let Some(pair) = extract_word_pair(issue) {
        return replace_word(text, &pair.original, &pair.corrected);
    }

    let mentions_capitalize = issue.suggested_fix.to_lowercase().contains("capitalize");
    if mentions_capitalize && text.chars().next().is_some_and(char::is_lowercase) {
        debug!("Capitalizing start of line {}", issue.line_number);
        return capitalize_first(text);
    }

    text.to_string()
}
