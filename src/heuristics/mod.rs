pub mod capitalization;
pub mod punctuation;
pub mod replace;
pub mod spelling;
pub mod word_pair;

pub use capitalization::*;
pub use punctuation::*;
pub use replace::*;
pub use spelling::*;
pub use word_pair::*;

use crate::models::{Issue, IssueCategory};

/// Split a line into (leading whitespace, body, trailing whitespace).
/// A whitespace-only line is all leading whitespace.
fn split_edges(line: &str) -> (&str, &str, &str) {
    let lead_len = line.len() - line.trim_start().len();
    let (leading, rest) = line.split_at(lead_len);
    let body = rest.trim_end();
    let trailing = &rest[body.len()..];
    (leading, body, trailing)
}

/// Dispatch an issue to its category applier
fn apply_category_fix(body: &str, issue: &Issue) -> String {
    match issue.category {
        IssueCategory::Capitalization => apply_capitalization_fix(body, issue),
        IssueCategory::Punctuation => apply_punctuation_fix(body, issue),
        IssueCategory::Spelling => apply_spelling_fix(body, issue),
        // Label consistency needs cross-line context; accepted for tracking only
        IssueCategory::SpeakerFormatting => body.to_string(),
        IssueCategory::Unknown(_) => replace_from_pair(body, issue).unwrap_or_else(|| body.to_string()),
    }
}

fn replace_from_pair(body: &str, issue: &Issue) -> Option<String> {
    let pair = extract_word_pair(issue)?;
    Some(replace_word(body, &pair.original, &pair.corrected))
}

/// Apply one issue's fix to one line.
///
/// The edit happens on the trimmed body; the line's leading and trailing
/// whitespace is reattached unchanged. If the category applier changes
/// nothing, a mined word pair is tried as a last resort. Speaker-formatting
/// issues never change the line.
pub fn apply_fix_to_line(line: &str, issue: &Issue) -> String {
    if issue.category == IssueCategory::SpeakerFormatting {
        return line.to_string();
    }

    let (leading, body, trailing) = split_edges(line);

    let mut fixed = apply_category_fix(body, issue);
    if fixed == body {
        if let Some(replaced) = replace_from_pair(body, issue) {
            fixed = replaced;
        }
    }

    format!("{}{}{}", leading, fixed, trailing)
}

/// Apply several issues to one line in order, each seeing the previous result
pub fn apply_fixes_to_line<'a, I>(line: &str, issues: I) -> String
where
    I: IntoIterator<Item = &'a Issue>,
{
    issues
        .into_iter()
        .fold(line.to_string(), |current, issue| apply_fix_to_line(&current, issue))
}
