use std::collections::HashSet;

use tracing::debug;

use crate::heuristics::quoted_tokens;
use crate::models::Issue;

/// Result of Stage 0 normalization
#[derive(Debug, Clone)]
pub struct NormalizationResult {
    /// Issues that survived, in input order, with fixes cut to one sentence
    pub issues: Vec<Issue>,
    /// Issues dropped for pointing outside the transcript
    pub out_of_range: usize,
    /// Issues dropped as repeats of an earlier identity
    pub duplicates: usize,
}

/// Perform Stage 0: clean a raw batch of detected issues
///
/// This stage:
/// 1. Drops issues whose line number is outside 1..=total_lines
/// 2. Drops repeated identities, keeping the first
/// 3. Cuts every suggested fix down to its first sentence
pub fn normalize_issues(issues: Vec<Issue>, total_lines: usize) -> NormalizationResult {
    let raw_count = issues.len();

    let in_range = validate_line_numbers(issues, total_lines);
    let out_of_range = raw_count - in_range.len();

    let in_range_count = in_range.len();
    let unique = deduplicate_issues(in_range);
    let duplicates = in_range_count - unique.len();

    let issues: Vec<Issue> = unique
        .into_iter()
        .map(|issue| Issue {
            suggested_fix: enforce_fix_constraints(&issue.suggested_fix),
            ..issue
        })
        .collect();

    debug!(
        "Normalized {} issues: {} out of range, {} duplicates, {} kept",
        raw_count,
        out_of_range,
        duplicates,
        issues.len()
    );

    NormalizationResult {
        issues,
        out_of_range,
        duplicates,
    }
}

/// Keep only issues whose line number is within 1..=total_lines
pub fn validate_line_numbers(issues: Vec<Issue>, total_lines: usize) -> Vec<Issue> {
    issues
        .into_iter()
        .filter(|issue| issue.line_number >= 1 && issue.line_number <= total_lines)
        .collect()
}

/// Keep the first issue of each identity, preserving order
pub fn deduplicate_issues(issues: Vec<Issue>) -> Vec<Issue> {
    let mut seen = HashSet::new();
    issues
        .into_iter()
        .filter(|issue| seen.insert(issue.id()))
        .collect()
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into sentences, each keeping its terminator run.
///
/// A run of `.`/`!`/`?` ends a sentence when it follows a non-space
/// character and is followed by whitespace or the end of the text, or when
/// a letter follows it directly ("comma.Also"). Runs inside quoted tokens
/// never split, and a literal mark such as "Add ? at end" stays inside its
/// sentence.
fn sentences(text: &str) -> Vec<&str> {
    let quoted = quoted_tokens(text);
    let in_quotes = |byte: usize| quoted.iter().any(|q| q.start < byte && byte < q.end);

    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut result = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminator(chars[i].1) {
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && is_terminator(chars[j].1) {
            j += 1;
        }

        let after_word = i > 0 && !chars[i - 1].1.is_whitespace();
        let next = chars.get(j).map(|(_, c)| *c);
        let spaced_end = after_word && next.is_none_or(char::is_whitespace);
        let run_on = next.is_some_and(char::is_alphabetic);
        if (spaced_end || run_on) && !in_quotes(chars[i].0) {
            let end = chars.get(j).map(|(b, _)| *b).unwrap_or(text.len());
            result.push(&text[start..end]);
            start = end;
        }
        i = j;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }
    result
}

/// Reduce a suggested fix to its first sentence, ending it with a period if
/// it has no terminal punctuation. Text with no sentence content is returned
/// trimmed.
pub fn enforce_fix_constraints(fix: &str) -> String {
    let first = sentences(fix)
        .into_iter()
        .map(str::trim)
        .find(|s| !s.trim_end_matches(is_terminator).trim().is_empty());

    match first {
        Some(sentence) if sentence.ends_with(is_terminator) => sentence.to_string(),
        Some(sentence) => format!("{}.", sentence),
        None => fix.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueCategory, Severity};

    fn issue(line: usize, description: &str, fix: &str) -> Issue {
        Issue {
            line_number: line,
            category: IssueCategory::Punctuation,
            severity: Severity::Review,
            description: description.to_string(),
            suggested_fix: fix.to_string(),
            confidence: 0.8,
        }
    }

    #[test]
    fn test_validate_line_numbers() {
        let issues = vec![
            issue(0, "zero", "Add period at end."),
            issue(1, "first", "Add period at end."),
            issue(3, "last", "Add period at end."),
            issue(4, "past end", "Add period at end."),
        ];

        let kept = validate_line_numbers(issues, 3);
        let descriptions: Vec<&str> = kept.iter().map(|i| i.description.as_str()).collect();
        assert_eq!(descriptions, vec!["first", "last"]);
    }

    #[test]
    fn test_deduplicate_keeps_first() {
        let a = issue(2, "missing period", "Add period at end.");
        let mut a_twin = a.clone();
        a_twin.confidence = 0.1;
        a_twin.suggested_fix = "Something else.".to_string();
        let b = issue(2, "other", "Add comma.");

        let unique = deduplicate_issues(vec![a.clone(), a_twin, b.clone()]);
        assert_eq!(unique, vec![a, b]);
    }

    #[test]
    fn test_enforce_fix_constraints() {
        assert_eq!(
            enforce_fix_constraints("Add a comma. Also check spelling."),
            "Add a comma."
        );
        assert_eq!(enforce_fix_constraints("Add period at end"), "Add period at end.");
        assert_eq!(enforce_fix_constraints("  Is it a question?  Maybe."), "Is it a question?");
        assert_eq!(enforce_fix_constraints("Add ? at end"), "Add ? at end.");
        assert_eq!(
            enforce_fix_constraints("Add apostrophe to 'todays' to make it 'today's'"),
            "Add apostrophe to 'todays' to make it 'today's'."
        );
    }

    #[test]
    fn test_enforce_fix_constraints_without_space_after_stop() {
        assert_eq!(
            enforce_fix_constraints("Add a comma.Also check spelling."),
            "Add a comma."
        );
        assert_eq!(
            enforce_fix_constraints("Add period at end .Then capitalize 'smith'."),
            "Add period at end ."
        );
        assert_eq!(
            enforce_fix_constraints("Replace 'e.g.' with 'for example'.Done."),
            "Replace 'e.g.' with 'for example'."
        );
        assert_eq!(
            enforce_fix_constraints("Change 'todays' to 'today's'"),
            "Change 'todays' to 'today's'."
        );
    }

    #[test]
    fn test_enforce_fix_constraints_without_sentences() {
        assert_eq!(enforce_fix_constraints("  ...  "), "...");
        assert_eq!(enforce_fix_constraints(""), "");
    }

    #[test]
    fn test_normalize_issues() {
        let issues = vec![
            issue(1, "a", "Add period at end. Then review."),
            issue(1, "a", "Duplicate."),
            issue(9, "b", "Out of range."),
            issue(2, "c", "Add comma"),
        ];

        let result = normalize_issues(issues, 2);

        assert_eq!(result.out_of_range, 1);
        assert_eq!(result.duplicates, 1);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].suggested_fix, "Add period at end.");
        assert_eq!(result.issues[1].suggested_fix, "Add comma.");
    }
}
