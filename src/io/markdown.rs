use crate::models::{AcceptedSet, Issue, IssueCategory, Transcript};

fn bold(text: &str) -> String {
    format!("**{}**", text)
}

/// Split text into alternating runs of whitespace and non-whitespace
fn split_runs(text: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            runs.push(&text[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < text.len() {
        runs.push(&text[start..]);
    }
    runs
}

/// Bold every token that changed, when both sides have the same token layout
fn mark_changed_tokens(original: &str, corrected: &str) -> Option<String> {
    let before = split_runs(original);
    let after = split_runs(corrected);
    if before.len() != after.len() {
        return None;
    }

    let mut marked_any = false;
    let marked: String = before
        .iter()
        .zip(&after)
        .map(|(old, new)| {
            if new.trim().is_empty() || old == new {
                new.to_string()
            } else {
                marked_any = true;
                bold(new)
            }
        })
        .collect();

    marked_any.then_some(marked)
}

fn same_ignoring_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Bold the span between the common prefix and the common suffix.
///
/// This is a prefix/suffix comparison rather than a scan for where the two
/// lines line up again, so one span covers every change on the line. A pure
/// deletion leaves nothing to bold and returns None, which makes the caller
/// bold the whole line.
fn mark_changed_span(original: &str, corrected: &str) -> Option<String> {
    let old: Vec<char> = original.chars().collect();
    let new: Vec<char> = corrected.chars().collect();

    // Text appended to the end, e.g. a period
    if new.len() > old.len() && old.iter().zip(&new).all(|(&a, &b)| same_ignoring_case(a, b)) {
        let kept: String = new[..old.len()].iter().collect();
        let added: String = new[old.len()..].iter().collect();
        return Some(format!("{}{}", kept, bold(&added)));
    }

    let prefix = old.iter().zip(&new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old
        .iter()
        .rev()
        .zip(new.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let changed: String = new[prefix..new.len() - suffix].iter().collect();
    if changed.is_empty() {
        // Pure deletion, nothing to point at
        return None;
    }

    let head: String = new[..prefix].iter().collect();
    let tail: String = new[new.len() - suffix..].iter().collect();
    Some(format!("{}{}{}", head, bold(&changed), tail))
}

/// Render a corrected line with its changed part in bold.
///
/// Capitalization issues mark whole changed tokens, punctuation issues mark
/// the changed character span. When neither isolates the change, the whole
/// corrected line is bolded so the reader still sees that it changed.
pub fn mark_changes_in_bold(original: &str, corrected: &str, issues: &[&Issue]) -> String {
    if original == corrected {
        return original.to_string();
    }

    let original = original.trim();
    let corrected = corrected.trim();
    let has = |category: IssueCategory| issues.iter().any(|i| i.category == category);

    if has(IssueCategory::Capitalization) {
        if let Some(marked) = mark_changed_tokens(original, corrected) {
            return marked;
        }
    }

    if has(IssueCategory::Punctuation) {
        if let Some(marked) = mark_changed_span(original, corrected) {
            return marked;
        }
    }

    bold(corrected)
}

/// Render the corrected transcript as a numbered Markdown document.
///
/// Lines changed by accepted issues are shown with the change in bold and a
/// list of the corrections applied; every other line is shown as is.
pub fn export_to_markdown(
    original: &Transcript,
    corrected: &Transcript,
    issues: &[Issue],
    accepted: &AcceptedSet,
) -> String {
    let by_line = accepted.group_by_line(issues);

    let mut out: Vec<String> = vec![
        "# Corrected Transcript".to_string(),
        String::new(),
        "*This document shows the corrected transcript with changes marked in **bold**.*"
            .to_string(),
        String::new(),
        format!("**Total corrections applied:** {}", accepted.len()),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    for (index, original_line) in original.lines().iter().enumerate() {
        let line_number = index + 1;
        let corrected_line = corrected.line(line_number).unwrap_or(original_line.as_str());
        let line_issues = by_line
            .get(&line_number)
            .filter(|_| corrected_line != original_line.as_str());

        match line_issues {
            Some(line_issues) => {
                let marked = mark_changes_in_bold(original_line, corrected_line, line_issues);
                out.push(format!("{}. {}", line_number, marked));
                out.push(String::new());
                out.push("   *Corrections:*".to_string());
                for issue in line_issues {
                    out.push(format!("   - {}: {}", issue.category, issue.suggested_fix));
                }
                out.push(String::new());
            }
            None => {
                out.push(format!("{}. {}", line_number, original_line));
                out.push(String::new());
            }
        }
    }

    out.join("\n")
}
