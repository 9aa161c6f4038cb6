use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::Issue;

use super::replace::replace_word;
use super::word_pair::{extract_word_pair, WordPair};

/// "recieve should be receive"
fn re_should_be() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(\w+)\s+should\s+be\s+(\w+)\b").unwrap())
}

/// "Change recieve to receive"
fn re_change_to() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bchange\s+(\w+)\s+to\s+(\w+)\b").unwrap())
}

fn captured_pair(re: &Regex, text: &str) -> Option<WordPair> {
    let caps = re.captures(text)?;
    WordPair::distinct(caps.get(1)?.as_str(), caps.get(2)?.as_str())
}

/// Unquoted replacement patterns: description "X should be Y", then fix
/// "change X to Y", then fix "X should be Y"
fn literal_pair(issue: &Issue) -> Option<WordPair> {
    captured_pair(re_should_be(), &issue.description)
        .or_else(|| captured_pair(re_change_to(), &issue.suggested_fix))
        .or_else(|| captured_pair(re_should_be(), &issue.suggested_fix))
}

/// Apply a spelling issue to trimmed line text.
///
/// Only ever substitutes a correction spelled out in the issue text.
pub fn apply_spelling_fix(text: &str, issue: &Issue) -> String {
    let pair = extract_word_pair(issue).or_else(|| {
        let pair = literal_pair(issue)?;
        debug!("Literal spelling pattern '{}' -> '{}'", pair.original, pair.corrected);
        Some(pair)
    });

    match pair {
        Some(pair) => replace_word(text, &pair.original, &pair.corrected),
        None => text.to_string(),
    }
}
