use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::Issue;

use super::replace::replace_word;
use super::word_pair::extract_word_pair;

/// Word named after "before" in "Add comma before 'but'"
fn re_comma_target() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bbefore\s+["'\x{2018}\x{201C}]?(\w+)"#).unwrap()
    })
}

/// Conjunctions with a space on both sides, in the order they are tried
fn re_conjunctions() -> &'static [Regex] {
    static RE: OnceLock<Vec<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        ["and", "but", "or", "so"]
            .iter()
            .map(|conj| Regex::new(&format!("(?i) {} ", conj)).unwrap())
            .collect()
    })
}

fn re_all() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\ball\b").unwrap())
}

/// Fix text of the issue being applied, with a lowercase copy for keyword checks
struct FixText<'a> {
    issue: &'a Issue,
    lower: String,
}

impl<'a> FixText<'a> {
    fn new(issue: &'a Issue) -> Self {
        Self {
            issue,
            lower: issue.suggested_fix.to_lowercase(),
        }
    }

    fn mentions(&self, keyword: &str) -> bool {
        self.lower.contains(keyword)
    }
}

/// A rule returns None when it does not apply to the fix text
type PunctuationRule = fn(&str, &FixText) -> Option<String>;

const RULES: [(&str, PunctuationRule); 5] = [
    ("word_replacement", word_replacement),
    ("add_period", add_period),
    ("add_comma", add_comma),
    ("add_question_mark", add_question_mark),
    ("remove", remove_mark),
];

/// Apply a punctuation issue to trimmed line text.
///
/// Rules are tried in priority order and the first that applies decides the
/// result. An instruction no rule understands leaves the text unchanged.
pub fn apply_punctuation_fix(text: &str, issue: &Issue) -> String {
    let fix = FixText::new(issue);

    RULES
        .iter()
        .find_map(|(name, rule)| {
            let fixed = rule(text, &fix)?;
            debug!(rule = *name, "Punctuation rule applied to line {}", issue.line_number);
            Some(fixed)
        })
        .unwrap_or_else(|| text.to_string())
}

/// "Add apostrophe to 'todays' to make it 'today's'" and other quoted swaps
fn word_replacement(text: &str, fix: &FixText) -> Option<String> {
    let quoted = fix.issue.suggested_fix.contains(['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}']);
    if !(fix.mentions("apostrophe") || fix.mentions("make it") || quoted) {
        return None;
    }

    let pair = extract_word_pair(fix.issue)?;
    Some(replace_word(text, &pair.original, &pair.corrected))
}

fn ends_with_terminal(text: &str) -> bool {
    text.ends_with(['.', '!', '?'])
}

fn add_period(text: &str, fix: &FixText) -> Option<String> {
    if !(fix.mentions("add period") && fix.mentions("end")) {
        return None;
    }

    if text.is_empty() || ends_with_terminal(text) {
        return Some(text.to_string());
    }
    Some(format!("{}.", text))
}

fn add_comma(text: &str, fix: &FixText) -> Option<String> {
    if !fix.mentions("add comma") {
        return None;
    }

    let target = re_comma_target()
        .captures(&fix.issue.suggested_fix)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase());

    Some(match target {
        Some(word) => insert_comma_before_word(text, &word),
        None => insert_comma_before_conjunction(text),
    })
}

/// Insert ", " before the first whole-word occurrence of `word`
fn insert_comma_before_word(text: &str, word: &str) -> String {
    let found = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word)))
        .ok()
        .and_then(|re| re.find(text).map(|m| m.start()));

    let Some(index) = found.filter(|&i| i > 0) else {
        return text.to_string();
    };

    let before = text[..index].trim_end();
    if before.is_empty() || before.ends_with(',') {
        return text.to_string();
    }
    format!("{}, {}", before, &text[index..])
}

/// Insert "," before a conjunction.
///
/// "and" is tried first, then "but", "or" and "so", so the chosen spot is
/// not necessarily the leftmost one. Occurrences that already follow a
/// comma are skipped.
fn insert_comma_before_conjunction(text: &str) -> String {
    let found = re_conjunctions().iter().find_map(|re| {
        re.find_iter(text)
            .map(|m| m.start())
            .find(|&i| i > 0 && !text[..i].ends_with(','))
    });

    match found {
        Some(index) => format!("{},{}", &text[..index], &text[index..]),
        None => text.to_string(),
    }
}

fn add_question_mark(text: &str, fix: &FixText) -> Option<String> {
    let applies = fix.mentions("add question mark")
        || fix.mentions("add ?")
        || fix.mentions("add question");
    if !applies {
        return None;
    }

    if text.is_empty() || text.ends_with('?') {
        return Some(text.to_string());
    }
    let stem = text
        .strip_suffix('.')
        .or_else(|| text.strip_suffix('!'))
        .unwrap_or(text);
    Some(format!("{}?", stem))
}

fn remove_mark(text: &str, fix: &FixText) -> Option<String> {
    if !fix.mentions("remove") {
        return None;
    }

    // The fix sentence's own full stop does not count as mentioning "."
    let instruction = fix.lower.trim_end_matches(['.', '!', '?']);

    if instruction.contains("period") || instruction.contains('.') {
        return Some(text.strip_suffix('.').unwrap_or(text).to_string());
    }

    if instruction.contains("comma") || instruction.contains(',') {
        let removed = if re_all().is_match(instruction) {
            text.replace(',', "")
        } else {
            text.replacen(',', "", 1)
        };
        return Some(removed);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueCategory, Severity};

    fn issue(description: &str, fix: &str) -> Issue {
        Issue {
            line_number: 2,
            category: IssueCategory::Punctuation,
            severity: Severity::Review,
            description: description.to_string(),
            suggested_fix: fix.to_string(),
            confidence: 0.85,
        }
    }

    fn fix(text: &str, suggested_fix: &str) -> String {
        apply_punctuation_fix(text, &issue("Punctuation issue", suggested_fix))
    }

    #[test]
    fn test_apostrophe_with_make_it() {
        assert_eq!(
            fix("A: todays hearing starts now", "Add apostrophe to 'todays' to make it 'today's'"),
            "A: today's hearing starts now"
        );
    }

    #[test]
    fn test_add_period_at_end() {
        assert_eq!(fix("he said yes", "Add period at end"), "he said yes.");
        assert_eq!(fix("he said yes.", "Add period at end"), "he said yes.");
        assert_eq!(fix("he said yes!", "Add period at the end."), "he said yes!");
        assert_eq!(fix("", "Add period at end"), "");
    }

    #[test]
    fn test_add_comma_before_named_word() {
        assert_eq!(
            fix("I tried but it failed", "Add comma before 'but'."),
            "I tried, but it failed"
        );
        assert_eq!(
            fix("I tried, but it failed", "Add comma before 'but'."),
            "I tried, but it failed"
        );
    }

    #[test]
    fn test_add_comma_before_named_word_unquoted() {
        assert_eq!(
            fix("Well however we go", "Add comma before however"),
            "Well, however we go"
        );
    }

    #[test]
    fn test_add_comma_before_conjunction() {
        assert_eq!(fix("yes and no", "Add comma."), "yes, and no");
        assert_eq!(fix("yes, and no", "Add comma."), "yes, and no");
        assert_eq!(fix("sand dunes", "Add comma."), "sand dunes");
    }

    #[test]
    fn test_add_comma_tries_conjunctions_in_order() {
        assert_eq!(fix("go or stay but decide", "Add comma."), "go or stay, but decide");
        assert_eq!(fix("so we left and ate", "Add comma."), "so we left, and ate");
        assert_eq!(fix("yes, and no but maybe", "Add comma."), "yes, and no, but maybe");
        assert_eq!(fix("a, and b and c", "Add comma."), "a, and b, and c");
    }

    #[test]
    fn test_add_question_mark() {
        assert_eq!(fix("Did you go.", "Add question mark at end."), "Did you go?");
        assert_eq!(fix("Did you go!", "Add question mark."), "Did you go?");
        assert_eq!(fix("Did you go", "Add ? at end"), "Did you go?");
        assert_eq!(fix("Did you go?", "Add question mark."), "Did you go?");
    }

    #[test]
    fn test_remove_period() {
        assert_eq!(fix("Q: Your name.", "Remove period"), "Q: Your name");
        assert_eq!(fix("Q: Your name", "Remove the period."), "Q: Your name");
    }

    #[test]
    fn test_remove_commas() {
        assert_eq!(fix("so, yes, indeed", "Remove comma."), "so yes, indeed");
        assert_eq!(fix("so, yes, indeed", "Remove all commas."), "so yes indeed");
    }

    #[test]
    fn test_unknown_instruction_is_noop() {
        assert_eq!(fix("foo bar baz", "Rephrase for clarity"), "foo bar baz");
        assert_eq!(fix("foo bar baz", "Remove the filler"), "foo bar baz");
    }

    #[test]
    fn test_quoted_rule_without_pair_falls_through() {
        // A lone quote yields no pair, so the comma rule still gets its turn
        assert_eq!(
            fix("we left so it ended", "Add comma before 'so'"),
            "we left, so it ended"
        );
    }
}
