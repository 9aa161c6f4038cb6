use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::models::{Issue, IssueCategory};

use super::replace::capitalize_first;

/// An (original, corrected) token pair mined from an issue's text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPair {
    pub original: String,
    pub corrected: String,
}

impl WordPair {
    /// Build a pair only if the tokens differ case-insensitively
    pub fn distinct(original: &str, corrected: &str) -> Option<Self> {
        if original.to_lowercase() == corrected.to_lowercase() {
            return None;
        }
        Some(Self {
            original: original.to_string(),
            corrected: corrected.to_string(),
        })
    }
}

/// A quoted substring and the byte span of the quotes around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotedToken<'a> {
    /// Inner text, trimmed
    pub text: &'a str,
    /// Byte offset of the opening quote
    pub start: usize,
    /// Byte offset just past the closing quote
    pub end: usize,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum QuoteKind {
    Single,
    Double,
}

/// Find all quoted substrings in `text`, in order.
///
/// A single quote preceded by a letter or digit is an apostrophe, not an
/// opening quote, and a single quote followed by a letter or digit does not
/// close, so `'today's'` yields `today's`.
pub fn quoted_tokens(text: &str) -> Vec<QuotedToken<'_>> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        let kind = match c {
            '\'' | '\u{2018}' => QuoteKind::Single,
            '"' | '\u{201C}' => QuoteKind::Double,
            _ => {
                i += 1;
                continue;
            }
        };

        if c == '\'' && i > 0 && chars[i - 1].1.is_alphanumeric() {
            i += 1;
            continue;
        }

        let close = (i + 1..chars.len()).find(|&j| {
            let d = chars[j].1;
            match kind {
                QuoteKind::Double => d == '"' || d == '\u{201D}',
                QuoteKind::Single => {
                    (d == '\'' || d == '\u{2019}')
                        && !chars.get(j + 1).is_some_and(|(_, n)| n.is_alphanumeric())
                }
            }
        });

        match close {
            Some(j) => {
                let (close_at, close_char) = chars[j];
                let inner = text[start + c.len_utf8()..close_at].trim();
                if !inner.is_empty() {
                    tokens.push(QuotedToken {
                        text: inner,
                        start,
                        end: close_at + close_char.len_utf8(),
                    });
                }
                i = j + 1;
            }
            None => i += 1,
        }
    }

    tokens
}

fn re_should_be_between() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*should\s+be\s+(?:capitalized\s+as\s+)?$").unwrap()
    })
}

fn re_to_make_it() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bto\s+make\s+it\b").unwrap())
}

type Strategy = fn(&Issue) -> Option<WordPair>;

/// Extraction strategies, tried in order; the first pair found wins
const STRATEGIES: [(&str, Strategy); 5] = [
    ("should_be_description", should_be_in_description),
    ("should_be_fix", should_be_in_fix),
    ("to_make_it", to_make_it),
    ("quoted_fallback", quoted_fallback),
    ("capitalize_single", capitalize_single),
];

/// Derive an (original, corrected) pair from an issue's description and fix text
pub fn extract_word_pair(issue: &Issue) -> Option<WordPair> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let pair = strategy(issue)?;
        debug!(
            strategy = *name,
            "Word pair '{}' -> '{}'", pair.original, pair.corrected
        );
        Some(pair)
    })
}

/// `'X' should be [capitalized as] 'Y'` with the two quotes adjacent
fn should_be_pair(text: &str) -> Option<WordPair> {
    let tokens = quoted_tokens(text);
    tokens.windows(2).find_map(|pair| {
        let between = &text[pair[0].end..pair[1].start];
        if re_should_be_between().is_match(between) {
            WordPair::distinct(pair[0].text, pair[1].text)
        } else {
            None
        }
    })
}

fn should_be_in_description(issue: &Issue) -> Option<WordPair> {
    should_be_pair(&issue.description)
}

fn should_be_in_fix(issue: &Issue) -> Option<WordPair> {
    should_be_pair(&issue.suggested_fix)
}

/// `... 'X' to make it 'Y'`: Y is the quote right after the phrase, X the
/// nearest quote before it
fn to_make_it_pair(text: &str) -> Option<WordPair> {
    let phrase = re_to_make_it().find(text)?;
    let tokens = quoted_tokens(text);

    let corrected = tokens
        .iter()
        .find(|t| t.start >= phrase.end() && text[phrase.end()..t.start].trim().is_empty())?;
    let original = tokens.iter().rev().find(|t| t.end <= phrase.start())?;

    WordPair::distinct(original.text, corrected.text)
}

fn to_make_it(issue: &Issue) -> Option<WordPair> {
    to_make_it_pair(&issue.description).or_else(|| to_make_it_pair(&issue.suggested_fix))
}

/// Push tokens not yet present, comparing case-insensitively
fn push_distinct<'a>(into: &mut Vec<&'a str>, tokens: &[QuotedToken<'a>]) {
    for token in tokens {
        let lower = token.text.to_lowercase();
        if !into.iter().any(|t| t.to_lowercase() == lower) {
            into.push(token.text);
        }
    }
}

/// Distinct quoted tokens of description then fix, in order of appearance
fn combined_tokens(issue: &Issue) -> Vec<&str> {
    let mut combined = Vec::new();
    push_distinct(&mut combined, &quoted_tokens(&issue.description));
    push_distinct(&mut combined, &quoted_tokens(&issue.suggested_fix));
    combined
}

/// First and last quoted tokens, preferring the fix text when it quotes two.
///
/// Approximate: a description quoting unrelated examples can yield the wrong pair.
fn quoted_fallback(issue: &Issue) -> Option<WordPair> {
    let mut from_fix = Vec::new();
    push_distinct(&mut from_fix, &quoted_tokens(&issue.suggested_fix));

    let tokens = if from_fix.len() >= 2 {
        from_fix
    } else {
        combined_tokens(issue)
    };

    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) if tokens.len() >= 2 => WordPair::distinct(first, last),
        _ => None,
    }
}

/// Capitalization issue quoting one lowercase word: capitalize it
fn capitalize_single(issue: &Issue) -> Option<WordPair> {
    if issue.category != IssueCategory::Capitalization {
        return None;
    }

    let tokens = combined_tokens(issue);
    let [token] = tokens.as_slice() else {
        return None;
    };
    if !token.chars().next().is_some_and(char::is_lowercase) {
        return None;
    }

    Some(WordPair {
        original: token.to_string(),
        corrected: capitalize_first(token),
    })
}
