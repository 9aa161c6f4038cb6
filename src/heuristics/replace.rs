use regex::{Captures, Regex};

/// Uppercase the first character, leave the rest untouched
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn starts_uppercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

/// Replace every case-insensitive occurrence of `original` in `text`.
///
/// Whole-word matches are tried first. When there are none, the token is
/// matched anywhere, so "Dr." still matches and "todays" matches inside
/// "todaysession". An uppercase first letter on the matched text carries
/// over to the replacement.
pub fn replace_word(text: &str, original: &str, replacement: &str) -> String {
    if original.is_empty() {
        return text.to_string();
    }

    let escaped = regex::escape(original);
    replace_with(text, &format!(r"(?i)\b{}\b", escaped), replacement)
        .or_else(|| replace_with(text, &format!("(?i){}", escaped), replacement))
        .unwrap_or_else(|| text.to_string())
}

/// Returns None if the pattern does not compile or does not match
fn replace_with(text: &str, pattern: &str, replacement: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    if !re.is_match(text) {
        return None;
    }

    let replaced = re.replace_all(text, |caps: &Captures| {
        if starts_uppercase(&caps[0]) {
            capitalize_first(replacement)
        } else {
            replacement.to_string()
        }
    });
    Some(replaced.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("smith went"), "Smith went");
        assert_eq!(capitalize_first("éclair"), "Éclair");
        assert_eq!(capitalize_first("iPHONE"), "IPHONE");
        assert_eq!(capitalize_first(""), "");
    }

    #[test]
    fn test_replace_whole_word_all_occurrences() {
        assert_eq!(
            replace_word("todays plan and todays weather", "todays", "today's"),
            "today's plan and today's weather"
        );
    }

    #[test]
    fn test_replace_transfers_leading_capital_only() {
        assert_eq!(
            replace_word("Todays news, todays views", "todays", "today's"),
            "Today's news, today's views"
        );
        // The rest of the replacement is used as given
        assert_eq!(replace_word("Nasa said", "nasa", "NASA"), "NASA said");
    }

    #[test]
    fn test_replace_respects_word_boundaries() {
        // A whole-word match elsewhere on the line keeps "habits" intact
        assert_eq!(
            replace_word("habits of its parts", "its", "it's"),
            "habits of it's parts"
        );
    }

    #[test]
    fn test_replace_inside_word_when_no_whole_word_match() {
        assert_eq!(
            replace_word("the todaysession started", "todays", "today's"),
            "the today'ssession started"
        );
        assert_eq!(replace_word("Imagine, Im_here", "Im", "I'm"), "I'magine, I'm_here");
        assert_eq!(replace_word("habits", "its", "it's"), "habit's");
    }

    #[test]
    fn test_replace_punctuated_token_without_boundary() {
        assert_eq!(replace_word("ask dr. jones", "dr.", "Dr."), "ask Dr. jones");
    }

    #[test]
    fn test_replace_special_characters_are_literal() {
        assert_eq!(replace_word("cost (approx) 5", "(approx)", "(approx.)"), "cost (approx.) 5");
        assert_eq!(replace_word("a+b", "a.b", "x"), "a+b");
    }

    #[test]
    fn test_replace_missing_word_is_noop() {
        assert_eq!(replace_word("nothing here", "smith", "Smith"), "nothing here");
        assert_eq!(replace_word("", "smith", "Smith"), "");
        assert_eq!(replace_word("text", "", "x"), "text");
    }
}
