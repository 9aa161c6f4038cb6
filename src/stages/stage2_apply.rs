use anyhow::Result;
use tracing::{debug, info, warn};

use crate::heuristics::{apply_fix_to_line, apply_fixes_to_line};
use crate::llm::{build_fix_prompt, AnthropicClient, FIX_SYSTEM_PROMPT};
use crate::models::{AcceptedSet, Issue, IssueCategory, Transcript};

/// Execute Stage 2: apply accepted fixes with the heuristic engine
///
/// Always starts from the original lines, so applying the same accepted set
/// twice gives the same transcript. Lines without accepted issues, and
/// issues pointing past the end, leave the transcript untouched.
pub fn apply_fixes_to_transcript(
    transcript: &Transcript,
    issues: &[Issue],
    accepted: &AcceptedSet,
) -> Transcript {
    if accepted.is_empty() {
        return transcript.clone();
    }

    let by_line = accepted.group_by_line(issues);
    info!(
        "Stage 2: Applying {} accepted issues across {} lines",
        by_line.values().map(Vec::len).sum::<usize>(),
        by_line.len()
    );

    let lines = transcript
        .lines()
        .iter()
        .enumerate()
        .map(|(index, line)| match by_line.get(&(index + 1)) {
            Some(line_issues) => apply_fixes_to_line(line, line_issues.iter().copied()),
            None => line.clone(),
        })
        .collect();

    Transcript::from_lines(lines)
}

/// Delegate that applies one fix to one line, e.g. a language model
#[allow(async_fn_in_trait)]
pub trait LineFixer {
    async fn fix_line(&self, line: &str, issue: &Issue) -> Result<String>;
}

impl LineFixer for AnthropicClient {
    async fn fix_line(&self, line: &str, issue: &Issue) -> Result<String> {
        let prompt = build_fix_prompt(line, issue);
        let reply = self.send_message(FIX_SYSTEM_PROMPT, &prompt).await?;
        clean_fix_reply(line, &reply)
    }
}

/// Trim the model's reply, drop quotes it echoed from the prompt, and put
/// the line's own edge whitespace back
fn clean_fix_reply(line: &str, reply: &str) -> Result<String> {
    let body = line.trim();
    if body.is_empty() {
        return Ok(line.to_string());
    }

    let mut corrected = reply.trim();
    let echoed_quotes = corrected.len() >= 2
        && corrected.starts_with('"')
        && corrected.ends_with('"')
        && !(body.starts_with('"') && body.ends_with('"'));
    if echoed_quotes {
        corrected = corrected[1..corrected.len() - 1].trim();
    }

    if corrected.is_empty() {
        anyhow::bail!("No corrected line returned from model");
    }

    let leading = &line[..line.len() - line.trim_start().len()];
    let trailing = &line[line.trim_end().len()..];
    Ok(format!("{}{}{}", leading, corrected, trailing))
}

/// Result of an assisted Stage 2 run
#[derive(Debug, Clone)]
pub struct AssistedApplyResult {
    pub transcript: Transcript,
    /// Fix steps where the delegate failed and the heuristic engine was used
    pub fallbacks: usize,
    /// Fix steps the delegate handled
    pub delegated: usize,
}

/// Execute Stage 2 with a delegate applying each fix
///
/// Steps run strictly one after another, in line order and then issue order,
/// because later fixes on a line must see earlier results. A failed step
/// falls back to the heuristic engine for that step only. Speaker-formatting
/// issues are never sent.
pub async fn apply_fixes_with_assistant<F: LineFixer>(
    fixer: &F,
    transcript: &Transcript,
    issues: &[Issue],
    accepted: &AcceptedSet,
) -> AssistedApplyResult {
    let mut result = AssistedApplyResult {
        transcript: transcript.clone(),
        fallbacks: 0,
        delegated: 0,
    };
    if accepted.is_empty() {
        return result;
    }

    let by_line = accepted.group_by_line(issues);
    let mut lines = transcript.lines().to_vec();

    for (line_number, line_issues) in by_line {
        let Some(slot) = line_number.checked_sub(1).and_then(|i| lines.get_mut(i)) else {
            continue;
        };

        let mut current = slot.clone();
        for issue in line_issues {
            if issue.category == IssueCategory::SpeakerFormatting {
                continue;
            }
            current = match fixer.fix_line(&current, issue).await {
                Ok(corrected) => {
                    debug!("Line {}: delegate applied fix", line_number);
                    result.delegated += 1;
                    corrected
                }
                Err(e) => {
                    warn!(
                        "Line {}: delegate failed ({:#}), using heuristic fix",
                        line_number, e
                    );
                    result.fallbacks += 1;
                    apply_fix_to_line(&current, issue)
                }
            };
        }
        *slot = current;
    }

    info!(
        "Stage 2: {} fixes delegated, {} fell back to heuristics",
        result.delegated, result.fallbacks
    );

    result.transcript = Transcript::from_lines(lines);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use crate::models::Severity;

    fn issue(line: usize, category: IssueCategory, description: &str, fix: &str) -> Issue {
        Issue {
            line_number: line,
            category,
            severity: Severity::Review,
            description: description.to_string(),
            suggested_fix: fix.to_string(),
            confidence: 0.9,
        }
    }

    fn sample() -> (Transcript, Vec<Issue>) {
        let transcript = Transcript::new("Q: smith went hoem\n\n  A: he said yes  \nQ. Next");
        let issues = vec![
            issue(3, IssueCategory::Punctuation, "Missing period", "Add period at end."),
            issue(1, IssueCategory::Capitalization, "'smith' should be 'Smith'", "Capitalize."),
            issue(1, IssueCategory::Spelling, "'hoem' should be 'home'", "Fix spelling."),
            issue(4, IssueCategory::SpeakerFormatting, "'Q.' should be 'Q:'", "Use 'Q:'."),
            issue(9, IssueCategory::Spelling, "'x' should be 'y'", "Out of range."),
        ];
        (transcript, issues)
    }

    #[test]
    fn test_no_accepted_issues_returns_original() {
        let (transcript, issues) = sample();
        let corrected = apply_fixes_to_transcript(&transcript, &issues, &AcceptedSet::new());
        assert_eq!(corrected, transcript);
    }

    #[test]
    fn test_apply_accepted_only() {
        let (transcript, issues) = sample();
        let mut accepted = AcceptedSet::new();
        accepted.accept(&issues[0]);
        accepted.accept(&issues[2]);

        let corrected = apply_fixes_to_transcript(&transcript, &issues, &accepted);

        assert_eq!(
            corrected.text(),
            "Q: smith went home\n\n  A: he said yes.  \nQ. Next"
        );
    }

    #[test]
    fn test_apply_all_preserves_shape() {
        let (transcript, issues) = sample();
        let accepted = AcceptedSet::all(&issues);

        let corrected = apply_fixes_to_transcript(&transcript, &issues, &accepted);

        assert_eq!(corrected.line_count(), transcript.line_count());
        assert_eq!(
            corrected.text(),
            "Q: Smith went home\n\n  A: he said yes.  \nQ. Next"
        );
    }

    #[test]
    fn test_replays_from_original() {
        let (transcript, issues) = sample();
        let accepted = AcceptedSet::all(&issues);

        let once = apply_fixes_to_transcript(&transcript, &issues, &accepted);
        let again = apply_fixes_to_transcript(&transcript, &issues, &accepted);
        assert_eq!(once, again);

        // Rejecting an issue later recomputes from the original lines
        let mut fewer = accepted.clone();
        fewer.reject(&issues[1]);
        let recomputed = apply_fixes_to_transcript(&transcript, &issues, &fewer);
        assert_eq!(recomputed.line(1), Some("Q: smith went home"));
    }

    #[test]
    fn test_issue_order_within_line_is_kept() {
        let transcript = Transcript::new("did you go");
        let issues = vec![
            issue(1, IssueCategory::Punctuation, "Not a statement", "Add question mark at end."),
            issue(1, IssueCategory::Punctuation, "Missing period", "Add period at end."),
        ];
        let accepted = AcceptedSet::all(&issues);

        let corrected = apply_fixes_to_transcript(&transcript, &issues, &accepted);
        assert_eq!(corrected.text(), "did you go?");
    }

    struct UppercaseFixer;

    impl LineFixer for UppercaseFixer {
        async fn fix_line(&self, line: &str, _issue: &Issue) -> Result<String> {
            Ok(line.to_uppercase())
        }
    }

    struct FailingFixer {
        calls: RefCell<Vec<String>>,
    }

    impl LineFixer for FailingFixer {
        async fn fix_line(&self, line: &str, _issue: &Issue) -> Result<String> {
            self.calls.borrow_mut().push(line.to_string());
            anyhow::bail!("service unavailable")
        }
    }

    #[tokio::test]
    async fn test_assistant_applies_in_order() {
        let (transcript, issues) = sample();
        let mut accepted = AcceptedSet::new();
        accepted.accept(&issues[1]);

        let result = apply_fixes_with_assistant(&UppercaseFixer, &transcript, &issues, &accepted).await;

        assert_eq!(result.delegated, 1);
        assert_eq!(result.fallbacks, 0);
        assert_eq!(result.transcript.line(1), Some("Q: SMITH WENT HOEM"));
        assert_eq!(result.transcript.line(3), Some("  A: he said yes  "));
    }

    #[tokio::test]
    async fn test_assistant_failure_falls_back_to_heuristics() {
        let (transcript, issues) = sample();
        let accepted = AcceptedSet::all(&issues);
        let fixer = FailingFixer {
            calls: RefCell::new(Vec::new()),
        };

        let result = apply_fixes_with_assistant(&fixer, &transcript, &issues, &accepted).await;
        let expected = apply_fixes_to_transcript(&transcript, &issues, &accepted);

        assert_eq!(result.transcript, expected);
        assert_eq!(result.delegated, 0);
        // Speaker formatting and the out-of-range issue on line 9 are never sent
        assert_eq!(result.fallbacks, 3);

        // Second fix on line 1 saw the heuristic result of the first
        let calls = fixer.calls.borrow();
        assert_eq!(calls[0], "Q: smith went hoem");
        assert_eq!(calls[1], "Q: Smith went hoem");
    }

    #[test]
    fn test_clean_fix_reply() {
        assert_eq!(clean_fix_reply("  he said yes ", "he said yes.\n").unwrap(), "  he said yes. ");
        assert_eq!(clean_fix_reply("he said yes", "\"he said yes.\"").unwrap(), "he said yes.");
        assert_eq!(clean_fix_reply("\"quoted\"", "\"quoted.\"").unwrap(), "\"quoted.\"");
        assert!(clean_fix_reply("text", "   ").is_err());
        assert_eq!(clean_fix_reply("   ", "").unwrap(), "   ");
    }
}
