use crate::models::{Issue, Transcript};

/// System prompt for issue detection (non-negotiable constraints)
pub const DETECT_SYSTEM_PROMPT: &str = r#"You are a transcript proofreading assistant. You detect and report issues in transcripts. You MUST NOT rewrite or modify the original text.

RULES:
1. NEVER rewrite or paraphrase the transcript text.
2. ONLY report issues in these categories: punctuation, capitalization, spelling, speaker_formatting (Q/A and speaker labels).
3. suggested_fix MUST be a minimal instruction of at most one sentence, never a rewritten line.
4. line_number MUST be the 1-based line where the issue occurs.
5. Submit your findings with the submit_issues tool.

WRITING FIXES:
- Quote the exact word from the line and its correction, e.g. "'smith' should be 'Smith'" or "Add apostrophe to 'todays' to make it 'today's'".
- For marks at the end of a line say "Add period at end" or "Add question mark at end".
- For commas say "Add comma before 'but'".

SEVERITY:
- blocking: critical errors
- review: should be reviewed
- info: minor suggestions

confidence is your confidence from 0 to 1."#;

/// Build the user prompt for issue detection
pub fn build_detection_prompt(transcript: &Transcript) -> String {
    let mut prompt = String::new();

    prompt.push_str(
        "Please proofread the following transcript and identify any issues. \
         Return only the issues found, with accurate line numbers.\n",
    );
    prompt.push_str(&format!(
        "The transcript has {} lines.\n\n",
        transcript.line_count()
    ));
    prompt.push_str("Transcript:\n");
    prompt.push_str(&transcript.text());

    prompt
}

/// System prompt for applying a single fix to a single line
pub const FIX_SYSTEM_PROMPT: &str = r#"You are a text correction assistant. Apply one specific fix to one line of text.

RULES:
1. Apply ONLY the requested fix. Make no other changes.
2. Preserve all leading and trailing whitespace.
3. Do not rewrite or paraphrase.
4. Reply with ONLY the corrected line text, nothing else."#;

/// Build the user prompt for a per-line fix
pub fn build_fix_prompt(line: &str, issue: &Issue) -> String {
    format!(
        "Please apply the following fix to this line of text.\n\n\
         Line text: \"{}\"\n\n\
         Issue description: {}\n\
         Suggested fix: {}\n\
         Category: {}\n\n\
         Return ONLY the corrected line text. Do not include any explanation or additional text.",
        line, issue.description, issue.suggested_fix, issue.category
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IssueCategory, Severity};

    #[test]
    fn test_detection_prompt_embeds_transcript_verbatim() {
        let transcript = Transcript::new("Q: where were you\n\nA:  at home");
        let prompt = build_detection_prompt(&transcript);

        assert!(prompt.contains("The transcript has 3 lines."));
        assert!(prompt.ends_with("Q: where were you\n\nA:  at home"));
    }

    #[test]
    fn test_fix_prompt_names_issue() {
        let issue = Issue {
            line_number: 1,
            category: IssueCategory::Spelling,
            severity: Severity::Info,
            description: "'hoem' should be 'home'".to_string(),
            suggested_fix: "Fix spelling.".to_string(),
            confidence: 0.6,
        };
        let prompt = build_fix_prompt("went hoem", &issue);

        assert!(prompt.contains("Line text: \"went hoem\""));
        assert!(prompt.contains("Category: spelling"));
        assert!(prompt.contains("Suggested fix: Fix spelling."));
    }
}
