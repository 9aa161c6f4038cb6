use tracing::info;

use crate::error::{ProofreadError, Result};
use crate::llm::{
    build_detection_prompt, parse_detection_response, AnthropicClient, ValidationConfig,
    DETECT_SYSTEM_PROMPT,
};
use crate::models::{Issue, Transcript};

use super::stage0_normalize::normalize_issues;

/// Upstream admission limits for a single transcript
#[derive(Debug, Clone, Copy)]
pub struct InputLimits {
    pub max_lines: usize,
    pub max_chars: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_lines: 1000,
            max_chars: 120_000,
        }
    }
}

impl InputLimits {
    /// Reject transcripts above either limit
    pub fn check(&self, transcript: &Transcript) -> Result<()> {
        let lines = transcript.line_count();
        let chars = transcript.char_count();

        if lines > self.max_lines || chars > self.max_chars {
            return Err(ProofreadError::InputTooLarge {
                lines,
                chars,
                max_lines: self.max_lines,
                max_chars: self.max_chars,
            });
        }
        Ok(())
    }
}

/// Configuration for Stage 1
#[derive(Debug, Clone, Default)]
pub struct DetectConfig {
    pub limits: InputLimits,
    pub validation: ValidationConfig,
}

/// Result of Stage 1 detection
#[derive(Debug, Clone)]
pub struct DetectResult {
    /// Clean issue set, ready for review
    pub issues: Vec<Issue>,
    /// Number of lines the issues were detected against
    pub total_lines: usize,
    /// Issues the detector returned before normalization
    pub raw_count: usize,
}

/// Turn a raw detector payload into a clean issue set
///
/// Schema violations reject the payload outright. Valid payloads go through
/// Stage 0 normalization against the transcript's line count.
pub fn process_detection_response(
    transcript: &Transcript,
    response: serde_json::Value,
    config: &DetectConfig,
) -> Result<DetectResult> {
    let issues = parse_detection_response(response, &config.validation)?;
    let raw_count = issues.len();
    let total_lines = transcript.line_count();

    let normalized = normalize_issues(issues, total_lines);
    info!(
        "Detected {} issues: {} out of range, {} duplicates, {} kept",
        raw_count,
        normalized.out_of_range,
        normalized.duplicates,
        normalized.issues.len()
    );

    Ok(DetectResult {
        issues: normalized.issues,
        total_lines,
        raw_count,
    })
}

/// Execute Stage 1: LLM issue detection
///
/// 1. Check admission limits
/// 2. Call Claude with the transcript, forcing the submit_issues tool
/// 3. Validate the payload strictly
/// 4. Normalize the surviving issues
pub async fn execute_detection(
    client: &AnthropicClient,
    transcript: &Transcript,
    config: &DetectConfig,
) -> Result<DetectResult> {
    config.limits.check(transcript)?;

    info!(
        "Stage 1: Detecting issues in {} lines ({} characters)",
        transcript.line_count(),
        transcript.char_count()
    );

    let prompt = build_detection_prompt(transcript);
    let response = client.send_with_tool(DETECT_SYSTEM_PROMPT, &prompt).await?;

    process_detection_response(transcript, response, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_limits() {
        let limits = InputLimits::default();
        assert!(limits.check(&Transcript::new("one\ntwo")).is_ok());

        let long = vec!["x"; 1001].join("\n");
        let err = limits.check(&Transcript::new(&long)).unwrap_err();
        assert!(matches!(err, ProofreadError::InputTooLarge { lines: 1001, .. }));

        let wide = "x".repeat(120_001);
        assert!(limits.check(&Transcript::new(&wide)).is_err());

        let exact = "x".repeat(120_000);
        assert!(limits.check(&Transcript::new(&exact)).is_ok());
    }

    #[test]
    fn test_process_detection_response() {
        let transcript = Transcript::new("Q: whats your name\nA: john smith");
        let response = json!({
            "issues": [
                {"line_number": 1, "category": "punctuation", "severity": "review",
                 "description": "Missing apostrophe in 'whats'",
                 "suggested_fix": "Add apostrophe to 'whats' to make it 'what's'. Also add a question mark.",
                 "confidence": 0.9},
                {"line_number": 1, "category": "punctuation", "severity": "info",
                 "description": "Missing apostrophe in 'whats'",
                 "suggested_fix": "Duplicate.", "confidence": 0.4},
                {"line_number": 7, "category": "spelling", "severity": "info",
                 "description": "Not a line", "suggested_fix": "Ignore.", "confidence": 0.4}
            ]
        });

        let result = process_detection_response(&transcript, response, &DetectConfig::default())
            .unwrap();

        assert_eq!(result.raw_count, 3);
        assert_eq!(result.total_lines, 2);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(
            result.issues[0].suggested_fix,
            "Add apostrophe to 'whats' to make it 'what's'."
        );
    }

    #[test]
    fn test_malformed_response_is_fatal() {
        let transcript = Transcript::new("line");
        let response = json!({"issues": [{"line_number": 1}]});

        let err = process_detection_response(&transcript, response, &DetectConfig::default())
            .unwrap_err();
        assert!(matches!(err, ProofreadError::MalformedResponse(_)));
    }
}
