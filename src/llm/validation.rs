use serde::Deserialize;

use crate::error::{ProofreadError, Result};
use crate::models::{Issue, IssueCategory, Severity};

/// Configuration for detection response validation
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    /// Longest suggested_fix accepted, in characters
    pub max_fix_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { max_fix_chars: 200 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResponse {
    issues: Vec<RawIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIssue {
    line_number: i64,
    category: IssueCategory,
    severity: Severity,
    description: String,
    suggested_fix: String,
    confidence: f64,
}

fn malformed(index: usize, field: &str, problem: &str) -> ProofreadError {
    ProofreadError::MalformedResponse(format!("issues[{}].{}: {}", index, field, problem))
}

/// Validate a detection response against the issue schema.
///
/// Any deviation rejects the whole response; no partial list is returned.
pub fn parse_detection_response(
    value: serde_json::Value,
    config: &ValidationConfig,
) -> Result<Vec<Issue>> {
    let raw: RawResponse = serde_json::from_value(value)
        .map_err(|e| ProofreadError::MalformedResponse(e.to_string()))?;

    raw.issues
        .into_iter()
        .enumerate()
        .map(|(index, issue)| validate_issue(index, issue, config))
        .collect()
}

fn validate_issue(index: usize, raw: RawIssue, config: &ValidationConfig) -> Result<Issue> {
    let line_number = usize::try_from(raw.line_number)
        .ok()
        .filter(|&n| n >= 1)
        .ok_or_else(|| malformed(index, "line_number", "must be a positive integer"))?;

    if !raw.category.is_known() {
        return Err(malformed(index, "category", "not a known category"));
    }

    if raw.description.trim().is_empty() {
        return Err(malformed(index, "description", "must not be empty"));
    }

    if raw.suggested_fix.trim().is_empty() {
        return Err(malformed(index, "suggested_fix", "must not be empty"));
    }
    if raw.suggested_fix.chars().count() > config.max_fix_chars {
        return Err(malformed(
            index,
            "suggested_fix",
            &format!("longer than {} characters", config.max_fix_chars),
        ));
    }

    if !(0.0..=1.0).contains(&raw.confidence) {
        return Err(malformed(index, "confidence", "must be between 0 and 1"));
    }

    Ok(Issue {
        line_number,
        category: raw.category,
        severity: raw.severity,
        description: raw.description,
        suggested_fix: raw.suggested_fix,
        confidence: raw.confidence,
    })
}
