use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::models::{Issue, Transcript};

/// Read a plain-text transcript; lines are kept exactly as written
pub fn read_transcript(path: &Path) -> Result<Transcript> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(Transcript::new(&content))
}

/// Issue files come either wrapped as `{ "issues": [...] }` or as a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IssueFile {
    Wrapped { issues: Vec<Issue> },
    Bare(Vec<Issue>),
}

/// Read an issue file written by `detect` or exported elsewhere
pub fn read_issues(path: &Path) -> Result<Vec<Issue>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    parse_issues_json(&content)
}

/// Parse issue JSON in either accepted layout
pub fn parse_issues_json(json: &str) -> Result<Vec<Issue>> {
    let file: IssueFile = serde_json::from_str(json).context("Failed to parse issues JSON")?;
    Ok(match file {
        IssueFile::Wrapped { issues } => issues,
        IssueFile::Bare(issues) => issues,
    })
}
