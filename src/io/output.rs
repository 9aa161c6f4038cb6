use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::Issue;

const CSV_HEADERS: [&str; 6] = [
    "line_number",
    "category",
    "severity",
    "description",
    "suggested_fix",
    "confidence",
];

/// Issue file layout shared by `detect` output and the JSON export
#[derive(Debug, Serialize)]
struct IssueExport<'a> {
    issues: &'a [Issue],
}

/// Render issues as pretty-printed `{ "issues": [...] }`
pub fn export_to_json(issues: &[Issue]) -> Result<String> {
    serde_json::to_string_pretty(&IssueExport { issues }).context("Failed to serialize issues")
}

/// Quote a CSV field if it contains a comma, quote or newline
fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render issues as CSV, one row per issue under a fixed header row
pub fn export_to_csv(issues: &[Issue]) -> String {
    let mut rows = Vec::with_capacity(issues.len() + 1);
    rows.push(CSV_HEADERS.join(","));

    for issue in issues {
        let row = [
            issue.line_number.to_string(),
            escape_csv(issue.category.as_str()),
            escape_csv(issue.severity.as_str()),
            escape_csv(&issue.description),
            escape_csv(&issue.suggested_fix),
            issue.confidence.to_string(),
        ];
        rows.push(row.join(","));
    }

    rows.join("\n")
}

/// Write text content to a file
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {:?}", path))?;
    Ok(())
}

/// Write issues to a JSON file in the `{ "issues": [...] }` layout
pub fn write_issues_json(path: &Path, issues: &[Issue]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create file: {:?}", path))?;
    serde_json::to_writer_pretty(file, &IssueExport { issues }).context("Failed to write JSON")?;
    Ok(())
}
