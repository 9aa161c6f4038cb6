use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::io::{export_to_csv, export_to_json, export_to_markdown, write_text};
use crate::models::{AcceptedSet, Issue, Transcript};

/// Configuration for Stage 3 rendering
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Whether to write the corrected transcript text
    pub write_corrected: bool,
    /// Whether to write the Markdown review document
    pub write_markdown: bool,
    /// Whether to write the issue list as JSON
    pub write_json: bool,
    /// Whether to write the issue list as CSV
    pub write_csv: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            write_corrected: true,
            write_markdown: true,
            write_json: true,
            write_csv: true,
        }
    }
}

/// Where each output goes; a missing path skips that output
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderTargets<'a> {
    pub corrected: Option<&'a Path>,
    pub markdown: Option<&'a Path>,
    pub json: Option<&'a Path>,
    pub csv: Option<&'a Path>,
}

/// Result of Stage 3 rendering
#[derive(Debug, Default)]
pub struct RenderResult {
    pub corrected_path: Option<PathBuf>,
    pub markdown_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
    pub csv_path: Option<PathBuf>,
}

/// Inputs Stage 3 renders from
pub struct RenderInput<'a> {
    pub original: &'a Transcript,
    pub corrected: &'a Transcript,
    pub issues: &'a [Issue],
    pub accepted: &'a AcceptedSet,
}

fn render_to(
    enabled: bool,
    path: Option<&Path>,
    what: &str,
    render: impl FnOnce() -> Result<String>,
) -> Result<Option<PathBuf>> {
    let Some(path) = path.filter(|_| enabled) else {
        return Ok(None);
    };
    info!("Writing {} to {:?}", what, path);
    write_text(path, &render()?)?;
    Ok(Some(path.to_path_buf()))
}

/// Execute Stage 3: Rendering
///
/// Produces up to four outputs:
/// 1. Corrected transcript: the original lines with accepted fixes applied
/// 2. Markdown: numbered lines with changes in bold and the corrections listed
/// 3. JSON: the issue list as `{ "issues": [...] }`
/// 4. CSV: the issue list, one row per issue
pub fn execute_render(
    input: &RenderInput<'_>,
    targets: &RenderTargets<'_>,
    config: &RenderConfig,
) -> Result<RenderResult> {
    let corrected_path = render_to(
        config.write_corrected,
        targets.corrected,
        "corrected transcript",
        || Ok(input.corrected.text()),
    )?;

    let markdown_path = render_to(config.write_markdown, targets.markdown, "Markdown review", || {
        Ok(export_to_markdown(
            input.original,
            input.corrected,
            input.issues,
            input.accepted,
        ))
    })?;

    let json_path = render_to(config.write_json, targets.json, "issue JSON", || {
        export_to_json(input.issues)
    })?;

    let csv_path = render_to(config.write_csv, targets.csv, "issue CSV", || {
        Ok(export_to_csv(input.issues))
    })?;

    Ok(RenderResult {
        corrected_path,
        markdown_path,
        json_path,
        csv_path,
    })
}
