pub mod error;
pub mod heuristics;
pub mod io;
pub mod llm;
pub mod models;
pub mod stages;

pub use error::ProofreadError;
pub use heuristics::{apply_fix_to_line, apply_fixes_to_line, extract_word_pair, WordPair};
pub use io::{
    export_to_csv, export_to_json, export_to_markdown, mark_changes_in_bold, read_issues,
    read_transcript, write_issues_json, write_text,
};
pub use llm::{AnthropicClient, AnthropicConfig};
pub use models::{sort_for_display, AcceptedSet, Issue, IssueCategory, IssueId, Severity, Transcript};
pub use stages::{
    apply_fixes_to_transcript, apply_fixes_with_assistant, deduplicate_issues,
    enforce_fix_constraints, execute_detection, execute_render, normalize_issues,
    validate_line_numbers, DetectConfig, LineFixer, RenderConfig, RenderInput, RenderTargets,
};
