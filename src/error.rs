use thiserror::Error;

/// Errors surfaced to callers of a proofreading pass.
///
/// Heuristic misses are not errors: a fix that cannot be interpreted leaves the
/// line unchanged.
#[derive(Debug, Error)]
pub enum ProofreadError {
    #[error(
        "Transcript exceeds admission limits: {lines} lines / {chars} characters (max {max_lines} lines, {max_chars} characters)"
    )]
    InputTooLarge {
        lines: usize,
        chars: usize,
        max_lines: usize,
        max_chars: usize,
    },

    /// The detector answered, but not with something matching the issue schema
    #[error("Invalid response format from detection service: {0}")]
    MalformedResponse(String),

    #[error("Detection service error: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ProofreadError>;
