use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue category - restricted set the detector is allowed to report
///
/// Stored on the wire as its snake_case name. Any other name is kept as is
/// in `Unknown`, so loading and re-exporting an issue file round-trips it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum IssueCategory {
    /// Missing or wrong punctuation (periods, commas, apostrophes, question marks)
    Punctuation,
    /// Proper nouns, sentence starts
    Capitalization,
    /// Misspelled words
    Spelling,
    /// Q/A and speaker label consistency
    SpeakerFormatting,
    /// Anything else found in an issue file; never accepted from the detector
    Unknown(String),
}

impl IssueCategory {
    pub fn as_str(&self) -> &str {
        match self {
            IssueCategory::Punctuation => "punctuation",
            IssueCategory::Capitalization => "capitalization",
            IssueCategory::Spelling => "spelling",
            IssueCategory::SpeakerFormatting => "speaker_formatting",
            IssueCategory::Unknown(name) => name.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, IssueCategory::Unknown(_))
    }

    /// Categories the detector may report
    pub const DETECTABLE: [IssueCategory; 4] = [
        IssueCategory::Punctuation,
        IssueCategory::Capitalization,
        IssueCategory::Spelling,
        IssueCategory::SpeakerFormatting,
    ];
}

impl From<String> for IssueCategory {
    fn from(name: String) -> Self {
        match name.as_str() {
            "punctuation" => IssueCategory::Punctuation,
            "capitalization" => IssueCategory::Capitalization,
            "spelling" => IssueCategory::Spelling,
            "speaker_formatting" => IssueCategory::SpeakerFormatting,
            _ => IssueCategory::Unknown(name),
        }
    }
}

impl From<IssueCategory> for String {
    fn from(category: IssueCategory) -> Self {
        match category {
            IssueCategory::Unknown(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an issue. Only used for display ordering, never for fix application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Blocking,
    Review,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Blocking => "blocking",
            Severity::Review => "review",
            Severity::Info => "info",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Severity::Blocking => 2,
            Severity::Review => 1,
            Severity::Info => 0,
        }
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// blocking > review > info
impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected transcript problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// 1-based line number in the transcript the issue was detected against
    pub line_number: usize,
    pub category: IssueCategory,
    pub severity: Severity,
    /// Free text explaining the problem; may quote the offending word
    pub description: String,
    /// Minimal instruction, at most one sentence (e.g. "Add period at end.")
    pub suggested_fix: String,
    /// Detector confidence (0-1)
    pub confidence: f64,
}

impl Issue {
    /// Logical identity used for deduplication and acceptance tracking
    pub fn id(&self) -> IssueId {
        IssueId {
            line_number: self.line_number,
            category: self.category.clone(),
            description: self.description.clone(),
        }
    }
}

/// Identity of an issue: (line_number, category, description).
///
/// Severity, confidence and suggested_fix do not take part, so two issues that
/// only differ there are the same issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IssueId {
    pub line_number: usize,
    pub category: IssueCategory,
    pub description: String,
}

/// Renders as `line_number:category:description`
impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.line_number, self.category, self.description)
    }
}

/// Sort issues for display: most severe first, then by line.
pub fn sort_for_display(issues: &mut [Issue]) {
    issues.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then(a.line_number.cmp(&b.line_number))
    });
}
