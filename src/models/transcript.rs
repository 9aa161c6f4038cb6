/// A line-oriented transcript.
///
/// Lines are split on `\n` only and never trimmed, so `\r`, indentation and
/// empty lines survive a split/join round trip byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn new(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(str::to_string).collect(),
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines (an empty document still has one empty line)
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Character count, as used by the upstream admission limits
    pub fn char_count(&self) -> usize {
        self.lines.iter().map(|l| l.chars().count()).sum::<usize>()
            + self.lines.len().saturating_sub(1)
    }

    /// Get a line by its 1-based number
    pub fn line(&self, line_number: usize) -> Option<&str> {
        line_number
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(String::as_str)
    }

    /// Rejoin the lines with `\n`
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl std::fmt::Display for Transcript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text())
    }
}
