use std::collections::{BTreeMap, HashSet};

use super::{Issue, IssueId};

/// Reviewer-approved issues, tracked by issue identity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptedSet {
    ids: HashSet<IssueId>,
}

impl AcceptedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept every issue in the slice
    pub fn all(issues: &[Issue]) -> Self {
        Self {
            ids: issues.iter().map(Issue::id).collect(),
        }
    }

    /// Returns true if the issue was not already accepted
    pub fn accept(&mut self, issue: &Issue) -> bool {
        self.ids.insert(issue.id())
    }

    /// Returns true if the issue had been accepted
    pub fn reject(&mut self, issue: &Issue) -> bool {
        self.ids.remove(&issue.id())
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, issue: &Issue) -> bool {
        self.ids.contains(&issue.id())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Accepted issues grouped by line number, keeping their given order within a line
    pub fn group_by_line<'a>(&self, issues: &'a [Issue]) -> BTreeMap<usize, Vec<&'a Issue>> {
        let mut by_line: BTreeMap<usize, Vec<&Issue>> = BTreeMap::new();
        for issue in issues.iter().filter(|i| self.contains(i)) {
            by_line.entry(issue.line_number).or_default().push(issue);
        }
        by_line
    }
}
