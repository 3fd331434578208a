//! Status filter and free-text search over the reconciled list.

use crate::domain::{AnnotatedBug, Bug, StatusFilter};

/// What the viewer narrowed the list to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BugListFilter {
    /// Status filter, initially the viewer's `bugFilterDefault`
    pub status: StatusFilter,

    /// Case-insensitive substring matched against title and description
    pub search: String,
}

impl BugListFilter {
    /// Filter with the given status and no search term
    pub fn with_status(status: StatusFilter) -> Self {
        Self {
            status,
            search: String::new(),
        }
    }

    /// Whether `bug` passes both the status filter and the search term
    pub fn matches(&self, bug: &Bug) -> bool {
        if !self.status.admits(bug.status) {
            return false;
        }
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        bug.title.to_lowercase().contains(&needle)
            || bug.description.to_lowercase().contains(&needle)
    }

    /// The passing part of a snapshot, order preserved
    pub fn apply(&self, bugs: &[AnnotatedBug]) -> Vec<AnnotatedBug> {
        bugs.iter()
            .filter(|annotated| self.matches(&annotated.bug))
            .cloned()
            .collect()
    }
}
