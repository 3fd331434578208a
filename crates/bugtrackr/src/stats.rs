//! Summary counts over a set of bugs.

use crate::domain::{Bug, BugStatus, Priority};
use serde::Serialize;

/// Counts shown on the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BugStats {
    /// All bugs
    pub total: usize,

    /// Open bugs
    pub open: usize,

    /// Resolved bugs
    pub resolved: usize,

    /// High-priority bugs, any status
    pub high_priority: usize,
}

impl BugStats {
    /// Count a set of bugs
    pub fn from_bugs<'a>(bugs: impl IntoIterator<Item = &'a Bug>) -> Self {
        bugs.into_iter().fold(Self::default(), |mut stats, bug| {
            stats.total += 1;
            match bug.status {
                BugStatus::Open => stats.open += 1,
                BugStatus::Resolved => stats.resolved += 1,
            }
            if bug.priority == Priority::High {
                stats.high_priority += 1;
            }
            stats
        })
    }
}
