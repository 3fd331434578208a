//! Merging the "filed by me" and "assigned to me" live queries.
//!
//! The two subscriptions deliver their batches independently and in no
//! particular order relative to each other. [`LiveListReconciler`] owns the
//! merged map and applies each change according to its source:
//!
//! | source   | added / modified                               | removed                  |
//! |----------|------------------------------------------------|--------------------------|
//! | filer    | upsert fields, keep `assigned` (false if new)  | drop the entry           |
//! | assignee | insert with `assigned = true`, or set the flag | clear `assigned`, keep   |
//!
//! A filer removal wins even if the assignee subscription still lists the
//! bug. Assignee events never rewrite the fields of a bug already in the
//! map; only the filer subscription does.

use crate::domain::{AnnotatedBug, Bug, BugChange, BugId, BugStatus, ChangeType, newest_first};
use std::collections::HashMap;

/// Which live query a change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionSource {
    /// Bugs the viewer filed
    Filer,

    /// Bugs assigned to the viewer
    Assignee,
}

#[derive(Debug, Clone)]
struct Entry {
    bug: Bug,
    assigned: bool,
}

/// Owner of one viewer's merged bug map.
#[derive(Debug, Default)]
pub struct LiveListReconciler {
    entries: HashMap<BugId, Entry>,
}

impl LiveListReconciler {
    /// Create an empty reconciler
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one change from `source`.
    pub fn apply_change(&mut self, source: SubscriptionSource, change_type: ChangeType, bug: Bug) {
        match (source, change_type) {
            (SubscriptionSource::Filer, ChangeType::Added | ChangeType::Modified) => {
                match self.entries.get_mut(&bug.id) {
                    Some(entry) => entry.bug = bug,
                    None => {
                        self.entries.insert(
                            bug.id.clone(),
                            Entry {
                                bug,
                                assigned: false,
                            },
                        );
                    }
                }
            }
            (SubscriptionSource::Filer, ChangeType::Removed) => {
                self.entries.remove(&bug.id);
            }
            (SubscriptionSource::Assignee, ChangeType::Added | ChangeType::Modified) => {
                match self.entries.get_mut(&bug.id) {
                    Some(entry) => entry.assigned = true,
                    None => {
                        self.entries.insert(
                            bug.id.clone(),
                            Entry {
                                bug,
                                assigned: true,
                            },
                        );
                    }
                }
            }
            (SubscriptionSource::Assignee, ChangeType::Removed) => {
                if let Some(entry) = self.entries.get_mut(&bug.id) {
                    entry.assigned = false;
                }
            }
        }
    }

    /// Apply a whole batch from one subscription, in order.
    pub fn apply_batch(
        &mut self,
        source: SubscriptionSource,
        changes: impl IntoIterator<Item = BugChange>,
    ) {
        for change in changes {
            self.apply_change(source, change.change_type, change.bug);
        }
    }

    /// Optimistically mark a bug resolved. Returns `false` if it isn't in the
    /// map. The next store event for the bug overwrites this.
    pub fn resolve_locally(&mut self, id: &BugId) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.bug.status = BugStatus::Resolved;
                true
            }
            None => false,
        }
    }

    /// Optimistically drop a bug, returning it if it was present.
    pub fn remove_locally(&mut self, id: &BugId) -> Option<Bug> {
        self.entries.remove(id).map(|entry| entry.bug)
    }

    /// Materialize the map, newest first.
    pub fn snapshot(&self) -> Vec<AnnotatedBug> {
        let mut bugs: Vec<AnnotatedBug> = self
            .entries
            .values()
            .map(|entry| AnnotatedBug {
                bug: entry.bug.clone(),
                assigned: entry.assigned,
            })
            .collect();
        bugs.sort_by(|a, b| newest_first(&a.bug, &b.bug));
        bugs
    }

    /// Look up one bug
    pub fn get(&self, id: &BugId) -> Option<AnnotatedBug> {
        self.entries.get(id).map(|entry| AnnotatedBug {
            bug: entry.bug.clone(),
            assigned: entry.assigned,
        })
    }

    /// Number of bugs in the map
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
