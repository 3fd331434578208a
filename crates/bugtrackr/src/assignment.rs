//! Assignee selection.
//!
//! Selection is a pure function of the roster and the filer's choice. The
//! side effects that follow (creating the bug, bumping the counter,
//! notifying) belong to [`BugTracker::submit_bug`](crate::tracker::BugTracker::submit_bug).

use crate::domain::{Identity, RosterEntry, UserId};
use serde::{Deserialize, Serialize};

/// What the filer picked in the assignment control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualChoice {
    /// The self sentinel: keep the bug
    SelfAssign,

    /// A specific roster member
    User(UserId),
}

/// How the assignee is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AssignmentMode {
    /// Least-loaded roster member
    #[default]
    Auto,

    /// The filer's explicit choice
    Manual(ManualChoice),
}

/// Tunables for auto mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AssignmentPolicy {
    /// In auto mode, keep the bug when exactly one other user is on the
    /// roster instead of handing it to that user.
    pub lone_candidate_to_self: bool,
}

impl Default for AssignmentPolicy {
    fn default() -> Self {
        Self {
            lone_candidate_to_self: true,
        }
    }
}

/// The selected assignee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignee {
    /// Assignee uid
    pub uid: UserId,

    /// Address the notification goes to
    pub email: String,

    /// Counter value at selection time (zero for self)
    pub assigned_bug_count: u64,
}

impl Assignee {
    fn myself(identity: &Identity) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            assigned_bug_count: 0,
        }
    }

    fn from_entry(entry: &RosterEntry) -> Self {
        Self {
            uid: entry.uid.clone(),
            email: entry.email.clone(),
            assigned_bug_count: entry.assigned_bug_count,
        }
    }

    /// Whether this is the filer themself
    pub fn is_self(&self, identity: &Identity) -> bool {
        self.uid == identity.uid
    }
}

/// Pick the assignee for a new bug.
///
/// `roster` must not contain the filer; it is scanned in the given order,
/// which decides ties.
///
/// - Manual, self sentinel: the filer.
/// - Manual, uid: that roster member, or the filer when the uid isn't on the
///   roster or its entry has no email.
/// - Auto, exactly one candidate and `lone_candidate_to_self`: the filer.
/// - Auto otherwise: the first candidate with the smallest
///   `assigned_bug_count`, or the filer for an empty roster.
pub fn select_assignee(
    mode: &AssignmentMode,
    roster: &[RosterEntry],
    filer: &Identity,
    policy: AssignmentPolicy,
) -> Assignee {
    match mode {
        AssignmentMode::Manual(ManualChoice::SelfAssign) => Assignee::myself(filer),
        AssignmentMode::Manual(ManualChoice::User(uid)) => roster
            .iter()
            .find(|entry| &entry.uid == uid && !entry.email.trim().is_empty())
            .map_or_else(|| Assignee::myself(filer), Assignee::from_entry),
        AssignmentMode::Auto => {
            if roster.len() == 1 && policy.lone_candidate_to_self {
                return Assignee::myself(filer);
            }
            // min_by_key returns the first of equal minima
            roster
                .iter()
                .min_by_key(|entry| entry.assigned_bug_count)
                .map_or_else(|| Assignee::myself(filer), Assignee::from_entry)
        }
    }
}

/// Drop the filer from a full roster listing.
pub fn roster_excluding(roster: Vec<RosterEntry>, uid: &UserId) -> Vec<RosterEntry> {
    roster.into_iter().filter(|entry| &entry.uid != uid).collect()
}
