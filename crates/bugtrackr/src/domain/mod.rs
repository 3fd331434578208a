//! Domain types for bug tracking.
//!
//! This module contains the records stored in the document store (bugs,
//! roster entries, preferences) and the derived values computed from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

mod legacy;

pub use legacy::{LegacyStatus, Migration, StoredBug};

/// Maximum length for bug titles (in characters).
pub const MAX_TITLE_LENGTH: usize = 200;

/// Role label given to users that sign in for the first time.
pub const DEFAULT_ROLE: &str = "Developer";

/// Unique identifier for a bug, assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BugId(String);

impl BugId {
    /// Create a new bug ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BugId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for BugId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stable user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// The two fields the identity provider hands us after sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier
    pub uid: UserId,

    /// Contact address
    pub email: String,
}

impl Identity {
    /// Create an identity from a uid and email
    pub fn new(uid: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

/// Bug priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait
    Low,

    /// Normal priority
    #[default]
    Medium,

    /// Needs attention soon
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Medium => f.write_str("medium"),
            Self::High => f.write_str("high"),
        }
    }
}

/// Bug status.
///
/// Older records may carry `in-progress` or `closed`; those are migrated on
/// load (see [`LegacyStatus`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BugStatus {
    /// Reported and not yet fixed
    #[default]
    Open,

    /// Fixed or otherwise dealt with
    Resolved,
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => f.write_str("open"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// A bug report as stored in the `bugs` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    /// Store-assigned identifier
    pub id: BugId,

    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Priority level
    pub priority: Priority,

    /// Current status
    pub status: BugStatus,

    /// Server-assigned creation time
    pub created_at: DateTime<Utc>,

    /// The filer
    pub created_by: UserId,

    /// Current assignee (the filer unless assigned elsewhere)
    pub assigned_to: UserId,

    /// Denormalized copy of the assignee's contact address
    pub assigned_email: String,
}

impl Bug {
    /// Whether `uid` filed this bug or is currently assigned to it
    pub fn involves(&self, uid: &UserId) -> bool {
        &self.created_by == uid || &self.assigned_to == uid
    }
}

/// List order used everywhere bugs are shown: newest first, ties by ID.
pub fn newest_first(a: &Bug, b: &Bug) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Reasons a bug report is rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title is empty or whitespace
    #[error("title is required")]
    EmptyTitle,

    /// Description is empty or whitespace
    #[error("description is required")]
    EmptyDescription,

    /// Title exceeds [`MAX_TITLE_LENGTH`]
    #[error("title cannot exceed {MAX_TITLE_LENGTH} characters (got {0})")]
    TitleTooLong(usize),
}

/// Check the user-supplied text of a bug report.
pub fn validate_report(title: &str, description: &str) -> Result<(), ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let length = title.chars().count();
    if length > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong(length));
    }
    if description.trim().is_empty() {
        return Err(ValidationError::EmptyDescription);
    }
    Ok(())
}

/// Data for creating a bug. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBug {
    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Priority level
    pub priority: Priority,

    /// The filer
    pub created_by: UserId,

    /// Chosen assignee
    pub assigned_to: UserId,

    /// Assignee contact address
    pub assigned_email: String,
}

impl NewBug {
    /// Validate title and description.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_report(&self.title, &self.description)
    }
}

/// Partial update of a bug. Only `Some` fields change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BugUpdate {
    /// New status
    pub status: Option<BugStatus>,

    /// New priority
    pub priority: Option<Priority>,

    /// New assignee and their contact address
    pub assignee: Option<(UserId, String)>,
}

/// Which bugs a query or live subscription covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BugQuery {
    /// Every bug in the collection
    All,

    /// Bugs whose filer is the given user
    FiledBy(UserId),

    /// Bugs currently assigned to the given user
    AssignedTo(UserId),
}

impl BugQuery {
    /// Whether `bug` satisfies this query
    pub fn matches(&self, bug: &Bug) -> bool {
        match self {
            Self::All => true,
            Self::FiledBy(uid) => &bug.created_by == uid,
            Self::AssignedTo(uid) => &bug.assigned_to == uid,
        }
    }
}

/// Kind of delta pushed by a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Bug started matching the query
    Added,

    /// Bug still matches but its fields changed
    Modified,

    /// Bug stopped matching or was deleted
    Removed,
}

/// One delta from a live subscription. For `Removed`, `bug` is the last
/// state the subscriber saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugChange {
    /// What happened
    pub change_type: ChangeType,

    /// The bug it happened to
    pub bug: Bug,
}

/// A user in the roster of assignable teammates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// Primary key
    pub uid: UserId,

    /// Contact address
    pub email: String,

    /// Free-text role label
    #[serde(default = "default_role")]
    pub role: String,

    /// Bugs assigned to this user by someone else. Never decremented.
    #[serde(default)]
    pub assigned_bug_count: u64,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

impl RosterEntry {
    /// A fresh roster entry for a first sign-in
    pub fn for_identity(identity: &Identity, role: impl Into<String>) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone(),
            role: role.into(),
            assigned_bug_count: 0,
        }
    }
}

/// Which bugs the list shows by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    /// No status filtering
    #[default]
    #[serde(alias = "All")]
    All,

    /// Only open bugs
    #[serde(alias = "Open")]
    Open,

    /// Only resolved bugs
    #[serde(alias = "Resolved")]
    Resolved,
}

impl StatusFilter {
    /// Whether a bug with `status` passes the filter
    pub fn admits(self, status: BugStatus) -> bool {
        match self {
            Self::All => true,
            Self::Open => status == BugStatus::Open,
            Self::Resolved => status == BugStatus::Resolved,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Open => f.write_str("open"),
            Self::Resolved => f.write_str("resolved"),
        }
    }
}

/// UI theme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    #[default]
    Light,

    /// Dark theme
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

/// Per-user preferences, keyed by uid in the `userPreferences` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    /// Status filter applied when the bug list opens
    pub bug_filter_default: StatusFilter,

    /// UI theme
    pub theme: Theme,

    /// Whether assignment emails are sent to this user
    pub notifications_enabled: bool,

    /// Whether keyword suggestions are shown
    pub ai_suggestions: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            bug_filter_default: StatusFilter::All,
            theme: Theme::Light,
            notifications_enabled: true,
            ai_suggestions: true,
        }
    }
}

/// A bug in the reconciled list, flagged when it is assigned to the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedBug {
    /// The bug itself
    #[serde(flatten)]
    pub bug: Bug,

    /// Currently assigned to the viewing user
    pub assigned: bool,
}
