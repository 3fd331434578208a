//! Tolerant on-disk form of a bug record.
//!
//! Earlier writers stored the filer as `userId`, used the
//! `open | in-progress | closed` status set, and sometimes omitted
//! `createdAt` or `assignedTo`. [`StoredBug`] accepts all of those shapes and
//! [`StoredBug::into_bug`] normalizes them, reporting every field it had to
//! rewrite.

use super::{Bug, BugId, BugStatus, Priority, UserId};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Every status value ever written to the `bugs` collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum LegacyStatus {
    /// `open`
    #[default]
    #[serde(rename = "open")]
    Open,

    /// `in-progress` (also seen as `in_progress`)
    #[serde(rename = "in-progress", alias = "in_progress")]
    InProgress,

    /// `closed`
    #[serde(rename = "closed")]
    Closed,

    /// `resolved`
    #[serde(rename = "resolved")]
    Resolved,
}

impl LegacyStatus {
    /// Map onto the two-state enumeration. In-progress work is still open.
    pub fn canonical(self) -> BugStatus {
        match self {
            Self::Open | Self::InProgress => BugStatus::Open,
            Self::Closed | Self::Resolved => BugStatus::Resolved,
        }
    }

    fn is_canonical(self) -> bool {
        matches!(self, Self::Open | Self::Resolved)
    }
}

/// A field rewritten while normalizing a stored bug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Migration {
    /// Status came from the legacy enumeration
    Status {
        /// Value found on disk
        from: LegacyStatus,
        /// Value it was mapped to
        to: BugStatus,
    },

    /// `assignedTo` was missing; the filer became the assignee
    AssigneeDefaulted,

    /// `createdAt` was missing; the load time was used
    CreatedAtBackfilled,
}

/// A bug record as it may appear on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBug {
    id: BugId,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    priority: Priority,
    #[serde(default)]
    status: LegacyStatus,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_by: Option<UserId>,
    #[serde(default)]
    user_id: Option<UserId>,
    #[serde(default)]
    assigned_to: Option<UserId>,
    #[serde(default)]
    assigned_email: String,
}

impl StoredBug {
    /// The record's ID, available even when normalization fails
    pub fn id(&self) -> &BugId {
        &self.id
    }

    /// Normalize into a [`Bug`].
    ///
    /// # Errors
    ///
    /// Returns a message when the record names no filer at all.
    pub fn into_bug(self, loaded_at: DateTime<Utc>) -> Result<(Bug, Vec<Migration>), String> {
        let mut migrations = Vec::new();

        let created_by = self
            .created_by
            .or(self.user_id)
            .ok_or_else(|| "record has neither createdBy nor userId".to_string())?;

        let status = self.status.canonical();
        if !self.status.is_canonical() {
            migrations.push(Migration::Status {
                from: self.status,
                to: status,
            });
        }

        let assigned_to = self.assigned_to.unwrap_or_else(|| {
            migrations.push(Migration::AssigneeDefaulted);
            created_by.clone()
        });

        let created_at = self.created_at.unwrap_or_else(|| {
            migrations.push(Migration::CreatedAtBackfilled);
            loaded_at
        });

        let bug = Bug {
            id: self.id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            status,
            created_at,
            created_by,
            assigned_to,
            assigned_email: self.assigned_email,
        };
        Ok((bug, migrations))
    }
}
