//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bugtrackr::domain::{
    Bug, BugId, BugQuery, BugUpdate, Identity, NewBug, Preferences, Priority, RosterEntry, UserId,
};
use bugtrackr::error::{Error, Result};
use bugtrackr::notify::{DispatchError, Notification, NotificationDispatcher};
use bugtrackr::store::in_memory::new_in_memory_store;
use bugtrackr::store::{DocumentStore, Subscription};
use bugtrackr::tracker::BugTracker;
use std::path::Path;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Dispatchers
// ============================================================================

/// Dispatcher that records every notification it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn dispatch(&self, notification: &Notification) -> std::result::Result<(), DispatchError> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Dispatcher whose endpoint always refuses.
#[derive(Debug, Default)]
pub struct FailingDispatcher;

#[async_trait]
impl NotificationDispatcher for FailingDispatcher {
    async fn dispatch(&self, _: &Notification) -> std::result::Result<(), DispatchError> {
        Err(DispatchError::Rejected("mailbox full".to_string()))
    }
}

// ============================================================================
// Store wrapper with injectable failures
// ============================================================================

/// In-memory store whose roster, counter and preference calls can be made
/// to fail on demand.
pub struct FlakyStore {
    inner: Arc<dyn DocumentStore>,
    pub fail_roster: AtomicBool,
    pub fail_increment: AtomicBool,
    pub fail_preferences: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: new_in_memory_store("bug"),
            fail_roster: AtomicBool::new(false),
            fail_increment: AtomicBool::new(false),
            fail_preferences: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        })
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(Error::Storage(format!("{what} unavailable")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create_bug(&self, new_bug: NewBug) -> Result<Bug> {
        self.inner.create_bug(new_bug).await
    }

    async fn get_bug(&self, id: &BugId) -> Result<Option<Bug>> {
        self.inner.get_bug(id).await
    }

    async fn update_bug(&self, id: &BugId, update: BugUpdate) -> Result<Bug> {
        Self::check(&self.fail_update, "bug update")?;
        self.inner.update_bug(id, update).await
    }

    async fn delete_bug(&self, id: &BugId) -> Result<()> {
        Self::check(&self.fail_delete, "bug delete")?;
        self.inner.delete_bug(id).await
    }

    async fn query_bugs(&self, query: &BugQuery) -> Result<Vec<Bug>> {
        self.inner.query_bugs(query).await
    }

    async fn subscribe(&self, query: BugQuery) -> Result<Subscription> {
        self.inner.subscribe(query).await
    }

    async fn get_user(&self, uid: &UserId) -> Result<Option<RosterEntry>> {
        self.inner.get_user(uid).await
    }

    async fn upsert_user(&self, entry: RosterEntry) -> Result<()> {
        self.inner.upsert_user(entry).await
    }

    async fn list_roster(&self) -> Result<Vec<RosterEntry>> {
        Self::check(&self.fail_roster, "roster")?;
        self.inner.list_roster().await
    }

    async fn increment_assigned_count(&self, uid: &UserId) -> Result<u64> {
        Self::check(&self.fail_increment, "counter")?;
        self.inner.increment_assigned_count(uid).await
    }

    async fn get_preferences(&self, uid: &UserId) -> Result<Option<Preferences>> {
        Self::check(&self.fail_preferences, "preferences")?;
        self.inner.get_preferences(uid).await
    }

    async fn put_preferences(&self, uid: &UserId, preferences: Preferences) -> Result<()> {
        Self::check(&self.fail_preferences, "preferences")?;
        self.inner.put_preferences(uid, preferences).await
    }

    async fn import_bugs(&self, bugs: Vec<Bug>) -> Result<()> {
        self.inner.import_bugs(bugs).await
    }

    async fn export_bugs(&self) -> Result<Vec<Bug>> {
        self.inner.export_bugs().await
    }

    async fn export_preferences(&self) -> Result<Vec<(UserId, Preferences)>> {
        self.inner.export_preferences().await
    }

    async fn save(&self) -> Result<()> {
        self.inner.save().await
    }

    async fn reload(&self) -> Result<()> {
        self.inner.reload().await
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn identity(uid: &str) -> Identity {
    Identity::new(uid, format!("{uid}@example.com"))
}

/// A roster entry with a preset counter.
pub fn roster_entry(uid: &str, count: u64) -> RosterEntry {
    RosterEntry {
        uid: UserId::new(uid),
        email: format!("{uid}@example.com"),
        role: "Developer".to_string(),
        assigned_bug_count: count,
    }
}

/// A new bug filed by `filer` and assigned to `assignee`.
pub fn new_bug(title: &str, filer: &str, assignee: &str) -> NewBug {
    NewBug {
        title: title.to_string(),
        description: "Steps to reproduce".to_string(),
        priority: Priority::Medium,
        created_by: UserId::new(filer),
        assigned_to: UserId::new(assignee),
        assigned_email: format!("{assignee}@example.com"),
    }
}

/// Tracker over `store` whose roster holds `users` (uid, counter).
pub async fn tracker_with_roster(
    store: Arc<dyn DocumentStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    users: &[(&str, u64)],
) -> BugTracker {
    for (uid, count) in users {
        store.upsert_user(roster_entry(uid, *count)).await.unwrap();
    }
    BugTracker::new(store, dispatcher)
}

// ============================================================================
// CLI
// ============================================================================

/// Run the bugtrackr binary in `dir` with colors off.
pub fn run_bugtrackr_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bugtrackr"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("BUGTRACKR_USER")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute bugtrackr binary")
}

/// Run the binary and parse stdout as JSON, asserting success.
pub fn run_json(dir: &Path, args: &[&str]) -> serde_json::Value {
    let output = run_bugtrackr_in_dir(dir, args);
    assert!(
        output.status.success(),
        "bugtrackr {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "bugtrackr {args:?} printed invalid JSON ({e}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}
