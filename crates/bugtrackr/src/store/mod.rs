//! Document store abstraction.
//!
//! Bugs, the roster of assignable users and per-user preferences live in a
//! document store reached through the [`DocumentStore`] trait. The trait is
//! object-safe and every method takes `&self`, so one store can be shared as
//! `Arc<dyn DocumentStore>` between the tracker service and any number of
//! live sessions; implementations synchronize internally.
//!
//! Two backends ship with the crate:
//!
//! - **In-memory**: ephemeral, used by tests and short-lived tools
//! - **JSONL**: the in-memory store loaded from and saved to
//!   `.bugtrackr/data/*.jsonl`
//!
//! # Live queries
//!
//! [`DocumentStore::subscribe`] returns a [`Subscription`] that first yields
//! every bug currently matching the query as `added`, then one batch per
//! mutation that affects the query. See [`subscription`] for the exact
//! translation rules.
//!
//! # Example
//!
//! ```no_run
//! use bugtrackr::domain::{BugQuery, NewBug, Priority, UserId};
//! use bugtrackr::store::{StoreBackend, create_store};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = create_store(StoreBackend::InMemory, "bug").await?;
//!
//!     let bug = store
//!         .create_bug(NewBug {
//!             title: "Crash on save".to_string(),
//!             description: "Click save twice".to_string(),
//!             priority: Priority::High,
//!             created_by: UserId::new("alice"),
//!             assigned_to: UserId::new("alice"),
//!             assigned_email: "alice@example.com".to_string(),
//!         })
//!         .await?;
//!
//!     let mine = store.query_bugs(&BugQuery::FiledBy(UserId::new("alice"))).await?;
//!     assert_eq!(mine[0].id, bug.id);
//!     Ok(())
//! }
//! ```

use crate::domain::{
    Bug, BugId, BugQuery, BugUpdate, NewBug, Preferences, RosterEntry, UserId,
};
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

pub mod in_memory;
pub mod subscription;

pub use subscription::Subscription;

/// Core storage trait for the three collections.
///
/// # Method Categories
///
/// - **Bugs**: `create_bug`, `get_bug`, `update_bug`, `delete_bug`,
///   `query_bugs`, `subscribe`
/// - **Roster**: `get_user`, `upsert_user`, `list_roster`,
///   `increment_assigned_count`
/// - **Preferences**: `get_preferences`, `put_preferences`
/// - **Batch**: `import_bugs`, `export_bugs`, `export_preferences`
/// - **Persistence**: `save`, `reload`
#[async_trait]
pub trait DocumentStore: Send + Sync {
    // ========== Bugs ==========

    /// Create a bug. The store assigns its ID and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if title or description are rejected.
    async fn create_bug(&self, new_bug: NewBug) -> Result<Bug>;

    /// Get a bug by ID. Returns `None` if it doesn't exist.
    async fn get_bug(&self, id: &BugId) -> Result<Option<Bug>>;

    /// Apply a partial update and return the updated bug.
    ///
    /// # Errors
    ///
    /// Returns `Error::BugNotFound` if the bug doesn't exist.
    async fn update_bug(&self, id: &BugId, update: BugUpdate) -> Result<Bug>;

    /// Delete a bug.
    ///
    /// # Errors
    ///
    /// Returns `Error::BugNotFound` if the bug doesn't exist.
    async fn delete_bug(&self, id: &BugId) -> Result<()>;

    /// Bugs matching `query`, newest first.
    async fn query_bugs(&self, query: &BugQuery) -> Result<Vec<Bug>>;

    /// Open a live query.
    async fn subscribe(&self, query: BugQuery) -> Result<Subscription>;

    // ========== Roster ==========

    /// Look up a roster entry.
    async fn get_user(&self, uid: &UserId) -> Result<Option<RosterEntry>>;

    /// Insert or replace a roster entry.
    async fn upsert_user(&self, entry: RosterEntry) -> Result<()>;

    /// Every roster entry, in ascending uid order.
    async fn list_roster(&self) -> Result<Vec<RosterEntry>>;

    /// Atomically add one to a user's assigned bug count and return the new
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserNotFound` if the user has no roster entry.
    async fn increment_assigned_count(&self, uid: &UserId) -> Result<u64>;

    // ========== Preferences ==========

    /// A user's stored preferences, if any.
    async fn get_preferences(&self, uid: &UserId) -> Result<Option<Preferences>>;

    /// Store a user's preferences, replacing what was there.
    async fn put_preferences(&self, uid: &UserId, preferences: Preferences) -> Result<()>;

    // ========== Batch ==========

    /// Insert bugs as-is, replacing any with the same ID.
    ///
    /// Used when loading from disk and for seeding. Live subscribers see the
    /// resulting changes.
    async fn import_bugs(&self, bugs: Vec<Bug>) -> Result<()>;

    /// Every bug, newest first.
    async fn export_bugs(&self) -> Result<Vec<Bug>>;

    /// Every stored preferences document with its owner.
    async fn export_preferences(&self) -> Result<Vec<(UserId, Preferences)>>;

    // ========== Persistence ==========

    /// Flush to the backing medium. A no-op for the in-memory backend.
    async fn save(&self) -> Result<()>;

    /// Re-read the backing medium, publishing any differences to live
    /// subscribers. A no-op for the in-memory backend.
    async fn reload(&self) -> Result<()>;
}

/// Store backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-memory store (ephemeral)
    InMemory,

    /// In-memory store persisted to a directory of JSONL files
    Jsonl(PathBuf),
}

impl StoreBackend {
    /// The data directory for file-based backends.
    pub fn data_dir(&self) -> Option<&Path> {
        match self {
            StoreBackend::Jsonl(dir) => Some(dir),
            StoreBackend::InMemory => None,
        }
    }
}

/// JSONL-backed store that persists on `save()`.
///
/// Wraps the in-memory store and delegates every operation to it; `save`
/// writes the three collections to the data directory and `reload` swaps in
/// whatever is on disk while keeping live subscribers attached.
struct JsonlBackedStore {
    inner: in_memory::InMemoryStore,
    dir: PathBuf,
    prefix: String,
}

#[async_trait]
impl DocumentStore for JsonlBackedStore {
    async fn create_bug(&self, new_bug: NewBug) -> Result<Bug> {
        self.inner.create_bug(new_bug).await
    }

    async fn get_bug(&self, id: &BugId) -> Result<Option<Bug>> {
        self.inner.get_bug(id).await
    }

    async fn update_bug(&self, id: &BugId, update: BugUpdate) -> Result<Bug> {
        self.inner.update_bug(id, update).await
    }

    async fn delete_bug(&self, id: &BugId) -> Result<()> {
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
        self.inner.list_roster().await
    }

    async fn increment_assigned_count(&self, uid: &UserId) -> Result<u64> {
        self.inner.increment_assigned_count(uid).await
    }

    async fn get_preferences(&self, uid: &UserId) -> Result<Option<Preferences>> {
        self.inner.get_preferences(uid).await
    }

    async fn put_preferences(&self, uid: &UserId, preferences: Preferences) -> Result<()> {
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
        in_memory::save_to_jsonl(&self.inner, &self.dir).await
    }

    async fn reload(&self) -> Result<()> {
        let (fresh, warnings) = in_memory::load_inner(&self.dir, &self.prefix).await?;
        log_load_warnings(&warnings);
        self.inner.lock().await.replace_data(fresh);
        Ok(())
    }
}

fn log_load_warnings(warnings: &[in_memory::LoadWarning]) {
    for warning in warnings {
        warn!("{warning}");
    }
}

/// Create a store for the given backend.
///
/// For [`StoreBackend::Jsonl`], existing files in the directory are loaded
/// (load warnings are logged, not fatal) and the directory is created on the
/// first `save()` if it doesn't exist yet.
///
/// # Errors
///
/// Returns an error if existing files cannot be read.
pub async fn create_store(
    backend: StoreBackend,
    prefix: impl Into<String>,
) -> Result<Arc<dyn DocumentStore>> {
    let prefix = prefix.into();
    match backend {
        StoreBackend::InMemory => Ok(in_memory::new_in_memory_store(prefix)),
        StoreBackend::Jsonl(dir) => {
            let (inner, warnings) = in_memory::load_inner(&dir, &prefix).await?;
            log_load_warnings(&warnings);
            info!(
                dir = %dir.display(),
                bugs = inner.bug_count(),
                "Loaded bugtrackr data"
            );

            Ok(Arc::new(JsonlBackedStore {
                inner: in_memory::wrap(inner),
                dir,
                prefix,
            }))
        }
    }
}
