//! In-memory document store.
//!
//! All data is held in RAM and **lost when the process exits** unless it is
//! written out with [`save_to_jsonl`]. The store is the backend of both the
//! ephemeral [`StoreBackend::InMemory`](crate::store::StoreBackend::InMemory)
//! and the JSONL-backed store.
//!
//! # Architecture
//!
//! - `HashMap<BugId, Bug>` for bug lookups; queries sort on the way out
//! - `BTreeMap<UserId, RosterEntry>` so the roster comes back in uid order
//! - `HashMap<UserId, Preferences>` for preferences
//! - a [`SubscriberSet`](crate::store::subscription) fed inside the same lock
//!   as every mutation, so each subscriber sees changes in commit order
//!
//! # Thread Safety
//!
//! The store is `Arc<Mutex<InMemoryStoreInner>>`. Every operation holds the
//! lock for its whole duration, which is what makes
//! `increment_assigned_count` atomic.

mod inner;
mod jsonl;
mod trait_impl;

use crate::store::DocumentStore;
use std::sync::Arc;
use tokio::sync::Mutex;

pub(crate) use inner::InMemoryStoreInner;
pub(crate) use jsonl::load_inner;
pub use jsonl::{
    BUGS_FILE, LoadWarning, PREFERENCES_FILE, USERS_FILE, load_from_jsonl, save_to_jsonl,
};

/// Thread-safe in-memory store. Implements [`DocumentStore`] in
/// `trait_impl.rs`.
pub(crate) type InMemoryStore = Arc<Mutex<InMemoryStoreInner>>;

pub(crate) fn wrap(inner: InMemoryStoreInner) -> InMemoryStore {
    Arc::new(Mutex::new(inner))
}

/// Create an empty in-memory store.
///
/// # Arguments
///
/// * `prefix` - The prefix for bug IDs (e.g., "bug")
///
/// # Example
///
/// ```
/// use bugtrackr::store::in_memory::new_in_memory_store;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let store = new_in_memory_store("bug");
///     assert!(store.export_bugs().await.unwrap().is_empty());
/// }
/// ```
pub fn new_in_memory_store(prefix: impl Into<String>) -> Arc<dyn DocumentStore> {
    Arc::new(wrap(InMemoryStoreInner::new(prefix)))
}
