//! Live views scoped to one signed-in user.
//!
//! A bug list session starts in two phases so the list never shows the
//! wrong default filter:
//!
//! 1. [`BugListSession::load_preferences`] reads (or lazily creates) the
//!    viewer's preferences.
//! 2. [`BugListSession::start`] takes those preferences, opens the "filed by
//!    me" and "assigned to me" subscriptions and spawns the task that feeds
//!    both into a [`LiveListReconciler`].
//!
//! The task owns the reconciler; consumers only ever see immutable
//! [`ListSnapshot`]s through a `watch` channel. Dropping the [`LiveBugList`]
//! aborts the task, which drops both subscriptions.
//!
//! ```no_run
//! use bugtrackr::domain::Identity;
//! use bugtrackr::session::BugListSession;
//! use bugtrackr::store::in_memory::new_in_memory_store;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let store = new_in_memory_store("bug");
//!     let session = BugListSession::new(store, Identity::new("alice", "alice@example.com"));
//!
//!     let preferences = session.load_preferences().await;
//!     let mut list = session.start(preferences).await?;
//!     list.wait_synced().await?;
//!     for entry in list.visible() {
//!         println!("{} {}", entry.bug.id, entry.bug.title);
//!     }
//!     Ok(())
//! }
//! ```

use crate::domain::{
    AnnotatedBug, Bug, BugChange, BugId, BugQuery, BugStatus, BugUpdate, ChangeType, Identity,
    Preferences, StatusFilter, UserId,
};
use crate::error::{Error, Result};
use crate::filter::BugListFilter;
use crate::reconciler::{LiveListReconciler, SubscriptionSource};
use crate::store::{DocumentStore, Subscription};
use crate::tracker::load_preferences;
use crate::trend::{TrendSeries, bucketize};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One published state of the merged list.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    /// Merged bugs, newest first
    pub bugs: Arc<[AnnotatedBug]>,

    /// Both subscriptions have delivered their initial batch
    pub synced: bool,
}

impl ListSnapshot {
    fn empty() -> Self {
        Self {
            bugs: Arc::from(Vec::new()),
            synced: false,
        }
    }
}

#[derive(Debug)]
enum LocalEdit {
    Resolve(BugId),
    Remove(BugId),
}

/// Phase one of a bug list: bound to a viewer, not yet subscribed.
pub struct BugListSession {
    store: Arc<dyn DocumentStore>,
    viewer: Identity,
}

impl BugListSession {
    /// Create a session for `viewer`
    pub fn new(store: Arc<dyn DocumentStore>, viewer: Identity) -> Self {
        Self { store, viewer }
    }

    /// Read the viewer's preferences, creating the defaults on first use.
    pub async fn load_preferences(&self) -> Preferences {
        load_preferences(self.store.as_ref(), &self.viewer.uid).await
    }

    /// Open both subscriptions and start reconciling.
    ///
    /// The list's status filter starts at `preferences.bug_filter_default`.
    ///
    /// # Errors
    ///
    /// Returns the store's error if a subscription can't be opened.
    pub async fn start(self, preferences: Preferences) -> Result<LiveBugList> {
        let filed = self
            .store
            .subscribe(BugQuery::FiledBy(self.viewer.uid.clone()))
            .await?;
        let assigned = self
            .store
            .subscribe(BugQuery::AssignedTo(self.viewer.uid.clone()))
            .await?;

        let (snapshot_tx, snapshots) = watch::channel(ListSnapshot::empty());
        let (edits, edit_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(reconcile(filed, assigned, edit_rx, snapshot_tx));
        debug!(user = %self.viewer.uid, "Started live bug list");

        Ok(LiveBugList {
            store: self.store,
            viewer: self.viewer,
            snapshots,
            edits,
            filter: BugListFilter::with_status(preferences.bug_filter_default),
            task,
        })
    }
}

async fn reconcile(
    mut filed: Subscription,
    mut assigned: Subscription,
    mut edits: mpsc::UnboundedReceiver<LocalEdit>,
    snapshots: watch::Sender<ListSnapshot>,
) {
    let mut reconciler = LiveListReconciler::new();
    let mut filed_synced = false;
    let mut assigned_synced = false;

    loop {
        tokio::select! {
            biased;

            edit = edits.recv() => match edit {
                Some(LocalEdit::Resolve(id)) => {
                    reconciler.resolve_locally(&id);
                }
                Some(LocalEdit::Remove(id)) => {
                    reconciler.remove_locally(&id);
                }
                None => break,
            },
            batch = filed.next_batch() => match batch {
                Some(changes) => {
                    reconciler.apply_batch(SubscriptionSource::Filer, changes);
                    filed_synced = true;
                }
                None => break,
            },
            batch = assigned.next_batch() => match batch {
                Some(changes) => {
                    reconciler.apply_batch(SubscriptionSource::Assignee, changes);
                    assigned_synced = true;
                }
                None => break,
            },
        }

        let snapshot = ListSnapshot {
            bugs: reconciler.snapshot().into(),
            synced: filed_synced && assigned_synced,
        };
        if snapshots.send(snapshot).is_err() {
            break;
        }
    }

    debug!("Live bug list stopped");
}

/// A running, reconciled bug list for one viewer.
pub struct LiveBugList {
    store: Arc<dyn DocumentStore>,
    viewer: Identity,
    snapshots: watch::Receiver<ListSnapshot>,
    edits: mpsc::UnboundedSender<LocalEdit>,
    filter: BugListFilter,
    task: JoinHandle<()>,
}

impl LiveBugList {
    /// The viewer this list belongs to
    pub fn viewer(&self) -> &Identity {
        &self.viewer
    }

    /// The latest published snapshot
    pub fn current(&self) -> ListSnapshot {
        self.snapshots.borrow().clone()
    }

    /// The latest snapshot with the status filter and search applied
    pub fn visible(&self) -> Vec<AnnotatedBug> {
        self.filter.apply(&self.snapshots.borrow().bugs)
    }

    /// The active filter
    pub fn filter(&self) -> &BugListFilter {
        &self.filter
    }

    /// Change the status filter
    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
    }

    /// Change the search term
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    /// Wait for the next snapshot. Returns `false` once the list has stopped.
    pub async fn changed(&mut self) -> bool {
        self.snapshots.changed().await.is_ok()
    }

    /// A separate receiver for the published snapshots. It reports the
    /// channel closed once the list is cancelled or dropped.
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.snapshots.clone()
    }

    /// Wait until both subscriptions have delivered their initial batch.
    ///
    /// # Errors
    ///
    /// Returns `Error::Storage` if the list stopped first.
    pub async fn wait_synced(&mut self) -> Result<ListSnapshot> {
        self.snapshots
            .wait_for(|snapshot| snapshot.synced)
            .await
            .map(|snapshot| snapshot.clone())
            .map_err(|_| Error::Storage("live bug list stopped before syncing".to_string()))
    }

    fn local_edit(&self, edit: LocalEdit) {
        if self.edits.send(edit).is_err() {
            debug!("Live bug list stopped, local edit dropped");
        }
    }

    fn listed(&self, id: &BugId) -> Result<()> {
        if self.snapshots.borrow().bugs.iter().any(|a| &a.bug.id == id) {
            Ok(())
        } else {
            Err(Error::BugNotFound(id.clone()))
        }
    }

    /// Resolve a bug in the list.
    ///
    /// The list shows it resolved immediately; the store write follows. If
    /// the write fails the error is logged and returned, and the list keeps
    /// the optimistic state until the store says otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Error::BugNotFound` if the bug isn't in this list, or the
    /// store's error.
    pub async fn resolve(&self, id: &BugId) -> Result<Bug> {
        self.listed(id)?;
        self.local_edit(LocalEdit::Resolve(id.clone()));

        self.store
            .update_bug(
                id,
                BugUpdate {
                    status: Some(BugStatus::Resolved),
                    ..BugUpdate::default()
                },
            )
            .await
            .inspect_err(|e| warn!(bug_id = %id, error = %e, "Resolve failed"))
    }

    /// Delete a bug in the list.
    ///
    /// The bug disappears from the list immediately; the store delete
    /// follows, with the same failure handling as [`resolve`](Self::resolve).
    ///
    /// # Errors
    ///
    /// Returns `Error::BugNotFound` if the bug isn't in this list, or the
    /// store's error.
    pub async fn delete(&self, id: &BugId) -> Result<()> {
        self.listed(id)?;
        self.local_edit(LocalEdit::Remove(id.clone()));

        self.store
            .delete_bug(id)
            .await
            .inspect_err(|e| warn!(bug_id = %id, error = %e, "Delete failed"))
    }

    /// Stop the list and drop both subscriptions.
    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for LiveBugList {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A trend series kept current from the "filed by" subscription.
///
/// The whole series is recomputed after every batch.
pub struct TrendFeed {
    series: watch::Receiver<TrendSeries>,
    task: JoinHandle<()>,
}

impl TrendFeed {
    /// Subscribe to `uid`'s filed bugs and publish a `window_days` series.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the subscription can't be opened.
    pub async fn start(
        store: Arc<dyn DocumentStore>,
        uid: UserId,
        window_days: u32,
    ) -> Result<Self> {
        let mut subscription = store.subscribe(BugQuery::FiledBy(uid)).await?;

        let mut created: HashMap<BugId, DateTime<Utc>> = HashMap::new();
        if let Some(initial) = subscription.next_batch().await {
            apply_timestamps(&mut created, initial);
        }
        let (tx, series) = watch::channel(bucketize(created.values().copied(), window_days));

        let task = tokio::spawn(async move {
            while let Some(batch) = subscription.next_batch().await {
                apply_timestamps(&mut created, batch);
                if tx
                    .send(bucketize(created.values().copied(), window_days))
                    .is_err()
                {
                    break;
                }
            }
        });

        Ok(Self { series, task })
    }

    /// The latest series
    pub fn current(&self) -> TrendSeries {
        self.series.borrow().clone()
    }

    /// Wait for the next series. Returns `false` once the feed has stopped.
    pub async fn changed(&mut self) -> bool {
        self.series.changed().await.is_ok()
    }
}

impl Drop for TrendFeed {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn apply_timestamps(created: &mut HashMap<BugId, DateTime<Utc>>, changes: Vec<BugChange>) {
    for change in changes {
        match change.change_type {
            ChangeType::Added | ChangeType::Modified => {
                created.insert(change.bug.id, change.bug.created_at);
            }
            ChangeType::Removed => {
                created.remove(&change.bug.id);
            }
        }
    }
}
