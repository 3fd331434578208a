//! Live query subscriptions.
//!
//! A subscriber registers a [`BugQuery`] and receives batches of
//! [`BugChange`]s: first one batch describing everything that currently
//! matches, then one batch per store mutation that affects the query. Each
//! mutation is described to the store as a `(before, after)` pair and
//! translated per subscriber:
//!
//! | before matches | after matches | delivered   |
//! |----------------|---------------|-------------|
//! | no             | yes           | `Added`     |
//! | yes            | yes           | `Modified`  |
//! | yes            | no / deleted  | `Removed`   |
//! | no             | no            | nothing     |
//!
//! Dropping a [`Subscription`] closes its channel; the store notices on its
//! next publish and forgets the subscriber.

use crate::domain::{Bug, BugChange, BugQuery, ChangeType};
use tokio::sync::mpsc;
use tracing::debug;

/// Receiving end of a live query.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    query: BugQuery,
    receiver: mpsc::UnboundedReceiver<Vec<BugChange>>,
}

impl Subscription {
    /// Store-local identifier of this subscription
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The query this subscription follows
    pub fn query(&self) -> &BugQuery {
        &self.query
    }

    /// Wait for the next batch of changes.
    ///
    /// Returns `None` once the store has dropped the subscriber.
    pub async fn next_batch(&mut self) -> Option<Vec<BugChange>> {
        self.receiver.recv().await
    }

    /// Take the next batch if one is already queued.
    pub fn try_next_batch(&mut self) -> Option<Vec<BugChange>> {
        self.receiver.try_recv().ok()
    }

    /// Stop receiving changes. Queued batches are discarded.
    pub fn cancel(mut self) {
        self.receiver.close();
    }
}

struct Subscriber {
    id: u64,
    query: BugQuery,
    sender: mpsc::UnboundedSender<Vec<BugChange>>,
}

/// Registry of live subscribers, owned by a store.
#[derive(Default)]
pub(crate) struct SubscriberSet {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

impl SubscriberSet {
    /// Register a query. `current` is the full collection; the matching part
    /// is delivered immediately as one `Added` batch (possibly empty).
    pub(crate) fn register<'a>(
        &mut self,
        query: BugQuery,
        current: impl IntoIterator<Item = &'a Bug>,
    ) -> Subscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.next_id;
        self.next_id += 1;

        let initial: Vec<BugChange> = current
            .into_iter()
            .filter(|bug| query.matches(bug))
            .map(|bug| BugChange {
                change_type: ChangeType::Added,
                bug: bug.clone(),
            })
            .collect();

        debug!(subscription = id, query = ?query, initial = initial.len(), "Registered subscriber");

        // The receiver is still in hand, so this send cannot fail.
        let _ = sender.send(initial);
        self.subscribers.push(Subscriber {
            id,
            query: query.clone(),
            sender,
        });

        Subscription {
            id,
            query,
            receiver,
        }
    }

    /// Describe one mutation to every subscriber.
    pub(crate) fn publish(&mut self, before: Option<&Bug>, after: Option<&Bug>) {
        self.publish_all(&[(before, after)]);
    }

    /// Describe several mutations; each subscriber gets them as one batch.
    pub(crate) fn publish_all(&mut self, transitions: &[(Option<&Bug>, Option<&Bug>)]) {
        self.subscribers.retain(|subscriber| {
            if subscriber.sender.is_closed() {
                debug!(subscription = subscriber.id, "Dropping cancelled subscriber");
                return false;
            }

            let batch: Vec<BugChange> = transitions
                .iter()
                .filter_map(|(before, after)| translate(&subscriber.query, *before, *after))
                .collect();

            if batch.is_empty() {
                return true;
            }
            subscriber.sender.send(batch).is_ok()
        });
    }

    /// Number of live subscribers
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.subscribers.len()
    }
}

fn translate(query: &BugQuery, before: Option<&Bug>, after: Option<&Bug>) -> Option<BugChange> {
    let was = before.filter(|bug| query.matches(bug));
    let now = after.filter(|bug| query.matches(bug));

    let (change_type, bug) = match (was, now) {
        (None, Some(bug)) => (ChangeType::Added, bug),
        (Some(_), Some(bug)) => (ChangeType::Modified, bug),
        (Some(bug), None) => (ChangeType::Removed, bug),
        (None, None) => return None,
    };

    Some(BugChange {
        change_type,
        bug: bug.clone(),
    })
}
