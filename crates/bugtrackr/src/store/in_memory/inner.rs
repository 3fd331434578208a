//! Core in-memory store data structures.

use crate::domain::{Bug, BugId, BugQuery, NewBug, Preferences, RosterEntry, UserId, newest_first};
use crate::error::{Error, Result};
use crate::id_generation::BugIdGenerator;
use crate::store::subscription::SubscriberSet;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Inner store structure (not thread-safe).
///
/// Wrapped in `Arc<Mutex<>>` by [`InMemoryStore`](super::InMemoryStore).
pub(crate) struct InMemoryStoreInner {
    /// Bugs indexed by ID
    pub(super) bugs: HashMap<BugId, Bug>,

    /// Roster entries, ordered by uid
    pub(super) users: BTreeMap<UserId, RosterEntry>,

    /// Preferences documents keyed by owner
    pub(super) preferences: HashMap<UserId, Preferences>,

    /// ID generator for new bugs
    pub(super) id_generator: BugIdGenerator,

    /// Live query subscribers
    pub(super) subscribers: SubscriberSet,
}

impl InMemoryStoreInner {
    /// Create a new empty store
    pub(crate) fn new(prefix: impl Into<String>) -> Self {
        Self {
            bugs: HashMap::new(),
            users: BTreeMap::new(),
            preferences: HashMap::new(),
            id_generator: BugIdGenerator::new(prefix),
            subscribers: SubscriberSet::default(),
        }
    }

    /// Number of stored bugs
    pub(crate) fn bug_count(&self) -> usize {
        self.bugs.len()
    }

    /// Generate a new unique ID for a bug
    pub(super) fn generate_id(&mut self, new_bug: &NewBug) -> Result<BugId> {
        let id = self
            .id_generator
            .generate(
                &new_bug.title,
                &new_bug.description,
                new_bug.created_by.as_str(),
            )
            .map_err(|e| Error::Storage(format!("ID generation failed: {e}")))?;

        Ok(BugId::new(id))
    }

    /// Insert or replace a bug without publishing.
    pub(super) fn insert_bug(&mut self, bug: Bug) -> Option<Bug> {
        self.id_generator.register_id(bug.id.as_str());
        self.bugs.insert(bug.id.clone(), bug)
    }

    /// Bugs matching `query`, newest first.
    pub(super) fn matching(&self, query: &BugQuery) -> Vec<Bug> {
        let mut bugs: Vec<Bug> = self
            .bugs
            .values()
            .filter(|bug| query.matches(bug))
            .cloned()
            .collect();
        bugs.sort_by(newest_first);
        bugs
    }

    /// Swap in freshly loaded data, keeping the live subscribers and telling
    /// them about every bug that differs.
    pub(crate) fn replace_data(&mut self, fresh: InMemoryStoreInner) {
        let InMemoryStoreInner {
            bugs,
            users,
            preferences,
            id_generator,
            subscribers: _,
        } = fresh;

        let previous = std::mem::replace(&mut self.bugs, bugs);
        self.users = users;
        self.preferences = preferences;
        self.id_generator = id_generator;

        let ids: BTreeSet<&BugId> = previous.keys().chain(self.bugs.keys()).collect();
        let transitions: Vec<(Option<&Bug>, Option<&Bug>)> = ids
            .into_iter()
            .map(|id| (previous.get(id), self.bugs.get(id)))
            .filter(|(before, after)| before != after)
            .collect();

        debug!(changed = transitions.len(), "Reloaded store contents");
        self.subscribers.publish_all(&transitions);
    }
}
