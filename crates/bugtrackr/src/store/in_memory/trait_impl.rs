//! DocumentStore trait implementation for the in-memory store.

use super::InMemoryStore;
use crate::domain::{
    Bug, BugId, BugQuery, BugStatus, BugUpdate, NewBug, Preferences, RosterEntry, UserId,
};
use crate::error::{Error, Result};
use crate::store::{DocumentStore, Subscription};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create_bug(&self, new_bug: NewBug) -> Result<Bug> {
        new_bug.validate()?;

        let mut inner = self.lock().await;
        let id = inner.generate_id(&new_bug)?;

        let bug = Bug {
            id,
            title: new_bug.title,
            description: new_bug.description,
            priority: new_bug.priority,
            status: BugStatus::Open,
            created_at: Utc::now(),
            created_by: new_bug.created_by,
            assigned_to: new_bug.assigned_to,
            assigned_email: new_bug.assigned_email,
        };

        inner.insert_bug(bug.clone());
        inner.subscribers.publish(None, Some(&bug));
        debug!(bug_id = %bug.id, "Created bug");

        Ok(bug)
    }

    async fn get_bug(&self, id: &BugId) -> Result<Option<Bug>> {
        let inner = self.lock().await;
        Ok(inner.bugs.get(id).cloned())
    }

    async fn update_bug(&self, id: &BugId, update: BugUpdate) -> Result<Bug> {
        let mut inner = self.lock().await;

        let bug = inner
            .bugs
            .get_mut(id)
            .ok_or_else(|| Error::BugNotFound(id.clone()))?;
        let before = bug.clone();

        if let Some(status) = update.status {
            bug.status = status;
        }
        if let Some(priority) = update.priority {
            bug.priority = priority;
        }
        if let Some((uid, email)) = update.assignee {
            bug.assigned_to = uid;
            bug.assigned_email = email;
        }
        let after = bug.clone();

        inner.subscribers.publish(Some(&before), Some(&after));
        Ok(after)
    }

    async fn delete_bug(&self, id: &BugId) -> Result<()> {
        let mut inner = self.lock().await;

        let removed = inner
            .bugs
            .remove(id)
            .ok_or_else(|| Error::BugNotFound(id.clone()))?;
        inner.id_generator.forget_id(id.as_str());
        inner.subscribers.publish(Some(&removed), None);
        debug!(bug_id = %id, "Deleted bug");

        Ok(())
    }

    async fn query_bugs(&self, query: &BugQuery) -> Result<Vec<Bug>> {
        let inner = self.lock().await;
        Ok(inner.matching(query))
    }

    async fn subscribe(&self, query: BugQuery) -> Result<Subscription> {
        let mut inner = self.lock().await;
        let current = inner.matching(&query);
        Ok(inner.subscribers.register(query, &current))
    }

    async fn get_user(&self, uid: &UserId) -> Result<Option<RosterEntry>> {
        let inner = self.lock().await;
        Ok(inner.users.get(uid).cloned())
    }

    async fn upsert_user(&self, entry: RosterEntry) -> Result<()> {
        let mut inner = self.lock().await;
        inner.users.insert(entry.uid.clone(), entry);
        Ok(())
    }

    async fn list_roster(&self) -> Result<Vec<RosterEntry>> {
        let inner = self.lock().await;
        Ok(inner.users.values().cloned().collect())
    }

    async fn increment_assigned_count(&self, uid: &UserId) -> Result<u64> {
        let mut inner = self.lock().await;
        let entry = inner
            .users
            .get_mut(uid)
            .ok_or_else(|| Error::UserNotFound(uid.clone()))?;
        entry.assigned_bug_count += 1;
        Ok(entry.assigned_bug_count)
    }

    async fn get_preferences(&self, uid: &UserId) -> Result<Option<Preferences>> {
        let inner = self.lock().await;
        Ok(inner.preferences.get(uid).copied())
    }

    async fn put_preferences(&self, uid: &UserId, preferences: Preferences) -> Result<()> {
        let mut inner = self.lock().await;
        inner.preferences.insert(uid.clone(), preferences);
        Ok(())
    }

    async fn import_bugs(&self, bugs: Vec<Bug>) -> Result<()> {
        let mut inner = self.lock().await;

        let mut transitions = Vec::with_capacity(bugs.len());
        for bug in bugs {
            let previous = inner.insert_bug(bug.clone());
            transitions.push((previous, bug));
        }

        let refs: Vec<(Option<&Bug>, Option<&Bug>)> = transitions
            .iter()
            .map(|(before, after)| (before.as_ref(), Some(after)))
            .collect();
        inner.subscribers.publish_all(&refs);

        Ok(())
    }

    async fn export_bugs(&self) -> Result<Vec<Bug>> {
        let inner = self.lock().await;
        Ok(inner.matching(&BugQuery::All))
    }

    async fn export_preferences(&self) -> Result<Vec<(UserId, Preferences)>> {
        let inner = self.lock().await;
        let mut preferences: Vec<(UserId, Preferences)> = inner
            .preferences
            .iter()
            .map(|(uid, prefs)| (uid.clone(), *prefs))
            .collect();
        preferences.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(preferences)
    }

    async fn save(&self) -> Result<()> {
        // In-memory store has nothing to flush
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        Ok(())
    }
}
