//! The bug tracker service.
//!
//! [`BugTracker`] is the caller around the pure pieces: it validates
//! reports, asks [`select_assignee`] for an assignee, and then runs the
//! create, increment and notify steps against the injected store and
//! dispatcher. The steps are independent: once the bug is created, a failed
//! increment or notification is logged and the submission still succeeds.

use crate::assignment::{
    Assignee, AssignmentMode, AssignmentPolicy, roster_excluding, select_assignee,
};
use crate::domain::{
    AnnotatedBug, Bug, BugId, BugQuery, BugStatus, BugUpdate, ChangeType, DEFAULT_ROLE, Identity,
    NewBug, Preferences, Priority, RosterEntry, UserId, validate_report,
};
use crate::error::{Error, Result};
use crate::notify::{Notification, NotificationDispatcher};
use crate::reconciler::{LiveListReconciler, SubscriptionSource};
use crate::stats::BugStats;
use crate::store::DocumentStore;
use crate::suggestions::{Suggestion, keyword_suggestions};
use crate::trend::{TrendSeries, bucketize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A bug report as entered by the filer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BugSubmission {
    /// Short summary
    pub title: String,

    /// Full description
    pub description: String,

    /// Priority level
    pub priority: Priority,

    /// How to pick the assignee
    pub mode: AssignmentMode,
}

/// What happened during a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// The stored bug
    pub bug: Bug,

    /// Who got it
    pub assignee: Assignee,

    /// Whether the assignee's counter was bumped
    pub counter_incremented: bool,

    /// Whether the dispatcher accepted the notification
    pub notified: bool,
}

/// Read a user's preferences, creating the defaults on first read.
///
/// Never fails: a store error yields the defaults, which are then not
/// persisted.
pub async fn load_preferences(store: &dyn DocumentStore, uid: &UserId) -> Preferences {
    match store.get_preferences(uid).await {
        Ok(Some(preferences)) => preferences,
        Ok(None) => {
            let preferences = Preferences::default();
            if let Err(e) = store.put_preferences(uid, preferences).await {
                warn!(user = %uid, error = %e, "Could not store default preferences");
            } else {
                debug!(user = %uid, "Created default preferences");
            }
            preferences
        }
        Err(e) => {
            warn!(user = %uid, error = %e, "Preference load failed, using defaults");
            Preferences::default()
        }
    }
}

/// Bug tracking operations over an injected store and dispatcher.
pub struct BugTracker {
    store: Arc<dyn DocumentStore>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    policy: AssignmentPolicy,
    default_role: String,
}

impl std::fmt::Debug for BugTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BugTracker")
            .field("policy", &self.policy)
            .field("default_role", &self.default_role)
            .field("store", &"<dyn DocumentStore>")
            .field("dispatcher", &"<dyn NotificationDispatcher>")
            .finish()
    }
}

impl BugTracker {
    /// Create a tracker with the default assignment policy and role label
    pub fn new(
        store: Arc<dyn DocumentStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            policy: AssignmentPolicy::default(),
            default_role: DEFAULT_ROLE.to_string(),
        }
    }

    /// Use a different assignment policy
    #[must_use]
    pub fn with_policy(mut self, policy: AssignmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Use a different role label for first sign-ins
    #[must_use]
    pub fn with_default_role(mut self, role: impl Into<String>) -> Self {
        self.default_role = role.into();
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    // ========== Roster ==========

    /// Register a signed-in user.
    ///
    /// Creates the roster entry on first sign-in; afterwards only refreshes
    /// the email if it changed. The counter is never touched.
    pub async fn sign_in(&self, identity: &Identity) -> Result<RosterEntry> {
        match self.store.get_user(&identity.uid).await? {
            Some(mut entry) => {
                if entry.email != identity.email {
                    entry.email.clone_from(&identity.email);
                    self.store.upsert_user(entry.clone()).await?;
                    debug!(user = %identity.uid, "Updated roster email");
                }
                Ok(entry)
            }
            None => {
                let entry = RosterEntry::for_identity(identity, self.default_role.as_str());
                self.store.upsert_user(entry.clone()).await?;
                info!(user = %identity.uid, role = %entry.role, "Added user to roster");
                Ok(entry)
            }
        }
    }

    /// The identity recorded for `uid` at sign-in.
    ///
    /// # Errors
    ///
    /// Returns `Error::UserNotFound` if the user never signed in.
    pub async fn identity_for(&self, uid: &UserId) -> Result<Identity> {
        self.store
            .get_user(uid)
            .await?
            .map(|entry| Identity::new(entry.uid, entry.email))
            .ok_or_else(|| Error::UserNotFound(uid.clone()))
    }

    /// The full roster, in uid order
    pub async fn roster(&self) -> Result<Vec<RosterEntry>> {
        self.store.list_roster().await
    }

    // ========== Bugs ==========

    /// File a bug.
    ///
    /// Validation happens before any store call. A roster load failure
    /// assigns the bug to the filer. After the bug is stored, the assignee's
    /// counter is bumped (only if it isn't the filer) and the assignee is
    /// notified; neither step can fail the submission.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for a bad report, or the store's error if
    /// the bug itself could not be created.
    pub async fn submit_bug(
        &self,
        filer: &Identity,
        submission: BugSubmission,
    ) -> Result<SubmitOutcome> {
        validate_report(&submission.title, &submission.description)?;

        let roster = match self.store.list_roster().await {
            Ok(roster) => roster_excluding(roster, &filer.uid),
            Err(e) => {
                warn!(error = %e, "Roster load failed, assigning to filer");
                Vec::new()
            }
        };
        let assignee = select_assignee(&submission.mode, &roster, filer, self.policy);

        let bug = self
            .store
            .create_bug(NewBug {
                title: submission.title.trim().to_string(),
                description: submission.description.trim().to_string(),
                priority: submission.priority,
                created_by: filer.uid.clone(),
                assigned_to: assignee.uid.clone(),
                assigned_email: assignee.email.clone(),
            })
            .await?;
        info!(bug_id = %bug.id, assignee = %assignee.uid, "Filed bug");

        let counter_incremented = if assignee.is_self(filer) {
            false
        } else {
            match self.store.increment_assigned_count(&assignee.uid).await {
                Ok(count) => {
                    debug!(user = %assignee.uid, count, "Bumped assigned bug count");
                    true
                }
                Err(e) => {
                    warn!(bug_id = %bug.id, user = %assignee.uid, error = %e, "Counter increment failed");
                    false
                }
            }
        };

        let notified = self.notify_assignee(&bug).await;

        Ok(SubmitOutcome {
            bug,
            assignee,
            counter_incremented,
            notified,
        })
    }

    async fn notify_assignee(&self, bug: &Bug) -> bool {
        if bug.assigned_email.trim().is_empty() {
            debug!(bug_id = %bug.id, "Assignee has no email, skipping notification");
            return false;
        }

        let enabled = match self.store.get_preferences(&bug.assigned_to).await {
            Ok(preferences) => preferences.unwrap_or_default().notifications_enabled,
            Err(e) => {
                warn!(user = %bug.assigned_to, error = %e, "Preference load failed, notifying anyway");
                true
            }
        };
        if !enabled {
            debug!(bug_id = %bug.id, user = %bug.assigned_to, "Notifications disabled by assignee");
            return false;
        }

        match self.dispatcher.dispatch(&Notification::bug_assigned(bug)).await {
            Ok(()) => true,
            Err(e) => {
                warn!(bug_id = %bug.id, error = %e, "Notification failed");
                false
            }
        }
    }

    async fn bug_for_actor(&self, actor: &UserId, id: &BugId) -> Result<Bug> {
        let bug = self
            .store
            .get_bug(id)
            .await?
            .ok_or_else(|| Error::BugNotFound(id.clone()))?;
        if !bug.involves(actor) {
            return Err(Error::NotPermitted {
                user: actor.clone(),
                bug: id.clone(),
            });
        }
        Ok(bug)
    }

    /// One bug, as seen by its filer or current assignee.
    ///
    /// # Errors
    ///
    /// Returns `Error::BugNotFound` or `Error::NotPermitted`.
    pub async fn bug(&self, actor: &UserId, id: &BugId) -> Result<Bug> {
        self.bug_for_actor(actor, id).await
    }

    /// Mark a bug resolved. Only its filer or current assignee may do this.
    pub async fn resolve_bug(&self, actor: &UserId, id: &BugId) -> Result<Bug> {
        self.bug_for_actor(actor, id).await?;
        let bug = self
            .store
            .update_bug(
                id,
                BugUpdate {
                    status: Some(BugStatus::Resolved),
                    ..BugUpdate::default()
                },
            )
            .await?;
        info!(bug_id = %id, user = %actor, "Resolved bug");
        Ok(bug)
    }

    /// Delete a bug. Only its filer or current assignee may do this.
    ///
    /// Returns the bug as it was before deletion.
    pub async fn delete_bug(&self, actor: &UserId, id: &BugId) -> Result<Bug> {
        let bug = self.bug_for_actor(actor, id).await?;
        self.store.delete_bug(id).await?;
        info!(bug_id = %id, user = %actor, "Deleted bug");
        Ok(bug)
    }

    /// Bugs `uid` filed or is assigned, merged the same way the live list
    /// merges them.
    pub async fn bugs_for(&self, uid: &UserId) -> Result<Vec<AnnotatedBug>> {
        let filed = self.store.query_bugs(&BugQuery::FiledBy(uid.clone())).await?;
        let assigned = self
            .store
            .query_bugs(&BugQuery::AssignedTo(uid.clone()))
            .await?;

        let mut reconciler = LiveListReconciler::new();
        for bug in filed {
            reconciler.apply_change(SubscriptionSource::Filer, ChangeType::Added, bug);
        }
        for bug in assigned {
            reconciler.apply_change(SubscriptionSource::Assignee, ChangeType::Added, bug);
        }
        Ok(reconciler.snapshot())
    }

    // ========== Dashboard ==========

    /// Counts over the bugs `uid` filed
    pub async fn stats_for(&self, uid: &UserId) -> Result<BugStats> {
        let filed = self.store.query_bugs(&BugQuery::FiledBy(uid.clone())).await?;
        Ok(BugStats::from_bugs(&filed))
    }

    /// Daily trend of the bugs `uid` filed
    pub async fn trend_for(&self, uid: &UserId, window_days: u32) -> Result<TrendSeries> {
        let filed = self.store.query_bugs(&BugQuery::FiledBy(uid.clone())).await?;
        Ok(bucketize(filed.iter().map(|bug| bug.created_at), window_days))
    }

    /// Keyword hints for `uid`, empty when they turned suggestions off
    pub async fn suggestions_for(&self, uid: &UserId) -> Result<Vec<Suggestion>> {
        if !self.load_preferences(uid).await.ai_suggestions {
            return Ok(Vec::new());
        }
        let filed = self.store.query_bugs(&BugQuery::FiledBy(uid.clone())).await?;
        Ok(keyword_suggestions(&filed))
    }

    // ========== Preferences ==========

    /// A user's preferences, created with defaults on first read.
    /// Falls back to the defaults if the store can't be read.
    pub async fn load_preferences(&self, uid: &UserId) -> Preferences {
        load_preferences(self.store.as_ref(), uid).await
    }

    /// Replace a user's preferences
    pub async fn save_preferences(&self, uid: &UserId, preferences: Preferences) -> Result<()> {
        self.store.put_preferences(uid, preferences).await?;
        info!(user = %uid, "Saved preferences");
        Ok(())
    }
}
