//! Integration tests for live bug lists and trend feeds.
//!
//! Each test mutates the shared store directly and waits for the live view
//! to catch up, the way a second user's actions would reach the viewer.

use bugtrackr::domain::{
    AnnotatedBug, BugId, BugStatus, BugUpdate, Preferences, StatusFilter, UserId,
};
use bugtrackr::error::Error;
use bugtrackr::session::{BugListSession, LiveBugList, TrendFeed};
use bugtrackr::store::DocumentStore;
use bugtrackr::store::in_memory::new_in_memory_store;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

mod common;
use common::{FlakyStore, identity, new_bug};
use std::sync::atomic::Ordering;

const WAIT: Duration = Duration::from_secs(5);

async fn start_list(store: &Arc<dyn DocumentStore>, uid: &str) -> LiveBugList {
    let session = BugListSession::new(store.clone(), identity(uid));
    let preferences = session.load_preferences().await;
    let mut list = session.start(preferences).await.unwrap();
    list.wait_synced().await.unwrap();
    list
}

/// Wait until the unfiltered snapshot satisfies `pred`.
async fn wait_until(list: &mut LiveBugList, pred: impl Fn(&[AnnotatedBug]) -> bool) {
    loop {
        if pred(&list.current().bugs) {
            return;
        }
        let changed = timeout(WAIT, list.changed())
            .await
            .expect("live list did not update in time");
        assert!(changed, "live list stopped");
    }
}

fn find<'a>(bugs: &'a [AnnotatedBug], id: &BugId) -> Option<&'a AnnotatedBug> {
    bugs.iter().find(|a| &a.bug.id == id)
}

#[tokio::test]
async fn test_start_uses_saved_filter() {
    let store = new_in_memory_store("bug");
    store
        .put_preferences(
            &UserId::new("alice"),
            Preferences {
                bug_filter_default: StatusFilter::Open,
                ..Preferences::default()
            },
        )
        .await
        .unwrap();

    let list = start_list(&store, "alice").await;
    assert_eq!(list.filter().status, StatusFilter::Open);
    assert_eq!(list.viewer().uid, UserId::new("alice"));
}

#[tokio::test]
async fn test_initial_sync_merges_both_subscriptions() {
    let store = new_in_memory_store("bug");
    let filed = store.create_bug(new_bug("Crash", "alice", "bob")).await.unwrap();
    let assigned = store.create_bug(new_bug("Hang", "bob", "alice")).await.unwrap();
    let both = store.create_bug(new_bug("Typo", "alice", "alice")).await.unwrap();
    store.create_bug(new_bug("Leak", "bob", "carol")).await.unwrap();

    let list = start_list(&store, "alice").await;
    let snapshot = list.current();
    assert!(snapshot.synced);
    assert_eq!(snapshot.bugs.len(), 3);
    assert!(!find(&snapshot.bugs, &filed.id).unwrap().assigned);
    assert!(find(&snapshot.bugs, &assigned.id).unwrap().assigned);
    assert!(find(&snapshot.bugs, &both.id).unwrap().assigned);
}

#[tokio::test]
async fn test_new_bugs_appear_live() {
    let store = new_in_memory_store("bug");
    let mut list = start_list(&store, "alice").await;
    assert!(list.current().bugs.is_empty());

    let bug = store.create_bug(new_bug("Hang", "bob", "alice")).await.unwrap();
    wait_until(&mut list, |bugs| {
        find(bugs, &bug.id).is_some_and(|a| a.assigned)
    })
    .await;
}

#[tokio::test]
async fn test_reassignment_away_clears_assigned_flag() {
    let store = new_in_memory_store("bug");
    let bug = store.create_bug(new_bug("Hang", "bob", "alice")).await.unwrap();
    let mine = store.create_bug(new_bug("Crash", "alice", "alice")).await.unwrap();
    let mut list = start_list(&store, "alice").await;

    for id in [&bug.id, &mine.id] {
        store
            .update_bug(
                id,
                BugUpdate {
                    assignee: Some((UserId::new("carol"), "carol@example.com".to_string())),
                    ..BugUpdate::default()
                },
            )
            .await
            .unwrap();
    }

    wait_until(&mut list, |bugs| {
        // bob's bug stays listed until the session restarts
        find(bugs, &bug.id).is_some_and(|a| !a.assigned)
            && find(bugs, &mine.id)
                .is_some_and(|a| !a.assigned && a.bug.assigned_to.as_str() == "carol")
    })
    .await;
}

#[tokio::test]
async fn test_filer_delete_removes_bug() {
    let store = new_in_memory_store("bug");
    let bug = store.create_bug(new_bug("Crash", "alice", "alice")).await.unwrap();
    let mut list = start_list(&store, "alice").await;
    assert_eq!(list.current().bugs.len(), 1);

    store.delete_bug(&bug.id).await.unwrap();
    wait_until(&mut list, <[AnnotatedBug]>::is_empty).await;
}

#[tokio::test]
async fn test_resolve_through_list() {
    let store = new_in_memory_store("bug");
    let bug = store.create_bug(new_bug("Crash", "alice", "bob")).await.unwrap();
    let mut list = start_list(&store, "alice").await;

    let resolved = list.resolve(&bug.id).await.unwrap();
    assert_eq!(resolved.status, BugStatus::Resolved);

    wait_until(&mut list, |bugs| {
        find(bugs, &bug.id).is_some_and(|a| a.bug.status == BugStatus::Resolved)
    })
    .await;

    list.set_status_filter(StatusFilter::Open);
    assert!(list.visible().is_empty());
    list.set_status_filter(StatusFilter::Resolved);
    assert_eq!(list.visible().len(), 1);
}

#[tokio::test]
async fn test_delete_through_list() {
    let store = new_in_memory_store("bug");
    let bug = store.create_bug(new_bug("Crash", "alice", "bob")).await.unwrap();
    let mut list = start_list(&store, "alice").await;

    list.delete(&bug.id).await.unwrap();
    wait_until(&mut list, <[AnnotatedBug]>::is_empty).await;
    assert!(store.get_bug(&bug.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_acting_on_unlisted_bug_fails() {
    let store = new_in_memory_store("bug");
    let other = store.create_bug(new_bug("Leak", "bob", "carol")).await.unwrap();
    let list = start_list(&store, "alice").await;

    assert!(matches!(
        list.resolve(&other.id).await,
        Err(Error::BugNotFound(_))
    ));
    assert!(matches!(
        list.delete(&other.id).await,
        Err(Error::BugNotFound(_))
    ));
    assert_eq!(
        store.get_bug(&other.id).await.unwrap().unwrap().status,
        BugStatus::Open
    );
}

#[tokio::test]
async fn test_search_filters_visible_bugs() {
    let store = new_in_memory_store("bug");
    store.create_bug(new_bug("Login crash", "alice", "alice")).await.unwrap();
    store.create_bug(new_bug("Slow export", "alice", "alice")).await.unwrap();
    let mut list = start_list(&store, "alice").await;

    list.set_search("LOGIN");
    let visible = list.visible();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].bug.title, "Login crash");

    list.set_search("");
    assert_eq!(list.visible().len(), 2);
}

#[tokio::test]
async fn test_snapshot_is_newest_first() {
    let store = new_in_memory_store("bug");
    let first = store.create_bug(new_bug("First", "alice", "alice")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = store.create_bug(new_bug("Second", "bob", "alice")).await.unwrap();

    let list = start_list(&store, "alice").await;
    let ids: Vec<BugId> = list.visible().into_iter().map(|a| a.bug.id).collect();
    assert_eq!(ids, [second.id, first.id]);
}

#[tokio::test]
async fn test_resolve_keeps_local_state_when_write_fails() {
    let flaky = FlakyStore::new();
    let store: Arc<dyn DocumentStore> = flaky.clone();
    let bug = store.create_bug(new_bug("Crash", "alice", "bob")).await.unwrap();
    let mut list = start_list(&store, "alice").await;

    flaky.fail_update.store(true, Ordering::SeqCst);
    assert!(matches!(list.resolve(&bug.id).await, Err(Error::Storage(_))));

    wait_until(&mut list, |bugs| {
        find(bugs, &bug.id).is_some_and(|a| a.bug.status == BugStatus::Resolved)
    })
    .await;
    assert_eq!(
        store.get_bug(&bug.id).await.unwrap().unwrap().status,
        BugStatus::Open
    );
}

#[tokio::test]
async fn test_delete_keeps_local_removal_when_write_fails() {
    let flaky = FlakyStore::new();
    let store: Arc<dyn DocumentStore> = flaky.clone();
    let bug = store.create_bug(new_bug("Crash", "alice", "bob")).await.unwrap();
    let mut list = start_list(&store, "alice").await;

    flaky.fail_delete.store(true, Ordering::SeqCst);
    assert!(matches!(list.delete(&bug.id).await, Err(Error::Storage(_))));

    wait_until(&mut list, <[AnnotatedBug]>::is_empty).await;
    assert!(store.get_bug(&bug.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cancelled_list_stops_updating() {
    let store = new_in_memory_store("bug");
    let list = start_list(&store, "alice").await;
    let mut snapshots = list.subscribe();
    list.cancel();

    // Publishing to the dropped subscriptions must not fail the mutation
    store.create_bug(new_bug("Crash", "alice", "alice")).await.unwrap();
    store.create_bug(new_bug("Hang", "bob", "alice")).await.unwrap();
    assert_eq!(store.export_bugs().await.unwrap().len(), 2);

    let closed = timeout(WAIT, async {
        while snapshots.changed().await.is_ok() {
            assert!(snapshots.borrow_and_update().bugs.is_empty());
        }
    })
    .await;
    assert!(closed.is_ok(), "cancelled list kept publishing");
    assert!(snapshots.borrow().bugs.is_empty());
}

// ========== Trend feed ==========

#[tokio::test]
async fn test_trend_feed_follows_filed_bugs() {
    let store = new_in_memory_store("bug");
    store.create_bug(new_bug("Crash", "alice", "bob")).await.unwrap();

    let mut feed = TrendFeed::start(store.clone(), UserId::new("alice"), 7)
        .await
        .unwrap();
    let series = feed.current();
    assert_eq!(series.buckets.len(), 7);
    assert_eq!(series.total, 1);

    let bug = store.create_bug(new_bug("Hang", "alice", "bob")).await.unwrap();
    store.create_bug(new_bug("Leak", "bob", "alice")).await.unwrap();
    loop {
        if feed.current().total == 2 {
            break;
        }
        assert!(timeout(WAIT, feed.changed()).await.unwrap());
    }

    store.delete_bug(&bug.id).await.unwrap();
    loop {
        if feed.current().total == 1 {
            break;
        }
        assert!(timeout(WAIT, feed.changed()).await.unwrap());
    }
}
