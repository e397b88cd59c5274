use std::sync::Arc;

use tempfile::tempdir;

use super::*;

use crate::model::Identity;
use crate::store;

/// In-memory catalog that answers in reverse request order, so these tests
/// prove the history order comes from the store and not from the catalog.
struct StubCatalog {
    videos: Vec<VideoRecord>,
}

impl VideoCatalog for StubCatalog {
    fn find_many(&self, ids: &[VideoId]) -> Vec<VideoRecord> {
        let mut found: Vec<VideoRecord> = self
            .videos
            .iter()
            .filter(|v| ids.contains(&v.id))
            .cloned()
            .collect();
        found.reverse();
        found
    }
}

fn sample_identity(id: &str, handle: &str) -> Identity {
    Identity {
        id: IdentityId(id.to_string()),
        handle: handle.to_string(),
        email: format!("{handle}@example.com"),
        full_name: format!("{handle} full name"),
        password_hash: "unused".to_string(),
        avatar: format!("/media/{handle}"),
        cover_image: String::new(),
        refresh_token: None,
        watch_history: Vec::new(),
        created_at: store::now_ts(),
    }
}

fn sample_video(id: &str, owner: &str) -> VideoRecord {
    VideoRecord {
        id: VideoId(id.to_string()),
        title: format!("title of {id}"),
        description: format!("description of {id}"),
        duration_secs: 90,
        thumbnail: format!("/media/thumb-{id}"),
        owner: IdentityId(owner.to_string()),
        created_at: store::now_ts(),
    }
}

fn queries(store: Arc<CredentialStore>, videos: Vec<VideoRecord>) -> ViewerQueries {
    ViewerQueries::new(store, Arc::new(StubCatalog { videos }))
}

#[tokio::test]
async fn channel_profile_reports_counts_for_the_viewer() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    for (id, handle) in [("id-a", "alice"), ("id-b", "bob"), ("id-c", "carol")] {
        store
            .insert_identity(sample_identity(id, handle))
            .await
            .expect("insert identity");
    }
    let (alice, bob, carol) = (
        IdentityId("id-a".to_string()),
        IdentityId("id-b".to_string()),
        IdentityId("id-c".to_string()),
    );
    store.subscribe(&bob, &alice).await.expect("bob -> alice");
    store.subscribe(&carol, &alice).await.expect("carol -> alice");
    store.subscribe(&alice, &bob).await.expect("alice -> bob");

    let queries = queries(store, Vec::new());

    let profile = queries
        .channel_profile(&bob, "alice")
        .await
        .expect("alice profile");
    assert_eq!(profile.handle, "alice");
    assert_eq!(profile.subscriber_count, 2);
    assert_eq!(profile.subscription_count, 1);
    assert!(profile.is_subscribed);

    let profile = queries
        .channel_profile(&carol, "bob")
        .await
        .expect("bob profile");
    assert_eq!(profile.subscriber_count, 1);
    assert_eq!(profile.subscription_count, 1);
    assert!(!profile.is_subscribed, "carol does not follow bob");
}

#[tokio::test]
async fn channel_profile_normalizes_the_handle_and_fails_on_unknown() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    store
        .insert_identity(sample_identity("id-a", "alice"))
        .await
        .expect("insert identity");
    let viewer = IdentityId("id-a".to_string());
    let queries = queries(store, Vec::new());

    let profile = queries
        .channel_profile(&viewer, "  ALICE ")
        .await
        .expect("case-insensitive lookup");
    assert_eq!(profile.handle, "alice");

    assert!(matches!(
        queries
            .channel_profile(&viewer, "   ")
            .await
            .expect_err("blank"),
        AccountError::NotFound(_)
    ));
    assert!(matches!(
        queries
            .channel_profile(&viewer, "nobody")
            .await
            .expect_err("unknown"),
        AccountError::NotFound(_)
    ));
}

#[tokio::test]
async fn unsubscribing_flips_the_profile_flag() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    store
        .insert_identity(sample_identity("id-a", "alice"))
        .await
        .expect("insert alice");
    store
        .insert_identity(sample_identity("id-b", "bob"))
        .await
        .expect("insert bob");
    let (alice, bob) = (
        IdentityId("id-a".to_string()),
        IdentityId("id-b".to_string()),
    );
    store.subscribe(&bob, &alice).await.expect("subscribe");

    let queries = queries(store.clone(), Vec::new());
    let profile = queries
        .channel_profile(&bob, "alice")
        .await
        .expect("profile");
    assert!(profile.is_subscribed);

    store.unsubscribe(&bob, &alice).await.expect("unsubscribe");
    let profile = queries
        .channel_profile(&bob, "alice")
        .await
        .expect("profile");
    assert!(!profile.is_subscribed);
    assert_eq!(profile.subscriber_count, 0);
}

#[tokio::test]
async fn watch_history_of_a_fresh_identity_is_empty() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    store
        .insert_identity(sample_identity("id-a", "alice"))
        .await
        .expect("insert identity");
    let queries = queries(store, Vec::new());

    let history = queries
        .watch_history(&IdentityId("id-a".to_string()))
        .await
        .expect("history");
    assert!(history.is_empty());
}

#[tokio::test]
async fn watch_history_keeps_stored_order_and_projects_the_owner() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    store
        .insert_identity(sample_identity("id-a", "alice"))
        .await
        .expect("insert alice");
    store
        .insert_identity(sample_identity("id-b", "bob"))
        .await
        .expect("insert bob");
    let viewer = IdentityId("id-a".to_string());
    for vid in ["v-1", "v-2", "v-3"] {
        store
            .record_watch(&viewer, VideoId(vid.to_string()))
            .await
            .expect("record watch");
    }

    let queries = queries(
        store,
        vec![
            sample_video("v-1", "id-b"),
            sample_video("v-2", "id-b"),
            sample_video("v-3", "id-b"),
        ],
    );
    let history = queries.watch_history(&viewer).await.expect("history");

    let ids: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["v-1", "v-2", "v-3"], "stored order, not catalog order");

    let owner = &history[0].owner;
    assert_eq!(owner.handle, "bob");
    assert_eq!(owner.avatar, "/media/bob");
    let json = serde_json::to_value(owner).expect("serialize owner");
    let fields = json.as_object().expect("owner is an object");
    assert_eq!(
        fields.len(),
        3,
        "owner carries handle, full_name, avatar and nothing else"
    );
}

#[tokio::test]
async fn watch_history_skips_unresolved_videos_and_vanished_owners() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    store
        .insert_identity(sample_identity("id-a", "alice"))
        .await
        .expect("insert alice");
    store
        .insert_identity(sample_identity("id-b", "bob"))
        .await
        .expect("insert bob");
    let viewer = IdentityId("id-a".to_string());
    for vid in ["v-1", "v-gone", "v-orphan"] {
        store
            .record_watch(&viewer, VideoId(vid.to_string()))
            .await
            .expect("record watch");
    }

    // "v-gone" is not in the catalog; "v-orphan" resolves but its owner
    // identity was never stored.
    let queries = queries(
        store,
        vec![sample_video("v-1", "id-b"), sample_video("v-orphan", "id-ghost")],
    );
    let history = queries.watch_history(&viewer).await.expect("history");

    let ids: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["v-1"]);
}

#[tokio::test]
async fn rewatching_a_video_repeats_it_in_the_history() {
    let temp = tempdir().expect("create temp dir");
    let store = Arc::new(CredentialStore::open(temp.path()).expect("open store"));
    store
        .insert_identity(sample_identity("id-a", "alice"))
        .await
        .expect("insert alice");
    store
        .insert_identity(sample_identity("id-b", "bob"))
        .await
        .expect("insert bob");
    let viewer = IdentityId("id-a".to_string());
    for vid in ["v-1", "v-2", "v-1"] {
        store
            .record_watch(&viewer, VideoId(vid.to_string()))
            .await
            .expect("record watch");
    }

    let queries = queries(
        store,
        vec![sample_video("v-1", "id-b"), sample_video("v-2", "id-b")],
    );
    let history = queries.watch_history(&viewer).await.expect("history");

    let ids: Vec<&str> = history.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["v-1", "v-2", "v-1"]);
}
