//! Behavior tests for the in-memory datastore

use chrono::{Duration, Utc};
use uuid::Uuid;

use dgo_content::DashboardConfig;
use dgo_ledger::ScopeId;
use dgo_store::{
    ArtifactUpdate, Document, DocumentStore, GenerationStatus, LeaseStore, MemoryStore,
    StoreError, SyncSource, VersionChangeType, VersionNumber, VersionSnapshot, VersionStore,
};

fn sample_document() -> Document {
    Document::new("q3-revenue", ScopeId::new(), "region,revenue\nwest,100\n")
}

fn sample_config() -> DashboardConfig {
    DashboardConfig::new(
        "Revenue",
        serde_json::json!({"charts": []}),
        "<html></html>",
        "Revenue by region",
    )
}

#[tokio::test]
async fn create_and_fetch_round_trip() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc.clone()).await.unwrap();
    assert_eq!(store.fetch(id).await.unwrap(), doc);
}

#[tokio::test]
async fn duplicate_slug_in_scope_is_rejected() {
    let store = MemoryStore::new();
    let scope = ScopeId::new();
    store
        .create(Document::new("board", scope, "a"))
        .await
        .unwrap();
    let err = store
        .create(Document::new("board", scope, "b"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SlugTaken(s) if s == "board"));

    // Same slug in a different scope is fine.
    store
        .create(Document::new("board", ScopeId::new(), "c"))
        .await
        .unwrap();
}

#[tokio::test]
async fn transition_applies_timestamp_contract() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc).await.unwrap();

    let analyzing = store
        .transition(id, GenerationStatus::Analyzing, None)
        .await
        .unwrap();
    assert!(analyzing.generation_started_at.is_some());
    assert!(analyzing.generation_completed_at.is_none());
    assert!(analyzing.generation_error.is_none());

    store
        .transition(id, GenerationStatus::Generating, None)
        .await
        .unwrap();
    let completed = store
        .transition(id, GenerationStatus::Completed, None)
        .await
        .unwrap();
    assert!(completed.generation_completed_at.is_some());
    assert!(completed.generation_error.is_none());
}

#[tokio::test]
async fn failed_transition_records_error_message() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc).await.unwrap();

    store
        .transition(id, GenerationStatus::Analyzing, None)
        .await
        .unwrap();
    let failed = store
        .transition(id, GenerationStatus::Failed, Some("capability unreachable".into()))
        .await
        .unwrap();
    assert_eq!(failed.status, GenerationStatus::Failed);
    assert_eq!(
        failed.generation_error.as_deref(),
        Some("capability unreachable")
    );
}

#[tokio::test]
async fn illegal_transition_is_rejected() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc).await.unwrap();

    let err = store
        .transition(id, GenerationStatus::Completed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Lifecycle(_)));
}

#[tokio::test]
async fn artifact_update_keeps_fingerprint_invariant() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc).await.unwrap();

    let update = ArtifactUpdate::new(sample_config(), "region,revenue\nwest,150\n", None);
    let updated = store.apply_update(id, update).await.unwrap();
    assert!(updated.content_hash.matches(&updated.raw_content));
    assert!(updated.config.is_some());
}

#[tokio::test]
async fn version_append_bumps_counters_and_is_append_only() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc.clone()).await.unwrap();

    let snapshot = VersionSnapshot {
        config: Some(sample_config()),
        raw_content: doc.raw_content.clone(),
        data: None,
    };

    let v1 = store
        .append(id, VersionChangeType::Initial, "first generation".into(), snapshot.clone())
        .await
        .unwrap();
    assert_eq!(v1.number, VersionNumber { major: 1, minor: 0 });

    let v2 = store
        .append(id, VersionChangeType::DataRefresh, "source changed".into(), snapshot.clone())
        .await
        .unwrap();
    assert_eq!(v2.number, VersionNumber { major: 1, minor: 1 });

    let doc = store.fetch(id).await.unwrap();
    assert_eq!(doc.version, VersionNumber { major: 1, minor: 1 });

    let versions = store.list(id).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0], v1, "earlier snapshots are never rewritten");
    assert_eq!(store.count(id).await.unwrap(), 2);
}

#[tokio::test]
async fn lease_is_exclusive_until_expiry() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc).await.unwrap();

    store
        .acquire(id, "sync-batch", Duration::minutes(10))
        .await
        .unwrap();
    let err = store
        .acquire(id, "interactive", Duration::minutes(10))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Lease(_)));

    // Releasing under the wrong holder is a no-op.
    store.release(id, "interactive").await.unwrap();
    assert!(store
        .acquire(id, "interactive", Duration::minutes(10))
        .await
        .is_err());

    // The right holder releases, freeing the document.
    store.release(id, "sync-batch").await.unwrap();
    store
        .acquire(id, "interactive", Duration::minutes(10))
        .await
        .unwrap();
}

#[tokio::test]
async fn expired_lease_is_claimable_and_listed() {
    let store = MemoryStore::new();
    let doc = sample_document();
    let id = doc.id;
    store.create(doc).await.unwrap();

    store.acquire(id, "worker-a", Duration::zero()).await.unwrap();

    let later = Utc::now() + Duration::seconds(1);
    let expired = store.list_expired(later).await.unwrap();
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].holder, "worker-a");

    // A new holder can claim over the lapsed lease.
    store
        .acquire(id, "worker-b", Duration::minutes(10))
        .await
        .unwrap();
}

#[tokio::test]
async fn due_for_sync_selection_and_ordering() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let scope = ScopeId::new();

    // Completed, synced long ago.
    let mut stale = Document::new("stale", scope, "a");
    stale.status = GenerationStatus::Completed;
    let mut link = SyncSource::new(Uuid::new_v4(), "sheet-1");
    link.last_synced_at = Some(now - Duration::hours(30));
    stale.sync = Some(link);
    let stale_id = stale.id;

    // Completed, never synced.
    let mut fresh_link = Document::new("never", scope, "b");
    fresh_link.status = GenerationStatus::Completed;
    fresh_link.sync = Some(SyncSource::new(Uuid::new_v4(), "sheet-2"));
    let never_id = fresh_link.id;

    // Completed, synced recently.
    let mut recent = Document::new("recent", scope, "c");
    recent.status = GenerationStatus::Completed;
    let mut recent_sync = SyncSource::new(Uuid::new_v4(), "sheet-3");
    recent_sync.last_synced_at = Some(now - Duration::hours(1));
    recent.sync = Some(recent_sync);

    // No sync link at all.
    let unlinked = Document::new("unlinked", scope, "d");

    for d in [stale, fresh_link, recent, unlinked] {
        store.create(d).await.unwrap();
    }

    let cutoff = now - Duration::hours(23);
    let due = store.list_due_for_sync(cutoff, 10).await.unwrap();
    let ids: Vec<_> = due.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![never_id, stale_id], "never-synced first, then oldest");

    let limited = store.list_due_for_sync(cutoff, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn stuck_listing_uses_started_at_cutoff() {
    let store = MemoryStore::new();
    let now = Utc::now();

    let mut stuck = sample_document();
    stuck.status = GenerationStatus::Generating;
    stuck.generation_started_at = Some(now - Duration::minutes(30));
    let stuck_id = stuck.id;

    let mut recent = Document::new("recent", ScopeId::new(), "x");
    recent.status = GenerationStatus::Generating;
    recent.generation_started_at = Some(now - Duration::minutes(2));

    store.create(stuck).await.unwrap();
    store.create(recent).await.unwrap();

    let listed = store.list_stuck(now - Duration::minutes(10)).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, stuck_id);
}
