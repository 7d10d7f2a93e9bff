//! Trigger surface authentication tests

mod common;

use chrono::{Duration, Utc};

use common::Harness;
use dgo_engine::{EngineConfig, EngineError, TriggerSurface};

#[tokio::test]
async fn wrong_bearer_is_rejected_with_401() {
    let h = Harness::new(EngineConfig::default());
    let surface = TriggerSurface::new(h.engine.clone(), "cron-secret");

    let err = surface.trigger_sync("wrong").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
    assert_eq!(err.status_code(), 401);

    let err = surface.trigger_cleanup("").await.unwrap_err();
    assert!(matches!(err, EngineError::Unauthorized));
}

#[tokio::test]
async fn correct_bearer_runs_the_batch_and_reports() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    // Same content the connector serves, so the pass is a no-op sync.
    h.seed_completed(
        "board",
        "region,revenue\nwest,100\neast,200\n",
        Some(Utc::now() - Duration::hours(30)),
    )
    .await;

    let surface = TriggerSurface::new(h.engine.clone(), "cron-secret");

    let summary = surface.trigger_sync("cron-secret").await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.unchanged, 1);

    let reap = surface.trigger_cleanup("cron-secret").await.unwrap();
    assert_eq!(reap.scanned, 0);

    // Summaries serialize for the HTTP shim.
    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("\"unchanged\":1"));
}
