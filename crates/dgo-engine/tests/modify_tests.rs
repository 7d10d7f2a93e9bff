//! Interactive generation and modification tests

mod common;

use chrono::Duration;

use common::Harness;
use dgo_engine::{EngineConfig, EngineError};
use dgo_ledger::{FlatUsageEstimate, ScopeId, UsageMetrics};
use dgo_store::{
    Document, DocumentStore, GapStore, GenerationStatus, LeaseStore, SagaStep,
    VersionChangeType, VersionNumber, VersionStore,
};
use dgo_strategy::StrategyPath;
use dgo_test_utils::{sample_csv, RecordingNotifier, ScriptedCapability, StaticConnector};

#[tokio::test]
async fn generate_walks_the_full_lifecycle() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    let id = h.seed(Document::new("board", h.scope, sample_csv())).await;

    let receipt = h.engine.generate(id).await.unwrap();
    assert_eq!(receipt.path, StrategyPath::Direct);
    assert_eq!(receipt.version, Some(VersionNumber { major: 1, minor: 0 }));
    assert_eq!(receipt.credits_charged, Some(1));

    let doc = h.store.fetch(id).await.unwrap();
    assert_eq!(doc.status, GenerationStatus::Completed);
    assert!(doc.config.is_some());
    assert!(doc.generation_completed_at.is_some());

    let versions = h.store.list(id).await.unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].change_type, VersionChangeType::Initial);
}

#[tokio::test]
async fn insufficient_credits_refuses_before_any_side_effect() {
    // Flat estimate worth exactly 10 credits makes the preflight ask for 10.
    let config = EngineConfig::default().with_flat_agentic_estimate(FlatUsageEstimate {
        input_units: 100_000,
        output_units: 0,
    });
    let h = Harness::new(config);
    h.grant(5).await;
    let id = h
        .seed_completed_doc("board", &sample_csv())
        .await;

    let err = h
        .engine
        .modify(id, h.scope, "make the title bigger")
        .await
        .unwrap_err();
    match err {
        EngineError::InsufficientCredits {
            required,
            available,
        } => {
            assert_eq!(required, 10);
            assert_eq!(available, 5);
        }
        other => panic!("expected InsufficientCredits, got {other:?}"),
    }

    // No AI call, no ledger mutation, no version, no status change.
    assert_eq!(h.direct.call_count(), 0);
    assert_eq!(h.agentic.call_count(), 0);
    assert_eq!(h.ledger.transactions(h.scope).await.unwrap().len(), 1);
    assert_eq!(h.store.count(id).await.unwrap(), 0);
    let doc = h.store.fetch(id).await.unwrap();
    assert_eq!(doc.status, GenerationStatus::Completed);

    // The lease was released with the refusal.
    h.store
        .acquire(id, "anyone", Duration::minutes(1))
        .await
        .unwrap();
}

#[tokio::test]
async fn ownership_mismatch_is_forbidden() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    let stranger = ScopeId::new();
    let err = h
        .engine
        .modify(id, stranger, "change the colors")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden { .. }));
    assert_eq!(err.status_code(), 403);
    assert_eq!(h.direct.call_count() + h.agentic.call_count(), 0);
}

#[tokio::test]
async fn direct_failure_falls_back_and_still_succeeds() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    h.direct.push_response(Err(dgo_strategy::CapabilityError::Generation(
        "template mismatch".into(),
    )));

    let receipt = h
        .engine
        .modify(id, h.scope, "swap the chart order")
        .await
        .unwrap();
    assert_eq!(receipt.path, StrategyPath::Agentic);
    assert!(receipt.fell_back);
    assert_eq!(h.direct.call_count(), 1);
    assert_eq!(h.agentic.call_count(), 1);

    let doc = h.store.fetch(id).await.unwrap();
    assert_eq!(doc.status, GenerationStatus::Completed);
}

#[tokio::test]
async fn comprehensive_review_never_touches_the_direct_path() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    let receipt = h
        .engine
        .modify(id, h.scope, "Please reconcile all values against the sheet")
        .await
        .unwrap();
    assert_eq!(receipt.path, StrategyPath::Agentic);
    assert_eq!(h.direct.call_count(), 0, "direct path must be skipped entirely");
    assert_eq!(h.agentic.call_count(), 1);
}

#[tokio::test]
async fn unmetered_agentic_run_is_billed_at_the_flat_estimate() {
    let h = Harness::new(EngineConfig::default().with_direct_enabled(false));
    h.grant(100).await;
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    // The agentic fixture reports zero usage; default flat estimate is
    // (50_000 + 20_000 * 5) / 10_000 = 15 credits.
    let receipt = h
        .engine
        .modify(id, h.scope, "restyle everything nicely")
        .await
        .unwrap();
    assert_eq!(receipt.credits_charged, Some(15));
    assert_eq!(receipt.balance_after, Some(85));

    let txs = h.ledger.transactions(h.scope).await.unwrap();
    let charge = txs.last().unwrap();
    assert_eq!(charge.amount, -15);
    let usage = charge.context.usage.unwrap();
    assert_eq!(usage.input_units, 50_000);
    assert_eq!(usage.output_units, 20_000);
}

#[tokio::test]
async fn failed_charge_after_persist_keeps_the_artifact_and_records_a_gap() {
    // The agentic run reports usage far beyond the preflight estimate, so
    // the preflight passes but the real charge overdraws.
    let direct = ScriptedCapability::succeeding("direct", UsageMetrics::of(4_000, 1_200));
    let agentic = ScriptedCapability::succeeding("agentic", UsageMetrics::of(500_000, 0));
    let connector = StaticConnector::new("a,b\n1,2\n");
    let notifier = RecordingNotifier::new();
    let h = Harness::assemble(
        EngineConfig::default().with_direct_enabled(false),
        direct,
        agentic,
        connector,
        notifier,
    );
    h.grant(20).await; // covers the preflight (15), not the real charge (50)
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    let receipt = h
        .engine
        .modify(id, h.scope, "restyle everything")
        .await
        .unwrap();
    assert_eq!(receipt.credits_charged, None);
    assert_eq!(receipt.balance_after, None);
    assert!(receipt.version.is_some(), "the snapshot step still ran");

    // The artifact won: the document completed despite the missed charge.
    let doc = h.store.fetch(id).await.unwrap();
    assert_eq!(doc.status, GenerationStatus::Completed);

    let gaps = h.store.for_document(id).await.unwrap();
    assert_eq!(gaps.len(), 1);
    assert_eq!(gaps[0].step, SagaStep::LedgerDeduction);
    assert!(gaps[0].detail.contains("50"));

    // The refused charge left the balance untouched.
    assert_eq!(h.ledger.balance(h.scope).await.unwrap().balance, 20);
}

#[tokio::test]
async fn both_paths_failing_marks_the_document_failed() {
    let direct = ScriptedCapability::failing("direct", "renderer crashed");
    let agentic = ScriptedCapability::failing("agentic", "sandbox crashed");
    let connector = dgo_test_utils::StaticConnector::new("a,b\n1,2\n");
    let notifier = dgo_test_utils::RecordingNotifier::new();
    let h = Harness::assemble(EngineConfig::default(), direct, agentic, connector, notifier);
    h.grant(100).await;
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    let err = h
        .engine
        .modify(id, h.scope, "swap the chart order")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Strategy(_)));

    let doc = h.store.fetch(id).await.unwrap();
    assert_eq!(doc.status, GenerationStatus::Failed);
    assert!(doc.generation_error.is_some());
    assert_eq!(h.store.count(id).await.unwrap(), 0);
}

#[tokio::test]
async fn busy_document_is_reported_as_conflict() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    let id = h.seed_completed_doc("board", &sample_csv()).await;

    h.store
        .acquire(id, "another-worker", Duration::minutes(10))
        .await
        .unwrap();

    let err = h
        .engine
        .modify(id, h.scope, "swap the chart order")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Busy { .. }));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn modification_bumps_minor_and_keeps_source_content() {
    let h = Harness::new(EngineConfig::default());
    h.grant(100).await;
    let id = h.seed(Document::new("board", h.scope, sample_csv())).await;
    h.engine.generate(id).await.unwrap();

    let before = h.store.fetch(id).await.unwrap();
    let receipt = h
        .engine
        .modify(id, h.scope, "use a line chart")
        .await
        .unwrap();
    assert_eq!(receipt.version, Some(VersionNumber { major: 1, minor: 1 }));

    let after = h.store.fetch(id).await.unwrap();
    assert_eq!(after.raw_content, before.raw_content);
    assert_eq!(after.content_hash, before.content_hash);

    let versions = h.store.list(id).await.unwrap();
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[1].change_type, VersionChangeType::AiModification);
}

impl Harness {
    /// Completed document without a sync link, for interactive scenarios
    async fn seed_completed_doc(&self, slug: &str, raw: &str) -> dgo_store::DocumentId {
        let mut doc = Document::new(slug, self.scope, raw);
        doc.status = GenerationStatus::Completed;
        doc.config = Some(dgo_test_utils::sample_config(slug));
        doc.generation_completed_at = Some(chrono::Utc::now());
        self.seed(doc).await
    }
}
