//! Shared harness for engine integration tests

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Utc};

use dgo_engine::{EngineConfig, OrchestrationEngine, RefreshNotifier, SourceConnector};
use dgo_ledger::{
    CostModel, CreditLedger, MemoryBalanceStore, ScopeId, TransactionContext, TransactionKind,
    UsageMetrics,
};
use dgo_store::{Document, DocumentId, DocumentStore, MemoryStore};
use dgo_test_utils::{
    completed_synced_document, RecordingNotifier, ScriptedCapability, StaticConnector,
};

/// Everything an engine test needs, wired against in-memory backends
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub ledger: CreditLedger,
    pub direct: Arc<ScriptedCapability>,
    pub agentic: Arc<ScriptedCapability>,
    pub connector: Arc<StaticConnector>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<OrchestrationEngine>,
    pub scope: ScopeId,
}

impl Harness {
    /// Harness with the default config and healthy capabilities
    ///
    /// The direct path reports measured usage worth 1 credit; the agentic
    /// path reports zero usage, exercising the flat-estimate substitution.
    pub fn new(config: EngineConfig) -> Self {
        let direct = ScriptedCapability::succeeding("direct", UsageMetrics::of(4_000, 1_200));
        let agentic = ScriptedCapability::succeeding("agentic", UsageMetrics::of(0, 0));
        let connector = StaticConnector::new("region,revenue\nwest,100\neast,200\n");
        let notifier = RecordingNotifier::new();
        Self::assemble(config, direct, agentic, connector, notifier)
    }

    /// Harness with explicit collaborators
    pub fn assemble(
        config: EngineConfig,
        direct: Arc<ScriptedCapability>,
        agentic: Arc<ScriptedCapability>,
        connector: Arc<StaticConnector>,
        notifier: Arc<RecordingNotifier>,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let ledger = CreditLedger::new(Arc::new(MemoryBalanceStore::new()), CostModel::default());
        let engine = Arc::new(OrchestrationEngine::new(
            config,
            store.clone(),
            ledger.clone(),
            direct.clone(),
            agentic.clone(),
            connector.clone(),
            notifier.clone(),
        ));
        Self {
            store,
            ledger,
            direct,
            agentic,
            connector,
            notifier,
            engine,
            scope: ScopeId::new(),
        }
    }

    /// Engine built over the same backends but a different connector/notifier
    pub fn engine_with(
        &self,
        config: EngineConfig,
        connector: Arc<dyn SourceConnector>,
        notifier: Arc<dyn RefreshNotifier>,
    ) -> Arc<OrchestrationEngine> {
        Arc::new(OrchestrationEngine::new(
            config,
            self.store.clone(),
            self.ledger.clone(),
            self.direct.clone(),
            self.agentic.clone(),
            connector,
            notifier,
        ))
    }

    /// Grant credits to the harness scope
    pub async fn grant(&self, credits: u64) {
        self.ledger
            .add(
                self.scope,
                credits,
                TransactionKind::Grant,
                TransactionContext::default(),
            )
            .await
            .unwrap();
    }

    /// Seed a completed, sync-linked document
    pub async fn seed_completed(
        &self,
        slug: &str,
        raw_content: &str,
        last_synced_at: Option<DateTime<Utc>>,
    ) -> DocumentId {
        let doc = completed_synced_document(self.scope, slug, raw_content, last_synced_at);
        let id = doc.id;
        self.store.create(doc).await.unwrap();
        id
    }

    /// Seed an arbitrary document
    pub async fn seed(&self, doc: Document) -> DocumentId {
        let id = doc.id;
        self.store.create(doc).await.unwrap();
        id
    }
}
