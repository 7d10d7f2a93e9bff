//! Orchestration engine
//!
//! The pipelines that move a document through its lifecycle:
//! - `generate`: pending -> analyzing -> generating -> completed
//! - `modify`: completed -> refreshing -> completed
//!
//! Every pipeline acquires a processing lease first, checks credits before
//! any AI call, persists the artifact as the primary step, and settles
//! accounting (ledger deduction, version snapshot) as secondary steps whose
//! failures leave durable gap records instead of rolling the artifact back.

use std::sync::Arc;

use dgo_content::{parse_table, profile_content};
use dgo_ledger::{CreditLedger, DeductReceipt, ScopeId, TransactionContext, TransactionKind};
use dgo_store::{
    ArtifactUpdate, BookkeepingGap, Datastore, Document, DocumentId, DocumentStore,
    DocumentVersion, GapStore, GenerationStatus, LeaseStore, SagaStep, VersionChangeType,
    VersionNumber, VersionSnapshot, VersionStore,
};
use dgo_strategy::{
    GenerationCapability, GenerationRequest, InstructionClassifier, StrategyOutcome,
    StrategyPath, StrategySelector,
};

use crate::config::EngineConfig;
use crate::connector::SourceConnector;
use crate::error::EngineError;
use crate::notify::RefreshNotifier;

/// Instructions used for first-time generation
const INITIAL_INSTRUCTIONS: &str =
    "Generate a dashboard that summarizes the source data with appropriate charts and tables.";

/// Result of a generation or modification pipeline
#[derive(Debug, Clone)]
pub struct PipelineReceipt {
    /// The document after the pipeline completed
    pub document: Document,
    /// Version the pipeline produced, absent when the snapshot step failed
    pub version: Option<VersionNumber>,
    /// Which capability path produced the artifact
    pub path: StrategyPath,
    /// True when the direct path failed and the agentic path recovered
    pub fell_back: bool,
    /// Credits charged, absent when the deduction step failed
    pub credits_charged: Option<u64>,
    /// Balance after the charge, absent when the deduction step failed
    pub balance_after: Option<u64>,
    /// Human-readable description of what changed
    pub change_summary: String,
}

/// The orchestration engine
///
/// Owns the strategy selector and drives the datastore, ledger, connector,
/// and notifier collaborators.
pub struct OrchestrationEngine {
    pub(crate) config: EngineConfig,
    pub(crate) store: Arc<dyn Datastore>,
    pub(crate) ledger: CreditLedger,
    pub(crate) selector: StrategySelector,
    pub(crate) connector: Arc<dyn SourceConnector>,
    pub(crate) notifier: Arc<dyn RefreshNotifier>,
}

impl std::fmt::Debug for OrchestrationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationEngine")
            .field("config", &self.config)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

impl OrchestrationEngine {
    /// Create an engine
    ///
    /// The strategy selector is built here so the configuration's
    /// `direct_enabled` flag is the single source of routing truth.
    #[must_use]
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn Datastore>,
        ledger: CreditLedger,
        direct: Arc<dyn GenerationCapability>,
        agentic: Arc<dyn GenerationCapability>,
        connector: Arc<dyn SourceConnector>,
        notifier: Arc<dyn RefreshNotifier>,
    ) -> Self {
        let selector =
            StrategySelector::new(direct, agentic).with_direct_enabled(config.direct_enabled);
        Self {
            config,
            store,
            ledger,
            selector,
            connector,
            notifier,
        }
    }

    /// Replace the instruction classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn InstructionClassifier>) -> Self {
        self.selector = self.selector.with_classifier(classifier);
        self
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The credit ledger in use
    #[inline]
    #[must_use]
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// Run first-time generation for a pending document
    ///
    /// # Errors
    /// `InsufficientCredits` before any AI call when the preflight estimate
    /// is not covered; `Busy` when another worker holds the lease; strategy
    /// and store failures land the document in `Failed` and propagate.
    pub async fn generate(&self, id: DocumentId) -> Result<PipelineReceipt, EngineError> {
        let doc = self.store.fetch(id).await.map_err(EngineError::from)?;
        tracing::info!(document = %id, slug = %doc.slug, "generation requested");

        self.store
            .acquire(id, "generate", self.config.lease_ttl())
            .await
            .map_err(EngineError::from)?;
        let result = self.generate_leased(doc).await;
        let _ = self.store.release(id, "generate").await;
        result
    }

    async fn generate_leased(&self, doc: Document) -> Result<PipelineReceipt, EngineError> {
        let id = doc.id;

        // Refuse before any AI call or status mutation.
        self.ledger
            .check_affordable(doc.scope, self.config.preflight_credits())
            .await?;

        self.store
            .transition(id, GenerationStatus::Analyzing, None)
            .await
            .map_err(EngineError::from)?;

        match self.run_generation(&doc).await {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                self.fail_document(id, format!("generation failed: {err}"))
                    .await;
                Err(err)
            }
        }
    }

    async fn run_generation(&self, doc: &Document) -> Result<PipelineReceipt, EngineError> {
        let id = doc.id;
        let profile = profile_content(&doc.raw_content);
        let data = parse_table(&doc.raw_content);

        self.store
            .transition(id, GenerationStatus::Generating, None)
            .await
            .map_err(EngineError::from)?;

        let request =
            GenerationRequest::initial(INITIAL_INSTRUCTIONS, doc.raw_content.clone(), profile)
                .with_branding(self.config.branding.clone());
        let outcome = self.selector.execute(&request).await?;

        let update =
            ArtifactUpdate::new(outcome.output.config.clone(), doc.raw_content.clone(), data);
        let updated = self
            .store
            .apply_update(id, update)
            .await
            .map_err(EngineError::from)?;

        let (deduct, version) = self
            .settle_accounting(
                &updated,
                &outcome,
                TransactionKind::Generation,
                VersionChangeType::Initial,
            )
            .await;

        let completed = self
            .store
            .transition(id, GenerationStatus::Completed, None)
            .await
            .map_err(EngineError::from)?;

        Ok(receipt(completed, outcome, deduct, version))
    }

    /// Apply an interactive modification to a completed document
    ///
    /// # Errors
    /// `Forbidden` on ownership mismatch; `InsufficientCredits` before any
    /// AI call when the preflight estimate is not covered; `Busy` when the
    /// document is leased; strategy failure lands the document in `Failed`.
    pub async fn modify(
        &self,
        id: DocumentId,
        scope: ScopeId,
        instructions: &str,
    ) -> Result<PipelineReceipt, EngineError> {
        let doc = self.store.fetch(id).await.map_err(EngineError::from)?;
        if doc.scope != scope {
            return Err(EngineError::Forbidden {
                document: id,
                scope,
            });
        }
        tracing::info!(document = %id, slug = %doc.slug, "modification requested");

        self.store
            .acquire(id, "modify", self.config.lease_ttl())
            .await
            .map_err(EngineError::from)?;
        let result = self.modify_leased(doc, instructions).await;
        let _ = self.store.release(id, "modify").await;
        result
    }

    async fn modify_leased(
        &self,
        doc: Document,
        instructions: &str,
    ) -> Result<PipelineReceipt, EngineError> {
        let id = doc.id;

        // Refuse before any AI call or status mutation.
        self.ledger
            .check_affordable(doc.scope, self.config.preflight_credits())
            .await?;

        self.store
            .transition(id, GenerationStatus::Refreshing, None)
            .await
            .map_err(EngineError::from)?;

        match self.run_modification(&doc, instructions).await {
            Ok(receipt) => Ok(receipt),
            Err(err) => {
                self.fail_document(id, format!("modification failed: {err}"))
                    .await;
                Err(err)
            }
        }
    }

    async fn run_modification(
        &self,
        doc: &Document,
        instructions: &str,
    ) -> Result<PipelineReceipt, EngineError> {
        let id = doc.id;
        let current = doc.config.clone().ok_or_else(|| {
            EngineError::Internal("completed document carries no artifact".to_string())
        })?;
        let profile = profile_content(&doc.raw_content);

        let request = GenerationRequest::modification(
            instructions,
            current,
            doc.raw_content.clone(),
            profile,
        )
        .with_branding(self.config.branding.clone());
        let outcome = self.selector.execute(&request).await?;

        // Modification changes the artifact, not the source content.
        let update = ArtifactUpdate::new(
            outcome.output.config.clone(),
            doc.raw_content.clone(),
            doc.data.clone(),
        );
        let updated = self
            .store
            .apply_update(id, update)
            .await
            .map_err(EngineError::from)?;

        let (deduct, version) = self
            .settle_accounting(
                &updated,
                &outcome,
                TransactionKind::Modification,
                VersionChangeType::AiModification,
            )
            .await;

        let completed = self
            .store
            .transition(id, GenerationStatus::Completed, None)
            .await
            .map_err(EngineError::from)?;

        Ok(receipt(completed, outcome, deduct, version))
    }

    /// Settle secondary accounting after the artifact persist
    ///
    /// Failures here never roll back the already-persisted artifact: each
    /// failed step leaves a durable gap record for later reconciliation.
    pub(crate) async fn settle_accounting(
        &self,
        doc: &Document,
        outcome: &StrategyOutcome,
        kind: TransactionKind,
        change_type: VersionChangeType,
    ) -> (Option<DeductReceipt>, Option<DocumentVersion>) {
        let billed = if outcome.path == StrategyPath::Agentic {
            self.config
                .flat_agentic_estimate
                .or_actual(outcome.output.usage)
        } else {
            outcome.output.usage
        };
        let cost = self.config.cost_model.credits_for_usage(&billed);

        let context = TransactionContext::for_document(doc.id.0)
            .with_usage(billed)
            .with_note(format!("path={}", outcome.path));

        let deduct = match self.ledger.deduct(doc.scope, cost, kind, context).await {
            Ok(receipt) => Some(receipt),
            Err(err) => {
                let _ = self
                    .store
                    .record(BookkeepingGap::new(
                        doc.id,
                        SagaStep::LedgerDeduction,
                        format!("charge of {cost} credits failed: {err}"),
                    ))
                    .await;
                None
            }
        };

        let snapshot = VersionSnapshot {
            config: doc.config.clone(),
            raw_content: doc.raw_content.clone(),
            data: doc.data.clone(),
        };
        let version = match self
            .store
            .append(doc.id, change_type, outcome.output.change_summary.clone(), snapshot)
            .await
        {
            Ok(version) => Some(version),
            Err(err) => {
                let _ = self
                    .store
                    .record(BookkeepingGap::new(
                        doc.id,
                        SagaStep::VersionSnapshot,
                        err.to_string(),
                    ))
                    .await;
                None
            }
        };

        (deduct, version)
    }

    /// Force a document into the failed state, best effort
    pub(crate) async fn fail_document(&self, id: DocumentId, message: String) {
        if let Err(err) = self
            .store
            .transition(id, GenerationStatus::Failed, Some(message))
            .await
        {
            tracing::error!(document = %id, error = %err, "could not mark document failed");
        }
    }
}

fn receipt(
    document: Document,
    outcome: StrategyOutcome,
    deduct: Option<DeductReceipt>,
    version: Option<DocumentVersion>,
) -> PipelineReceipt {
    PipelineReceipt {
        document,
        version: version.map(|v| v.number),
        path: outcome.path,
        fell_back: outcome.fell_back,
        credits_charged: deduct
            .as_ref()
            .map(|d| d.transaction.amount.unsigned_abs()),
        balance_after: deduct.map(|d| d.new_balance.balance),
        change_summary: outcome.output.change_summary,
    }
}
