//! Sync scheduler batch driver
//!
//! Periodically selects documents due for refresh, fingerprints their latest
//! external content, and refreshes only what actually changed. Each
//! document's processing is isolated: one failure is recorded in the batch
//! summary and the batch continues. Only the candidate query itself is
//! batch-fatal.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use dgo_content::{diff_content, parse_table, profile_content, DiffSummary};
use dgo_ledger::TransactionKind;
use dgo_store::{
    ArtifactUpdate, BookkeepingGap, Document, DocumentId, DocumentStore, GapStore,
    GenerationStatus, LeaseStore, SagaStep, VersionChangeType,
};
use dgo_strategy::{GenerationRequest, StrategyPath};

use crate::connector::SourceFetch;
use crate::engine::OrchestrationEngine;
use crate::error::EngineError;
use crate::notify::RefreshNotice;

/// Outcome of processing a single document during sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Source changed; the artifact was regenerated
    Refreshed,
    /// Fingerprint matched; only `last_synced_at` moved
    Unchanged,
    /// Processing failed; the batch continued
    Failed,
}

/// Per-document result in a sync batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncItemResult {
    /// Processed document
    pub document: DocumentId,
    /// Document slug, for display
    pub slug: String,
    /// What happened
    pub outcome: SyncOutcome,
    /// Failure detail when `outcome` is failed
    pub detail: Option<String>,
    /// Credits charged when a refresh ran and the deduction succeeded
    pub credits_charged: Option<u64>,
    /// Capability path that produced the refresh, when one ran
    pub path: Option<StrategyPath>,
}

impl SyncItemResult {
    fn refreshed(
        document: DocumentId,
        slug: String,
        credits_charged: Option<u64>,
        path: StrategyPath,
    ) -> Self {
        Self {
            document,
            slug,
            outcome: SyncOutcome::Refreshed,
            detail: None,
            credits_charged,
            path: Some(path),
        }
    }

    fn unchanged(document: DocumentId, slug: String) -> Self {
        Self {
            document,
            slug,
            outcome: SyncOutcome::Unchanged,
            detail: None,
            credits_charged: None,
            path: None,
        }
    }

    fn failed(document: DocumentId, slug: String, detail: String) -> Self {
        Self {
            document,
            slug,
            outcome: SyncOutcome::Failed,
            detail: Some(detail),
            credits_charged: None,
            path: None,
        }
    }
}

/// Structured summary of one sync batch run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncBatchSummary {
    /// Documents considered by this batch
    pub processed: usize,
    /// Documents whose artifact was regenerated
    pub refreshed: usize,
    /// Documents whose content was unchanged
    pub unchanged: usize,
    /// Documents whose processing failed
    pub failed: usize,
    /// Per-document results, in processing order
    pub items: Vec<SyncItemResult>,
}

impl SyncBatchSummary {
    /// Record one item, incrementing the matching counter
    pub fn record(&mut self, item: SyncItemResult) {
        self.processed += 1;
        match item.outcome {
            SyncOutcome::Refreshed => self.refreshed += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
            SyncOutcome::Failed => self.failed += 1,
        }
        self.items.push(item);
    }
}

impl OrchestrationEngine {
    /// Run one sync batch
    ///
    /// # Errors
    /// Only when the candidate query itself fails; per-document failures
    /// are recorded in the summary and never abort sibling processing.
    pub async fn run_sync_batch(&self) -> Result<SyncBatchSummary, EngineError> {
        let now = Utc::now();
        let cutoff = now - self.config.freshness_threshold();
        let due = self
            .store
            .list_due_for_sync(cutoff, self.config.sync_batch_limit)
            .await
            .map_err(EngineError::from)?;

        tracing::info!(candidates = due.len(), "sync batch started");

        let mut summary = SyncBatchSummary::default();
        for doc in due {
            let item = self.sync_document(doc).await;
            summary.record(item);
        }

        tracing::info!(
            processed = summary.processed,
            refreshed = summary.refreshed,
            unchanged = summary.unchanged,
            failed = summary.failed,
            "sync batch finished"
        );
        Ok(summary)
    }

    async fn sync_document(&self, doc: Document) -> SyncItemResult {
        let id = doc.id;
        let slug = doc.slug.clone();

        if let Err(err) = self
            .store
            .acquire(id, "sync-batch", self.config.lease_ttl())
            .await
        {
            return SyncItemResult::failed(id, slug, format!("lease unavailable: {err}"));
        }

        let result = self.sync_leased(&doc).await;
        let _ = self.store.release(id, "sync-batch").await;

        match result {
            Ok(item) => item,
            Err(err) => {
                tracing::error!(document = %id, error = %err, "sync item failed");
                SyncItemResult::failed(id, slug, err.to_string())
            }
        }
    }

    async fn sync_leased(&self, doc: &Document) -> Result<SyncItemResult, EngineError> {
        let link = doc.sync.as_ref().ok_or_else(|| {
            EngineError::Internal("sync candidate without source link".to_string())
        })?;

        // A fetch failure is recoverable: the document is left untouched
        // and the next batch retries it.
        let fetch = self
            .connector
            .fetch_latest(link.connection_id, &link.resource_id)
            .await?;

        if doc.content_hash.matches(&fetch.content) {
            self.store.touch_synced(doc.id, Utc::now()).await?;
            tracing::debug!(document = %doc.id, "content unchanged");
            return Ok(SyncItemResult::unchanged(doc.id, doc.slug.clone()));
        }

        let diff = diff_content(&doc.raw_content, &fetch.content);
        tracing::info!(document = %doc.id, "source changed: {}", diff.describe());

        self.store
            .transition(doc.id, GenerationStatus::Refreshing, None)
            .await?;

        match self.refresh_changed(doc, &fetch, &diff).await {
            Ok(item) => Ok(item),
            Err(err) => {
                self.fail_document(doc.id, format!("refresh failed: {err}"))
                    .await;
                Err(err)
            }
        }
    }

    async fn refresh_changed(
        &self,
        doc: &Document,
        fetch: &SourceFetch,
        diff: &DiffSummary,
    ) -> Result<SyncItemResult, EngineError> {
        let current = doc.config.clone().ok_or_else(|| {
            EngineError::Internal("completed document carries no artifact".to_string())
        })?;
        let profile = profile_content(&fetch.content);
        let instructions = format!(
            "Update the dashboard to reflect the latest source data. Scale of change: {}.",
            diff.describe()
        );

        let request = GenerationRequest::modification(
            instructions,
            current,
            fetch.content.clone(),
            profile,
        )
        .with_branding(self.config.branding.clone());
        let outcome = self.selector.execute(&request).await?;

        let update = ArtifactUpdate::new(
            outcome.output.config.clone(),
            fetch.content.clone(),
            parse_table(&fetch.content),
        )
        .with_synced_at(Utc::now());
        let updated = self.store.apply_update(doc.id, update).await?;

        let (deduct, version) = self
            .settle_accounting(
                &updated,
                &outcome,
                TransactionKind::DataRefresh,
                VersionChangeType::DataRefresh,
            )
            .await;

        self.store
            .transition(doc.id, GenerationStatus::Completed, None)
            .await?;

        let notice = RefreshNotice {
            document: doc.id,
            slug: doc.slug.clone(),
            change_summary: outcome.output.change_summary.clone(),
            version: version.as_ref().map_or(updated.version, |v| v.number),
        };
        if let Err(err) = self.notifier.notify_refreshed(notice).await {
            let _ = self
                .store
                .record(BookkeepingGap::new(
                    doc.id,
                    SagaStep::Notification,
                    err.to_string(),
                ))
                .await;
        }

        Ok(SyncItemResult::refreshed(
            doc.id,
            doc.slug.clone(),
            deduct.as_ref().map(|d| d.transaction.amount.unsigned_abs()),
            outcome.path,
        ))
    }
}
