//! Stale operation reaper
//!
//! There is no cooperative cancellation into an in-flight AI call: a
//! timed-out operation leaves its document stuck in an in-flight status.
//! The reaper runs on its own, more frequent schedule, finds documents whose
//! in-flight status (or processing lease) has outlived the staleness
//! threshold, and force-fails them with a timing-derived message. This is
//! the system's sole recovery mechanism for partial failure.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use dgo_store::{Document, DocumentId, DocumentStore, GenerationStatus, LeaseStore};

use crate::engine::OrchestrationEngine;
use crate::error::EngineError;

/// One document force-failed by the reaper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReapedItem {
    /// Reaped document
    pub document: DocumentId,
    /// Document slug, for display
    pub slug: String,
    /// Status the document was stuck in
    pub previous_status: GenerationStatus,
    /// Synthesized failure message written to the document
    pub message: String,
}

/// Structured summary of one reaper pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaperSummary {
    /// Stuck candidates examined
    pub scanned: usize,
    /// Documents force-failed
    pub reaped: usize,
    /// Per-document results
    pub items: Vec<ReapedItem>,
}

impl OrchestrationEngine {
    /// Run one reaper pass
    ///
    /// # Errors
    /// Only when the candidate queries fail; per-document transition errors
    /// are logged and skipped.
    pub async fn run_reaper(&self) -> Result<ReaperSummary, EngineError> {
        let now = Utc::now();
        let cutoff = now - self.config.stale_after();

        let mut targets: Vec<Document> = self
            .store
            .list_stuck(cutoff)
            .await
            .map_err(EngineError::from)?;

        // Expired leases are reaped too: evict the lapsed claim and, when
        // the document is still in flight, treat it as stuck.
        let expired = self
            .store
            .list_expired(now)
            .await
            .map_err(EngineError::from)?;
        for lease in expired {
            let _ = self.store.evict(lease.document).await;
            if targets.iter().any(|d| d.id == lease.document) {
                continue;
            }
            if let Ok(doc) = self.store.fetch(lease.document).await {
                if doc.status.is_in_flight() {
                    targets.push(doc);
                }
            }
        }

        let mut summary = ReaperSummary {
            scanned: targets.len(),
            ..ReaperSummary::default()
        };

        for doc in targets {
            let held_secs = doc
                .generation_started_at
                .map_or(0, |started| (now - started).num_seconds().max(0));
            let message = format!(
                "operation timed out: status '{}' held for {held_secs}s (threshold {}s)",
                doc.status, self.config.stale_after_secs
            );

            match self
                .store
                .transition(doc.id, GenerationStatus::Failed, Some(message.clone()))
                .await
            {
                Ok(_) => {
                    let _ = self.store.evict(doc.id).await;
                    tracing::warn!(
                        document = %doc.id,
                        slug = %doc.slug,
                        previous = %doc.status,
                        "stale operation reaped"
                    );
                    summary.reaped += 1;
                    summary.items.push(ReapedItem {
                        document: doc.id,
                        slug: doc.slug,
                        previous_status: doc.status,
                        message,
                    });
                }
                Err(err) => {
                    tracing::error!(document = %doc.id, error = %err, "reap transition failed");
                }
            }
        }

        tracing::info!(
            scanned = summary.scanned,
            reaped = summary.reaped,
            "reaper pass finished"
        );
        Ok(summary)
    }
}
