//! Bookkeeping gap records
//!
//! The artifact persist is the primary step of every pipeline; ledger
//! deduction, version snapshotting, and notification are secondary steps
//! allowed to fail without rolling the artifact back. Each such failure is
//! recorded as a durable gap so a reconciliation job can detect and backfill
//! missed charges and snapshots instead of losing them to a silent swallow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::document::DocumentId;

/// Secondary pipeline step that may leave a gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SagaStep {
    /// Credit deduction against the owning scope
    LedgerDeduction,
    /// Version snapshot append
    VersionSnapshot,
    /// Owner notification
    Notification,
}

impl SagaStep {
    /// String form used in persisted rows
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LedgerDeduction => "ledger_deduction",
            Self::VersionSnapshot => "version_snapshot",
            Self::Notification => "notification",
        }
    }
}

impl std::fmt::Display for SagaStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Durable record of a failed secondary step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookkeepingGap {
    /// Gap row ID
    pub id: Ulid,
    /// Document whose pipeline left the gap
    pub document: DocumentId,
    /// Which secondary step failed
    pub step: SagaStep,
    /// What went wrong
    pub detail: String,
    /// When the failure was observed
    pub occurred_at: DateTime<Utc>,
}

impl BookkeepingGap {
    /// Record a failure observed now
    #[must_use]
    pub fn new(document: DocumentId, step: SagaStep, detail: impl Into<String>) -> Self {
        Self {
            id: Ulid::new(),
            document,
            step,
            detail: detail.into(),
            occurred_at: Utc::now(),
        }
    }
}
