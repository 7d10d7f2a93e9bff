//! Datastore traits
//!
//! Contracts the orchestration engine drives. Backends must provide
//! at least read-committed isolation; status transitions and lease
//! acquisition are conditional single operations, never read-then-write
//! in application code.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use dgo_content::{ContentFingerprint, DashboardConfig, TableData};

use crate::document::{Document, DocumentId};
use crate::gap::BookkeepingGap;
use crate::lease::{LeaseError, ProcessLease};
use crate::lifecycle::{GenerationStatus, LifecycleError};
use crate::version::{DocumentVersion, VersionChangeType, VersionSnapshot};

/// Errors surfaced by datastore operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No document with the given ID
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// A document with this slug already exists in the scope
    #[error("slug already taken: {0}")]
    SlugTaken(String),

    /// Requested status change violates the state machine
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Lease acquisition failed
    #[error(transparent)]
    Lease(#[from] LeaseError),

    /// Underlying datastore failed
    #[error("datastore failure: {0}")]
    Backend(String),
}

/// Primary mutation applied after a successful generation run
///
/// Constructed through [`ArtifactUpdate::new`] so the stored fingerprint is
/// always computed from the stored content.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactUpdate {
    /// The freshly generated artifact
    pub config: DashboardConfig,
    /// Source content the artifact was generated from
    pub raw_content: String,
    /// Fingerprint of `raw_content`
    pub content_hash: ContentFingerprint,
    /// Parsed tabular cache, when the content parsed as a table
    pub data: Option<TableData>,
    /// Sync completion time to record, for refresh runs
    pub synced_at: Option<DateTime<Utc>>,
}

impl ArtifactUpdate {
    /// Build an update whose fingerprint matches its content
    #[must_use]
    pub fn new(config: DashboardConfig, raw_content: impl Into<String>, data: Option<TableData>) -> Self {
        let raw_content = raw_content.into();
        Self {
            config,
            content_hash: ContentFingerprint::of_str(&raw_content),
            raw_content,
            data,
            synced_at: None,
        }
    }

    /// Record a sync completion time with the update
    #[inline]
    #[must_use]
    pub fn with_synced_at(mut self, at: DateTime<Utc>) -> Self {
        self.synced_at = Some(at);
        self
    }
}

/// Document persistence
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist a new document
    async fn create(&self, document: Document) -> Result<(), StoreError>;

    /// Fetch a document by ID
    async fn fetch(&self, id: DocumentId) -> Result<Document, StoreError>;

    /// Conditionally advance a document's status
    ///
    /// Validates the edge against the current status and applies the
    /// timestamp contract in the same operation: entering an in-flight
    /// state records `generation_started_at` and clears the terminal
    /// fields; entering a terminal state records `generation_completed_at`
    /// and, for failures, `generation_error`.
    async fn transition(
        &self,
        id: DocumentId,
        to: GenerationStatus,
        error: Option<String>,
    ) -> Result<Document, StoreError>;

    /// Apply the primary artifact mutation
    async fn apply_update(
        &self,
        id: DocumentId,
        update: ArtifactUpdate,
    ) -> Result<Document, StoreError>;

    /// Record a sync pass that found the content unchanged
    async fn touch_synced(
        &self,
        id: DocumentId,
        at: DateTime<Utc>,
    ) -> Result<Document, StoreError>;

    /// Documents eligible for a sync pass, oldest-synced first
    ///
    /// Eligible: sync enabled, external link present, not in flight, and
    /// `last_synced_at` absent or older than `cutoff`. At most `limit` rows.
    async fn list_due_for_sync(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError>;

    /// Documents whose in-flight status has outlived `cutoff`
    async fn list_stuck(&self, cutoff: DateTime<Utc>) -> Result<Vec<Document>, StoreError>;
}

/// Append-only version history
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Append a snapshot, assigning the next version number
    ///
    /// Bumps the document's stored counters according to change-type policy
    /// and persists the immutable row in the same operation.
    async fn append(
        &self,
        id: DocumentId,
        change_type: VersionChangeType,
        summary: String,
        snapshot: VersionSnapshot,
    ) -> Result<DocumentVersion, StoreError>;

    /// All versions of a document, oldest first
    async fn list(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, StoreError>;

    /// Number of versions of a document
    async fn count(&self, id: DocumentId) -> Result<usize, StoreError>;
}

/// Lease persistence
#[async_trait]
pub trait LeaseStore: Send + Sync {
    /// Claim a document for processing
    ///
    /// Fails with [`LeaseError::AlreadyHeld`] when another holder's
    /// unexpired lease exists; an expired lease is replaced.
    async fn acquire(
        &self,
        document: DocumentId,
        holder: &str,
        ttl: Duration,
    ) -> Result<ProcessLease, StoreError>;

    /// Release a claim; a no-op when the lease is gone or held by another
    async fn release(&self, document: DocumentId, holder: &str) -> Result<(), StoreError>;

    /// Drop a lease regardless of holder (reaper use)
    async fn evict(&self, document: DocumentId) -> Result<(), StoreError>;

    /// Leases that have lapsed as of `now`
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ProcessLease>, StoreError>;
}

/// Bookkeeping gap persistence
#[async_trait]
pub trait GapStore: Send + Sync {
    /// Record a failed secondary step
    async fn record(&self, gap: BookkeepingGap) -> Result<(), StoreError>;

    /// All recorded gaps, oldest first
    async fn all(&self) -> Result<Vec<BookkeepingGap>, StoreError>;

    /// Gaps recorded for one document, oldest first
    async fn for_document(&self, id: DocumentId) -> Result<Vec<BookkeepingGap>, StoreError>;
}

/// Everything the orchestration engine needs from one backend
pub trait Datastore: DocumentStore + VersionStore + LeaseStore + GapStore {}

impl<T: DocumentStore + VersionStore + LeaseStore + GapStore> Datastore for T {}
