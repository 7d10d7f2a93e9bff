//! Document model
//!
//! A document is the unit of work: the ingested source content, the
//! generated dashboard artifact, lifecycle bookkeeping, version counters,
//! and the optional link to an external data source that keeps it fresh.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use uuid::Uuid;

use dgo_content::{ContentFingerprint, DashboardConfig, TableData};
use dgo_ledger::ScopeId;

use crate::lifecycle::GenerationStatus;
use crate::version::VersionNumber;

/// Unique document identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(pub Ulid);

impl DocumentId {
    /// Generate new document ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Link to the external source a document is synchronized against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSource {
    /// Stored connection the connector resolves credentials for
    pub connection_id: Uuid,
    /// Resource within the connection (sheet id, file path, ...)
    pub resource_id: String,
    /// Whether scheduled refresh is enabled
    pub enabled: bool,
    /// Completion time of the last sync pass that looked at this document
    pub last_synced_at: Option<DateTime<Utc>>,
}

impl SyncSource {
    /// Enabled link that has never been synced
    #[must_use]
    pub fn new(connection_id: Uuid, resource_id: impl Into<String>) -> Self {
        Self {
            connection_id,
            resource_id: resource_id.into(),
            enabled: true,
            last_synced_at: None,
        }
    }
}

/// The unit of work: a dashboard document
///
/// # Invariants
/// - `status` only changes along the lifecycle state machine's edges
/// - `content_hash` is always the fingerprint of the stored `raw_content`
/// - a completed document always has a non-`None` `config`
/// - a document in any in-flight status has `generation_started_at` set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document ID
    pub id: DocumentId,
    /// URL-friendly identity, unique within the owning scope
    pub slug: String,
    /// Billing scope charged for this document's usage
    pub scope: ScopeId,
    /// Last-ingested source content
    pub raw_content: String,
    /// Fingerprint of `raw_content`
    pub content_hash: ContentFingerprint,
    /// Generated artifact; present once generation has completed
    pub config: Option<DashboardConfig>,
    /// Parsed tabular cache of `raw_content`
    pub data: Option<TableData>,
    /// Lifecycle status
    pub status: GenerationStatus,
    /// When the current (or last) in-flight operation began
    pub generation_started_at: Option<DateTime<Utc>>,
    /// When the last operation reached a terminal state
    pub generation_completed_at: Option<DateTime<Utc>>,
    /// Failure description when `status` is failed
    pub generation_error: Option<String>,
    /// Current version counters; the next snapshot bumps from here
    pub version: VersionNumber,
    /// External source linkage, when this document syncs
    pub sync: Option<SyncSource>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Create a pending document from freshly ingested content
    ///
    /// The document starts in `Pending` with `generation_started_at` set so
    /// an abandoned document is visible to staleness scans from the moment
    /// it exists.
    #[must_use]
    pub fn new(slug: impl Into<String>, scope: ScopeId, raw_content: impl Into<String>) -> Self {
        let raw_content = raw_content.into();
        let now = Utc::now();
        Self {
            id: DocumentId::new(),
            slug: slug.into(),
            scope,
            content_hash: ContentFingerprint::of_str(&raw_content),
            raw_content,
            config: None,
            data: None,
            status: GenerationStatus::Pending,
            generation_started_at: Some(now),
            generation_completed_at: None,
            generation_error: None,
            version: VersionNumber::zero(),
            sync: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach an external source link
    #[inline]
    #[must_use]
    pub fn with_sync(mut self, sync: SyncSource) -> Self {
        self.sync = Some(sync);
        self
    }

    /// True when a sync pass should consider this document
    ///
    /// Requires a completed document with an enabled external link and a
    /// `last_synced_at` that is absent or older than `cutoff`. In-flight
    /// documents are excluded (the status field is the advisory lock), and
    /// failed documents stay out until regenerated.
    #[must_use]
    pub fn due_for_sync(&self, cutoff: DateTime<Utc>) -> bool {
        if self.status != GenerationStatus::Completed {
            return false;
        }
        match &self.sync {
            Some(link) if link.enabled => {
                link.last_synced_at.map_or(true, |last| last < cutoff)
            }
            _ => false,
        }
    }

    /// True when an in-flight operation has outlived `cutoff`
    #[must_use]
    pub fn is_stuck(&self, cutoff: DateTime<Utc>) -> bool {
        self.status.is_in_flight()
            && self
                .generation_started_at
                .is_some_and(|started| started < cutoff)
    }
}
