//! In-memory datastore
//!
//! Reference implementation of the datastore traits used by tests and the
//! demo binary. Per-document mutations run under the map's entry lock, which
//! stands in for the conditional single-row update a production datastore
//! performs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;

use dgo_ledger::ScopeId;

use crate::document::{Document, DocumentId};
use crate::gap::BookkeepingGap;
use crate::lease::{LeaseError, ProcessLease};
use crate::lifecycle::{validate_transition, GenerationStatus};
use crate::store::{
    ArtifactUpdate, DocumentStore, GapStore, LeaseStore, StoreError, VersionStore,
};
use crate::version::{
    DocumentVersion, VersionChangeType, VersionId, VersionSnapshot,
};

/// In-memory implementation of all datastore traits
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: DashMap<DocumentId, Document>,
    slugs: DashMap<(ScopeId, String), DocumentId>,
    versions: DashMap<DocumentId, Vec<DocumentVersion>>,
    leases: DashMap<DocumentId, ProcessLease>,
    gaps: Mutex<Vec<BookkeepingGap>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

fn apply_status(doc: &mut Document, to: GenerationStatus, error: Option<String>) {
    let now = Utc::now();
    doc.status = to;
    doc.updated_at = now;
    if to.is_in_flight() {
        doc.generation_started_at = Some(now);
        doc.generation_completed_at = None;
        doc.generation_error = None;
    } else {
        doc.generation_completed_at = Some(now);
        doc.generation_error = match to {
            GenerationStatus::Failed => {
                Some(error.unwrap_or_else(|| "generation failed".to_string()))
            }
            _ => None,
        };
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, document: Document) -> Result<(), StoreError> {
        let slug_key = (document.scope, document.slug.clone());
        if self.slugs.contains_key(&slug_key) {
            return Err(StoreError::SlugTaken(document.slug));
        }
        self.slugs.insert(slug_key, document.id);
        self.documents.insert(document.id, document);
        Ok(())
    }

    async fn fetch(&self, id: DocumentId) -> Result<Document, StoreError> {
        self.documents
            .get(&id)
            .map(|d| d.clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn transition(
        &self,
        id: DocumentId,
        to: GenerationStatus,
        error: Option<String>,
    ) -> Result<Document, StoreError> {
        let mut entry = self.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        validate_transition(entry.status, to)?;
        apply_status(&mut entry, to, error);
        tracing::debug!(document = %id, status = %to, "status transition");
        Ok(entry.clone())
    }

    async fn apply_update(
        &self,
        id: DocumentId,
        update: ArtifactUpdate,
    ) -> Result<Document, StoreError> {
        let mut entry = self.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        entry.config = Some(update.config);
        entry.raw_content = update.raw_content;
        entry.content_hash = update.content_hash;
        entry.data = update.data;
        if let (Some(at), Some(link)) = (update.synced_at, entry.sync.as_mut()) {
            link.last_synced_at = Some(at);
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn touch_synced(
        &self,
        id: DocumentId,
        at: DateTime<Utc>,
    ) -> Result<Document, StoreError> {
        let mut entry = self.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if let Some(link) = entry.sync.as_mut() {
            link.last_synced_at = Some(at);
        }
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn list_due_for_sync(
        &self,
        cutoff: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let mut due: Vec<Document> = self
            .documents
            .iter()
            .filter(|d| d.due_for_sync(cutoff))
            .map(|d| d.clone())
            .collect();
        // Never-synced documents first, then oldest sync time.
        due.sort_by_key(|d| d.sync.as_ref().and_then(|s| s.last_synced_at));
        due.truncate(limit);
        Ok(due)
    }

    async fn list_stuck(&self, cutoff: DateTime<Utc>) -> Result<Vec<Document>, StoreError> {
        Ok(self
            .documents
            .iter()
            .filter(|d| d.is_stuck(cutoff))
            .map(|d| d.clone())
            .collect())
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn append(
        &self,
        id: DocumentId,
        change_type: VersionChangeType,
        summary: String,
        snapshot: VersionSnapshot,
    ) -> Result<DocumentVersion, StoreError> {
        let mut entry = self.documents.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        let number = entry.version.bump(change_type);
        entry.version = number;
        entry.updated_at = Utc::now();

        let version = DocumentVersion {
            id: VersionId::new(),
            document: id,
            number,
            change_type,
            summary,
            snapshot,
            created_at: Utc::now(),
        };
        self.versions.entry(id).or_default().push(version.clone());
        Ok(version)
    }

    async fn list(&self, id: DocumentId) -> Result<Vec<DocumentVersion>, StoreError> {
        Ok(self
            .versions
            .get(&id)
            .map(|v| v.clone())
            .unwrap_or_default())
    }

    async fn count(&self, id: DocumentId) -> Result<usize, StoreError> {
        Ok(self.versions.get(&id).map_or(0, |v| v.len()))
    }
}

#[async_trait]
impl LeaseStore for MemoryStore {
    async fn acquire(
        &self,
        document: DocumentId,
        holder: &str,
        ttl: Duration,
    ) -> Result<ProcessLease, StoreError> {
        let now = Utc::now();
        match self.leases.entry(document) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let existing = occupied.get();
                if !existing.is_expired(now) {
                    return Err(LeaseError::AlreadyHeld {
                        document,
                        holder: existing.holder.clone(),
                        expires_at: existing.expires_at,
                    }
                    .into());
                }
                let lease = ProcessLease::claim(document, holder, ttl);
                occupied.insert(lease.clone());
                Ok(lease)
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let lease = ProcessLease::claim(document, holder, ttl);
                vacant.insert(lease.clone());
                Ok(lease)
            }
        }
    }

    async fn release(&self, document: DocumentId, holder: &str) -> Result<(), StoreError> {
        self.leases
            .remove_if(&document, |_, lease| lease.holder == holder);
        Ok(())
    }

    async fn evict(&self, document: DocumentId) -> Result<(), StoreError> {
        self.leases.remove(&document);
        Ok(())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<ProcessLease>, StoreError> {
        Ok(self
            .leases
            .iter()
            .filter(|l| l.is_expired(now))
            .map(|l| l.clone())
            .collect())
    }
}

#[async_trait]
impl GapStore for MemoryStore {
    async fn record(&self, gap: BookkeepingGap) -> Result<(), StoreError> {
        tracing::warn!(
            document = %gap.document,
            step = %gap.step,
            detail = %gap.detail,
            "bookkeeping gap recorded"
        );
        self.gaps.lock().push(gap);
        Ok(())
    }

    async fn all(&self) -> Result<Vec<BookkeepingGap>, StoreError> {
        Ok(self.gaps.lock().clone())
    }

    async fn for_document(&self, id: DocumentId) -> Result<Vec<BookkeepingGap>, StoreError> {
        Ok(self
            .gaps
            .lock()
            .iter()
            .filter(|g| g.document == id)
            .cloned()
            .collect())
    }
}
