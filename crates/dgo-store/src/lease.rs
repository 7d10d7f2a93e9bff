//! Processing leases
//!
//! A lease is a time-bounded exclusive claim on a document, acquired before
//! any in-flight status transition and released on completion. At most one
//! active lease exists per document; expired leases are claimable by the
//! next caller and visible to the reaper.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::document::DocumentId;

/// Exclusive claim on a document's processing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLease {
    /// Leased document
    pub document: DocumentId,
    /// Identity of the claiming worker (trigger name, task id, ...)
    pub holder: String,
    /// When the claim was made
    pub acquired_at: DateTime<Utc>,
    /// When the claim lapses if not released
    pub expires_at: DateTime<Utc>,
}

impl ProcessLease {
    /// Create a lease starting now
    #[must_use]
    pub fn claim(document: DocumentId, holder: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            document,
            holder: holder.into(),
            acquired_at: now,
            expires_at: now + ttl,
        }
    }

    /// True once the claim has lapsed
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Lease acquisition failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaseError {
    /// Another worker holds an unexpired lease on the document
    #[error("document {document} is leased by {holder} until {expires_at}")]
    AlreadyHeld {
        document: DocumentId,
        holder: String,
        expires_at: DateTime<Utc>,
    },
}
