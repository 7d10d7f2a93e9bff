//! External source connector boundary
//!
//! The collaborator that resolves a stored connection into fresh content.
//! Credential storage and refresh happen behind this trait; the engine only
//! sees the latest raw content for a linked resource.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Latest content fetched from an external source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFetch {
    /// Raw content of the linked resource
    pub content: String,
    /// When the fetch happened
    pub fetched_at: DateTime<Utc>,
}

impl SourceFetch {
    /// Fetch result stamped now
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            fetched_at: Utc::now(),
        }
    }
}

/// Source fetch failure
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectorError {
    /// No stored connection with this ID
    #[error("connection not found: {0}")]
    ConnectionNotFound(Uuid),

    /// Access credential could not be refreshed
    #[error("credential refresh failed: {0}")]
    Credential(String),

    /// The upstream fetch itself failed
    #[error("source fetch failed: {0}")]
    Fetch(String),
}

/// Resolves stored connections and fetches linked resources
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// Fetch the latest raw content for a linked resource
    ///
    /// Implementations refresh the stored access credential when expired
    /// before fetching.
    async fn fetch_latest(
        &self,
        connection_id: Uuid,
        resource_id: &str,
    ) -> Result<SourceFetch, ConnectorError>;
}
