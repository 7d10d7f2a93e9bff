//! Refresh notification boundary
//!
//! Fire-and-forget owner notification after a successful refresh. A failing
//! notifier never fails the refresh; the engine records a bookkeeping gap
//! and moves on.

use async_trait::async_trait;

use dgo_store::{DocumentId, VersionNumber};

/// What a refresh notice tells the owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshNotice {
    /// Refreshed document
    pub document: DocumentId,
    /// Document slug, for display
    pub slug: String,
    /// Human-readable change summary
    pub change_summary: String,
    /// Version the refresh produced
    pub version: VersionNumber,
}

/// Notification failure
#[derive(Debug, Clone, thiserror::Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Sends refresh notices to document owners
#[async_trait]
pub trait RefreshNotifier: Send + Sync {
    /// Deliver one notice
    async fn notify_refreshed(&self, notice: RefreshNotice) -> Result<(), NotifyError>;
}

/// Notifier that only logs
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl RefreshNotifier for LogNotifier {
    async fn notify_refreshed(&self, notice: RefreshNotice) -> Result<(), NotifyError> {
        tracing::info!(
            document = %notice.document,
            slug = %notice.slug,
            version = %notice.version,
            "dashboard refreshed: {}",
            notice.change_summary
        );
        Ok(())
    }
}
