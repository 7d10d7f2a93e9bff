//! Trigger surface
//!
//! The two periodic entry points (run a sync batch, run stale-status
//! cleanup), authenticated by a shared-secret bearer credential. Transport
//! is someone else's concern; this layer is the typed API an HTTP handler
//! or scheduler shim calls into.

use std::sync::Arc;

use crate::engine::OrchestrationEngine;
use crate::error::EngineError;
use crate::reaper::ReaperSummary;
use crate::sync::SyncBatchSummary;

/// Authenticated access to the periodic triggers
pub struct TriggerSurface {
    engine: Arc<OrchestrationEngine>,
    secret: String,
}

impl std::fmt::Debug for TriggerSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerSurface").finish_non_exhaustive()
    }
}

impl TriggerSurface {
    /// Create a surface guarding an engine with a shared secret
    #[must_use]
    pub fn new(engine: Arc<OrchestrationEngine>, secret: impl Into<String>) -> Self {
        Self {
            engine,
            secret: secret.into(),
        }
    }

    fn authorize(&self, bearer: &str) -> Result<(), EngineError> {
        if bearer == self.secret {
            Ok(())
        } else {
            tracing::warn!("trigger rejected: bad bearer credential");
            Err(EngineError::Unauthorized)
        }
    }

    /// Run one sync batch
    ///
    /// # Errors
    /// `Unauthorized` on a bad credential; otherwise only batch-fatal
    /// failures from the engine.
    pub async fn trigger_sync(&self, bearer: &str) -> Result<SyncBatchSummary, EngineError> {
        self.authorize(bearer)?;
        self.engine.run_sync_batch().await
    }

    /// Run one stale-status cleanup pass
    ///
    /// # Errors
    /// `Unauthorized` on a bad credential; otherwise only batch-fatal
    /// failures from the engine.
    pub async fn trigger_cleanup(&self, bearer: &str) -> Result<ReaperSummary, EngineError> {
        self.authorize(bearer)?;
        self.engine.run_reaper().await
    }
}
