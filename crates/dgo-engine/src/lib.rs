//! DGO Orchestration Engine
//!
//! The generation/refresh pipeline that keeps AI-produced dashboards
//! synchronized with their source data.
//!
//! # Core Concepts
//!
//! - [`OrchestrationEngine`]: the generate/modify pipelines over the
//!   datastore, ledger, strategy selector, connector, and notifier
//! - [`SyncBatchSummary`]: result of one periodic sync batch (fingerprint
//!   check first, regeneration only on change, per-document isolation)
//! - [`ReaperSummary`]: result of one stale-operation cleanup pass
//! - [`TriggerSurface`]: shared-secret authenticated periodic entry points
//!
//! # Example
//!
//! ```rust,ignore
//! use dgo_engine::{EngineConfig, OrchestrationEngine, TriggerSurface};
//!
//! let engine = OrchestrationEngine::new(
//!     EngineConfig::default(), store, ledger, direct, agentic, connector, notifier,
//! );
//! let receipt = engine.generate(document_id).await?;
//! println!("generated {} via {}", receipt.document.slug, receipt.path);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod api;
mod config;
mod connector;
mod engine;
mod error;
mod notify;
mod reaper;
mod sync;

// Re-exports
pub use api::TriggerSurface;
pub use config::EngineConfig;
pub use connector::{ConnectorError, SourceConnector, SourceFetch};
pub use engine::{OrchestrationEngine, PipelineReceipt};
pub use error::EngineError;
pub use notify::{LogNotifier, NotifyError, RefreshNotice, RefreshNotifier};
pub use reaper::{ReapedItem, ReaperSummary};
pub use sync::{SyncBatchSummary, SyncItemResult, SyncOutcome};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
