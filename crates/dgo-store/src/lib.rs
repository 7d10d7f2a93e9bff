//! DGO Document Store
//!
//! The document model and its persistence contracts: lifecycle state
//! machine, append-only version history, processing leases, and durable
//! bookkeeping-gap records.
//!
//! # Core Concepts
//!
//! - [`Document`]: the unit of work, carrying source content, the artifact,
//!   lifecycle bookkeeping, version counters, and sync linkage
//! - [`GenerationStatus`]: lifecycle states; transitions only along the
//!   state machine's edges
//! - [`DocumentVersion`]: immutable snapshot appended on every mutation
//! - [`ProcessLease`]: time-bounded exclusive claim acquired before any
//!   in-flight transition
//! - [`BookkeepingGap`]: durable record of a failed secondary step
//! - [`MemoryStore`]: in-memory implementation of all store traits
//!
//! # Example
//!
//! ```rust,ignore
//! use dgo_store::{Document, DocumentStore, GenerationStatus, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.create(Document::new("q3-revenue", scope, csv)).await?;
//! store.transition(id, GenerationStatus::Analyzing, None).await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod document;
mod gap;
mod lease;
mod lifecycle;
mod memory;
mod store;
mod version;

// Re-exports
pub use document::{Document, DocumentId, SyncSource};
pub use gap::{BookkeepingGap, SagaStep};
pub use lease::{LeaseError, ProcessLease};
pub use lifecycle::{
    allowed_transitions, validate_transition, GenerationStatus, LifecycleError,
};
pub use memory::MemoryStore;
pub use store::{
    ArtifactUpdate, Datastore, DocumentStore, GapStore, LeaseStore, StoreError, VersionStore,
};
pub use version::{
    DocumentVersion, VersionChangeType, VersionId, VersionNumber, VersionSnapshot,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
