//! DGO Strategy System
//!
//! Two-tier modification strategy for dashboard artifacts: a fast
//! deterministic direct path with an expensive sandboxed agentic fallback.
//!
//! # Core Concepts
//!
//! - [`GenerationCapability`]: the AI engine boundary; direct and agentic
//!   implementations are interchangeable behind it
//! - [`InstructionClassifier`]: pluggable comprehensive-review detection
//! - [`StrategySelector`]: routes a request, falls back on direct failure,
//!   and labels the outcome with the path that actually ran
//!
//! # Example
//!
//! ```rust,ignore
//! use dgo_strategy::{StrategySelector, GenerationRequest};
//!
//! let selector = StrategySelector::new(direct, agentic);
//! let outcome = selector.execute(&request).await?;
//! println!("artifact produced by the {} path", outcome.path);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod capability;
mod classifier;
mod selector;

// Re-exports
pub use capability::{
    CapabilityError, GenerationCapability, GenerationOutput, GenerationRequest,
};
pub use classifier::{Escalation, InstructionClassifier, PhraseClassifier};
pub use selector::{StrategyError, StrategyOutcome, StrategyPath, StrategySelector};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
