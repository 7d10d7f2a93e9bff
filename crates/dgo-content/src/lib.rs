//! DGO Content System
//!
//! Change detection and artifact payloads for generated dashboards.
//!
//! # Core Concepts
//!
//! - [`ContentFingerprint`]: 32-byte Blake3 digest for cheap change detection
//! - [`DiffSummary`]: line-level scale-of-change hint for strategy selection
//! - [`DashboardConfig`]: the generated artifact a completed document carries
//! - [`DataProfile`]: column kinds and stats fed to the generation capability
//!
//! # Example
//!
//! ```rust,ignore
//! use dgo_content::{diff_content, ContentFingerprint};
//!
//! let stored = ContentFingerprint::of_str(&previous);
//! if !stored.matches(&fetched) {
//!     let summary = diff_content(&previous, &fetched);
//!     println!("changed: {}", summary.describe());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod dashboard;
mod diff;
mod fingerprint;
mod profile;

// Re-exports
pub use dashboard::{BrandingContext, DashboardConfig, TableData};
pub use diff::{diff_content, ChangeMagnitude, DiffSummary};
pub use fingerprint::{ContentFingerprint, FingerprintError};
pub use profile::{parse_table, profile_content, ColumnKind, ColumnProfile, DataProfile};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
