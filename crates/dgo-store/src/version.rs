//! Immutable version snapshots
//!
//! Every successful mutation of a document appends one [`DocumentVersion`]:
//! a full copy of the artifact, raw content, and data cache at that point,
//! tagged with a change type and a human-readable summary. Versions are
//! never mutated or deleted; numbers are monotonic and never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use dgo_content::{DashboardConfig, TableData};

use crate::document::DocumentId;

/// Unique version row identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VersionId(pub Ulid);

impl VersionId {
    /// Generate new version ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for VersionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic (major, minor) version pair
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct VersionNumber {
    /// Major version; bumped by restores
    pub major: u32,
    /// Minor version; bumped by refreshes and modifications
    pub minor: u32,
}

impl VersionNumber {
    /// Version pair of a document that has never been generated
    #[inline]
    #[must_use]
    pub const fn zero() -> Self {
        Self { major: 0, minor: 0 }
    }

    /// Next version number for the given change type
    #[inline]
    #[must_use]
    pub const fn bump(self, change_type: VersionChangeType) -> Self {
        match change_type {
            VersionChangeType::Initial => Self { major: 1, minor: 0 },
            VersionChangeType::AiModification | VersionChangeType::DataRefresh => Self {
                major: self.major,
                minor: self.minor + 1,
            },
            VersionChangeType::Restore => Self {
                major: self.major + 1,
                minor: 0,
            },
        }
    }
}

impl std::fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

/// What kind of change produced a version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionChangeType {
    /// First successful generation
    Initial,
    /// Interactive AI modification
    AiModification,
    /// Scheduled data refresh
    DataRefresh,
    /// Roll back to an earlier snapshot
    Restore,
}

impl VersionChangeType {
    /// String form used in persisted rows
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::AiModification => "ai_modification",
            Self::DataRefresh => "data_refresh",
            Self::Restore => "restore",
        }
    }
}

impl std::fmt::Display for VersionChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Full state captured by a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    /// The artifact at this point
    pub config: Option<DashboardConfig>,
    /// The ingested source content at this point
    pub raw_content: String,
    /// Parsed tabular cache at this point
    pub data: Option<TableData>,
}

/// One immutable snapshot in a document's change history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    /// Version row ID
    pub id: VersionId,
    /// Owning document
    pub document: DocumentId,
    /// Assigned (major, minor) pair, unique per document
    pub number: VersionNumber,
    /// What kind of change produced this version
    pub change_type: VersionChangeType,
    /// Human-readable change summary
    pub summary: String,
    /// Captured state
    pub snapshot: VersionSnapshot,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}
