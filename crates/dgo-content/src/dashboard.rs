//! Dashboard artifact types
//!
//! The generated artifact a document carries once generation has completed:
//! structured layout, embedded render payload, and generation metadata.
//! Rendering itself happens elsewhere; these types only carry the payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The generated dashboard artifact
///
/// # Invariants
/// - A document in the completed state always carries one of these
/// - Replaced wholesale on every successful generation or modification;
///   never patched in place (history lives in the version store)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Display title
    pub title: String,
    /// Structured layout description (charts, tables, stat tiles)
    pub layout: serde_json::Value,
    /// Embedded render payload, self-contained
    pub render_html: String,
    /// Short description of what the dashboard shows
    pub summary: String,
    /// When this artifact was produced
    pub generated_at: DateTime<Utc>,
}

impl DashboardConfig {
    /// Create a new artifact stamped with the current time
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        layout: serde_json::Value,
        render_html: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            layout,
            render_html: render_html.into(),
            summary: summary.into(),
            generated_at: Utc::now(),
        }
    }
}

/// Parsed tabular cache of a document's raw content
///
/// Optional: only present when the raw content parsed as a table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableData {
    /// Column names from the header row
    pub columns: Vec<String>,
    /// Data rows, one cell per column
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    /// Number of data rows
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// True when no header and no rows were parsed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Values of a single column by index
    #[must_use]
    pub fn column_values(&self, index: usize) -> Vec<&str> {
        self.rows
            .iter()
            .filter_map(|r| r.get(index).map(String::as_str))
            .collect()
    }
}

/// Branding context handed to the generation capability
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BrandingContext {
    /// Product or organization name shown on the dashboard
    pub product_name: Option<String>,
    /// Accent color as a hex string
    pub accent_color: Option<String>,
    /// Logo URL embedded in the header
    pub logo_url: Option<String>,
}
