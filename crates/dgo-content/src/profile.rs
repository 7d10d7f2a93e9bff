//! Source data profiling
//!
//! Parses delimited raw content into a [`TableData`] cache and computes a
//! [`DataProfile`] (column kinds, null counts, numeric stats). The profile is
//! handed to the generation capability as analysis context so it does not
//! have to rediscover column roles on every run. Profiling never fails:
//! content that does not parse as a table yields an empty profile.

use serde::{Deserialize, Serialize};

use crate::dashboard::TableData;

/// Inferred kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Every non-empty cell parsed as a number
    Numeric,
    /// Anything else
    Text,
}

/// Per-column statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column name from the header row
    pub name: String,
    /// Inferred kind
    pub kind: ColumnKind,
    /// Number of empty cells
    pub null_count: usize,
    /// Minimum value (numeric columns only)
    pub min: Option<f64>,
    /// Maximum value (numeric columns only)
    pub max: Option<f64>,
    /// Mean value (numeric columns only)
    pub mean: Option<f64>,
}

/// Profile of a document's tabular source data
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataProfile {
    /// Number of data rows
    pub row_count: usize,
    /// Per-column statistics
    pub columns: Vec<ColumnProfile>,
}

impl DataProfile {
    /// True when nothing was profiled
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Names of numeric columns, in table order
    #[must_use]
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Numeric)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Build a profile from parsed table data
    #[must_use]
    pub fn from_table(table: &TableData) -> Self {
        let columns = table
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| profile_column(name, &table.column_values(idx)))
            .collect();
        Self {
            row_count: table.row_count(),
            columns,
        }
    }
}

fn profile_column(name: &str, values: &[&str]) -> ColumnProfile {
    let null_count = values.iter().filter(|v| v.trim().is_empty()).count();
    let numbers: Vec<f64> = values
        .iter()
        .filter(|v| !v.trim().is_empty())
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect();

    let non_empty = values.len() - null_count;
    let numeric = non_empty > 0 && numbers.len() == non_empty;

    if numeric {
        let min = numbers.iter().copied().fold(f64::INFINITY, f64::min);
        let max = numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        #[allow(clippy::cast_precision_loss)]
        let mean = numbers.iter().sum::<f64>() / numbers.len() as f64;
        ColumnProfile {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
            null_count,
            min: Some(min),
            max: Some(max),
            mean: Some(mean),
        }
    } else {
        ColumnProfile {
            name: name.to_string(),
            kind: ColumnKind::Text,
            null_count,
            min: None,
            max: None,
            mean: None,
        }
    }
}

/// Parse delimited text into a table
///
/// The delimiter (comma or tab) is chosen by frequency in the header row.
/// Returns `None` when the content has no header row.
#[must_use]
pub fn parse_table(raw: &str) -> Option<TableData> {
    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());
    let header = lines.next()?;

    let delimiter = if header.matches('\t').count() > header.matches(',').count() {
        '\t'
    } else {
        ','
    };

    let columns: Vec<String> = header
        .split(delimiter)
        .map(|c| c.trim().to_string())
        .collect();
    let rows: Vec<Vec<String>> = lines
        .map(|line| {
            line.split(delimiter)
                .map(|c| c.trim().to_string())
                .collect()
        })
        .collect();

    Some(TableData { columns, rows })
}

/// Parse and profile raw content in one step
///
/// Unparseable content yields an empty profile rather than an error so that
/// profiling can never block generation.
#[must_use]
pub fn profile_content(raw: &str) -> DataProfile {
    parse_table(raw)
        .map(|t| DataProfile::from_table(&t))
        .unwrap_or_default()
}
