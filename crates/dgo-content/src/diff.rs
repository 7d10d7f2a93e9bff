//! Structural diffing between source snapshots
//!
//! Produces a [`DiffSummary`] describing the scale of change between the
//! previously ingested content and a fresh fetch. The summary is a *hint*
//! for strategy selection, never a correctness gate: callers must behave
//! sensibly for any summary, including a degenerate one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Coarse classification of how much content changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeMagnitude {
    /// Byte-identical or no measurable line changes
    Unchanged,
    /// A handful of lines changed (localized edit)
    Minor,
    /// A substantial fraction changed
    Moderate,
    /// Most of the content changed (treat as a rewrite)
    Extensive,
}

impl ChangeMagnitude {
    fn classify(ratio: f64) -> Self {
        if ratio <= f64::EPSILON {
            Self::Unchanged
        } else if ratio < 0.15 {
            Self::Minor
        } else if ratio < 0.5 {
            Self::Moderate
        } else {
            Self::Extensive
        }
    }
}

/// Summary of the line-level difference between two source snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Lines present in the new content only
    pub lines_added: usize,
    /// Lines present in the old content only
    pub lines_removed: usize,
    /// Lines counted as in-place modifications (paired add/remove)
    pub lines_changed: usize,
    /// Fraction of the larger snapshot affected, in `[0.0, 1.0]`
    pub change_ratio: f64,
    /// Coarse classification derived from `change_ratio`
    pub magnitude: ChangeMagnitude,
}

impl DiffSummary {
    /// Summary for byte-identical content
    #[inline]
    #[must_use]
    pub fn unchanged() -> Self {
        Self {
            lines_added: 0,
            lines_removed: 0,
            lines_changed: 0,
            change_ratio: 0.0,
            magnitude: ChangeMagnitude::Unchanged,
        }
    }

    /// Total number of affected lines
    #[inline]
    #[must_use]
    pub fn total_affected(&self) -> usize {
        self.lines_added + self.lines_removed + self.lines_changed
    }

    /// True if any line-level difference was detected
    #[inline]
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.magnitude != ChangeMagnitude::Unchanged
    }

    /// One-line description for logs and change summaries
    #[must_use]
    pub fn describe(&self) -> String {
        format!(
            "{:?}: +{} -{} ~{} ({:.0}% of content)",
            self.magnitude,
            self.lines_added,
            self.lines_removed,
            self.lines_changed,
            self.change_ratio * 100.0
        )
    }
}

/// Compute a line-oriented diff summary between two snapshots
///
/// Lines are compared as unordered multisets: a line that merely moved does
/// not count as a change. An equal number of removed and added lines is
/// folded into `lines_changed` to approximate in-place edits. Pure and total:
/// empty inputs produce a well-formed summary.
#[must_use]
pub fn diff_content(previous: &str, current: &str) -> DiffSummary {
    if previous == current {
        return DiffSummary::unchanged();
    }

    let prev_lines: Vec<&str> = previous.lines().collect();
    let cur_lines: Vec<&str> = current.lines().collect();

    let mut counts: HashMap<&str, i64> = HashMap::new();
    for &line in &prev_lines {
        *counts.entry(line).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for &line in &cur_lines {
        if let Some(n) = counts.get_mut(line) {
            if *n > 0 {
                *n -= 1;
                common += 1;
            }
        }
    }

    let removed_total = prev_lines.len() - common;
    let added_total = cur_lines.len() - common;
    let lines_changed = removed_total.min(added_total);
    let lines_added = added_total - lines_changed;
    let lines_removed = removed_total - lines_changed;

    let span = prev_lines.len().max(cur_lines.len()).max(1);
    #[allow(clippy::cast_precision_loss)]
    let change_ratio = ((lines_added + lines_removed + lines_changed) as f64 / span as f64).min(1.0);

    DiffSummary {
        lines_added,
        lines_removed,
        lines_changed,
        change_ratio,
        magnitude: ChangeMagnitude::classify(change_ratio),
    }
}
