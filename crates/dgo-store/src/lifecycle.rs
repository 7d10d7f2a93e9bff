//! Document lifecycle state machine
//!
//! Governs the `status` field of a document and the legal transitions
//! between states. Every other component advances documents only along
//! these edges; the timestamp contract (started/completed/error fields)
//! is enforced by the store's transition operation.

use serde::{Deserialize, Serialize};

/// Generation status of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Created, generation not yet started
    Pending,
    /// Source data is being analyzed
    Analyzing,
    /// The artifact is being generated
    Generating,
    /// An already-completed document is being updated
    Refreshing,
    /// Generation finished; the document carries an artifact
    Completed,
    /// Generation failed; `generation_error` describes why
    Failed,
}

impl GenerationStatus {
    /// String form used in persisted rows and summaries
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Analyzing => "analyzing",
            Self::Generating => "generating",
            Self::Refreshing => "refreshing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// True for states no in-flight operation holds
    ///
    /// `Completed` is terminal but may be re-entered into `Refreshing` by a
    /// later sync cycle; `Failed` has no outgoing edges.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// True for states an operation is currently holding
    #[inline]
    #[must_use]
    pub const fn is_in_flight(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    /// Transition not present in the state machine
    #[error("illegal status transition: {from} -> {to}")]
    IllegalTransition {
        from: GenerationStatus,
        to: GenerationStatus,
    },
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: GenerationStatus) -> Vec<GenerationStatus> {
    use GenerationStatus::{Analyzing, Completed, Failed, Generating, Pending, Refreshing};
    match from {
        Pending => vec![Analyzing, Failed],
        Analyzing => vec![Generating, Failed],
        Generating => vec![Completed, Failed],
        Completed => vec![Refreshing],
        Refreshing => vec![Completed, Failed],
        Failed => vec![],
    }
}

/// Validates a state transition.
pub fn validate_transition(
    from: GenerationStatus,
    to: GenerationStatus,
) -> Result<(), LifecycleError> {
    if allowed(from, to) {
        Ok(())
    } else {
        Err(LifecycleError::IllegalTransition { from, to })
    }
}

fn allowed(from: GenerationStatus, to: GenerationStatus) -> bool {
    allowed_transitions(from).into_iter().any(|s| s == to)
}
