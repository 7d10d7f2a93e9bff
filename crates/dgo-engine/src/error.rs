//! Engine error taxonomy
//!
//! Expected outcomes (insufficient credits, busy documents) are their own
//! variants with HTTP-equivalent status codes; datastore and strategy
//! failures pass through with their causes intact.

use dgo_ledger::{LedgerError, ScopeId};
use dgo_store::{DocumentId, LeaseError, StoreError};
use dgo_strategy::StrategyError;

use crate::connector::ConnectorError;

/// Errors surfaced by engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No document with the given ID
    #[error("document not found: {0}")]
    NotFound(DocumentId),

    /// The caller's scope does not own the document
    #[error("document {document} does not belong to scope {scope}")]
    Forbidden {
        document: DocumentId,
        scope: ScopeId,
    },

    /// Balance does not cover the operation
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits {
        /// Credits the operation needs
        required: u64,
        /// Credits actually available
        available: u64,
    },

    /// Another worker is processing the document
    #[error("document {document} is busy: {reason}")]
    Busy {
        document: DocumentId,
        reason: String,
    },

    /// Trigger credential did not match
    #[error("unauthorized")]
    Unauthorized,

    /// No modification path produced an artifact
    #[error(transparent)]
    Strategy(#[from] StrategyError),

    /// External source fetch failed
    #[error(transparent)]
    Connector(#[from] ConnectorError),

    /// Datastore operation failed
    #[error(transparent)]
    Store(StoreError),

    /// Ledger datastore failed (distinct from the insufficient-credits outcome)
    #[error("ledger failure: {0}")]
    Ledger(String),

    /// An invariant the engine relies on was violated
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

impl EngineError {
    /// HTTP-equivalent status code for the trigger surface
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::InsufficientCredits { .. } => 402,
            Self::Forbidden { .. } => 403,
            Self::NotFound(_) => 404,
            Self::Busy { .. } => 409,
            Self::Strategy(_)
            | Self::Connector(_)
            | Self::Store(_)
            | Self::Ledger(_)
            | Self::Internal(_) => 500,
        }
    }

    /// True for outcomes a caller is expected to handle, not retry blindly
    #[inline]
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InsufficientCredits { .. } | Self::Busy { .. } | Self::NotFound(_)
        )
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Lease(LeaseError::AlreadyHeld {
                document,
                holder,
                expires_at,
            }) => Self::Busy {
                document,
                reason: format!("leased by {holder} until {expires_at}"),
            },
            other => Self::Store(other),
        }
    }
}

impl From<LedgerError> for EngineError {
    fn from(value: LedgerError) -> Self {
        match value {
            LedgerError::InsufficientCredits {
                required,
                available,
            } => Self::InsufficientCredits {
                required,
                available,
            },
            other => Self::Ledger(other.to_string()),
        }
    }
}
