//! Balances and audit transactions
//!
//! A [`CreditBalance`] is mutated only through the ledger's atomic
//! deduct/add operations; every mutation produces an immutable
//! [`CreditTransaction`] audit row recorded at the same logical instant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::cost::UsageMetrics;
use crate::scope::ScopeId;

/// Unique transaction identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Ulid);

impl TransactionId {
    /// Generate new transaction ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Credit balance of one billing scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Owning scope
    pub scope: ScopeId,
    /// Currently spendable credits
    pub balance: u64,
    /// Total credits ever granted
    pub lifetime_granted: u64,
    /// Total credits ever spent
    pub lifetime_used: u64,
}

impl CreditBalance {
    /// Empty balance for a scope that has never been granted credits
    #[inline]
    #[must_use]
    pub const fn empty(scope: ScopeId) -> Self {
        Self {
            scope,
            balance: 0,
            lifetime_granted: 0,
            lifetime_used: 0,
        }
    }

    /// True when at least `amount` credits are spendable
    #[inline]
    #[must_use]
    pub const fn can_afford(&self, amount: u64) -> bool {
        self.balance >= amount
    }
}

/// Why a balance was mutated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Credits granted or refilled
    Grant,
    /// Initial dashboard generation
    Generation,
    /// Interactive AI modification
    Modification,
    /// Scheduled data refresh
    DataRefresh,
    /// Credits returned after a failed charge
    Refund,
}

impl TransactionKind {
    /// String form used in audit records
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Grant => "grant",
            Self::Generation => "generation",
            Self::Modification => "modification",
            Self::DataRefresh => "data_refresh",
            Self::Refund => "refund",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Optional linkage recorded with a transaction
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransactionContext {
    /// Document whose processing produced the charge
    pub document: Option<Ulid>,
    /// Raw usage the charge was computed from
    pub usage: Option<UsageMetrics>,
    /// Free-form note
    pub note: Option<String>,
}

impl TransactionContext {
    /// Context linking a document
    #[inline]
    #[must_use]
    pub fn for_document(document: Ulid) -> Self {
        Self {
            document: Some(document),
            ..Self::default()
        }
    }

    /// Attach usage metrics
    #[inline]
    #[must_use]
    pub fn with_usage(mut self, usage: UsageMetrics) -> Self {
        self.usage = Some(usage);
        self
    }

    /// Attach a note
    #[inline]
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Immutable audit row for one balance mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Transaction ID
    pub id: TransactionId,
    /// Scope whose balance was mutated
    pub scope: ScopeId,
    /// Signed credit delta (negative for deductions)
    pub amount: i64,
    /// Balance immediately after the mutation
    pub balance_after: u64,
    /// Why the mutation happened
    pub kind: TransactionKind,
    /// Optional linkage to the originating work
    pub context: TransactionContext,
    /// When the mutation was recorded
    pub created_at: DateTime<Utc>,
}
