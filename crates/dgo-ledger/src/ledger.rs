//! Credit ledger
//!
//! The single authority for balance mutations. Check-and-deduct is pushed
//! down into the [`BalanceStore`] so the store can implement it as one
//! indivisible operation; the ledger itself never does read-then-write
//! against the balance.

use std::sync::Arc;

use crate::balance::{CreditBalance, CreditTransaction, TransactionContext, TransactionKind};
use crate::cost::CostModel;
use crate::scope::ScopeId;

/// Datastore failure distinct from any business outcome
#[derive(Debug, Clone, thiserror::Error)]
#[error("balance store failure: {0}")]
pub struct StoreFailure(pub String);

/// Outcome of an atomic conditional deduction
#[derive(Debug, Clone)]
pub enum DeductOutcome {
    /// Balance was sufficient; the mutation and its audit row are recorded
    Applied {
        /// Balance after the deduction
        balance: CreditBalance,
        /// The audit row recorded with the mutation
        transaction: CreditTransaction,
    },
    /// Balance was insufficient; nothing was recorded
    Insufficient {
        /// Credits the caller asked for
        required: u64,
        /// Credits actually available
        available: u64,
    },
}

/// Storage backend for balances and audit transactions
///
/// # Atomicity contract
/// `deduct_if_sufficient` must verify sufficiency, write the new balance,
/// and append the audit transaction as one indivisible unit: two concurrent
/// deductions against the same scope must never jointly overdraw. Backends
/// implement this with a conditional server-side update (or an equivalent
/// single lock), never with application-level read-modify-write.
#[async_trait::async_trait]
pub trait BalanceStore: Send + Sync {
    /// Fetch the balance of a scope, `None` if the scope has no balance row
    async fn fetch(&self, scope: ScopeId) -> Result<Option<CreditBalance>, StoreFailure>;

    /// Atomically deduct `amount` if the balance covers it
    async fn deduct_if_sufficient(
        &self,
        scope: ScopeId,
        amount: u64,
        kind: TransactionKind,
        context: TransactionContext,
    ) -> Result<DeductOutcome, StoreFailure>;

    /// Atomically add `amount` (grant/refill/refund), creating the balance
    /// row if the scope has none
    async fn credit(
        &self,
        scope: ScopeId,
        amount: u64,
        kind: TransactionKind,
        context: TransactionContext,
    ) -> Result<CreditBalance, StoreFailure>;

    /// Audit transactions of a scope, oldest first
    async fn transactions(&self, scope: ScopeId) -> Result<Vec<CreditTransaction>, StoreFailure>;
}

/// Errors surfaced by ledger operations
///
/// Insufficient balance is an expected outcome and is always reported as its
/// own variant, never folded into the store failure case.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The scope has no balance row
    #[error("no credit balance for scope {0}")]
    ScopeNotFound(ScopeId),

    /// Balance does not cover the requested deduction
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits {
        /// Credits the operation needs
        required: u64,
        /// Credits actually available
        available: u64,
    },

    /// Underlying datastore failed
    #[error(transparent)]
    Store(#[from] StoreFailure),
}

/// Receipt for a successful deduction
#[derive(Debug, Clone)]
pub struct DeductReceipt {
    /// Balance after the deduction
    pub new_balance: CreditBalance,
    /// The audit row recorded with the mutation
    pub transaction: CreditTransaction,
}

/// The credit ledger
///
/// Owns the cost model and drives the balance store. Shared across the
/// engine; cheap to clone.
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn BalanceStore>,
    cost_model: CostModel,
}

impl std::fmt::Debug for CreditLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditLedger")
            .field("cost_model", &self.cost_model)
            .finish_non_exhaustive()
    }
}

impl CreditLedger {
    /// Create a ledger over a balance store
    #[must_use]
    pub fn new(store: Arc<dyn BalanceStore>, cost_model: CostModel) -> Self {
        Self { store, cost_model }
    }

    /// The cost model in effect
    #[inline]
    #[must_use]
    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Current balance of a scope
    ///
    /// # Errors
    /// `ScopeNotFound` when the scope has no balance row
    pub async fn balance(&self, scope: ScopeId) -> Result<CreditBalance, LedgerError> {
        self.store
            .fetch(scope)
            .await?
            .ok_or(LedgerError::ScopeNotFound(scope))
    }

    /// Preflight check that `required` credits are available
    ///
    /// A scope without a balance row is treated as having zero credits.
    ///
    /// # Errors
    /// `InsufficientCredits` carrying required/available amounts
    pub async fn check_affordable(&self, scope: ScopeId, required: u64) -> Result<(), LedgerError> {
        let available = self
            .store
            .fetch(scope)
            .await?
            .map_or(0, |b| b.balance);
        if available < required {
            return Err(LedgerError::InsufficientCredits {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Atomically deduct credits from a scope
    ///
    /// # Errors
    /// `InsufficientCredits` when the balance does not cover `cost`;
    /// `Store` on datastore failure
    pub async fn deduct(
        &self,
        scope: ScopeId,
        cost: u64,
        kind: TransactionKind,
        context: TransactionContext,
    ) -> Result<DeductReceipt, LedgerError> {
        match self
            .store
            .deduct_if_sufficient(scope, cost, kind, context)
            .await?
        {
            DeductOutcome::Applied {
                balance,
                transaction,
            } => {
                tracing::debug!(
                    scope = %scope,
                    cost,
                    kind = %kind,
                    balance = balance.balance,
                    "credits deducted"
                );
                Ok(DeductReceipt {
                    new_balance: balance,
                    transaction,
                })
            }
            DeductOutcome::Insufficient {
                required,
                available,
            } => Err(LedgerError::InsufficientCredits {
                required,
                available,
            }),
        }
    }

    /// Add credits to a scope (grant/refill/refund)
    ///
    /// # Errors
    /// `Store` on datastore failure
    pub async fn add(
        &self,
        scope: ScopeId,
        amount: u64,
        kind: TransactionKind,
        context: TransactionContext,
    ) -> Result<CreditBalance, LedgerError> {
        let balance = self.store.credit(scope, amount, kind, context).await?;
        tracing::debug!(scope = %scope, amount, kind = %kind, "credits added");
        Ok(balance)
    }

    /// Audit transactions of a scope, oldest first
    ///
    /// # Errors
    /// `Store` on datastore failure
    pub async fn transactions(
        &self,
        scope: ScopeId,
    ) -> Result<Vec<CreditTransaction>, LedgerError> {
        Ok(self.store.transactions(scope).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBalanceStore;

    fn ledger() -> (CreditLedger, ScopeId) {
        let store = Arc::new(MemoryBalanceStore::new());
        (
            CreditLedger::new(store, CostModel::default()),
            ScopeId::new(),
        )
    }

    #[tokio::test]
    async fn balance_of_unknown_scope_is_not_found() {
        let (ledger, scope) = ledger();
        assert!(matches!(
            ledger.balance(scope).await,
            Err(LedgerError::ScopeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn grant_then_deduct() {
        let (ledger, scope) = ledger();
        ledger
            .add(scope, 100, TransactionKind::Grant, TransactionContext::default())
            .await
            .unwrap();

        let receipt = ledger
            .deduct(
                scope,
                30,
                TransactionKind::Generation,
                TransactionContext::default(),
            )
            .await
            .unwrap();

        assert_eq!(receipt.new_balance.balance, 70);
        assert_eq!(receipt.new_balance.lifetime_used, 30);
        assert_eq!(receipt.transaction.amount, -30);
        assert_eq!(receipt.transaction.balance_after, 70);
    }

    #[tokio::test]
    async fn deduct_beyond_balance_is_typed_refusal() {
        let (ledger, scope) = ledger();
        ledger
            .add(scope, 5, TransactionKind::Grant, TransactionContext::default())
            .await
            .unwrap();

        let err = ledger
            .deduct(
                scope,
                10,
                TransactionKind::Modification,
                TransactionContext::default(),
            )
            .await
            .unwrap_err();

        match err {
            LedgerError::InsufficientCredits {
                required,
                available,
            } => {
                assert_eq!(required, 10);
                assert_eq!(available, 5);
            }
            other => panic!("expected InsufficientCredits, got {other:?}"),
        }

        // Refusal must leave the balance untouched.
        assert_eq!(ledger.balance(scope).await.unwrap().balance, 5);
    }

    #[tokio::test]
    async fn deduct_from_unknown_scope_reports_zero_available() {
        let (ledger, scope) = ledger();
        let err = ledger
            .deduct(
                scope,
                1,
                TransactionKind::Generation,
                TransactionContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientCredits {
                required: 1,
                available: 0
            }
        ));
    }

    #[tokio::test]
    async fn preflight_check_does_not_mutate() {
        let (ledger, scope) = ledger();
        ledger
            .add(scope, 5, TransactionKind::Grant, TransactionContext::default())
            .await
            .unwrap();

        assert!(ledger.check_affordable(scope, 5).await.is_ok());
        assert!(matches!(
            ledger.check_affordable(scope, 6).await,
            Err(LedgerError::InsufficientCredits {
                required: 6,
                available: 5
            })
        ));
        assert_eq!(ledger.balance(scope).await.unwrap().balance, 5);
        // Preflight leaves no audit rows behind.
        assert_eq!(ledger.transactions(scope).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn every_mutation_leaves_an_audit_row() {
        let (ledger, scope) = ledger();
        ledger
            .add(scope, 50, TransactionKind::Grant, TransactionContext::default())
            .await
            .unwrap();
        ledger
            .deduct(
                scope,
                20,
                TransactionKind::DataRefresh,
                TransactionContext::default(),
            )
            .await
            .unwrap();

        let txs = ledger.transactions(scope).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert_eq!(txs[0].amount, 50);
        assert_eq!(txs[0].balance_after, 50);
        assert_eq!(txs[1].amount, -20);
        assert_eq!(txs[1].balance_after, 30);
    }
}
