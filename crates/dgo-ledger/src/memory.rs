//! In-memory balance store
//!
//! Reference implementation of [`BalanceStore`] used by tests and the demo
//! binary. A single mutex guards both the account map and the journal, which
//! is the in-process equivalent of the conditional server-side update a
//! production datastore performs: sufficiency check, balance write, and
//! audit append happen under one critical section.

use std::collections::HashMap;

use chrono::Utc;
use parking_lot::Mutex;

use crate::balance::{
    CreditBalance, CreditTransaction, TransactionContext, TransactionId, TransactionKind,
};
use crate::ledger::{BalanceStore, DeductOutcome, StoreFailure};
use crate::scope::ScopeId;

#[derive(Debug, Default)]
struct LedgerState {
    accounts: HashMap<ScopeId, CreditBalance>,
    journal: Vec<CreditTransaction>,
}

/// Mutex-guarded in-memory balance store
#[derive(Debug, Default)]
pub struct MemoryBalanceStore {
    inner: Mutex<LedgerState>,
}

impl MemoryBalanceStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of audit rows across all scopes
    #[must_use]
    pub fn journal_len(&self) -> usize {
        self.inner.lock().journal.len()
    }
}

#[async_trait::async_trait]
impl BalanceStore for MemoryBalanceStore {
    async fn fetch(&self, scope: ScopeId) -> Result<Option<CreditBalance>, StoreFailure> {
        Ok(self.inner.lock().accounts.get(&scope).copied())
    }

    async fn deduct_if_sufficient(
        &self,
        scope: ScopeId,
        amount: u64,
        kind: TransactionKind,
        context: TransactionContext,
    ) -> Result<DeductOutcome, StoreFailure> {
        let mut state = self.inner.lock();

        let account = state
            .accounts
            .get(&scope)
            .copied()
            .unwrap_or_else(|| CreditBalance::empty(scope));
        if !account.can_afford(amount) {
            return Ok(DeductOutcome::Insufficient {
                required: amount,
                available: account.balance,
            });
        }

        let updated = CreditBalance {
            balance: account.balance - amount,
            lifetime_used: account.lifetime_used + amount,
            ..account
        };
        let transaction = CreditTransaction {
            id: TransactionId::new(),
            scope,
            amount: -i64::try_from(amount).map_err(|e| StoreFailure(e.to_string()))?,
            balance_after: updated.balance,
            kind,
            context,
            created_at: Utc::now(),
        };

        state.accounts.insert(scope, updated);
        state.journal.push(transaction.clone());

        Ok(DeductOutcome::Applied {
            balance: updated,
            transaction,
        })
    }

    async fn credit(
        &self,
        scope: ScopeId,
        amount: u64,
        kind: TransactionKind,
        context: TransactionContext,
    ) -> Result<CreditBalance, StoreFailure> {
        let mut state = self.inner.lock();

        let account = state
            .accounts
            .get(&scope)
            .copied()
            .unwrap_or_else(|| CreditBalance::empty(scope));
        let updated = CreditBalance {
            balance: account.balance + amount,
            lifetime_granted: account.lifetime_granted + amount,
            ..account
        };
        let transaction = CreditTransaction {
            id: TransactionId::new(),
            scope,
            amount: i64::try_from(amount).map_err(|e| StoreFailure(e.to_string()))?,
            balance_after: updated.balance,
            kind,
            context,
            created_at: Utc::now(),
        };

        state.accounts.insert(scope, updated);
        state.journal.push(transaction);

        Ok(updated)
    }

    async fn transactions(&self, scope: ScopeId) -> Result<Vec<CreditTransaction>, StoreFailure> {
        Ok(self
            .inner
            .lock()
            .journal
            .iter()
            .filter(|t| t.scope == scope)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_missing_scope_is_none() {
        let store = MemoryBalanceStore::new();
        assert!(store.fetch(ScopeId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn credit_creates_account() {
        let store = MemoryBalanceStore::new();
        let scope = ScopeId::new();
        let balance = store
            .credit(scope, 42, TransactionKind::Grant, TransactionContext::default())
            .await
            .unwrap();
        assert_eq!(balance.balance, 42);
        assert_eq!(balance.lifetime_granted, 42);
        assert_eq!(store.journal_len(), 1);
    }

    #[tokio::test]
    async fn insufficient_deduct_records_nothing() {
        let store = MemoryBalanceStore::new();
        let scope = ScopeId::new();
        let outcome = store
            .deduct_if_sufficient(scope, 10, TransactionKind::Generation, TransactionContext::default())
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            DeductOutcome::Insufficient {
                required: 10,
                available: 0
            }
        ));
        assert_eq!(store.journal_len(), 0);
        assert!(store.fetch(scope).await.unwrap().is_none());
    }
}
