//! DGO Credit Ledger
//!
//! Usage metering for dashboard generation: balances per billing scope,
//! a weighted cost model, atomic check-and-deduct, and an immutable audit
//! journal.
//!
//! # Core Concepts
//!
//! - [`ScopeId`]: the billing entity (organization or personal) being charged
//! - [`CostModel`]: converts raw AI usage into credits with ceiling rounding
//! - [`CreditLedger`]: the single authority for balance mutations
//! - [`BalanceStore`]: storage backend contract; check-and-deduct is one
//!   indivisible operation so concurrent charges can never jointly overdraw
//! - [`CreditTransaction`]: audit row recorded with every mutation
//!
//! # Example
//!
//! ```rust,ignore
//! use dgo_ledger::{CreditLedger, CostModel, MemoryBalanceStore, TransactionKind};
//!
//! let ledger = CreditLedger::new(store, CostModel::default());
//! let cost = ledger.cost_model().credits_for(usage.input_units, usage.output_units);
//! match ledger.deduct(scope, cost, TransactionKind::DataRefresh, ctx).await {
//!     Ok(receipt) => println!("balance now {}", receipt.new_balance.balance),
//!     Err(LedgerError::InsufficientCredits { required, available }) => { /* 402 */ }
//!     Err(e) => return Err(e.into()),
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod balance;
mod cost;
mod ledger;
mod memory;
mod scope;

// Re-exports
pub use balance::{
    CreditBalance, CreditTransaction, TransactionContext, TransactionId, TransactionKind,
};
pub use cost::{CostModel, FlatUsageEstimate, UsageMetrics};
pub use ledger::{
    BalanceStore, CreditLedger, DeductOutcome, DeductReceipt, LedgerError, StoreFailure,
};
pub use memory::MemoryBalanceStore;
pub use scope::{ScopeId, ScopeKind};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
