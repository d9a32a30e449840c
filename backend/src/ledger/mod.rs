//! Deposit Ledger
//!
//! Lifecycle operations over the [`crate::models::DepositRegistry`]:
//! open, top-up, partial withdrawal, yield extraction, close, and the
//! record-term changes. These functions are pure bookkeeping; asset
//! movements around them belong to the engine.
//!
//! # Critical Invariants
//!
//! 1. **No partial mutation**: every check runs before the first write
//! 2. **Paired balances**: principal and agnostic balance change together,
//!    under one index snapshot, except on re-baseline
//! 3. **Non-negative yield**: `agnostic_balance >= to_agnostic(principal)`

pub mod error;
pub mod lifecycle;

pub use error::{LedgerError, Operation};
pub use lifecycle::{ClosedDeposit, OpenRequest};
