//! Yield Accountant
//!
//! Converts between **flat** units of the principal asset and
//! **agnostic** (index-normalized) units:
//!
//! ```text
//! to_agnostic(flat)     = flat     * UNIT  / index     (floor)
//! from_agnostic(agn)    = agn      * index / UNIT      (floor)
//! ```
//!
//! A record's agnostic balance is fixed between mutations while the index
//! rises, so its flat value grows: that growth is the yield.
//!
//! # Rounding
//!
//! ```text
//! yield = max(0, from_agnostic(agnostic_balance) - principal)
//! ```
//!
//! Every rounding step favours custody. Opening, topping up and
//! re-baselining credit at most the agnostic units the custody account
//! actually received (floor). Withdrawing debits at least the agnostic units
//! that left (ceil). A record's agnostic balance therefore never exceeds its
//! share of the custody balance, and the flat value it reports never
//! exceeds what custody holds for it.
//!
//! The accountant itself does not know the previous index. A falling index
//! is caught by [`YieldAccountant::not_below`] against a high-water mark
//! kept by the caller.
//!
//! # Example
//!
//! ```rust
//! use yield_splitter_core_rs::accounting::YieldAccountant;
//! use yield_splitter_core_rs::core::UNIT;
//!
//! let at_open = YieldAccountant::new(UNIT).unwrap();
//! let agnostic = at_open.to_agnostic(1_000).unwrap();
//! assert_eq!(agnostic, 1_000);
//!
//! // Index rises 10%
//! let later = YieldAccountant::new(UNIT + UNIT / 10).unwrap();
//! assert_eq!(later.outstanding_yield(1_000, agnostic).unwrap(), 100);
//! ```

use crate::core::{mul_div_ceil, mul_div_floor, Amount, Index, UNIT};
use crate::interfaces::RebaseIndexOracle;
use thiserror::Error;

/// Errors raised by yield accounting
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AccountingError {
    #[error("Rebase index must be positive")]
    ZeroIndex,

    #[error("Arithmetic overflow converting {amount}")]
    Overflow { amount: Amount },

    #[error("Rebase index fell from {previous} to {current}")]
    IndexDecreased { previous: Index, current: Index },
}

/// Valuation at a single index snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YieldAccountant {
    index: Index,
}

impl YieldAccountant {
    /// Create an accountant for `index` (base [`UNIT`])
    pub fn new(index: Index) -> Result<Self, AccountingError> {
        if index == 0 {
            return Err(AccountingError::ZeroIndex);
        }
        Ok(Self { index })
    }

    /// Snapshot the oracle's current index
    pub fn from_oracle(oracle: &dyn RebaseIndexOracle) -> Result<Self, AccountingError> {
        Self::new(oracle.current_index())
    }

    pub fn index(&self) -> Index {
        self.index
    }

    /// Reject a snapshot below the highest index already observed
    pub fn not_below(self, previous: Index) -> Result<Self, AccountingError> {
        if self.index < previous {
            return Err(AccountingError::IndexDecreased {
                previous,
                current: self.index,
            });
        }
        Ok(self)
    }

    /// Flat -> agnostic, rounded down
    pub fn to_agnostic(&self, flat: Amount) -> Result<Amount, AccountingError> {
        mul_div_floor(flat, UNIT, self.index).ok_or(AccountingError::Overflow { amount: flat })
    }

    /// Flat -> agnostic, rounded up
    fn to_agnostic_ceil(&self, flat: Amount) -> Result<Amount, AccountingError> {
        mul_div_ceil(flat, UNIT, self.index).ok_or(AccountingError::Overflow { amount: flat })
    }

    /// Agnostic -> flat at the current index, rounded down
    pub fn from_agnostic(&self, agnostic: Amount) -> Result<Amount, AccountingError> {
        mul_div_floor(agnostic, self.index, UNIT)
            .ok_or(AccountingError::Overflow { amount: agnostic })
    }

    /// Flat yield accrued since the last re-baseline, zero if none
    pub fn outstanding_yield(
        &self,
        principal: Amount,
        agnostic_balance: Amount,
    ) -> Result<Amount, AccountingError> {
        Ok(self.from_agnostic(agnostic_balance)?.saturating_sub(principal))
    }

    /// Principal plus outstanding yield
    pub fn position_value(
        &self,
        principal: Amount,
        agnostic_balance: Amount,
    ) -> Result<Amount, AccountingError> {
        let accrued = self.outstanding_yield(principal, agnostic_balance)?;
        principal
            .checked_add(accrued)
            .ok_or(AccountingError::Overflow { amount: principal })
    }

    /// Principal and agnostic balance after adding `amount` of principal
    ///
    /// The agnostic balance grows by `floor(amount / index)`, so the
    /// outstanding yield can only drop by a rounding unit, never rise.
    pub fn added(
        &self,
        principal: Amount,
        agnostic_balance: Amount,
        amount: Amount,
    ) -> Result<(Amount, Amount), AccountingError> {
        let new_principal = principal
            .checked_add(amount)
            .ok_or(AccountingError::Overflow { amount })?;
        let new_agnostic = agnostic_balance
            .checked_add(self.to_agnostic(amount)?)
            .ok_or(AccountingError::Overflow { amount })?;
        Ok((new_principal, new_agnostic))
    }

    /// Principal and agnostic balance after removing `amount` (<= principal)
    ///
    /// The agnostic balance shrinks by `ceil(amount / index)`.
    pub fn removed(
        &self,
        principal: Amount,
        agnostic_balance: Amount,
        amount: Amount,
    ) -> Result<(Amount, Amount), AccountingError> {
        let new_principal = principal
            .checked_sub(amount)
            .ok_or(AccountingError::Overflow { amount })?;
        let new_agnostic = agnostic_balance.saturating_sub(self.to_agnostic_ceil(amount)?);
        Ok((new_principal, new_agnostic))
    }

    /// Agnostic balance representing `principal` after a re-baseline
    pub fn rebaselined(&self, principal: Amount) -> Result<Amount, AccountingError> {
        self.to_agnostic(principal)
    }
}
