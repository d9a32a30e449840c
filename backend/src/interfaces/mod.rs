//! External collaborators
//!
//! The ledger never moves value, discovers prices or checks permissions
//! itself. It drives these traits:
//!
//! - **LedgerAsset**: fungible asset with transfer/allowance semantics
//! - **RebaseIndexOracle**: monotonically non-decreasing rebase index
//! - **StakingAdapter**: converts between wrapped, rebasing and flat forms
//! - **ExchangeAdapter**: bulk conversion into the settlement asset
//! - **AccessControl**: governance gate for administrative setters
//!
//! In-memory implementations used by tests and simulations live in
//! [`memory`].

pub mod memory;

use crate::core::{Amount, Index, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised by a [`LedgerAsset`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssetError {
    #[error("Insufficient balance: {account} holds {available}, required {required}")]
    InsufficientBalance {
        account: String,
        required: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance: {owner} allows {spender} {allowed}, required {required}")]
    InsufficientAllowance {
        owner: String,
        spender: String,
        required: Amount,
        allowed: Amount,
    },

    #[error("Transfer rejected: {0}")]
    Rejected(String),
}

/// Errors raised by an [`ExchangeAdapter`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExchangeError {
    #[error("Price slippage exceeded: minimum output {min_out}, got {amount_out}")]
    SlippageExceeded { min_out: Amount, amount_out: Amount },

    #[error("Swap deadline {deadline} expired")]
    DeadlineExpired { deadline: Timestamp },

    #[error("Swap reverted: {0}")]
    Reverted(String),
}

/// Errors raised by a [`StakingAdapter`]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StakingError {
    #[error("Staking adapter holds {available}, required {required}")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("Staking operation failed: {0}")]
    Failed(String),
}

/// Fungible asset with standard transfer/allowance semantics.
///
/// A handle is bound to one holder account; [`LedgerAsset::transfer`] and
/// [`LedgerAsset::approve`] act on behalf of that holder, and
/// [`LedgerAsset::transfer_from`] spends an allowance granted to it.
pub trait LedgerAsset {
    /// Account this handle acts for
    fn holder(&self) -> &str;

    fn balance_of(&self, account: &str) -> Amount;

    /// Move `amount` from the holder to `to`
    fn transfer(&mut self, to: &str, amount: Amount) -> Result<(), AssetError>;

    /// Move `amount` from `from` to `to`, spending `from`'s allowance to the holder
    fn transfer_from(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), AssetError>;

    /// Allow `spender` to move up to `amount` of the holder's balance
    fn approve(&mut self, spender: &str, amount: Amount) -> Result<(), AssetError>;
}

/// Source of the rebase index (fixed-point, base [`crate::core::UNIT`]).
///
/// The index must never decrease. A reading below the highest index the
/// ledger has already been valued at fails with `InvariantViolation`.
pub trait RebaseIndexOracle {
    fn current_index(&self) -> Index;
}

/// Converts the yield asset between its representations.
///
/// `unwrap`/`unstake` produce the exchange input; `wrap`/`stake` reverse
/// them when a conversion is abandoned.
pub trait StakingAdapter {
    /// Fixed-supply (wrapped) form -> rebasing form
    fn unwrap(&mut self, amount: Amount) -> Result<Amount, StakingError>;

    /// Rebasing form -> fixed-supply (wrapped) form
    fn wrap(&mut self, amount: Amount) -> Result<Amount, StakingError>;

    /// Rebasing form -> flat, freely swappable form
    fn unstake(&mut self, amount: Amount) -> Result<Amount, StakingError>;

    /// Flat form -> rebasing form
    fn stake(&mut self, amount: Amount) -> Result<Amount, StakingError>;
}

/// Executes the bulk yield conversion.
pub trait ExchangeAdapter {
    /// Account the ledger must approve to pull swap input
    fn spender(&self) -> &str;

    /// Expected output for `amount_in` at current prices
    fn quote(&self, amount_in: Amount) -> Result<Amount, ExchangeError>;

    /// Swap `amount_in` along `path`, sending proceeds to `recipient`.
    ///
    /// Must fail with [`ExchangeError::SlippageExceeded`] rather than
    /// deliver less than `min_out`.
    fn swap(
        &mut self,
        amount_in: Amount,
        min_out: Amount,
        path: &[String],
        recipient: &str,
        deadline: Timestamp,
    ) -> Result<Amount, ExchangeError>;
}

/// Administrative entry points gated by [`AccessControl`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdminAction {
    SetFeeShare,
    SetMaxSlippage,
    SetMinPayoutThresholdFloor,
    SetTreasury,
    SetDepositsDisabled,
    SetWithdrawalsDisabled,
    SetUpkeepDisabled,
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AdminAction::SetFeeShare => "set_fee_share",
            AdminAction::SetMaxSlippage => "set_max_slippage",
            AdminAction::SetMinPayoutThresholdFloor => "set_min_payout_threshold_floor",
            AdminAction::SetTreasury => "set_treasury",
            AdminAction::SetDepositsDisabled => "set_deposits_disabled",
            AdminAction::SetWithdrawalsDisabled => "set_withdrawals_disabled",
            AdminAction::SetUpkeepDisabled => "set_upkeep_disabled",
        };
        f.write_str(name)
    }
}

/// Governance gate
pub trait AccessControl {
    fn is_authorized(&self, caller: &str, action: AdminAction) -> bool;
}
