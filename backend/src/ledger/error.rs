//! Ledger error taxonomy
//!
//! Every error names the operation that failed and, where one exists, the
//! deposit it failed on.

use crate::accounting::AccountingError;
use crate::core::Amount;
use crate::interfaces::{AdminAction, AssetError};
use crate::models::{ConfigError, DepositId, OperationGroup};
use crate::upkeep::UpkeepPhase;
use std::fmt;
use thiserror::Error;

/// Ledger operation, for error reporting and kill-switch lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Open,
    TopUp,
    PartialWithdraw,
    ExtractYield,
    Close,
    ChangeRecipient,
    SetPayoutThreshold,
    SetSettlementInterval,
    ClaimSettlement,
    Upkeep,
    Restore,
    Query,
    Admin(AdminAction),
}

impl Operation {
    /// Kill-switch group gating this operation, if any
    pub fn group(&self) -> Option<OperationGroup> {
        match self {
            Operation::Open | Operation::TopUp => Some(OperationGroup::Deposits),
            Operation::PartialWithdraw
            | Operation::Close
            | Operation::ExtractYield
            | Operation::ClaimSettlement => Some(OperationGroup::Withdrawals),
            Operation::Upkeep => Some(OperationGroup::Upkeep),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Open => f.write_str("open"),
            Operation::TopUp => f.write_str("top_up"),
            Operation::PartialWithdraw => f.write_str("partial_withdraw"),
            Operation::ExtractYield => f.write_str("extract_yield"),
            Operation::Close => f.write_str("close"),
            Operation::ChangeRecipient => f.write_str("change_recipient"),
            Operation::SetPayoutThreshold => f.write_str("set_payout_threshold"),
            Operation::SetSettlementInterval => f.write_str("set_settlement_interval"),
            Operation::ClaimSettlement => f.write_str("claim_settlement"),
            Operation::Upkeep => f.write_str("upkeep"),
            Operation::Restore => f.write_str("restore"),
            Operation::Query => f.write_str("query"),
            Operation::Admin(action) => write!(f, "{}", action),
        }
    }
}

fn deposit_label(id: &Option<DepositId>) -> String {
    match id {
        Some(id) => format!("deposit {}", id),
        None => "ledger".to_string(),
    }
}

/// Errors surfaced by ledger operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("{op} on {}: invalid amount {amount}: {reason}", deposit_label(.id))]
    InvalidAmount {
        op: Operation,
        id: Option<DepositId>,
        amount: Amount,
        reason: String,
    },

    #[error("{op}: invalid recipient {recipient:?}")]
    InvalidRecipient { op: Operation, recipient: String },

    #[error("{op} on {}: {caller} is not authorized", deposit_label(.id))]
    Unauthorized {
        op: Operation,
        caller: String,
        id: Option<DepositId>,
    },

    #[error("{op}: deposit {id} not found")]
    NotFound { op: Operation, id: DepositId },

    #[error("{op}: {group} are disabled")]
    OperationDisabled { op: Operation, group: OperationGroup },

    #[error("{op}: upkeep cycle in progress ({phase:?})")]
    UpkeepInProgress { op: Operation, phase: UpkeepPhase },

    #[error("External conversion failed: {reason}")]
    ExternalConversionFailed { reason: String },

    #[error("Invariant violation on {}: {detail}", deposit_label(.id))]
    InvariantViolation {
        id: Option<DepositId>,
        detail: String,
    },

    #[error("{op} on {}: arithmetic overflow", deposit_label(.id))]
    ArithmeticOverflow { op: Operation, id: Option<DepositId> },

    #[error("Rebase index must be positive")]
    InvalidIndex,

    #[error("{op} on {}: transfer failed: {source}", deposit_label(.id))]
    TransferFailed {
        op: Operation,
        id: Option<DepositId>,
        #[source]
        source: AssetError,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}

impl LedgerError {
    /// Attach operation and deposit context to an accounting failure
    pub fn accounting(op: Operation, id: Option<DepositId>, error: AccountingError) -> Self {
        match error {
            AccountingError::ZeroIndex => LedgerError::InvalidIndex,
            AccountingError::Overflow { .. } => LedgerError::ArithmeticOverflow { op, id },
            AccountingError::IndexDecreased { .. } => LedgerError::InvariantViolation {
                id,
                detail: format!("{}: {}", op, error),
            },
        }
    }

    pub fn transfer(op: Operation, id: Option<DepositId>, source: AssetError) -> Self {
        LedgerError::TransferFailed { op, id, source }
    }

    /// Fatal errors indicate corrupted books rather than a bad request
    pub fn is_fatal(&self) -> bool {
        matches!(self, LedgerError::InvariantViolation { .. })
    }
}
