//! Deposit lifecycle operations
//!
//! Each operation validates the caller and the amounts against the record,
//! computes the new balances under a single [`YieldAccountant`] snapshot,
//! and only then writes to the registry. An `Err` always means the
//! registry is untouched.
//!
//! # Example
//!
//! ```rust
//! use yield_splitter_core_rs::accounting::YieldAccountant;
//! use yield_splitter_core_rs::core::UNIT;
//! use yield_splitter_core_rs::ledger::{lifecycle, OpenRequest};
//! use yield_splitter_core_rs::models::DepositRegistry;
//!
//! let mut registry = DepositRegistry::new();
//! let at_one = YieldAccountant::new(UNIT).unwrap();
//!
//! let request = OpenRequest::new("alice", "bob", 1_000 * UNIT, 86_400);
//! let id = lifecycle::open(&mut registry, &at_one, &request, 0, 0).unwrap();
//!
//! // Index grows 10%
//! let at_1_1 = YieldAccountant::new(UNIT + UNIT / 10).unwrap();
//! let paid = lifecycle::extract_yield(&mut registry, &at_1_1, "bob", id).unwrap();
//! assert_eq!(paid, 100 * UNIT);
//! ```

use crate::accounting::YieldAccountant;
use crate::core::{Amount, Timestamp};
use crate::ledger::error::{LedgerError, Operation};
use crate::models::{AccountId, DepositId, DepositRecord, DepositRegistry};
use tracing::debug;

/// Parameters of a new deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest<'a> {
    pub depositor: &'a str,
    pub recipient: &'a str,
    pub amount: Amount,
    pub settlement_interval: u64,
    /// Requested auto-payout threshold; raised to the ledger floor if lower
    pub minimum_payout_threshold: Amount,
}

impl<'a> OpenRequest<'a> {
    pub fn new(
        depositor: &'a str,
        recipient: &'a str,
        amount: Amount,
        settlement_interval: u64,
    ) -> Self {
        Self {
            depositor,
            recipient,
            amount,
            settlement_interval,
            minimum_payout_threshold: 0,
        }
    }

    pub fn with_payout_threshold(mut self, threshold: Amount) -> Self {
        self.minimum_payout_threshold = threshold;
        self
    }
}

/// What a close released: the removed record and the amounts owed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedDeposit {
    pub record: DepositRecord,
    pub principal: Amount,
    pub accrued_yield: Amount,
    /// `principal + accrued_yield`, owed to the depositor
    pub total_value: Amount,
    /// Settlement asset still owed to the recipient
    pub claimable_settlement_asset: Amount,
}

/// Which party of a record may invoke an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Depositor,
    Recipient,
    Either,
}

fn authorized<'r>(
    registry: &'r DepositRegistry,
    op: Operation,
    caller: &str,
    id: DepositId,
    party: Party,
) -> Result<&'r DepositRecord, LedgerError> {
    let record = registry
        .get(id)
        .ok_or(LedgerError::NotFound { op, id })?;

    let allowed = match party {
        Party::Depositor => record.is_depositor(caller),
        Party::Recipient => record.is_recipient(caller),
        Party::Either => record.is_participant(caller),
    };
    if !allowed {
        return Err(LedgerError::Unauthorized {
            op,
            caller: caller.to_string(),
            id: Some(id),
        });
    }
    Ok(record)
}

fn positive(op: Operation, id: Option<DepositId>, amount: Amount) -> Result<(), LedgerError> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount {
            op,
            id,
            amount,
            reason: "must be positive".to_string(),
        });
    }
    Ok(())
}

fn write_record(
    registry: &mut DepositRegistry,
    op: Operation,
    id: DepositId,
    update: impl FnOnce(&mut DepositRecord),
) -> Result<(), LedgerError> {
    let record = registry
        .get_mut(id)
        .ok_or(LedgerError::NotFound { op, id })?;
    update(record);
    Ok(())
}

/// Register a new deposit and return its id
///
/// Collecting `amount` from the depositor is the caller's job. If that
/// fails the caller discards the record with
/// [`DepositRegistry::discard_latest`], which hands the id out again.
pub fn open(
    registry: &mut DepositRegistry,
    accountant: &YieldAccountant,
    request: &OpenRequest<'_>,
    payout_threshold_floor: Amount,
    now: Timestamp,
) -> Result<DepositId, LedgerError> {
    let op = Operation::Open;
    positive(op, None, request.amount)?;
    if request.depositor.is_empty() {
        return Err(LedgerError::Unauthorized {
            op,
            caller: String::new(),
            id: None,
        });
    }
    if request.recipient.is_empty() {
        return Err(LedgerError::InvalidRecipient {
            op,
            recipient: String::new(),
        });
    }

    let agnostic = accountant
        .to_agnostic(request.amount)
        .map_err(|e| LedgerError::accounting(op, None, e))?;
    let threshold = request.minimum_payout_threshold.max(payout_threshold_floor);

    let id = registry.create(
        request.depositor,
        request.recipient,
        request.amount,
        agnostic,
        now,
        request.settlement_interval,
        threshold,
    );
    Ok(id)
}

/// Add principal to an existing deposit; returns the new principal
pub fn top_up(
    registry: &mut DepositRegistry,
    accountant: &YieldAccountant,
    caller: &str,
    id: DepositId,
    amount: Amount,
) -> Result<Amount, LedgerError> {
    let op = Operation::TopUp;
    let record = authorized(registry, op, caller, id, Party::Depositor)?;
    positive(op, Some(id), amount)?;

    let (principal, agnostic) = accountant
        .added(record.principal(), record.agnostic_balance(), amount)
        .map_err(|e| LedgerError::accounting(op, Some(id), e))?;

    write_record(registry, op, id, |r| r.set_balances(principal, agnostic))?;
    debug!(deposit_id = id, amount = %amount, principal = %principal, "deposit topped up");
    Ok(principal)
}

/// Remove part of the principal; returns the remaining principal
///
/// `amount` must be strictly below the principal. Withdrawing everything
/// is a [`close`].
pub fn partial_withdraw(
    registry: &mut DepositRegistry,
    accountant: &YieldAccountant,
    caller: &str,
    id: DepositId,
    amount: Amount,
) -> Result<Amount, LedgerError> {
    let op = Operation::PartialWithdraw;
    let record = authorized(registry, op, caller, id, Party::Depositor)?;
    positive(op, Some(id), amount)?;
    if amount >= record.principal() {
        return Err(LedgerError::InvalidAmount {
            op,
            id: Some(id),
            amount,
            reason: format!(
                "must be below principal {}; close the deposit to withdraw everything",
                record.principal()
            ),
        });
    }

    let (principal, agnostic) = accountant
        .removed(record.principal(), record.agnostic_balance(), amount)
        .map_err(|e| LedgerError::accounting(op, Some(id), e))?;

    write_record(registry, op, id, |r| r.set_balances(principal, agnostic))?;
    debug!(deposit_id = id, amount = %amount, principal = %principal, "principal withdrawn");
    Ok(principal)
}

/// Re-baseline the deposit and return the yield it had accrued
///
/// The yield is owed to the recipient whichever party asked.
pub fn extract_yield(
    registry: &mut DepositRegistry,
    accountant: &YieldAccountant,
    caller: &str,
    id: DepositId,
) -> Result<Amount, LedgerError> {
    let op = Operation::ExtractYield;
    let record = authorized(registry, op, caller, id, Party::Either)?;
    let map = |e| LedgerError::accounting(op, Some(id), e);

    let accrued = accountant
        .outstanding_yield(record.principal(), record.agnostic_balance())
        .map_err(map)?;
    let rebaselined = accountant.rebaselined(record.principal()).map_err(map)?;

    write_record(registry, op, id, |r| r.set_agnostic_balance(rebaselined))?;
    debug!(deposit_id = id, amount = %accrued, "yield extracted");
    Ok(accrued)
}

/// Remove the deposit from the ledger and report everything it owed
pub fn close(
    registry: &mut DepositRegistry,
    accountant: &YieldAccountant,
    caller: &str,
    id: DepositId,
) -> Result<ClosedDeposit, LedgerError> {
    let op = Operation::Close;
    let record = authorized(registry, op, caller, id, Party::Depositor)?;

    let principal = record.principal();
    let accrued_yield = accountant
        .outstanding_yield(principal, record.agnostic_balance())
        .map_err(|e| LedgerError::accounting(op, Some(id), e))?;
    let total_value = principal
        .checked_add(accrued_yield)
        .ok_or(LedgerError::ArithmeticOverflow { op, id: Some(id) })?;

    let record = registry
        .remove(id)
        .ok_or(LedgerError::NotFound { op, id })?;
    debug!(
        deposit_id = id,
        principal = %principal,
        total_value = %total_value,
        claimable = %record.claimable_settlement_asset(),
        "deposit closed"
    );
    Ok(ClosedDeposit {
        principal,
        accrued_yield,
        total_value,
        claimable_settlement_asset: record.claimable_settlement_asset(),
        record,
    })
}

/// Point the deposit's yield at a new recipient; returns the old one
pub fn change_recipient(
    registry: &mut DepositRegistry,
    caller: &str,
    id: DepositId,
    new_recipient: &str,
) -> Result<AccountId, LedgerError> {
    let op = Operation::ChangeRecipient;
    let record = authorized(registry, op, caller, id, Party::Depositor)?;
    if new_recipient.is_empty() {
        return Err(LedgerError::InvalidRecipient {
            op,
            recipient: new_recipient.to_string(),
        });
    }
    let old = record.recipient().to_string();

    if !registry.move_recipient(id, new_recipient) {
        return Err(LedgerError::NotFound { op, id });
    }
    debug!(deposit_id = id, old = %old, new = new_recipient, "recipient changed");
    Ok(old)
}

/// Change the auto-payout threshold; returns the effective value
pub fn set_payout_threshold(
    registry: &mut DepositRegistry,
    caller: &str,
    id: DepositId,
    threshold: Amount,
    floor: Amount,
) -> Result<Amount, LedgerError> {
    let op = Operation::SetPayoutThreshold;
    authorized(registry, op, caller, id, Party::Either)?;
    let effective = threshold.max(floor);
    write_record(registry, op, id, |r| r.set_minimum_payout_threshold(effective))?;
    Ok(effective)
}

pub fn set_settlement_interval(
    registry: &mut DepositRegistry,
    caller: &str,
    id: DepositId,
    interval: u64,
) -> Result<(), LedgerError> {
    let op = Operation::SetSettlementInterval;
    authorized(registry, op, caller, id, Party::Depositor)?;
    write_record(registry, op, id, |r| r.set_settlement_interval(interval))
}

/// Zero the claimable settlement balance and return it
///
/// Claims ignore the payout threshold. Nothing to claim is an error.
pub fn claim_settlement(
    registry: &mut DepositRegistry,
    caller: &str,
    id: DepositId,
) -> Result<Amount, LedgerError> {
    let op = Operation::ClaimSettlement;
    let record = authorized(registry, op, caller, id, Party::Recipient)?;
    if record.claimable_settlement_asset() == 0 {
        return Err(LedgerError::InvalidAmount {
            op,
            id: Some(id),
            amount: 0,
            reason: "nothing to claim".to_string(),
        });
    }

    let mut claimed = 0;
    write_record(registry, op, id, |r| claimed = r.take_claimable())?;
    debug!(deposit_id = id, amount = %claimed, "settlement claimed");
    Ok(claimed)
}
