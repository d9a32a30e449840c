//! Deposit record
//!
//! The unit of ownership in the ledger. Each record has:
//! - a **depositor**, who may top up, withdraw and close
//! - a **recipient**, who receives the yield (may equal the depositor)
//! - a flat `principal` and its index-normalized `agnostic_balance`
//! - settlement state: `last_settled`, `settlement_interval`,
//!   `claimable_settlement_asset`, `minimum_payout_threshold`
//!
//! Mutators are crate-private: only ledger lifecycle operations and the
//! upkeep scheduler change a record, always under one index snapshot.
//!
//! CRITICAL: `agnostic_balance >= to_agnostic(principal)` at the current index

use crate::core::{Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Deposit identifier, assigned monotonically from 1 and never reused
pub type DepositId = u64;

/// Identity of a depositor, recipient, treasury or custody account
pub type AccountId = String;

/// A single yield-splitting position
///
/// # Example
///
/// ```rust
/// use yield_splitter_core_rs::models::DepositRecord;
///
/// let record = DepositRecord::new(1, "alice".to_string(), "bob".to_string(), 1_000, 1_000, 0, 86_400, 0);
/// assert_eq!(record.principal(), 1_000);
/// assert!(!record.is_self_directed());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    id: DepositId,
    depositor: AccountId,
    recipient: AccountId,
    principal: Amount,
    agnostic_balance: Amount,
    last_settled: Timestamp,
    settlement_interval: u64,
    claimable_settlement_asset: Amount,
    minimum_payout_threshold: Amount,
}

impl DepositRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DepositId,
        depositor: AccountId,
        recipient: AccountId,
        principal: Amount,
        agnostic_balance: Amount,
        last_settled: Timestamp,
        settlement_interval: u64,
        minimum_payout_threshold: Amount,
    ) -> Self {
        Self {
            id,
            depositor,
            recipient,
            principal,
            agnostic_balance,
            last_settled,
            settlement_interval,
            claimable_settlement_asset: 0,
            minimum_payout_threshold,
        }
    }

    pub fn id(&self) -> DepositId {
        self.id
    }

    pub fn depositor(&self) -> &str {
        &self.depositor
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn principal(&self) -> Amount {
        self.principal
    }

    pub fn agnostic_balance(&self) -> Amount {
        self.agnostic_balance
    }

    pub fn last_settled(&self) -> Timestamp {
        self.last_settled
    }

    pub fn settlement_interval(&self) -> u64 {
        self.settlement_interval
    }

    pub fn claimable_settlement_asset(&self) -> Amount {
        self.claimable_settlement_asset
    }

    pub fn minimum_payout_threshold(&self) -> Amount {
        self.minimum_payout_threshold
    }

    /// Depositor directs the yield to themselves
    pub fn is_self_directed(&self) -> bool {
        self.depositor == self.recipient
    }

    pub fn is_depositor(&self, account: &str) -> bool {
        self.depositor == account
    }

    pub fn is_recipient(&self, account: &str) -> bool {
        self.recipient == account
    }

    /// Depositor or recipient
    pub fn is_participant(&self, account: &str) -> bool {
        self.is_depositor(account) || self.is_recipient(account)
    }

    /// Whether the claimable balance has reached the auto-payout threshold
    pub fn payout_due(&self) -> bool {
        self.claimable_settlement_asset > 0
            && self.claimable_settlement_asset >= self.minimum_payout_threshold
    }

    /// Set principal and agnostic balance together (one index snapshot)
    pub(crate) fn set_balances(&mut self, principal: Amount, agnostic_balance: Amount) {
        self.principal = principal;
        self.agnostic_balance = agnostic_balance;
    }

    /// Redefine the agnostic balance without touching principal.
    ///
    /// Only the re-baseline (yield extraction) and a cycle rollback use this.
    pub(crate) fn set_agnostic_balance(&mut self, agnostic_balance: Amount) {
        self.agnostic_balance = agnostic_balance;
    }

    pub(crate) fn set_last_settled(&mut self, timestamp: Timestamp) {
        self.last_settled = timestamp;
    }

    pub(crate) fn set_settlement_interval(&mut self, interval: u64) {
        self.settlement_interval = interval;
    }

    pub(crate) fn set_minimum_payout_threshold(&mut self, threshold: Amount) {
        self.minimum_payout_threshold = threshold;
    }

    pub(crate) fn set_recipient(&mut self, recipient: AccountId) {
        self.recipient = recipient;
    }

    pub(crate) fn credit_settlement(&mut self, amount: Amount) {
        self.claimable_settlement_asset = self.claimable_settlement_asset.saturating_add(amount);
    }

    /// Zero the claimable balance, returning what it held
    pub(crate) fn take_claimable(&mut self) -> Amount {
        std::mem::take(&mut self.claimable_settlement_asset)
    }

    pub(crate) fn restore_claimable(&mut self, amount: Amount) {
        self.claimable_settlement_asset = amount;
    }
}
