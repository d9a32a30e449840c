//! In-memory collaborators
//!
//! Reference implementations of every collaborator trait. Handles are
//! cheap clones sharing state through `Rc<RefCell<_>>`, so a test can keep
//! one handle while the ledger owns another and inspect balances, swaps
//! and staking calls afterwards.
//!
//! NOTE: Available in all builds to support integration testing and
//! simulations, but not meant to back a production ledger.
//!
//! # Example
//!
//! ```rust
//! use yield_splitter_core_rs::interfaces::memory::InMemoryAsset;
//! use yield_splitter_core_rs::interfaces::LedgerAsset;
//!
//! let alice = InMemoryAsset::new("alice");
//! alice.mint("alice", 1_000);
//!
//! let mut alice_handle = alice.clone();
//! alice_handle.transfer("bob", 400).unwrap();
//!
//! assert_eq!(alice.balance_of("alice"), 600);
//! assert_eq!(alice.balance_of("bob"), 400);
//! ```

use super::{
    AccessControl, AdminAction, AssetError, ExchangeAdapter, ExchangeError, LedgerAsset,
    RebaseIndexOracle, StakingAdapter, StakingError,
};
use crate::core::{mul_div_floor, Amount, BasisPoints, Index, Timestamp, UNIT};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

// ============================================================================
// Ledger asset
// ============================================================================

#[derive(Debug, Default)]
struct AssetBook {
    balances: BTreeMap<String, Amount>,
    allowances: BTreeMap<(String, String), Amount>,
    blocked: BTreeSet<String>,
}

impl AssetBook {
    fn balance(&self, account: &str) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn check_not_blocked(&self, from: &str, to: &str) -> Result<(), AssetError> {
        for account in [from, to] {
            if self.blocked.contains(account) {
                return Err(AssetError::Rejected(format!("account {} is blocked", account)));
            }
        }
        Ok(())
    }

    fn move_balance(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), AssetError> {
        self.check_not_blocked(from, to)?;
        let available = self.balance(from);
        if available < amount {
            return Err(AssetError::InsufficientBalance {
                account: from.to_string(),
                required: amount,
                available,
            });
        }
        self.balances.insert(from.to_string(), available - amount);
        let credited = self.balance(to).saturating_add(amount);
        self.balances.insert(to.to_string(), credited);
        Ok(())
    }
}

/// Fungible asset backed by a shared in-memory balance book
#[derive(Debug, Clone)]
pub struct InMemoryAsset {
    book: Rc<RefCell<AssetBook>>,
    holder: String,
}

impl InMemoryAsset {
    /// Create a new, empty asset with a handle bound to `holder`
    pub fn new(holder: &str) -> Self {
        Self {
            book: Rc::new(RefCell::new(AssetBook::default())),
            holder: holder.to_string(),
        }
    }

    /// Another handle on the same book acting for `holder`
    pub fn handle(&self, holder: &str) -> Self {
        Self {
            book: Rc::clone(&self.book),
            holder: holder.to_string(),
        }
    }

    /// Create `amount` out of thin air for `account` (issuance or rebase)
    pub fn mint(&self, account: &str, amount: Amount) {
        let mut book = self.book.borrow_mut();
        let balance = book.balance(account).saturating_add(amount);
        book.balances.insert(account.to_string(), balance);
    }

    pub fn allowance(&self, owner: &str, spender: &str) -> Amount {
        self.book
            .borrow()
            .allowances
            .get(&(owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Reject every transfer touching `account` until unblocked
    pub fn block_account(&self, account: &str) {
        self.book.borrow_mut().blocked.insert(account.to_string());
    }

    pub fn unblock_account(&self, account: &str) {
        self.book.borrow_mut().blocked.remove(account);
    }

    pub fn total_supply(&self) -> Amount {
        self.book.borrow().balances.values().sum()
    }
}

impl LedgerAsset for InMemoryAsset {
    fn holder(&self) -> &str {
        &self.holder
    }

    fn balance_of(&self, account: &str) -> Amount {
        self.book.borrow().balance(account)
    }

    fn transfer(&mut self, to: &str, amount: Amount) -> Result<(), AssetError> {
        let holder = self.holder.clone();
        self.book.borrow_mut().move_balance(&holder, to, amount)
    }

    fn transfer_from(&mut self, from: &str, to: &str, amount: Amount) -> Result<(), AssetError> {
        let mut book = self.book.borrow_mut();
        let key = (from.to_string(), self.holder.clone());
        let allowed = book.allowances.get(&key).copied().unwrap_or(0);
        if allowed < amount {
            return Err(AssetError::InsufficientAllowance {
                owner: from.to_string(),
                spender: self.holder.clone(),
                required: amount,
                allowed,
            });
        }
        book.move_balance(from, to, amount)?;
        book.allowances.insert(key, allowed - amount);
        Ok(())
    }

    fn approve(&mut self, spender: &str, amount: Amount) -> Result<(), AssetError> {
        self.book
            .borrow_mut()
            .allowances
            .insert((self.holder.clone(), spender.to_string()), amount);
        Ok(())
    }
}

// ============================================================================
// Index oracle
// ============================================================================

/// Index oracle whose value is set by hand
#[derive(Debug, Clone)]
pub struct ManualIndexOracle {
    index: Rc<Cell<Index>>,
}

impl ManualIndexOracle {
    pub fn new(index: Index) -> Self {
        Self {
            index: Rc::new(Cell::new(index)),
        }
    }

    /// Oracle starting at 1.0
    pub fn at_unit() -> Self {
        Self::new(UNIT)
    }

    pub fn set_index(&self, index: Index) {
        self.index.set(index);
    }

    /// Raise the index by `bps` of its current value
    pub fn accrue(&self, bps: BasisPoints) {
        let current = self.index.get();
        self.index
            .set(current.saturating_add(bps.of_rounded_down(current)));
    }
}

impl RebaseIndexOracle for ManualIndexOracle {
    fn current_index(&self) -> Index {
        self.index.get()
    }
}

// ============================================================================
// Staking adapter
// ============================================================================

/// Operation recorded by [`PassthroughStaking`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakingCall {
    Unwrap(Amount),
    Wrap(Amount),
    Unstake(Amount),
    Stake(Amount),
}

#[derive(Debug)]
struct StakingState {
    principal: InMemoryAsset,
    converted: InMemoryAsset,
    owner: String,
    calls: Vec<StakingCall>,
    fail_next: Option<StakingError>,
}

/// Staking adapter converting 1:1 between the principal asset and a second
/// asset for the account that owns it
///
/// Unwrap and unstake take the principal asset from the owner into the
/// adapter's account and pay the owner the same amount of the converted
/// asset out of the adapter's reserve; wrap and stake run the other way.
/// The reserve is funded by minting to the adapter's account.
#[derive(Debug, Clone)]
pub struct PassthroughStaking {
    account: String,
    state: Rc<RefCell<StakingState>>,
}

impl PassthroughStaking {
    /// Adapter at `account` converting on behalf of `owner`
    pub fn new(
        account: &str,
        owner: &str,
        principal: &InMemoryAsset,
        converted: &InMemoryAsset,
    ) -> Self {
        Self {
            account: account.to_string(),
            state: Rc::new(RefCell::new(StakingState {
                principal: principal.clone(),
                converted: converted.clone(),
                owner: owner.to_string(),
                calls: Vec::new(),
                fail_next: None,
            })),
        }
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn calls(&self) -> Vec<StakingCall> {
        self.state.borrow().calls.clone()
    }

    /// Make the next call fail with `error`
    pub fn fail_next(&self, error: StakingError) {
        self.state.borrow_mut().fail_next = Some(error);
    }

    fn convert(&mut self, call: StakingCall, amount: Amount) -> Result<Amount, StakingError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }
        let failed = |e: AssetError| StakingError::Failed(e.to_string());
        let owner = state.owner.clone();
        let (mut outgoing, mut incoming) = match call {
            StakingCall::Unwrap(_) | StakingCall::Unstake(_) => (
                state.principal.handle(&owner),
                state.converted.handle(&self.account),
            ),
            StakingCall::Wrap(_) | StakingCall::Stake(_) => (
                state.converted.handle(&owner),
                state.principal.handle(&self.account),
            ),
        };

        outgoing.transfer(&self.account, amount).map_err(failed)?;
        if let Err(e) = incoming.transfer(&owner, amount) {
            // Hand the owner's side back so a failed call leaves no trace
            let _ = outgoing.handle(&self.account).transfer(&owner, amount);
            return Err(failed(e));
        }
        state.calls.push(call);
        Ok(amount)
    }
}

impl StakingAdapter for PassthroughStaking {
    fn unwrap(&mut self, amount: Amount) -> Result<Amount, StakingError> {
        self.convert(StakingCall::Unwrap(amount), amount)
    }

    fn wrap(&mut self, amount: Amount) -> Result<Amount, StakingError> {
        self.convert(StakingCall::Wrap(amount), amount)
    }

    fn unstake(&mut self, amount: Amount) -> Result<Amount, StakingError> {
        self.convert(StakingCall::Unstake(amount), amount)
    }

    fn stake(&mut self, amount: Amount) -> Result<Amount, StakingError> {
        self.convert(StakingCall::Stake(amount), amount)
    }
}

// ============================================================================
// Exchange adapter
// ============================================================================

/// Arguments of one executed swap
#[derive(Debug, Clone, PartialEq)]
pub struct SwapCall {
    pub amount_in: Amount,
    pub min_out: Amount,
    pub amount_out: Amount,
    pub path: Vec<String>,
    pub recipient: String,
    pub deadline: Timestamp,
}

#[derive(Debug)]
struct ExchangeState {
    input: InMemoryAsset,
    output: InMemoryAsset,
    rate: Index,
    price_impact: BasisPoints,
    fail_next: Option<ExchangeError>,
    swaps: Vec<SwapCall>,
}

/// Exchange quoting a fixed rate, with optional execution price impact
///
/// `quote(x) = x * rate / UNIT`; a swap delivers the quote minus
/// `price_impact`. Input is pulled from `recipient` (the ledger swaps into
/// its own custody account) using the allowance granted to this
/// exchange's account, and proceeds are paid from the exchange's own
/// balance of the output asset.
#[derive(Debug, Clone)]
pub struct FixedRateExchange {
    account: String,
    state: Rc<RefCell<ExchangeState>>,
}

impl FixedRateExchange {
    /// `input`/`output` may be any handles on the two assets; they are
    /// rebound to `account`.
    pub fn new(account: &str, input: &InMemoryAsset, output: &InMemoryAsset, rate: Index) -> Self {
        Self {
            account: account.to_string(),
            state: Rc::new(RefCell::new(ExchangeState {
                input: input.handle(account),
                output: output.handle(account),
                rate,
                price_impact: BasisPoints::ZERO,
                fail_next: None,
                swaps: Vec::new(),
            })),
        }
    }

    pub fn set_rate(&self, rate: Index) {
        self.state.borrow_mut().rate = rate;
    }

    /// Deliver `impact` less than quoted on every swap
    pub fn set_price_impact(&self, impact: BasisPoints) {
        self.state.borrow_mut().price_impact = impact;
    }

    /// Make the next swap fail with `error`
    pub fn fail_next(&self, error: ExchangeError) {
        self.state.borrow_mut().fail_next = Some(error);
    }

    pub fn swaps(&self) -> Vec<SwapCall> {
        self.state.borrow().swaps.clone()
    }

    fn quote_at(rate: Index, amount_in: Amount) -> Result<Amount, ExchangeError> {
        mul_div_floor(amount_in, rate, UNIT)
            .ok_or_else(|| ExchangeError::Reverted("quote overflow".to_string()))
    }
}

impl ExchangeAdapter for FixedRateExchange {
    fn spender(&self) -> &str {
        &self.account
    }

    fn quote(&self, amount_in: Amount) -> Result<Amount, ExchangeError> {
        Self::quote_at(self.state.borrow().rate, amount_in)
    }

    fn swap(
        &mut self,
        amount_in: Amount,
        min_out: Amount,
        path: &[String],
        recipient: &str,
        deadline: Timestamp,
    ) -> Result<Amount, ExchangeError> {
        let mut state = self.state.borrow_mut();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }

        let quoted = Self::quote_at(state.rate, amount_in)?;
        let amount_out = quoted - state.price_impact.of_rounded_down(quoted);
        if amount_out < min_out {
            return Err(ExchangeError::SlippageExceeded {
                min_out,
                amount_out,
            });
        }

        let account = self.account.clone();
        state
            .input
            .transfer_from(recipient, &account, amount_in)
            .map_err(|e| ExchangeError::Reverted(e.to_string()))?;
        if let Err(e) = state.output.transfer(recipient, amount_out) {
            // Return the input so a failed swap leaves no trace
            let _ = state.input.transfer(recipient, amount_in);
            return Err(ExchangeError::Reverted(e.to_string()));
        }

        state.swaps.push(SwapCall {
            amount_in,
            min_out,
            amount_out,
            path: path.to_vec(),
            recipient: recipient.to_string(),
            deadline,
        });
        Ok(amount_out)
    }
}

// ============================================================================
// Access control
// ============================================================================

/// Access control granting every administrative action to a fixed set
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    admins: BTreeSet<String>,
}

impl AllowList {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins.into_iter().map(Into::into).collect(),
        }
    }

    pub fn single(admin: &str) -> Self {
        Self::new([admin])
    }
}

impl AccessControl for AllowList {
    fn is_authorized(&self, caller: &str, _action: AdminAction) -> bool {
        self.admins.contains(caller)
    }
}
