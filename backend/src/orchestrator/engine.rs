//! Yield Splitter Engine
//!
//! The facade owning the ledger: deposit registry, configuration, upkeep
//! scheduler, event log and every external collaborator. It is the only
//! place where assets move.
//!
//! # Architecture
//!
//! Every lifecycle call follows the same steps:
//!
//! ```text
//! 1. Guard: scheduler idle, operation group not disabled
//! 2. Snapshot the rebase index into a YieldAccountant
//! 3. Apply the bookkeeping change (ledger::lifecycle)
//! 4. Move assets; on failure restore the prior record
//! 5. Log the event
//! ```
//!
//! `run_upkeep` drives one [`UpkeepScheduler`] cycle with the collaborators
//! borrowed for its duration.
//!
//! # Example
//!
//! ```rust
//! use yield_splitter_core_rs::core::UNIT;
//! use yield_splitter_core_rs::interfaces::LedgerAsset;
//! use yield_splitter_core_rs::interfaces::memory::{
//!     AllowList, FixedRateExchange, InMemoryAsset, ManualIndexOracle,
//! };
//! use yield_splitter_core_rs::models::LedgerConfig;
//! use yield_splitter_core_rs::orchestrator::{Collaborators, YieldSplitter};
//!
//! let config = LedgerConfig::default();
//! let custody = config.custody_account.clone();
//!
//! let steth = InMemoryAsset::new(&custody);
//! let usdc = InMemoryAsset::new(&custody);
//! let oracle = ManualIndexOracle::at_unit();
//! let dex = FixedRateExchange::new("dex", &steth, &usdc, UNIT);
//! steth.mint("alice", 1_000 * UNIT);
//! steth.handle("alice").approve(&custody, 1_000 * UNIT).unwrap();
//!
//! let mut ledger = YieldSplitter::new(
//!     config,
//!     Collaborators {
//!         principal_asset: Box::new(steth.clone()),
//!         settlement_asset: Box::new(usdc.clone()),
//!         index_oracle: Box::new(oracle.clone()),
//!         exchange: Box::new(dex),
//!         exchange_input_asset: None,
//!         staking: None,
//!         access_control: Box::new(AllowList::single("admin")),
//!     },
//! )
//! .unwrap();
//!
//! let id = ledger.open("alice", "bob", 1_000 * UNIT, 0).unwrap();
//! oracle.set_index(UNIT + UNIT / 10);
//! steth.mint(&custody, 100 * UNIT); // the rebase
//!
//! assert_eq!(ledger.outstanding_yield(id).unwrap(), 100 * UNIT);
//! assert_eq!(ledger.extract_yield("alice", id, 1).unwrap(), 100 * UNIT);
//! assert_eq!(steth.balance_of("bob"), 100 * UNIT);
//! ```

use crate::accounting::{AccountingError, YieldAccountant};
use crate::core::{Amount, BasisPoints, Index, Timestamp};
use crate::interfaces::{
    AccessControl, AdminAction, ExchangeAdapter, LedgerAsset, RebaseIndexOracle, StakingAdapter,
};
use crate::ledger::lifecycle::{self, ClosedDeposit, OpenRequest};
use crate::ledger::{LedgerError, Operation};
use crate::models::{
    ConfigError, ConversionRoute, DepositId, DepositRecord, DepositRegistry, Event,
    EventLog, LedgerConfig, OperationGroup,
};
use crate::upkeep::{eligible_ids, CycleResources, UpkeepReport, UpkeepScheduler};
use tracing::{debug, error, info, warn};

// ============================================================================
// Collaborators
// ============================================================================

/// External components the ledger drives
///
/// Every asset handle must be held by the configured custody account.
pub struct Collaborators {
    /// Rebasing asset deposits are made in; also the yield and fee asset
    pub principal_asset: Box<dyn LedgerAsset>,

    /// Asset yield is converted into and distributed in
    pub settlement_asset: Box<dyn LedgerAsset>,

    pub index_oracle: Box<dyn RebaseIndexOracle>,

    pub exchange: Box<dyn ExchangeAdapter>,

    /// Asset the staking adapter converts yield into and the exchange
    /// pulls. Required unless the conversion route is `Direct`.
    pub exchange_input_asset: Option<Box<dyn LedgerAsset>>,

    /// Required unless the conversion route is `Direct`
    pub staking: Option<Box<dyn StakingAdapter>>,

    pub access_control: Box<dyn AccessControl>,
}

// ============================================================================
// YieldSplitter
// ============================================================================

/// Yield-splitting ledger facade
///
/// All mutation takes `&mut self`, so a cycle holds the ledger exclusively
/// and collaborators invoked during it cannot re-enter lifecycle calls.
/// Hosts sharing a ledger across threads wrap it in a `Mutex`.
pub struct YieldSplitter {
    config: LedgerConfig,
    registry: DepositRegistry,
    scheduler: UpkeepScheduler,
    events: EventLog,
    collaborators: Collaborators,
    /// Highest rebase index observed; the oracle must never report less
    index_high_water: Index,
}

impl YieldSplitter {
    /// Create an empty ledger
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration is invalid, an asset handle is
    /// not held by the custody account, or the conversion route needs a
    /// staking adapter or exchange input asset that was not supplied.
    pub fn new(config: LedgerConfig, collaborators: Collaborators) -> Result<Self, LedgerError> {
        Self::from_parts(
            config,
            collaborators,
            DepositRegistry::new(),
            UpkeepScheduler::new(),
            0,
        )
    }

    pub(crate) fn from_parts(
        config: LedgerConfig,
        collaborators: Collaborators,
        registry: DepositRegistry,
        scheduler: UpkeepScheduler,
        index_high_water: Index,
    ) -> Result<Self, LedgerError> {
        config.validate()?;
        let input_holder = collaborators
            .exchange_input_asset
            .as_ref()
            .map(|asset| asset.holder());
        for holder in [
            Some(collaborators.principal_asset.holder()),
            Some(collaborators.settlement_asset.holder()),
            input_holder,
        ]
        .into_iter()
        .flatten()
        {
            if holder != config.custody_account {
                return Err(ConfigError::CustodyMismatch {
                    expected: config.custody_account.clone(),
                    actual: holder.to_string(),
                }
                .into());
            }
        }
        if config.conversion_route != ConversionRoute::Direct {
            if collaborators.staking.is_none() {
                return Err(ConfigError::MissingStakingAdapter(config.conversion_route).into());
            }
            if collaborators.exchange_input_asset.is_none() {
                return Err(ConfigError::MissingExchangeInputAsset(config.conversion_route).into());
            }
        }

        info!(
            custody = %config.custody_account,
            deposits = registry.len(),
            route = ?config.conversion_route,
            "yield splitter initialized"
        );
        Ok(Self {
            config,
            registry,
            scheduler,
            events: EventLog::new(),
            collaborators,
            index_high_water,
        })
    }

    fn guard(&self, op: Operation) -> Result<(), LedgerError> {
        self.scheduler.ensure_idle(op)?;
        if let Some(group) = op.group() {
            if self.config.kill_switches.is_disabled(group) {
                return Err(LedgerError::OperationDisabled { op, group });
            }
        }
        Ok(())
    }

    /// Snapshot the index without recording it
    fn observed(&self, op: Operation) -> Result<YieldAccountant, LedgerError> {
        YieldAccountant::from_oracle(&*self.collaborators.index_oracle)
            .and_then(|accountant| accountant.not_below(self.index_high_water))
            .map_err(|e| {
                if e != AccountingError::ZeroIndex {
                    error!(op = %op, error = %e, "rebase index rejected");
                }
                LedgerError::accounting(op, None, e)
            })
    }

    /// Snapshot the index for a mutation and raise the high-water mark
    fn accountant(&mut self, op: Operation) -> Result<YieldAccountant, LedgerError> {
        let accountant = self.observed(op)?;
        self.index_high_water = accountant.index();
        Ok(accountant)
    }

    fn restore_record(&mut self, prior: Option<DepositRecord>) {
        if let Some(record) = prior {
            let id = record.id();
            if !self.registry.replace(record) {
                warn!(deposit_id = id, "failed to restore deposit after transfer failure");
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open a deposit with the default settlement interval and no
    /// threshold above the ledger floor
    pub fn open(
        &mut self,
        depositor: &str,
        recipient: &str,
        amount: Amount,
        now: Timestamp,
    ) -> Result<DepositId, LedgerError> {
        let request = OpenRequest::new(
            depositor,
            recipient,
            amount,
            self.config.default_settlement_interval,
        );
        self.open_with(&request, now)
    }

    /// Open a deposit, pulling `amount` from the depositor into custody
    ///
    /// The depositor must have approved the custody account beforehand.
    pub fn open_with(
        &mut self,
        request: &OpenRequest<'_>,
        now: Timestamp,
    ) -> Result<DepositId, LedgerError> {
        let op = Operation::Open;
        self.guard(op)?;
        let accountant = self.accountant(op)?;

        let id = lifecycle::open(
            &mut self.registry,
            &accountant,
            request,
            self.config.min_payout_threshold_floor,
            now,
        )?;
        if let Err(e) = self.collaborators.principal_asset.transfer_from(
            request.depositor,
            &self.config.custody_account,
            request.amount,
        ) {
            self.registry.discard_latest(id);
            return Err(LedgerError::transfer(op, None, e));
        }

        let agnostic_amount = self
            .registry
            .get(id)
            .map(|r| r.agnostic_balance())
            .unwrap_or_default();
        debug!(
            deposit_id = id,
            depositor = request.depositor,
            recipient = request.recipient,
            amount = %request.amount,
            agnostic = %agnostic_amount,
            "deposit opened"
        );
        self.events.log(Event::DepositOpened {
            timestamp: now,
            deposit_id: id,
            depositor: request.depositor.to_string(),
            recipient: request.recipient.to_string(),
            amount: request.amount,
            agnostic_amount,
        });
        Ok(id)
    }

    /// Add principal from the depositor; returns the new principal
    pub fn top_up(
        &mut self,
        caller: &str,
        id: DepositId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let op = Operation::TopUp;
        self.guard(op)?;
        let accountant = self.accountant(op)?;
        let prior = self.registry.get(id).cloned();

        let principal = lifecycle::top_up(&mut self.registry, &accountant, caller, id, amount)?;
        if let Err(e) = self.collaborators.principal_asset.transfer_from(
            caller,
            &self.config.custody_account,
            amount,
        ) {
            self.restore_record(prior);
            return Err(LedgerError::transfer(op, Some(id), e));
        }

        self.events.log(Event::DepositToppedUp {
            timestamp: now,
            deposit_id: id,
            depositor: caller.to_string(),
            amount,
            new_principal: principal,
        });
        Ok(principal)
    }

    /// Return part of the principal to the depositor
    pub fn partial_withdraw(
        &mut self,
        caller: &str,
        id: DepositId,
        amount: Amount,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let op = Operation::PartialWithdraw;
        self.guard(op)?;
        let accountant = self.accountant(op)?;
        let prior = self.registry.get(id).cloned();

        let remaining =
            lifecycle::partial_withdraw(&mut self.registry, &accountant, caller, id, amount)?;
        if let Err(e) = self.collaborators.principal_asset.transfer(caller, amount) {
            self.restore_record(prior);
            return Err(LedgerError::transfer(op, Some(id), e));
        }

        self.events.log(Event::PrincipalWithdrawn {
            timestamp: now,
            deposit_id: id,
            depositor: caller.to_string(),
            amount,
            remaining_principal: remaining,
        });
        Ok(remaining)
    }

    /// Pay the outstanding yield to the recipient and re-baseline
    pub fn extract_yield(
        &mut self,
        caller: &str,
        id: DepositId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let op = Operation::ExtractYield;
        self.guard(op)?;
        let accountant = self.accountant(op)?;
        let prior = self.registry.get(id).cloned();

        let amount = lifecycle::extract_yield(&mut self.registry, &accountant, caller, id)?;
        let recipient = prior
            .as_ref()
            .map(|r| r.recipient().to_string())
            .unwrap_or_default();
        if amount > 0 {
            if let Err(e) = self.collaborators.principal_asset.transfer(&recipient, amount) {
                self.restore_record(prior);
                return Err(LedgerError::transfer(op, Some(id), e));
            }
        }

        self.events.log(Event::YieldExtracted {
            timestamp: now,
            deposit_id: id,
            recipient,
            amount,
        });
        Ok(amount)
    }

    /// Close a deposit
    ///
    /// Unclaimed settlement asset goes to the recipient; principal plus
    /// residual yield goes to the depositor in one payment. If either
    /// transfer fails the record is put back, less any settlement already
    /// paid.
    pub fn close(
        &mut self,
        caller: &str,
        id: DepositId,
        now: Timestamp,
    ) -> Result<ClosedDeposit, LedgerError> {
        let op = Operation::Close;
        self.guard(op)?;
        let accountant = self.accountant(op)?;

        let closed = lifecycle::close(&mut self.registry, &accountant, caller, id)?;
        let recipient = closed.record.recipient().to_string();

        if closed.claimable_settlement_asset > 0 {
            if let Err(e) = self
                .collaborators
                .settlement_asset
                .transfer(&recipient, closed.claimable_settlement_asset)
            {
                self.registry.reinstate(closed.record);
                return Err(LedgerError::transfer(op, Some(id), e));
            }
        }
        if let Err(e) = self
            .collaborators
            .principal_asset
            .transfer(closed.record.depositor(), closed.total_value)
        {
            let mut record = closed.record;
            record.take_claimable();
            self.registry.reinstate(record);
            return Err(LedgerError::transfer(op, Some(id), e));
        }

        self.events.log(Event::DepositClosed {
            timestamp: now,
            deposit_id: id,
            depositor: closed.record.depositor().to_string(),
            recipient,
            principal: closed.principal,
            total_value: closed.total_value,
            settlement_paid: closed.claimable_settlement_asset,
        });
        Ok(closed)
    }

    pub fn change_recipient(
        &mut self,
        caller: &str,
        id: DepositId,
        new_recipient: &str,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let op = Operation::ChangeRecipient;
        self.guard(op)?;
        let old_recipient = lifecycle::change_recipient(&mut self.registry, caller, id, new_recipient)?;
        self.events.log(Event::RecipientChanged {
            timestamp: now,
            deposit_id: id,
            old_recipient,
            new_recipient: new_recipient.to_string(),
        });
        Ok(())
    }

    /// Returns the threshold in effect after clamping to the ledger floor
    pub fn set_payout_threshold(
        &mut self,
        caller: &str,
        id: DepositId,
        threshold: Amount,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let op = Operation::SetPayoutThreshold;
        self.guard(op)?;
        let threshold = lifecycle::set_payout_threshold(
            &mut self.registry,
            caller,
            id,
            threshold,
            self.config.min_payout_threshold_floor,
        )?;
        self.events.log(Event::PayoutThresholdChanged {
            timestamp: now,
            deposit_id: id,
            threshold,
        });
        Ok(threshold)
    }

    pub fn set_settlement_interval(
        &mut self,
        caller: &str,
        id: DepositId,
        interval: u64,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let op = Operation::SetSettlementInterval;
        self.guard(op)?;
        lifecycle::set_settlement_interval(&mut self.registry, caller, id, interval)?;
        self.events.log(Event::SettlementIntervalChanged {
            timestamp: now,
            deposit_id: id,
            interval,
        });
        Ok(())
    }

    /// Pay the recipient everything claimable, ignoring the threshold
    pub fn claim_settlement(
        &mut self,
        caller: &str,
        id: DepositId,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let op = Operation::ClaimSettlement;
        self.guard(op)?;
        let prior = self.registry.get(id).cloned();

        let amount = lifecycle::claim_settlement(&mut self.registry, caller, id)?;
        if let Err(e) = self.collaborators.settlement_asset.transfer(caller, amount) {
            self.restore_record(prior);
            return Err(LedgerError::transfer(op, Some(id), e));
        }

        self.events.log(Event::SettlementClaimed {
            timestamp: now,
            deposit_id: id,
            recipient: caller.to_string(),
            amount,
        });
        Ok(amount)
    }

    // ========================================================================
    // Upkeep
    // ========================================================================

    /// Settle every deposit due at `now` in one batch
    pub fn run_upkeep(&mut self, now: Timestamp) -> Result<UpkeepReport, LedgerError> {
        let op = Operation::Upkeep;
        self.guard(op)?;
        let accountant = self.accountant(op)?;

        let collaborators = &mut self.collaborators;
        let staking: Option<&mut dyn StakingAdapter> = match collaborators.staking {
            Some(ref mut staking) => Some(&mut **staking),
            None => None,
        };
        let exchange_input: Option<&mut dyn LedgerAsset> = match collaborators.exchange_input_asset
        {
            Some(ref mut asset) => Some(&mut **asset),
            None => None,
        };
        let mut resources = CycleResources {
            principal_asset: &mut *collaborators.principal_asset,
            settlement_asset: &mut *collaborators.settlement_asset,
            exchange_input,
            exchange: &mut *collaborators.exchange,
            staking,
        };
        self.scheduler.run_cycle(
            &mut self.registry,
            &accountant,
            &self.config,
            &mut resources,
            &mut self.events,
            now,
        )
    }

    // ========================================================================
    // Administration
    // ========================================================================

    fn authorize_admin(&self, caller: &str, action: AdminAction) -> Result<(), LedgerError> {
        if self.collaborators.access_control.is_authorized(caller, action) {
            Ok(())
        } else {
            Err(LedgerError::Unauthorized {
                op: Operation::Admin(action),
                caller: caller.to_string(),
                id: None,
            })
        }
    }

    fn config_updated(&mut self, parameter: &str, value: String, now: Timestamp) {
        info!(parameter, value = %value, "config updated");
        self.events.log(Event::ConfigUpdated {
            timestamp: now,
            parameter: parameter.to_string(),
            value,
        });
    }

    fn fraction(field: &'static str, value: BasisPoints) -> Result<BasisPoints, LedgerError> {
        if value.is_valid() {
            Ok(value)
        } else {
            Err(ConfigError::FractionOutOfRange {
                field,
                value: value.value(),
            }
            .into())
        }
    }

    pub fn set_fee_share(
        &mut self,
        caller: &str,
        fee_share: BasisPoints,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.authorize_admin(caller, AdminAction::SetFeeShare)?;
        self.config.fee_share = Self::fraction("fee_share", fee_share)?;
        self.config_updated("fee_share", fee_share.to_string(), now);
        Ok(())
    }

    pub fn set_max_slippage(
        &mut self,
        caller: &str,
        max_slippage: BasisPoints,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.authorize_admin(caller, AdminAction::SetMaxSlippage)?;
        self.config.max_slippage = Self::fraction("max_slippage", max_slippage)?;
        self.config_updated("max_slippage", max_slippage.to_string(), now);
        Ok(())
    }

    /// Raise or lower the global payout threshold floor
    ///
    /// Applies to thresholds set from now on; existing records keep theirs.
    pub fn set_min_payout_threshold_floor(
        &mut self,
        caller: &str,
        floor: Amount,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.authorize_admin(caller, AdminAction::SetMinPayoutThresholdFloor)?;
        self.config.min_payout_threshold_floor = floor;
        self.config_updated("min_payout_threshold_floor", floor.to_string(), now);
        Ok(())
    }

    /// Redirect future fees, including any unpaid fee still carried
    pub fn set_treasury(
        &mut self,
        caller: &str,
        treasury: &str,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.authorize_admin(caller, AdminAction::SetTreasury)?;
        if treasury.is_empty() {
            return Err(ConfigError::EmptyAccount("treasury").into());
        }
        if treasury == self.config.custody_account {
            return Err(ConfigError::TreasuryIsCustody.into());
        }
        self.config.treasury = treasury.to_string();
        self.config_updated("treasury", treasury.to_string(), now);
        Ok(())
    }

    fn set_kill_switch(
        &mut self,
        caller: &str,
        group: OperationGroup,
        disabled: bool,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let (action, parameter) = match group {
            OperationGroup::Deposits => (AdminAction::SetDepositsDisabled, "deposits_disabled"),
            OperationGroup::Withdrawals => {
                (AdminAction::SetWithdrawalsDisabled, "withdrawals_disabled")
            }
            OperationGroup::Upkeep => (AdminAction::SetUpkeepDisabled, "upkeep_disabled"),
        };
        self.authorize_admin(caller, action)?;

        let switches = &mut self.config.kill_switches;
        match group {
            OperationGroup::Deposits => switches.deposits_disabled = disabled,
            OperationGroup::Withdrawals => switches.withdrawals_disabled = disabled,
            OperationGroup::Upkeep => switches.upkeep_disabled = disabled,
        }
        if disabled {
            warn!(group = %group, "operation group disabled");
        }
        self.config_updated(parameter, disabled.to_string(), now);
        Ok(())
    }

    pub fn set_deposits_disabled(
        &mut self,
        caller: &str,
        disabled: bool,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.set_kill_switch(caller, OperationGroup::Deposits, disabled, now)
    }

    pub fn set_withdrawals_disabled(
        &mut self,
        caller: &str,
        disabled: bool,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.set_kill_switch(caller, OperationGroup::Withdrawals, disabled, now)
    }

    pub fn set_upkeep_disabled(
        &mut self,
        caller: &str,
        disabled: bool,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.set_kill_switch(caller, OperationGroup::Upkeep, disabled, now)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn registry(&self) -> &DepositRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &UpkeepScheduler {
        &self.scheduler
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    pub fn deposit(&self, id: DepositId) -> Option<&DepositRecord> {
        self.registry.get(id)
    }

    pub fn deposits_by_depositor(&self, depositor: &str) -> &[DepositId] {
        self.registry.by_depositor(depositor)
    }

    pub fn deposits_by_recipient(&self, recipient: &str) -> &[DepositId] {
        self.registry.by_recipient(recipient)
    }

    pub fn active_deposits(&self) -> &[DepositId] {
        self.registry.active_ids()
    }

    /// Current rebase index as reported by the oracle
    pub fn current_index(&self) -> Index {
        self.collaborators.index_oracle.current_index()
    }

    /// Highest rebase index any mutation has been valued at
    pub fn index_high_water(&self) -> Index {
        self.index_high_water
    }

    fn valued(
        &self,
        id: DepositId,
        value: impl FnOnce(&YieldAccountant, &DepositRecord) -> Result<Amount, AccountingError>,
    ) -> Result<Amount, LedgerError> {
        let op = Operation::Query;
        let record = self
            .registry
            .get(id)
            .ok_or(LedgerError::NotFound { op, id })?;
        let accountant = self.observed(op)?;
        value(&accountant, record).map_err(|e| LedgerError::accounting(op, Some(id), e))
    }

    /// Yield the deposit would pay if extracted now
    pub fn outstanding_yield(&self, id: DepositId) -> Result<Amount, LedgerError> {
        self.valued(id, |a, r| a.outstanding_yield(r.principal(), r.agnostic_balance()))
    }

    /// Principal plus outstanding yield
    pub fn position_value(&self, id: DepositId) -> Result<Amount, LedgerError> {
        self.valued(id, |a, r| a.position_value(r.principal(), r.agnostic_balance()))
    }

    pub fn total_principal(&self) -> Amount {
        self.registry.total_principal()
    }

    /// Deposits the next cycle at `now` would settle
    pub fn eligible_deposits(&self, now: Timestamp) -> Vec<DepositId> {
        eligible_ids(&self.registry, now)
    }
}

// Manual Debug implementation (collaborators don't implement Debug)
impl std::fmt::Debug for YieldSplitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldSplitter")
            .field("custody", &self.config.custody_account)
            .field("deposits", &self.registry.len())
            .field("phase", &self.scheduler.phase())
            .field("cycles_completed", &self.scheduler.cycles_completed())
            .field("event_count", &self.events.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
