//! Upkeep scheduler
//!
//! One cycle moves through `Idle -> Aggregating -> Converting ->
//! Distributing -> Idle`. The records re-baselined while aggregating are
//! kept in an ephemeral per-cycle map together with what they held
//! before, so a conversion refused before any funds moved can put every
//! one of them back.
//!
//! An exchange that takes the input and delivers below the minimum output
//! has already spent the yield. That cycle keeps its re-baseline: the
//! received proceeds join the carried dust, the fee joins the unpaid fee,
//! and the staking conversion is not reversed.

use crate::accounting::YieldAccountant;
use crate::core::{is_due, Amount, Timestamp};
use crate::interfaces::{ExchangeAdapter, LedgerAsset, StakingAdapter};
use crate::ledger::{LedgerError, Operation};
use crate::models::{ConversionRoute, DepositId, DepositRegistry, Event, EventLog, LedgerConfig};
use crate::upkeep::distribution::{minimum_output, prorate};
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};

/// Current step of the upkeep cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpkeepPhase {
    #[default]
    Idle,
    Aggregating,
    Converting,
    Distributing,
}

/// Collaborators a cycle drives, borrowed from the engine for its duration
pub struct CycleResources<'a> {
    pub principal_asset: &'a mut dyn LedgerAsset,
    pub settlement_asset: &'a mut dyn LedgerAsset,
    /// Staking output the exchange pulls on the `Unwrap` and `Unstake` routes
    pub exchange_input: Option<&'a mut dyn LedgerAsset>,
    pub exchange: &'a mut dyn ExchangeAdapter,
    pub staking: Option<&'a mut dyn StakingAdapter>,
}

/// State of one record before the cycle re-baselined it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CycleEntry {
    yield_amount: Amount,
    prior_agnostic: Amount,
    prior_last_settled: Timestamp,
}

/// Per-deposit outcome of a completed cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledDeposit {
    pub deposit_id: DepositId,
    pub yield_amount: Amount,
    pub share: Amount,
    /// Amount pushed to the recipient this cycle (0 if held or deferred)
    pub paid_out: Amount,
}

/// Result of [`UpkeepScheduler::run_cycle`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpkeepReport {
    pub timestamp: Timestamp,
    pub settled: Vec<SettledDeposit>,
    pub total_yield: Amount,
    pub fee: Amount,
    pub fee_paid: bool,
    pub amount_in: Amount,
    pub proceeds: Amount,
    /// Dust from earlier cycles distributed with this cycle's proceeds
    pub carried_in: Amount,
    pub dust_carried: Amount,
    pub payouts_deferred: usize,
}

impl UpkeepReport {
    pub fn settled_count(&self) -> usize {
        self.settled.len()
    }

    pub fn total_distributed(&self) -> Amount {
        self.settled.iter().map(|s| s.share).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Conversion {
    amount_in: Amount,
    proceeds: Amount,
}

/// Why a conversion produced nothing to distribute
#[derive(Debug, Clone, PartialEq, Eq)]
enum ConversionFailure {
    /// Nothing left custody
    Refused(String),
    /// The exchange took the input and delivered below the minimum
    Shortfall { amount_out: Amount, reason: String },
}

impl ConversionFailure {
    fn reason(&self) -> &str {
        match self {
            ConversionFailure::Refused(reason) => reason,
            ConversionFailure::Shortfall { reason, .. } => reason,
        }
    }
}

/// Ids of active deposits due for settlement at `now`, in active-set order
pub fn eligible_ids(registry: &DepositRegistry, now: Timestamp) -> Vec<DepositId> {
    registry
        .active_ids()
        .iter()
        .copied()
        .filter(|id| {
            registry
                .get(*id)
                .map(|r| is_due(r.last_settled(), r.settlement_interval(), now))
                .unwrap_or(false)
        })
        .collect()
}

/// Batch settlement state carried between cycles
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpkeepScheduler {
    phase: UpkeepPhase,
    /// Proceeds not distributed by floor rounding, added to the next cycle
    settlement_dust: Amount,
    /// Treasury fee whose transfer failed, retried at the next cycle start
    unpaid_treasury_fee: Amount,
    cycles_completed: u64,
}

impl UpkeepScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        settlement_dust: Amount,
        unpaid_treasury_fee: Amount,
        cycles_completed: u64,
    ) -> Self {
        Self {
            phase: UpkeepPhase::Idle,
            settlement_dust,
            unpaid_treasury_fee,
            cycles_completed,
        }
    }

    pub fn phase(&self) -> UpkeepPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == UpkeepPhase::Idle
    }

    pub fn settlement_dust(&self) -> Amount {
        self.settlement_dust
    }

    pub fn unpaid_treasury_fee(&self) -> Amount {
        self.unpaid_treasury_fee
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Fail with `UpkeepInProgress` unless the scheduler is idle
    pub fn ensure_idle(&self, op: Operation) -> Result<(), LedgerError> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(LedgerError::UpkeepInProgress {
                op,
                phase: self.phase,
            })
        }
    }

    /// Run one full upkeep cycle at `now`
    ///
    /// On `Err` the registry is exactly as it was before the call; carried
    /// dust and unpaid fees are unchanged except for a successful retry of
    /// a previously unpaid fee. The one exception is an exchange shortfall
    /// (see the module docs), after which the cycle's re-baseline stands.
    pub fn run_cycle(
        &mut self,
        registry: &mut DepositRegistry,
        accountant: &YieldAccountant,
        config: &LedgerConfig,
        resources: &mut CycleResources<'_>,
        events: &mut EventLog,
        now: Timestamp,
    ) -> Result<UpkeepReport, LedgerError> {
        self.ensure_idle(Operation::Upkeep)?;
        self.retry_treasury_fee(config, resources, events, now);

        self.phase = UpkeepPhase::Aggregating;
        let cycle = match aggregate(registry, accountant, now) {
            Ok(cycle) => cycle,
            Err(e) => {
                self.phase = UpkeepPhase::Idle;
                error!(error = %e, "upkeep aggregation failed");
                return Err(e);
            }
        };
        let total_yield = match cycle
            .values()
            .try_fold(0u128, |acc, entry| acc.checked_add(entry.yield_amount))
        {
            Some(total) => total,
            None => {
                rollback(registry, &cycle);
                self.phase = UpkeepPhase::Idle;
                return Err(LedgerError::ArithmeticOverflow {
                    op: Operation::Upkeep,
                    id: None,
                });
            }
        };
        debug!(eligible = cycle.len(), total_yield = %total_yield, "upkeep aggregated");

        if cycle.is_empty() {
            self.phase = UpkeepPhase::Idle;
            self.cycles_completed += 1;
            events.log(Event::UpkeepCompleted {
                timestamp: now,
                settled_count: 0,
                total_yield: 0,
                fee: 0,
                amount_in: 0,
                proceeds: 0,
                dust_carried: self.settlement_dust,
            });
            info!("upkeep completed with no eligible deposits");
            return Ok(UpkeepReport {
                timestamp: now,
                dust_carried: self.settlement_dust,
                ..Default::default()
            });
        }

        self.phase = UpkeepPhase::Converting;
        let fee = config.fee_share.of_rounded_down(total_yield);
        let swap_amount = total_yield - fee;
        let conversion = match convert(config, resources, swap_amount, now) {
            Ok(conversion) => conversion,
            Err(failure) => {
                match &failure {
                    ConversionFailure::Refused(reason) => {
                        rollback(registry, &cycle);
                        warn!(
                            eligible = cycle.len(),
                            total_yield = %total_yield,
                            reason = %reason,
                            "upkeep aborted, cycle rolled back"
                        );
                    }
                    ConversionFailure::Shortfall { amount_out, reason } => {
                        self.settlement_dust = self.settlement_dust.saturating_add(*amount_out);
                        self.unpaid_treasury_fee = self.unpaid_treasury_fee.saturating_add(fee);
                        error!(
                            eligible = cycle.len(),
                            total_yield = %total_yield,
                            amount_out = %amount_out,
                            reason = %reason,
                            "upkeep aborted after exchange shortfall; re-baseline kept, proceeds carried"
                        );
                    }
                }
                self.phase = UpkeepPhase::Idle;
                let reason = failure.reason().to_string();
                events.log(Event::UpkeepAborted {
                    timestamp: now,
                    eligible_count: cycle.len(),
                    total_yield,
                    reason: reason.clone(),
                });
                return Err(LedgerError::ExternalConversionFailed { reason });
            }
        };

        self.phase = UpkeepPhase::Distributing;
        let mut report = self.distribute(registry, resources, events, &cycle, conversion, now);
        report.total_yield = total_yield;
        report.fee = fee;
        report.fee_paid = self.pay_treasury_fee(config, resources, events, fee, now);

        self.phase = UpkeepPhase::Idle;
        self.cycles_completed += 1;
        events.log(Event::UpkeepCompleted {
            timestamp: now,
            settled_count: report.settled.len(),
            total_yield,
            fee,
            amount_in: report.amount_in,
            proceeds: report.proceeds,
            dust_carried: report.dust_carried,
        });
        info!(
            settled = report.settled.len(),
            total_yield = %total_yield,
            fee = %fee,
            proceeds = %report.proceeds,
            dust = %report.dust_carried,
            "upkeep completed"
        );
        Ok(report)
    }

    /// Credit this cycle's proceeds plus the dust carried in
    ///
    /// Shares sum to at most `proceeds + carried_in`; a cycle can credit
    /// more than its own proceeds when earlier dust joins it.
    fn distribute(
        &mut self,
        registry: &mut DepositRegistry,
        resources: &mut CycleResources<'_>,
        events: &mut EventLog,
        cycle: &BTreeMap<DepositId, CycleEntry>,
        conversion: Conversion,
        now: Timestamp,
    ) -> UpkeepReport {
        let carried_in = self.settlement_dust;
        let distributable = conversion.proceeds.saturating_add(carried_in);
        let yields: Vec<Amount> = cycle.values().map(|e| e.yield_amount).collect();
        let allocation = prorate(distributable, &yields);
        self.settlement_dust = allocation.dust;

        let mut report = UpkeepReport {
            timestamp: now,
            amount_in: conversion.amount_in,
            proceeds: conversion.proceeds,
            carried_in,
            dust_carried: allocation.dust,
            ..Default::default()
        };

        for ((id, entry), share) in cycle.iter().zip(allocation.shares) {
            let Some(record) = registry.get_mut(*id) else {
                continue;
            };
            if share > 0 {
                record.credit_settlement(share);
                events.log(Event::SettlementCredited {
                    timestamp: now,
                    deposit_id: *id,
                    yield_amount: entry.yield_amount,
                    share,
                });
            }

            let mut paid_out = 0;
            if record.payout_due() {
                let amount = record.take_claimable();
                let recipient = record.recipient().to_string();
                match resources.settlement_asset.transfer(&recipient, amount) {
                    Ok(()) => {
                        paid_out = amount;
                        events.log(Event::SettlementPaidOut {
                            timestamp: now,
                            deposit_id: *id,
                            recipient,
                            amount,
                        });
                    }
                    Err(e) => {
                        record.restore_claimable(amount);
                        report.payouts_deferred += 1;
                        warn!(deposit_id = id, amount = %amount, error = %e, "payout deferred");
                        events.log(Event::PayoutDeferred {
                            timestamp: now,
                            deposit_id: *id,
                            recipient,
                            amount,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            report.settled.push(SettledDeposit {
                deposit_id: *id,
                yield_amount: entry.yield_amount,
                share,
                paid_out,
            });
        }
        report
    }

    /// Transfer this cycle's fee; a failure is carried as unpaid
    fn pay_treasury_fee(
        &mut self,
        config: &LedgerConfig,
        resources: &mut CycleResources<'_>,
        events: &mut EventLog,
        fee: Amount,
        now: Timestamp,
    ) -> bool {
        if fee == 0 {
            return true;
        }
        match resources.principal_asset.transfer(&config.treasury, fee) {
            Ok(()) => {
                events.log(Event::TreasuryFeePaid {
                    timestamp: now,
                    treasury: config.treasury.clone(),
                    amount: fee,
                });
                true
            }
            Err(e) => {
                self.unpaid_treasury_fee = self.unpaid_treasury_fee.saturating_add(fee);
                warn!(treasury = %config.treasury, amount = %fee, error = %e, "treasury fee deferred");
                events.log(Event::TreasuryFeeDeferred {
                    timestamp: now,
                    treasury: config.treasury.clone(),
                    amount: fee,
                    reason: e.to_string(),
                });
                false
            }
        }
    }

    fn retry_treasury_fee(
        &mut self,
        config: &LedgerConfig,
        resources: &mut CycleResources<'_>,
        events: &mut EventLog,
        now: Timestamp,
    ) {
        let unpaid = self.unpaid_treasury_fee;
        if unpaid == 0 {
            return;
        }
        match resources.principal_asset.transfer(&config.treasury, unpaid) {
            Ok(()) => {
                self.unpaid_treasury_fee = 0;
                events.log(Event::TreasuryFeePaid {
                    timestamp: now,
                    treasury: config.treasury.clone(),
                    amount: unpaid,
                });
            }
            Err(e) => {
                warn!(treasury = %config.treasury, amount = %unpaid, error = %e, "unpaid treasury fee retry failed");
            }
        }
    }
}

/// Re-baseline every due record, remembering its prior state
///
/// Stops at the first record whose yield cannot be computed and restores
/// the ones already touched.
fn aggregate(
    registry: &mut DepositRegistry,
    accountant: &YieldAccountant,
    now: Timestamp,
) -> Result<BTreeMap<DepositId, CycleEntry>, LedgerError> {
    let mut cycle = BTreeMap::new();

    for id in eligible_ids(registry, now) {
        let Some(record) = registry.get_mut(id) else {
            continue;
        };
        let principal = record.principal();
        let step = accountant
            .outstanding_yield(principal, record.agnostic_balance())
            .and_then(|accrued| Ok((accrued, accountant.rebaselined(principal)?)));

        match step {
            Ok((yield_amount, rebaselined)) => {
                cycle.insert(
                    id,
                    CycleEntry {
                        yield_amount,
                        prior_agnostic: record.agnostic_balance(),
                        prior_last_settled: record.last_settled(),
                    },
                );
                record.set_agnostic_balance(rebaselined);
                record.set_last_settled(now);
            }
            Err(e) => {
                rollback(registry, &cycle);
                return Err(LedgerError::accounting(Operation::Upkeep, Some(id), e));
            }
        }
    }
    Ok(cycle)
}

fn rollback(registry: &mut DepositRegistry, cycle: &BTreeMap<DepositId, CycleEntry>) {
    for (id, entry) in cycle {
        if let Some(record) = registry.get_mut(*id) {
            record.set_agnostic_balance(entry.prior_agnostic);
            record.set_last_settled(entry.prior_last_settled);
        }
    }
}

/// Turn `swap_amount` of yield into settlement asset in custody
///
/// A refusal after a staking conversion reverses that conversion; a
/// shortfall does not, since the converted input is gone.
fn convert(
    config: &LedgerConfig,
    resources: &mut CycleResources<'_>,
    swap_amount: Amount,
    now: Timestamp,
) -> Result<Conversion, ConversionFailure> {
    if swap_amount == 0 {
        return Ok(Conversion {
            amount_in: 0,
            proceeds: 0,
        });
    }

    let route = config.conversion_route;
    let amount_in = match (route, resources.staking.as_deref_mut()) {
        (ConversionRoute::Direct, _) => swap_amount,
        (ConversionRoute::Unwrap, Some(staking)) => staking
            .unwrap(swap_amount)
            .map_err(|e| ConversionFailure::Refused(format!("unwrap: {}", e)))?,
        (ConversionRoute::Unstake, Some(staking)) => staking
            .unstake(swap_amount)
            .map_err(|e| ConversionFailure::Refused(format!("unstake: {}", e)))?,
        (route, None) => {
            return Err(ConversionFailure::Refused(format!(
                "no staking adapter for route {:?}",
                route
            )))
        }
    };

    match swap(config, resources, amount_in, now) {
        Ok(proceeds) => Ok(Conversion {
            amount_in,
            proceeds,
        }),
        Err(ConversionFailure::Refused(reason)) => {
            reverse_staking(route, resources, amount_in);
            Err(ConversionFailure::Refused(reason))
        }
        Err(shortfall) => Err(shortfall),
    }
}

/// Asset the exchange pulls on `route`
fn exchange_input<'r, 'a>(
    route: ConversionRoute,
    resources: &'r mut CycleResources<'a>,
) -> Result<&'r mut (dyn LedgerAsset + 'a), ConversionFailure> {
    match route {
        ConversionRoute::Direct => Ok(&mut *resources.principal_asset),
        route => resources.exchange_input.as_deref_mut().ok_or_else(|| {
            ConversionFailure::Refused(format!("no exchange input asset for route {:?}", route))
        }),
    }
}

fn revoke_allowance(route: ConversionRoute, resources: &mut CycleResources<'_>, spender: &str) {
    if let Ok(input) = exchange_input(route, resources) {
        if let Err(e) = input.approve(spender, 0) {
            warn!(error = %e, "failed to revoke exchange allowance");
        }
    }
}

fn swap(
    config: &LedgerConfig,
    resources: &mut CycleResources<'_>,
    amount_in: Amount,
    now: Timestamp,
) -> Result<Amount, ConversionFailure> {
    let route = config.conversion_route;
    let quote = resources
        .exchange
        .quote(amount_in)
        .map_err(|e| ConversionFailure::Refused(format!("quote: {}", e)))?;
    let min_out = minimum_output(quote, config.max_slippage);
    let spender = resources.exchange.spender().to_string();
    exchange_input(route, resources)?
        .approve(&spender, amount_in)
        .map_err(|e| ConversionFailure::Refused(format!("approve: {}", e)))?;

    let deadline = now.saturating_add(config.swap_deadline);
    let result = resources.exchange.swap(
        amount_in,
        min_out,
        &config.swap_path,
        &config.custody_account,
        deadline,
    );
    match result {
        Ok(amount_out) if amount_out >= min_out => {
            debug!(amount_in = %amount_in, amount_out = %amount_out, min_out = %min_out, "swap executed");
            Ok(amount_out)
        }
        Ok(amount_out) => {
            revoke_allowance(route, resources, &spender);
            Err(ConversionFailure::Shortfall {
                amount_out,
                reason: format!("swap returned {} below minimum {}", amount_out, min_out),
            })
        }
        Err(e) => {
            revoke_allowance(route, resources, &spender);
            Err(ConversionFailure::Refused(format!("swap: {}", e)))
        }
    }
}

fn reverse_staking(route: ConversionRoute, resources: &mut CycleResources<'_>, amount_in: Amount) {
    let Some(staking) = resources.staking.as_deref_mut() else {
        return;
    };
    let reversed = match route {
        ConversionRoute::Direct => return,
        ConversionRoute::Unwrap => staking.wrap(amount_in),
        ConversionRoute::Unstake => staking.stake(amount_in),
    };
    if let Err(e) = reversed {
        error!(route = ?route, amount = %amount_in, error = %e, "failed to reverse staking conversion");
    }
}
