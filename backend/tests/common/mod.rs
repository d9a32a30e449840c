//! Shared fixtures for integration tests
//!
//! A ledger wired to in-memory collaborators, with handles kept so tests can
//! drive the index, fund accounts and inspect balances.

#![allow(dead_code)]

use std::cell::Cell;
use yield_splitter_core_rs::core::{Amount, Index, UNIT, U256};
use yield_splitter_core_rs::interfaces::memory::{
    AllowList, FixedRateExchange, InMemoryAsset, ManualIndexOracle, PassthroughStaking,
};
use yield_splitter_core_rs::interfaces::{LedgerAsset, RebaseIndexOracle};
use yield_splitter_core_rs::models::{ConversionRoute, LedgerConfig};
use yield_splitter_core_rs::orchestrator::{Collaborators, YieldSplitter};

pub const CUSTODY: &str = "yield-splitter";
pub const ADMIN: &str = "admin";
pub const DAY: u64 = 86_400;
pub const STAKING: &str = "staking";

/// 1.1 in index units
pub const INDEX_1_1: Index = UNIT + UNIT / 10;

pub struct Harness {
    pub ledger: YieldSplitter,
    pub steth: InMemoryAsset,
    /// Non-rebasing form the staking adapter converts into
    pub wsteth: InMemoryAsset,
    pub usdc: InMemoryAsset,
    pub oracle: ManualIndexOracle,
    /// Trades `steth` on the direct route and `wsteth` otherwise
    pub dex: FixedRateExchange,
    pub staking: PassthroughStaking,
    /// Custody growth below one base unit, scaled by `UNIT`
    custody_remainder: Cell<Amount>,
}

impl Harness {
    pub fn new(config: LedgerConfig) -> Self {
        let steth = InMemoryAsset::new(CUSTODY);
        let wsteth = InMemoryAsset::new(CUSTODY);
        let usdc = InMemoryAsset::new(CUSTODY);
        let oracle = ManualIndexOracle::at_unit();
        let traded = match config.conversion_route {
            ConversionRoute::Direct => &steth,
            ConversionRoute::Unwrap | ConversionRoute::Unstake => &wsteth,
        };
        let dex = FixedRateExchange::new("dex", traded, &usdc, UNIT);
        let staking = PassthroughStaking::new(STAKING, CUSTODY, &steth, &wsteth);
        usdc.mint("dex", 1_000_000 * UNIT);
        wsteth.mint(STAKING, 1_000_000 * UNIT);

        let ledger = YieldSplitter::new(
            config,
            collaborators(&steth, &wsteth, &usdc, &oracle, &dex, &staking),
        )
        .unwrap();

        Self {
            ledger,
            steth,
            wsteth,
            usdc,
            oracle,
            dex,
            staking,
            custody_remainder: Cell::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(LedgerConfig::default())
    }

    /// Fresh collaborator handles sharing this harness's state
    pub fn collaborators(&self) -> Collaborators {
        collaborators(
            &self.steth,
            &self.wsteth,
            &self.usdc,
            &self.oracle,
            &self.dex,
            &self.staking,
        )
    }

    /// Mint principal asset to `account` and approve the custody account
    pub fn fund(&self, account: &str, amount: Amount) {
        self.steth.mint(account, amount);
        self.steth
            .handle(account)
            .approve(CUSTODY, Amount::MAX)
            .unwrap();
    }

    /// Move the index, growing the custody balance as the rebase would
    ///
    /// Growth below one base unit is carried into the next rebase, so the
    /// custody balance compounds like a share-based balance instead of
    /// losing a fraction at every step.
    pub fn rebase_to(&self, index: Index) {
        let current = U256::from(self.oracle.current_index());
        let unit = U256::from(UNIT);
        let balance = self.steth.balance_of(CUSTODY);
        let exact = U256::from(balance) * unit + U256::from(self.custody_remainder.get());
        let grown = exact * U256::from(index) / current;

        self.custody_remainder.set((grown % unit).as_u128());
        self.steth.mint(CUSTODY, (grown / unit).as_u128() - balance);
        self.oracle.set_index(index);
    }
}

fn collaborators(
    steth: &InMemoryAsset,
    wsteth: &InMemoryAsset,
    usdc: &InMemoryAsset,
    oracle: &ManualIndexOracle,
    dex: &FixedRateExchange,
    staking: &PassthroughStaking,
) -> Collaborators {
    Collaborators {
        principal_asset: Box::new(steth.clone()),
        settlement_asset: Box::new(usdc.clone()),
        index_oracle: Box::new(oracle.clone()),
        exchange: Box::new(dex.clone()),
        exchange_input_asset: Some(Box::new(wsteth.clone())),
        staking: Some(Box::new(staking.clone())),
        access_control: Box::new(AllowList::single(ADMIN)),
    }
}
