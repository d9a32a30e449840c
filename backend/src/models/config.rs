//! Ledger configuration
//!
//! One explicit configuration value owned by the ledger. Administrative
//! setters on the engine are the only way to change it after startup.

use crate::core::{Amount, BasisPoints};
use crate::models::deposit::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be at most 10000 bps, got {value}")]
    FractionOutOfRange { field: &'static str, value: u16 },

    #[error("{0} must not be empty")]
    EmptyAccount(&'static str),

    #[error("treasury and custody account must differ")]
    TreasuryIsCustody,

    #[error("conversion route {0:?} requires a staking adapter")]
    MissingStakingAdapter(ConversionRoute),

    #[error("conversion route {0:?} requires a handle on the exchange input asset")]
    MissingExchangeInputAsset(ConversionRoute),

    #[error("custody account {expected} does not match asset holder {actual}")]
    CustodyMismatch { expected: String, actual: String },

    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// How aggregated yield is turned into exchange input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConversionRoute {
    /// Swap the yield asset as-is
    #[default]
    Direct,
    /// Unwrap from the fixed-supply form before swapping
    Unwrap,
    /// Unstake from the rebasing form into the flat form before swapping
    Unstake,
}

/// Operation groups gated by kill-switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationGroup {
    /// open, top_up
    Deposits,
    /// partial_withdraw, close, extract_yield, claim_settlement
    Withdrawals,
    /// run_upkeep
    Upkeep,
}

impl fmt::Display for OperationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationGroup::Deposits => f.write_str("deposits"),
            OperationGroup::Withdrawals => f.write_str("withdrawals"),
            OperationGroup::Upkeep => f.write_str("upkeep"),
        }
    }
}

/// Independent kill-switches, all off by default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KillSwitches {
    pub deposits_disabled: bool,
    pub withdrawals_disabled: bool,
    pub upkeep_disabled: bool,
}

impl KillSwitches {
    pub fn is_disabled(&self, group: OperationGroup) -> bool {
        match group {
            OperationGroup::Deposits => self.deposits_disabled,
            OperationGroup::Withdrawals => self.withdrawals_disabled,
            OperationGroup::Upkeep => self.upkeep_disabled,
        }
    }
}

/// Complete ledger configuration
///
/// # Example
///
/// ```rust
/// use yield_splitter_core_rs::models::LedgerConfig;
///
/// let config = LedgerConfig::from_json(
///     r#"{ "custody_account": "splitter", "treasury": "dao", "fee_share": 1000 }"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.fee_share.value(), 1000);
/// assert_eq!(config.max_slippage.value(), 100);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Account holding all principal and settlement asset
    pub custody_account: AccountId,

    /// Receiver of the protocol fee
    pub treasury: AccountId,

    /// Share of aggregated yield paid to the treasury each cycle
    pub fee_share: BasisPoints,

    /// Largest tolerated shortfall of swap output versus quote
    pub max_slippage: BasisPoints,

    /// Global lower bound on every record's payout threshold
    pub min_payout_threshold_floor: Amount,

    /// Interval used when an open does not specify one (seconds)
    pub default_settlement_interval: u64,

    /// Asset path handed to the exchange
    pub swap_path: Vec<String>,

    /// Seconds after `now` at which a swap expires
    pub swap_deadline: u64,

    pub conversion_route: ConversionRoute,

    pub kill_switches: KillSwitches,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            custody_account: "yield-splitter".to_string(),
            treasury: "treasury".to_string(),
            fee_share: BasisPoints::ZERO,
            max_slippage: BasisPoints(100),
            min_payout_threshold_floor: 0,
            default_settlement_interval: 86_400,
            swap_path: Vec::new(),
            swap_deadline: 600,
            conversion_route: ConversionRoute::Direct,
            kill_switches: KillSwitches::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse and validate a JSON configuration; omitted fields take defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fee_share.is_valid() {
            return Err(ConfigError::FractionOutOfRange {
                field: "fee_share",
                value: self.fee_share.value(),
            });
        }
        if !self.max_slippage.is_valid() {
            return Err(ConfigError::FractionOutOfRange {
                field: "max_slippage",
                value: self.max_slippage.value(),
            });
        }
        if self.custody_account.is_empty() {
            return Err(ConfigError::EmptyAccount("custody_account"));
        }
        if self.treasury.is_empty() {
            return Err(ConfigError::EmptyAccount("treasury"));
        }
        if self.treasury == self.custody_account {
            return Err(ConfigError::TreasuryIsCustody);
        }
        Ok(())
    }
}
