//! Domain models for the yield-splitting ledger

pub mod config;
pub mod deposit;
pub mod event;
pub mod id_list;
pub mod registry;

// Re-exports
pub use config::{ConfigError, ConversionRoute, KillSwitches, LedgerConfig, OperationGroup};
pub use deposit::{AccountId, DepositId, DepositRecord};
pub use event::{Event, EventLog};
pub use registry::DepositRegistry;
