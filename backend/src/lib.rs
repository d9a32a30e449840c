//! Yield Splitter Core - Rust Engine
//!
//! Ledger for deposits of a rebasing, interest-bearing asset whose yield is
//! routed to a separate recipient and settled in batches into a second
//! asset.
//!
//! # Architecture
//!
//! - **core**: Fixed-point arithmetic, basis points, timestamps
//! - **models**: Domain types (DepositRecord, DepositRegistry, LedgerConfig, Event)
//! - **accounting**: Flat/agnostic conversions at one index snapshot
//! - **ledger**: Deposit lifecycle operations and the error taxonomy
//! - **upkeep**: Batch settlement cycle (aggregate, convert, distribute)
//! - **interfaces**: Collaborator traits and in-memory implementations
//! - **orchestrator**: The `YieldSplitter` facade and checkpoints
//!
//! # Critical Invariants
//!
//! 1. All amounts are u128 in the asset's smallest unit
//! 2. Outstanding yield is never negative, and a falling index is rejected
//! 3. A record is in the active set and both indices, or in none of them
//! 4. A refused upkeep conversion leaves the ledger as it was before the cycle
//! 5. Custody always holds at least what the ledger owes

// Module declarations
pub mod accounting;
pub mod core;
pub mod interfaces;
pub mod ledger;
pub mod models;
pub mod orchestrator;
pub mod upkeep;

// Re-exports for convenience
pub use accounting::{AccountingError, YieldAccountant};
pub use core::{Amount, BasisPoints, Index, Timestamp, UNIT};
pub use interfaces::{
    AccessControl, AdminAction, AssetError, ExchangeAdapter, ExchangeError, LedgerAsset,
    RebaseIndexOracle, StakingAdapter, StakingError,
};
pub use ledger::{ClosedDeposit, LedgerError, OpenRequest, Operation};
pub use models::{
    ConversionRoute, DepositId, DepositRecord, DepositRegistry, Event, EventLog, LedgerConfig,
};
pub use orchestrator::{Collaborators, LedgerSnapshot, YieldSplitter};
pub use upkeep::{UpkeepPhase, UpkeepReport};
