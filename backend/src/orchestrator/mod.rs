//! Orchestrator - the ledger facade
//!
//! See `engine.rs` for the lifecycle, upkeep and admin surface and
//! `checkpoint.rs` for save/restore.

pub mod checkpoint;
pub mod engine;

// Re-export main types for convenience
pub use checkpoint::{compute_config_hash, validate_snapshot, LedgerSnapshot};
pub use engine::{Collaborators, YieldSplitter};
