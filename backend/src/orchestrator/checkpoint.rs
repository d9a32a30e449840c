//! Checkpoint - Save/Restore Ledger State
//!
//! Serializes the complete ledger state (records, active set, id counter,
//! carried dust, unpaid fee, index high-water mark and configuration) so a
//! host can persist it and resume later with fresh collaborator handles.
//!
//! # Critical Invariants
//!
//! - **Index Integrity**: every record sits in exactly one depositor list,
//!   one recipient list and the active set
//! - **Id Monotonicity**: the id counter is above every stored id
//! - **Config Matching**: a snapshot only restores if its config hashes to
//!   the stamped value
//! - **Index Monotonicity**: a restored ledger rejects an oracle index below
//!   the one the snapshot was valued at
//!
//! The event log is not part of a snapshot; a restored ledger starts with
//! an empty log.

use crate::core::{Amount, Index};
use crate::ledger::LedgerError;
use crate::models::{DepositId, DepositRecord, DepositRegistry, LedgerConfig};
use crate::orchestrator::engine::{Collaborators, YieldSplitter};
use crate::upkeep::UpkeepScheduler;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete ledger state snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// All live records, in id order
    pub records: Vec<DepositRecord>,

    /// Active-settlement set, in scan order
    pub active: Vec<DepositId>,

    /// Next id the registry will assign
    pub next_id: DepositId,

    /// Proceeds carried to the next cycle
    pub settlement_dust: Amount,

    /// Treasury fee awaiting a successful transfer
    pub unpaid_treasury_fee: Amount,

    pub cycles_completed: u64,

    /// Highest rebase index the ledger had been valued at
    #[serde(default)]
    pub index_high_water: Index,

    pub config: LedgerConfig,

    /// SHA256 hash of `config` (for validation)
    pub config_hash: String,
}

impl LedgerSnapshot {
    pub fn to_json(&self) -> Result<String, LedgerError> {
        serde_json::to_string(self)
            .map_err(|e| LedgerError::Checkpoint(format!("Snapshot serialization failed: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self, LedgerError> {
        serde_json::from_str(json)
            .map_err(|e| LedgerError::Checkpoint(format!("Snapshot parse failed: {}", e)))
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute deterministic SHA256 hash of config
///
/// Uses canonical JSON serialization with sorted keys so the hash does not
/// depend on field order.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, LedgerError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| LedgerError::Checkpoint(format!("Config serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| LedgerError::Checkpoint(format!("Config serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validate snapshot integrity and rebuild its registry
///
/// Checks the config hash, the config itself, and every registry
/// invariant (no duplicate or orphaned ids, id counter ahead of all ids).
pub fn validate_snapshot(snapshot: &LedgerSnapshot) -> Result<DepositRegistry, LedgerError> {
    let actual = compute_config_hash(&snapshot.config)?;
    if actual != snapshot.config_hash {
        return Err(LedgerError::Checkpoint(format!(
            "Config hash mismatch: snapshot stamped {}, config hashes to {}",
            snapshot.config_hash, actual
        )));
    }
    snapshot.config.validate()?;

    DepositRegistry::from_parts(
        snapshot.records.clone(),
        snapshot.active.clone(),
        snapshot.next_id,
    )
    .map_err(|e| LedgerError::Checkpoint(format!("State validation failed: {}", e)))
}

impl YieldSplitter {
    /// Capture the ledger state
    ///
    /// Only possible between cycles; the `&self` borrow guarantees that.
    pub fn snapshot(&self) -> Result<LedgerSnapshot, LedgerError> {
        let registry = self.registry();
        let scheduler = self.scheduler();
        Ok(LedgerSnapshot {
            records: registry.records().cloned().collect(),
            active: registry.active_ids().to_vec(),
            next_id: registry.next_id(),
            settlement_dust: scheduler.settlement_dust(),
            unpaid_treasury_fee: scheduler.unpaid_treasury_fee(),
            cycles_completed: scheduler.cycles_completed(),
            index_high_water: self.index_high_water(),
            config: self.config().clone(),
            config_hash: compute_config_hash(self.config())?,
        })
    }

    /// Rebuild a ledger from a snapshot and fresh collaborator handles
    pub fn restore(
        snapshot: LedgerSnapshot,
        collaborators: Collaborators,
    ) -> Result<Self, LedgerError> {
        let registry = validate_snapshot(&snapshot)?;
        let scheduler = UpkeepScheduler::from_parts(
            snapshot.settlement_dust,
            snapshot.unpaid_treasury_fee,
            snapshot.cycles_completed,
        );
        info!(
            deposits = registry.len(),
            next_id = snapshot.next_id,
            index_high_water = %snapshot.index_high_water,
            "ledger restored from snapshot"
        );
        YieldSplitter::from_parts(
            snapshot.config,
            collaborators,
            registry,
            scheduler,
            snapshot.index_high_water,
        )
    }
}
