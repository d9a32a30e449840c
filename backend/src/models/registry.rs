//! Deposit registry
//!
//! Owns every live [`DepositRecord`] plus the structures that locate them:
//! the active set and the per-depositor and per-recipient indices.
//!
//! # Critical Invariants
//!
//! 1. **Single membership**: every live id is in the active set exactly
//!    once, in its depositor's list exactly once and in its recipient's
//!    list exactly once
//! 2. **Atomic removal**: removing a record removes it from all three in
//!    the same call
//! 3. **No reuse**: ids come from a monotonic counter and no two records
//!    ever carry the same id. The one rewind, [`DepositRegistry::discard_latest`],
//!    only reclaims an id no record or event was ever published under
//! 4. **Id references only**: lists store ids, never positions in another
//!    list

use crate::core::Amount;
use crate::models::deposit::{AccountId, DepositId, DepositRecord};
use crate::models::id_list::IdList;
use std::collections::BTreeMap;

/// Arena of deposit records with secondary indices
#[derive(Debug, Clone)]
pub struct DepositRegistry {
    /// All live records, indexed by id
    records: BTreeMap<DepositId, DepositRecord>,

    /// Ids eligible to be scanned by upkeep
    active: IdList,

    /// Depositor -> ids they own
    by_depositor: BTreeMap<AccountId, IdList>,

    /// Recipient -> ids whose yield they receive
    by_recipient: BTreeMap<AccountId, IdList>,

    /// Next id to assign
    next_id: DepositId,
}

impl Default for DepositRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DepositRegistry {
    /// Create an empty registry; the first id assigned is 1
    ///
    /// # Example
    ///
    /// ```rust
    /// use yield_splitter_core_rs::models::DepositRegistry;
    ///
    /// let mut registry = DepositRegistry::new();
    /// let id = registry.create("alice", "bob", 1_000, 1_000, 0, 60, 0);
    ///
    /// assert_eq!(id, 1);
    /// assert_eq!(registry.by_depositor("alice"), &[1]);
    /// assert_eq!(registry.by_recipient("bob"), &[1]);
    /// assert_eq!(registry.active_ids(), &[1]);
    /// ```
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            active: IdList::new(),
            by_depositor: BTreeMap::new(),
            by_recipient: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Assign an id and register a new record in every index
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        depositor: &str,
        recipient: &str,
        principal: Amount,
        agnostic_balance: Amount,
        now: u64,
        settlement_interval: u64,
        minimum_payout_threshold: Amount,
    ) -> DepositId {
        let id = self.next_id;
        self.next_id += 1;

        let record = DepositRecord::new(
            id,
            depositor.to_string(),
            recipient.to_string(),
            principal,
            agnostic_balance,
            now,
            settlement_interval,
            minimum_payout_threshold,
        );
        self.link(record);
        id
    }

    fn link(&mut self, record: DepositRecord) {
        let id = record.id();
        self.active.insert(id);
        self.by_depositor
            .entry(record.depositor().to_string())
            .or_default()
            .insert(id);
        self.by_recipient
            .entry(record.recipient().to_string())
            .or_default()
            .insert(id);
        self.records.insert(id, record);
    }

    fn unlink_from(index: &mut BTreeMap<AccountId, IdList>, account: &str, id: DepositId) {
        if let Some(list) = index.get_mut(account) {
            list.remove(id);
            if list.is_empty() {
                index.remove(account);
            }
        }
    }

    /// Remove a record from the arena and every index
    pub fn remove(&mut self, id: DepositId) -> Option<DepositRecord> {
        let record = self.records.remove(&id)?;
        self.active.remove(id);
        Self::unlink_from(&mut self.by_depositor, record.depositor(), id);
        Self::unlink_from(&mut self.by_recipient, record.recipient(), id);
        Some(record)
    }

    /// Undo the most recent [`DepositRegistry::create`].
    ///
    /// Rewinds the id counter so an open that failed to collect funds
    /// leaves no trace. Returns `None` if `id` is not the latest id.
    pub fn discard_latest(&mut self, id: DepositId) -> Option<DepositRecord> {
        if id + 1 != self.next_id {
            return None;
        }
        let record = self.remove(id)?;
        self.next_id = id;
        Some(record)
    }

    /// Put back a record previously returned by [`DepositRegistry::remove`]
    ///
    /// Returns false if the id is live or was never assigned.
    pub fn reinstate(&mut self, record: DepositRecord) -> bool {
        if self.records.contains_key(&record.id()) || record.id() >= self.next_id {
            return false;
        }
        self.link(record);
        true
    }

    /// Overwrite a live record with an earlier copy of itself
    ///
    /// Depositor and recipient must be unchanged, so no index moves.
    pub fn replace(&mut self, record: DepositRecord) -> bool {
        match self.records.get_mut(&record.id()) {
            Some(existing)
                if existing.depositor() == record.depositor()
                    && existing.recipient() == record.recipient() =>
            {
                *existing = record;
                true
            }
            _ => false,
        }
    }

    /// Move a record to a new recipient, patching the recipient index
    pub fn move_recipient(&mut self, id: DepositId, new_recipient: &str) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        let old_recipient = record.recipient().to_string();
        record.set_recipient(new_recipient.to_string());
        Self::unlink_from(&mut self.by_recipient, &old_recipient, id);
        self.by_recipient
            .entry(new_recipient.to_string())
            .or_default()
            .insert(id);
        true
    }

    pub fn get(&self, id: DepositId) -> Option<&DepositRecord> {
        self.records.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: DepositId) -> Option<&mut DepositRecord> {
        self.records.get_mut(&id)
    }

    pub fn contains(&self, id: DepositId) -> bool {
        self.records.contains_key(&id)
    }

    /// Ids scanned by upkeep, in active-set order
    pub fn active_ids(&self) -> &[DepositId] {
        self.active.as_slice()
    }

    pub fn by_depositor(&self, depositor: &str) -> &[DepositId] {
        self.by_depositor
            .get(depositor)
            .map(IdList::as_slice)
            .unwrap_or(&[])
    }

    pub fn by_recipient(&self, recipient: &str) -> &[DepositId] {
        self.by_recipient
            .get(recipient)
            .map(IdList::as_slice)
            .unwrap_or(&[])
    }

    pub fn records(&self) -> impl Iterator<Item = &DepositRecord> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn next_id(&self) -> DepositId {
        self.next_id
    }

    /// Sum of principal over all live records (for solvency checks)
    pub fn total_principal(&self) -> Amount {
        self.records.values().map(DepositRecord::principal).sum()
    }

    /// Rebuild a registry from persisted parts and verify its invariants
    pub fn from_parts(
        records: Vec<DepositRecord>,
        active: Vec<DepositId>,
        next_id: DepositId,
    ) -> Result<Self, String> {
        let mut registry = DepositRegistry {
            next_id,
            ..DepositRegistry::new()
        };
        for record in records {
            let id = record.id();
            if registry.records.contains_key(&id) {
                return Err(format!("duplicate deposit {}", id));
            }
            registry.by_depositor
                .entry(record.depositor().to_string())
                .or_default()
                .insert(id);
            registry.by_recipient
                .entry(record.recipient().to_string())
                .or_default()
                .insert(id);
            registry.records.insert(id, record);
        }
        for id in active {
            if !registry.active.insert(id) {
                return Err(format!("deposit {} listed twice in active set", id));
            }
        }
        registry.check_consistency()?;
        Ok(registry)
    }

    /// Verify every structural invariant
    ///
    /// # Returns
    ///
    /// `Err` describing the first violation found
    pub fn check_consistency(&self) -> Result<(), String> {
        if self.active.len() != self.records.len() {
            return Err(format!(
                "active set holds {} ids for {} records",
                self.active.len(),
                self.records.len()
            ));
        }
        for (id, record) in &self.records {
            if record.id() != *id {
                return Err(format!("record keyed {} carries id {}", id, record.id()));
            }
            if *id >= self.next_id {
                return Err(format!("deposit {} at or beyond next id {}", id, self.next_id));
            }
            if !self.active.contains(*id) {
                return Err(format!("deposit {} missing from active set", id));
            }
            if !self.by_depositor(record.depositor()).contains(id) {
                return Err(format!("deposit {} missing from depositor index", id));
            }
            if !self.by_recipient(record.recipient()).contains(id) {
                return Err(format!("deposit {} missing from recipient index", id));
            }
        }
        for (index_name, index) in [("depositor", &self.by_depositor), ("recipient", &self.by_recipient)] {
            let listed: usize = index.values().map(IdList::len).sum();
            if listed != self.records.len() {
                return Err(format!(
                    "{} index lists {} ids for {} records",
                    index_name,
                    listed,
                    self.records.len()
                ));
            }
        }
        Ok(())
    }
}
