//! Id list with O(1) membership removal
//!
//! Backs the active set and the per-depositor / per-recipient indices.
//! Removal swaps the last element into the vacated slot and truncates; the
//! private position map is patched for the moved id inside the same call,
//! so nothing outside this type ever holds a position.

use crate::models::deposit::DepositId;
use std::collections::HashMap;

/// Ordered list of deposit ids with O(1) `contains` and `remove`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdList {
    ids: Vec<DepositId>,
    positions: HashMap<DepositId, usize>,
}

impl IdList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id`; returns false if it was already present
    pub fn insert(&mut self, id: DepositId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.ids.len());
        self.ids.push(id);
        true
    }

    /// Swap-remove `id`; returns false if it was absent
    ///
    /// # Example
    ///
    /// ```rust
    /// use yield_splitter_core_rs::models::id_list::IdList;
    ///
    /// let mut list: IdList = [1, 2, 3].into_iter().collect();
    /// assert!(list.remove(1));
    /// assert_eq!(list.as_slice(), &[3, 2]);
    /// assert!(list.contains(3));
    /// ```
    pub fn remove(&mut self, id: DepositId) -> bool {
        let Some(position) = self.positions.remove(&id) else {
            return false;
        };
        self.ids.swap_remove(position);
        if let Some(&moved) = self.ids.get(position) {
            self.positions.insert(moved, position);
        }
        true
    }

    pub fn contains(&self, id: DepositId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn as_slice(&self) -> &[DepositId] {
        &self.ids
    }
}

impl FromIterator<DepositId> for IdList {
    fn from_iter<I: IntoIterator<Item = DepositId>>(iter: I) -> Self {
        let mut list = IdList::new();
        for id in iter {
            list.insert(id);
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut list = IdList::new();
        assert!(list.insert(1));
        assert!(!list.insert(1));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_remove_patches_moved_position() {
        let mut list: IdList = [10, 20, 30, 40].into_iter().collect();

        // 40 moves into slot 0
        assert!(list.remove(10));
        assert_eq!(list.as_slice(), &[40, 20, 30]);

        // Removing the moved element must use its patched position
        assert!(list.remove(40));
        assert_eq!(list.as_slice(), &[30, 20]);
        assert!(list.contains(20));
        assert!(list.contains(30));
        assert!(!list.contains(40));
    }

    #[test]
    fn test_remove_last_element() {
        let mut list: IdList = [1, 2].into_iter().collect();
        assert!(list.remove(2));
        assert_eq!(list.as_slice(), &[1]);
        assert!(list.remove(1));
        assert!(list.is_empty());
    }

    #[test]
    fn test_remove_absent() {
        let mut list: IdList = [1].into_iter().collect();
        assert!(!list.remove(5));
        assert_eq!(list.len(), 1);
    }
}
