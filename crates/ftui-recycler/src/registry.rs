//! Index -> slot table for active views.

use std::collections::BTreeMap;

use crate::error::{RecycleError, Result};
use crate::range::IndexRange;
use crate::shift::{Shift, ShiftIndices};
use crate::slot::SlotId;

/// Active views keyed by the index they show, in ascending index order.
#[derive(Debug, Clone, Default)]
pub struct ActiveRegistry {
    by_index: BTreeMap<usize, SlotId>,
}

impl ActiveRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_index.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SlotId> {
        self.by_index.get(&index).copied()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.by_index.contains_key(&index)
    }

    /// Register `slot` as showing `index`.
    pub fn insert(&mut self, index: usize, slot: SlotId) -> Result<()> {
        if self.by_index.contains_key(&index) {
            return Err(RecycleError::ActiveOverlap { slot });
        }
        self.by_index.insert(index, slot);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<SlotId> {
        self.by_index.remove(&index)
    }

    /// `(index, slot)` pairs in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, SlotId)> + '_ {
        self.by_index.iter().map(|(&index, &slot)| (index, slot))
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_index.keys().copied()
    }

    /// Active indices not covered by `range` (all of them when `None`).
    #[must_use]
    pub fn indices_outside(&self, range: Option<IndexRange>) -> Vec<usize> {
        self.indices()
            .filter(|&index| !range.is_some_and(|r| r.contains(index)))
            .collect()
    }

    /// Remove and return the entries for `at..at + count`.
    pub fn take_span(&mut self, at: usize, count: usize) -> Vec<(usize, SlotId)> {
        if count == 0 {
            return Vec::new();
        }
        let mut tail = self.by_index.split_off(&at);
        let rest = tail.split_off(&(at + count));
        self.by_index.extend(rest);
        tail.into_iter().collect()
    }

    /// Remove every entry.
    pub fn drain(&mut self) -> Vec<(usize, SlotId)> {
        std::mem::take(&mut self.by_index).into_iter().collect()
    }
}

impl ShiftIndices for ActiveRegistry {
    /// Fails with [`RecycleError::DanglingActive`] if a removed index is still
    /// registered; callers evict removed entries with
    /// [`take_span`](ActiveRegistry::take_span) first.
    fn shift_indices(&mut self, shift: Shift) -> Result<()> {
        if shift.is_noop() {
            return Ok(());
        }
        if let Some(index) = self.indices().find(|&i| shift.map_index(i).is_none()) {
            return Err(RecycleError::DanglingActive { index });
        }
        self.by_index = std::mem::take(&mut self.by_index)
            .into_iter()
            .filter_map(|(index, slot)| shift.map_index(index).map(|moved| (moved, slot)))
            .collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(indices: &[usize]) -> ActiveRegistry {
        let mut reg = ActiveRegistry::new();
        for (n, &index) in indices.iter().enumerate() {
            reg.insert(index, SlotId::from_raw(n as u32)).unwrap();
        }
        reg
    }

    #[test]
    fn double_registration_is_rejected() {
        let mut reg = registry(&[4]);
        assert!(reg.insert(4, SlotId::from_raw(9)).is_err());
        assert_eq!(reg.get(4), Some(SlotId::from_raw(0)));
    }

    #[test]
    fn take_span_splits_out_middle() {
        let mut reg = registry(&[1, 2, 3, 4, 5]);
        let taken = reg.take_span(2, 2);
        assert_eq!(
            taken.iter().map(|&(i, _)| i).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(reg.indices().collect::<Vec<_>>(), vec![1, 4, 5]);
    }

    #[test]
    fn shift_refuses_dangling_entries() {
        let mut reg = registry(&[3, 4]);
        assert_eq!(
            reg.shift_indices(Shift::Remove { at: 4, count: 1 }),
            Err(RecycleError::DanglingActive { index: 4 })
        );
        assert_eq!(reg.indices().collect::<Vec<_>>(), vec![3, 4]);
    }

    #[test]
    fn shift_moves_tail() {
        let mut reg = registry(&[3, 6, 7]);
        reg.shift_indices(Shift::Insert { at: 5, count: 10 }).unwrap();
        assert_eq!(reg.indices().collect::<Vec<_>>(), vec![3, 16, 17]);
    }

    #[test]
    fn indices_outside_window() {
        let reg = registry(&[1, 2, 8]);
        let window = IndexRange::new(2, 5).ok();
        assert_eq!(reg.indices_outside(window), vec![1, 8]);
        assert_eq!(reg.indices_outside(None), vec![1, 2, 8]);
    }
}
