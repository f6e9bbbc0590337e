//! Pool of inactive views.
//!
//! Pooled views come in two kinds:
//!
//! - **bound**: returned while still showing the item at some index. Keyed by
//!   that index and ordered by return time.
//! - **unbound**: no useful contents (never bound, or their item was deleted).
//!   Handed out first-in first-out.
//!
//! # Claim Policy
//!
//! [`RecyclingPool::claim`] tries, in order:
//!
//! 1. the bound view keyed to the requested index (no rebind needed),
//! 2. the oldest unbound view,
//! 3. the least recently returned bound view (evicting its stale contents),
//! 4. nothing; the caller must create a view.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{RecycleError, Result};
use crate::shift::{Shift, ShiftIndices};
use crate::slot::SlotId;

/// How a claimed view was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimKind {
    /// The view was pooled while bound to the requested index.
    Exact,
    /// The view had no contents.
    Unbound,
    /// The view was bound to another index; its contents are stale.
    Evicted { previous_index: usize },
}

/// A view handed out by [`RecyclingPool::claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Claimed {
    pub slot: SlotId,
    pub kind: ClaimKind,
}

impl Claimed {
    /// True when no rebind work is needed.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.kind == ClaimKind::Exact
    }
}

#[derive(Debug, Clone, Copy)]
struct BoundEntry {
    slot: SlotId,
    /// Return order; lower is older.
    seq: u64,
}

/// Inactive views awaiting reuse.
#[derive(Debug, Clone, Default)]
pub struct RecyclingPool {
    bound: FxHashMap<usize, BoundEntry>,
    /// Eviction queue: return sequence -> index in `bound`.
    eviction: BTreeMap<u64, usize>,
    unbound: VecDeque<SlotId>,
    /// Every slot currently pooled, for overlap detection.
    pooled: FxHashSet<SlotId>,
    next_seq: u64,
}

impl RecyclingPool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total pooled views.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len() + self.unbound.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn bound_len(&self) -> usize {
        self.bound.len()
    }

    #[must_use]
    pub fn unbound_len(&self) -> usize {
        self.unbound.len()
    }

    /// True when a bound view is pooled for `index`.
    #[must_use]
    pub fn contains_index(&self, index: usize) -> bool {
        self.bound.contains_key(&index)
    }

    #[must_use]
    pub fn contains_slot(&self, slot: SlotId) -> bool {
        self.pooled.contains(&slot)
    }

    /// Bound indices, oldest return first.
    pub fn bound_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.eviction.values().copied()
    }

    /// The pooled slot keyed to `index`, if any.
    pub fn bound_slot(&self, index: usize) -> Option<SlotId> {
        self.bound.get(&index).map(|entry| entry.slot)
    }

    /// Unbound views, next to be handed out first.
    pub fn unbound_slots(&self) -> impl Iterator<Item = SlotId> + '_ {
        self.unbound.iter().copied()
    }

    /// Return a view that still shows the item at `index`.
    ///
    /// Fails with [`RecycleError::DuplicateReturn`] if `index` already has a
    /// pooled view, and with [`RecycleError::ActiveOverlap`] if `slot` is
    /// already pooled.
    pub fn return_bound(&mut self, slot: SlotId, index: usize) -> Result<()> {
        if self.bound.contains_key(&index) {
            return Err(RecycleError::DuplicateReturn { index });
        }
        if !self.pooled.insert(slot) {
            return Err(RecycleError::ActiveOverlap { slot });
        }
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.bound.insert(index, BoundEntry { slot, seq });
        self.eviction.insert(seq, index);
        Ok(())
    }

    /// Return a view with no reusable contents.
    pub fn release_unbound(&mut self, slot: SlotId) -> Result<()> {
        if !self.pooled.insert(slot) {
            return Err(RecycleError::ActiveOverlap { slot });
        }
        self.unbound.push_back(slot);
        Ok(())
    }

    /// Hand out a view for `target`; see the module docs for the order.
    pub fn claim(&mut self, target: usize) -> Option<Claimed> {
        let claimed = if let Some(entry) = self.bound.remove(&target) {
            self.eviction.remove(&entry.seq);
            Claimed {
                slot: entry.slot,
                kind: ClaimKind::Exact,
            }
        } else if let Some(slot) = self.unbound.pop_front() {
            Claimed {
                slot,
                kind: ClaimKind::Unbound,
            }
        } else {
            let (_, previous_index) = self.eviction.pop_first()?;
            let entry = self.bound.remove(&previous_index)?;
            Claimed {
                slot: entry.slot,
                kind: ClaimKind::Evicted { previous_index },
            }
        };
        self.pooled.remove(&claimed.slot);
        Some(claimed)
    }

    /// Move every bound view to the unbound queue, oldest first.
    pub fn unbind_all(&mut self) {
        let bound = std::mem::take(&mut self.bound);
        for index in std::mem::take(&mut self.eviction).into_values() {
            if let Some(entry) = bound.get(&index) {
                self.unbound.push_back(entry.slot);
            }
        }
    }
}

impl ShiftIndices for RecyclingPool {
    /// Re-key bound views; views whose item was removed become unbound.
    fn shift_indices(&mut self, shift: Shift) -> Result<()> {
        if shift.is_noop() {
            return Ok(());
        }
        let bound = std::mem::take(&mut self.bound);
        let eviction = std::mem::take(&mut self.eviction);
        for (seq, index) in eviction {
            let Some(entry) = bound.get(&index).copied() else {
                continue;
            };
            match shift.map_index(index) {
                Some(moved) => {
                    self.bound.insert(moved, entry);
                    self.eviction.insert(seq, moved);
                }
                None => self.unbound.push_back(entry.slot),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: u32) -> SlotId {
        SlotId::from_raw(raw)
    }

    #[test]
    fn return_then_claim_same_index_is_exact() {
        let mut pool = RecyclingPool::new();
        pool.return_bound(id(3), 42).unwrap();

        assert_eq!(pool.bound_slot(42), Some(id(3)));
        let claimed = pool.claim(42).unwrap();
        assert_eq!(claimed.slot, id(3));
        assert!(claimed.is_exact());
        assert!(pool.is_empty());
    }

    #[test]
    fn unbound_is_preferred_over_eviction() {
        let mut pool = RecyclingPool::new();
        pool.return_bound(id(0), 5).unwrap();
        pool.release_unbound(id(1)).unwrap();

        let claimed = pool.claim(9).unwrap();
        assert_eq!(claimed.slot, id(1));
        assert_eq!(claimed.kind, ClaimKind::Unbound);
        assert!(pool.contains_index(5));
    }

    #[test]
    fn eviction_takes_least_recently_returned() {
        let mut pool = RecyclingPool::new();
        pool.return_bound(id(0), 10).unwrap();
        pool.return_bound(id(1), 11).unwrap();
        pool.return_bound(id(2), 12).unwrap();

        let claimed = pool.claim(50).unwrap();
        assert_eq!(claimed.slot, id(0));
        assert_eq!(claimed.kind, ClaimKind::Evicted { previous_index: 10 });
        assert_eq!(pool.bound_indices().collect::<Vec<_>>(), vec![11, 12]);
    }

    #[test]
    fn empty_pool_claims_nothing() {
        let mut pool = RecyclingPool::new();
        assert_eq!(pool.claim(0), None);
    }

    #[test]
    fn duplicate_return_is_rejected() {
        let mut pool = RecyclingPool::new();
        pool.return_bound(id(0), 7).unwrap();
        assert_eq!(
            pool.return_bound(id(1), 7),
            Err(RecycleError::DuplicateReturn { index: 7 })
        );
        assert_eq!(
            pool.return_bound(id(0), 8),
            Err(RecycleError::ActiveOverlap { slot: id(0) })
        );
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn shift_rekeys_and_unbinds_removed() {
        let mut pool = RecyclingPool::new();
        pool.return_bound(id(0), 2).unwrap();
        pool.return_bound(id(1), 5).unwrap();
        pool.return_bound(id(2), 8).unwrap();

        pool.shift_indices(Shift::Remove { at: 4, count: 2 }).unwrap();
        assert_eq!(pool.bound_slot(2), Some(id(0)));
        assert_eq!(pool.bound_slot(6), Some(id(2)));
        assert!(!pool.contains_index(5));
        assert_eq!(pool.unbound_slots().collect::<Vec<_>>(), vec![id(1)]);

        pool.shift_indices(Shift::Insert { at: 0, count: 3 }).unwrap();
        assert_eq!(pool.bound_indices().collect::<Vec<_>>(), vec![5, 9]);
    }

    #[test]
    fn shift_keeps_eviction_order() {
        let mut pool = RecyclingPool::new();
        pool.return_bound(id(0), 9).unwrap();
        pool.return_bound(id(1), 1).unwrap();
        pool.shift_indices(Shift::Insert { at: 0, count: 1 }).unwrap();

        let claimed = pool.claim(100).unwrap();
        assert_eq!(claimed.kind, ClaimKind::Evicted { previous_index: 10 });
    }

    #[test]
    fn unbind_all_keeps_every_slot() {
        let mut pool = RecyclingPool::new();
        pool.release_unbound(id(4)).unwrap();
        pool.return_bound(id(0), 3).unwrap();
        pool.return_bound(id(1), 1).unwrap();
        pool.unbind_all();

        assert_eq!(pool.bound_len(), 0);
        assert_eq!(
            pool.unbound_slots().collect::<Vec<_>>(),
            vec![id(4), id(0), id(1)]
        );
        assert!(pool.contains_slot(id(1)));
    }
}
