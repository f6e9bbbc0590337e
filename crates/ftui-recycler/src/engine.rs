//! The recalculation engine.
//!
//! [`Recycler`] owns the logical list, the [`ActiveWindow`], the
//! [`RecyclingPool`] and every view. All changes go through its methods, so
//! the window and the pool are consistent whenever a method returns `Ok`.
//!
//! # Settle Loop
//!
//! [`Recycler::tick`] runs a fixed-point loop:
//!
//! 1. Probe the visibility test for every active index and fold the hits
//!    into the visible range. With nothing visible, nothing active and a
//!    non-empty list, the anchor index is materialized first so there is
//!    something to probe.
//! 2. Re-derive the cache bands.
//! 3. While the window is dirty: recycle active indices outside the active
//!    range, materialize indices inside it that lack a view, then probe
//!    again. A freshly materialized cache index can turn out visible, which
//!    dirties the window and forces another pass.
//! 4. Assign the final [`SlotState`] of every active view and of the endcap,
//!    reporting each transition.
//!
//! Mutations run the same loop without probing: after the index shift the
//! window is taken as-is until the next tick.
//!
//! The loop runs until the window stops changing. Hosts whose visibility
//! test might keep flipping can opt into
//! [`RecyclerConfig::settle_pass_limit`], which fails with
//! [`RecycleError::SettleDidNotConverge`] instead of spinning.
//!
//! # Re-entrancy
//!
//! Every entry point takes `&mut self` and callbacks only ever see their own
//! view or a [`StateChange`], so a callback cannot mutate the list while a
//! settle is in progress.

use std::fmt;
use std::hash::Hash;

use rustc_hash::FxHashSet;

use crate::config::RecyclerConfig;
use crate::error::{RecycleError, Result};
use crate::keymap::IndexKeyMap;
use crate::pool::{ClaimKind, RecyclingPool};
use crate::range::IndexRange;
use crate::registry::ActiveRegistry;
use crate::shift::{Shift, ShiftIndices};
use crate::slot::{ItemView, SlotArena, SlotId, SlotState, ViewFactory};
use crate::window::{ActiveWindow, CacheRanges, Region};

/// An item with a stable identity.
pub trait Keyed {
    type Key: Clone + Eq + Hash;

    fn key(&self) -> Self::Key;
}

/// Answers whether an active index is inside the viewport.
///
/// Implemented for every `FnMut(usize) -> bool`.
pub trait VisibilityTest {
    fn is_visible(&mut self, index: usize) -> bool;

    /// Whether the endcap is inside the viewport. Only consulted when the
    /// endcap is enabled.
    fn is_endcap_visible(&mut self) -> bool {
        false
    }
}

impl<F> VisibilityTest for F
where
    F: FnMut(usize) -> bool,
{
    fn is_visible(&mut self, index: usize) -> bool {
        self(index)
    }
}

/// Which side of a mutation the layout should hold still.
///
/// Passed through to the layout collaborator via [`Splice`]; it has no effect
/// on window or pool bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    /// Content before the mutation keeps its screen position.
    #[default]
    FixBefore,
    /// Content after the mutation keeps its screen position.
    FixAfter,
    /// Both sides stay put; the mutation grows or shrinks in place.
    FixBoth,
}

/// One list mutation, as seen by the layout collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Splice {
    pub at: usize,
    pub removed: usize,
    pub inserted: usize,
    pub bias: Bias,
}

/// What a [`StateChange`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTarget {
    /// The view bound to this index (the index it had when the change was
    /// made).
    Item(usize),
    /// The sentinel after the last item.
    Endcap,
}

/// A slot state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    pub target: StateTarget,
    pub previous: SlotState,
    pub current: SlotState,
}

/// Outcome of one settle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Passes through the dirty loop.
    pub passes: usize,
    /// Views bound to an index.
    pub materialized: usize,
    /// Views returned to the pool.
    pub recycled: usize,
    /// State transitions, in the order they were reported.
    pub changes: Vec<StateChange>,
}

/// Running counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecycleStats {
    /// Claims served by a view still bound to the requested index.
    pub claims_exact: u64,
    /// Claims served by an unbound view.
    pub claims_unbound: u64,
    /// Claims that evicted a stale bound view.
    pub claims_evicted: u64,
    /// Views produced by the factory, including prewarmed ones.
    pub views_created: u64,
    /// Views returned to the pool.
    pub recycled: u64,
    /// Passes taken by the most recent settle.
    pub last_settle_passes: usize,
    pub ticks: u64,
}

impl RecycleStats {
    /// Fraction of materializations that needed no rebind (0.0 to 1.0).
    pub fn exact_reuse_rate(&self) -> f64 {
        let total =
            self.claims_exact + self.claims_unbound + self.claims_evicted + self.views_created;
        if total == 0 {
            0.0
        } else {
            self.claims_exact as f64 / total as f64
        }
    }
}

type StateListener = Box<dyn FnMut(&StateChange)>;

/// Virtualized list engine: the list, its active window and a view pool.
pub struct Recycler<T: Keyed, V> {
    config: RecyclerConfig,
    items: Vec<T>,
    keys: IndexKeyMap<T::Key>,
    window: ActiveWindow,
    pool: RecyclingPool,
    arena: SlotArena<V>,
    active: ActiveRegistry,
    factory: Box<dyn ViewFactory<V>>,
    listener: Option<StateListener>,
    endcap: SlotState,
    /// Endcap visibility from the last probe. Cleared once the last item
    /// leaves the active range.
    endcap_visible: bool,
    /// Where to seed the probe when nothing is visible.
    anchor: usize,
    splices: Vec<Splice>,
    stats: RecycleStats,
}

impl<T: Keyed, V> fmt::Debug for Recycler<T, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recycler")
            .field("len", &self.items.len())
            .field("window", &self.window)
            .field("pool", &self.pool)
            .field("active", &self.active)
            .field("views", &self.arena.len())
            .field("endcap", &self.endcap)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl<T, V> Recycler<T, V>
where
    T: Keyed,
    V: ItemView<T>,
{
    /// Create an empty recycler, prewarming `config.prewarm` views.
    pub fn new(config: RecyclerConfig, factory: impl ViewFactory<V> + 'static) -> Result<Self> {
        let window = ActiveWindow::new(config.cache_depth, config.orientation);
        let prewarm = config.prewarm;
        let mut recycler = Self {
            config,
            items: Vec::new(),
            keys: IndexKeyMap::new(),
            window,
            pool: RecyclingPool::new(),
            arena: SlotArena::new(),
            active: ActiveRegistry::new(),
            factory: Box::new(factory),
            listener: None,
            endcap: SlotState::Pooled,
            endcap_visible: false,
            anchor: 0,
            splices: Vec::new(),
            stats: RecycleStats::default(),
        };
        recycler.prewarm(prewarm)?;
        Ok(recycler)
    }

    /// Create `count` views now and park them in the unbound queue.
    pub fn prewarm(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let view = self.factory.create_view()?;
            let slot = self.arena.insert(view);
            self.pool.release_unbound(slot)?;
            self.stats.views_created += 1;
        }
        Ok(())
    }

    /// Receive every slot state transition.
    pub fn set_state_listener(&mut self, listener: impl FnMut(&StateChange) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_state_listener(&mut self) {
        self.listener = None;
    }

    // ── Queries ─────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &RecyclerConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn index_of(&self, key: &T::Key) -> Option<usize> {
        self.keys.index_of(key)
    }

    pub fn key_of(&self, index: usize) -> Option<&T::Key> {
        self.keys.key_of(index)
    }

    #[must_use]
    pub fn visible_range(&self) -> Option<IndexRange> {
        self.window.visible_range()
    }

    #[must_use]
    pub fn active_range(&self) -> Option<IndexRange> {
        self.window.active_range()
    }

    #[must_use]
    pub fn cache_ranges(&self) -> CacheRanges {
        self.window.cache_ranges()
    }

    /// True when something is visible.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.window.exists()
    }

    #[must_use]
    pub fn window(&self) -> &ActiveWindow {
        &self.window
    }

    #[must_use]
    pub fn pool(&self) -> &RecyclingPool {
        &self.pool
    }

    #[must_use]
    pub fn active(&self) -> &ActiveRegistry {
        &self.active
    }

    /// Active indices in ascending order.
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.active.indices()
    }

    /// The view slot bound to an active index.
    pub fn slot_at(&self, index: usize) -> Option<SlotId> {
        self.active.get(index)
    }

    /// The view bound to an active index.
    pub fn view(&self, index: usize) -> Option<&V> {
        self.arena.view(self.active.get(index)?)
    }

    pub fn view_mut(&mut self, index: usize) -> Option<&mut V> {
        let slot = self.active.get(index)?;
        self.arena.view_mut(slot)
    }

    /// Any view by slot, pooled or active.
    pub fn slot_view(&self, slot: SlotId) -> Option<&V> {
        self.arena.view(slot)
    }

    pub fn slot_state(&self, slot: SlotId) -> Option<SlotState> {
        self.arena.state(slot)
    }

    /// Index whose data the slot's view holds.
    pub fn slot_binding(&self, slot: SlotId) -> Option<usize> {
        self.arena.binding(slot)
    }

    /// Views created so far. Constant across recycling.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn endcap_state(&self) -> SlotState {
        self.endcap
    }

    #[must_use]
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    #[must_use]
    pub fn stats(&self) -> &RecycleStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = RecycleStats::default();
    }

    /// Drain the mutations recorded since the last call.
    pub fn take_splices(&mut self) -> Vec<Splice> {
        std::mem::take(&mut self.splices)
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Insert `items` before `index` (`index == len` appends).
    ///
    /// Fails without changing anything when `index > len` or a key is
    /// already present.
    pub fn insert(
        &mut self,
        index: usize,
        items: impl IntoIterator<Item = T>,
        bias: Bias,
    ) -> Result<()> {
        let items: Vec<T> = items.into_iter().collect();
        let keys: Vec<T::Key> = items.iter().map(Keyed::key).collect();
        self.keys.check_insert(index, &keys)?;
        let count = items.len();
        if count == 0 {
            return Ok(());
        }

        let shift = Shift::Insert { at: index, count };
        self.keys.insert_keys(index, keys)?;
        self.items.splice(index..index, items);
        self.apply_shift(shift)?;
        self.record_splice(Splice {
            at: index,
            removed: 0,
            inserted: count,
            bias,
        });
        self.settle(None)?;
        self.debug_assert_consistent();
        Ok(())
    }

    /// Remove `count` items starting at `index`, returning them.
    ///
    /// Views showing removed items are unbound and go to the unbound queue.
    pub fn remove(&mut self, index: usize, count: usize, bias: Bias) -> Result<Vec<T>> {
        self.keys.check_remove(index, count)?;
        if count == 0 {
            return Ok(Vec::new());
        }

        let shift = Shift::Remove { at: index, count };
        let mut changes = Vec::new();
        for (removed_index, slot) in self.active.take_span(index, count) {
            self.release_deleted(slot, removed_index, &mut changes)?;
        }
        self.keys.remove_keys(index, count)?;
        let removed: Vec<T> = self.items.drain(index..index + count).collect();
        self.apply_shift(shift)?;
        self.record_splice(Splice {
            at: index,
            removed: count,
            inserted: 0,
            bias,
        });
        self.settle(None)?;
        self.debug_assert_consistent();
        Ok(removed)
    }

    /// Append to the end; content before the insertion stays put.
    pub fn append(&mut self, items: impl IntoIterator<Item = T>) -> Result<()> {
        self.insert(self.items.len(), items, Bias::FixBefore)
    }

    /// Insert at the front; content after the insertion stays put.
    pub fn prepend(&mut self, items: impl IntoIterator<Item = T>) -> Result<()> {
        self.insert(0, items, Bias::FixAfter)
    }

    /// Remove every item. Every view ends up in the unbound queue; none are
    /// destroyed.
    pub fn clear(&mut self) -> Result<()> {
        let removed = self.items.len();
        let mut changes = Vec::new();
        for (index, slot) in self.active.drain() {
            self.release_deleted(slot, index, &mut changes)?;
        }
        self.pool.unbind_all();
        for slot in self.arena.ids().collect::<Vec<_>>() {
            self.arena.set_binding(slot, None);
        }
        self.items.clear();
        self.keys.clear();
        self.window.reset();
        self.anchor = 0;
        self.endcap_visible = false;
        if removed > 0 {
            self.record_splice(Splice {
                at: 0,
                removed,
                inserted: 0,
                bias: Bias::FixBoth,
            });
        }
        self.settle(None)?;
        self.debug_assert_consistent();
        Ok(())
    }

    /// Show `index` as the only visible item and materialize around it.
    ///
    /// This is the hook for an external scroll-to-index; the next
    /// [`tick`](Self::tick) corrects the visible range from the real
    /// viewport.
    pub fn scroll_to(&mut self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(RecycleError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        self.set_visible_range(Some(IndexRange::single(index)))
    }

    /// Replace the visible range and reconcile views against it.
    pub fn set_visible_range(&mut self, range: Option<IndexRange>) -> Result<()> {
        self.window.set_visible_range(range)?;
        self.settle(None)?;
        self.debug_assert_consistent();
        Ok(())
    }

    /// Run one recalculation pass against the current viewport.
    pub fn tick<Vis: VisibilityTest>(&mut self, visibility: &mut Vis) -> Result<SettleReport> {
        self.stats.ticks += 1;
        let report = self.settle(Some(visibility as &mut dyn VisibilityTest))?;
        self.debug_assert_consistent();
        Ok(report)
    }

    /// Verify every cross-table invariant.
    ///
    /// - active indices are exactly the active range
    /// - no slot is active twice, or both active and pooled
    /// - every view is either active or pooled
    /// - recorded bindings match the table holding the slot
    /// - keys, items and the window agree on the list
    pub fn check_invariants(&self) -> Result<()> {
        let len = self.items.len();
        if self.window.len() != len || self.keys.len() != len {
            return Err(RecycleError::LengthMismatch {
                window: self.window.len(),
                list: len,
            });
        }
        for (index, item) in self.items.iter().enumerate() {
            if self.keys.key_of(index) != Some(&item.key()) {
                return Err(RecycleError::KeyMismatch { index });
            }
        }

        let active_range = self.window.active_range();
        let mut seen = FxHashSet::default();
        for (index, slot) in self.active.iter() {
            if !active_range.is_some_and(|r| r.contains(index)) {
                return Err(RecycleError::DanglingActive { index });
            }
            if self.pool.contains_slot(slot) || !seen.insert(slot) {
                return Err(RecycleError::ActiveOverlap { slot });
            }
            let bound = self.arena.binding(slot);
            if bound != Some(index) {
                return Err(RecycleError::BindingMismatch { slot, index, bound });
            }
        }
        if let Some(range) = active_range
            && let Some(index) = range.iter().find(|&i| !self.active.contains(i))
        {
            return Err(RecycleError::MissingActive { index });
        }

        for index in self.pool.bound_indices() {
            let Some(slot) = self.pool.bound_slot(index) else {
                continue;
            };
            if !seen.insert(slot) {
                return Err(RecycleError::ActiveOverlap { slot });
            }
            let bound = self.arena.binding(slot);
            if bound != Some(index) {
                return Err(RecycleError::BindingMismatch { slot, index, bound });
            }
        }
        for slot in self.pool.unbound_slots() {
            if !seen.insert(slot) {
                return Err(RecycleError::ActiveOverlap { slot });
            }
        }
        if let Some(slot) = self.arena.ids().find(|slot| !seen.contains(slot)) {
            return Err(RecycleError::OrphanSlot { slot });
        }
        Ok(())
    }

    // ── Internals ───────────────────────────────────────────────────

    /// Apply `shift` to window, pool and active registry, in that order,
    /// then to the anchor. The key map and the item vector have already
    /// been spliced. An anchor on a removed item parks at the removal point;
    /// one past the end of the list stays put.
    fn apply_shift(&mut self, shift: Shift) -> Result<()> {
        let anchored = self.anchor < self.window.len();
        self.window.shift_indices(shift)?;
        self.pool.shift_indices(shift)?;
        self.active.shift_indices(shift)?;
        if anchored {
            self.anchor = shift
                .map_index(self.anchor)
                .unwrap_or_else(|| shift.from_index());
        }
        self.sync_bindings();
        Ok(())
    }

    /// Re-record every slot's binding from the table that holds it.
    fn sync_bindings(&mut self) {
        for (index, slot) in self.active.iter() {
            self.arena.set_binding(slot, Some(index));
        }
        for index in self.pool.bound_indices() {
            if let Some(slot) = self.pool.bound_slot(index) {
                self.arena.set_binding(slot, Some(index));
            }
        }
        for slot in self.pool.unbound_slots() {
            self.arena.set_binding(slot, None);
        }
    }

    fn record_splice(&mut self, splice: Splice) {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "recycler.splice",
            at = splice.at,
            removed = splice.removed,
            inserted = splice.inserted,
            bias = ?splice.bias,
            len = self.items.len()
        )
        .entered();
        self.splices.push(splice);
    }

    fn settle(&mut self, mut visibility: Option<&mut dyn VisibilityTest>) -> Result<SettleReport> {
        let mut report = SettleReport::default();
        let mut seeded = false;
        if let Some(vis) = visibility.as_deref_mut() {
            self.probe(vis, &mut seeded, &mut report)?;
        }
        self.window.recompute_cache_ranges();

        while self.window.take_dirty() {
            if let Some(limit) = self.config.settle_pass_limit
                && report.passes >= limit
            {
                // Leave the tables matching the current window before bailing.
                self.reconcile(&mut report)?;
                self.apply_states(&mut report.changes);
                self.stats.last_settle_passes = report.passes;
                #[cfg(feature = "tracing")]
                tracing::warn!(passes = report.passes, "recycler.settle did not converge");
                return Err(RecycleError::SettleDidNotConverge {
                    passes: report.passes,
                });
            }
            report.passes += 1;
            self.reconcile(&mut report)?;
            if let Some(vis) = visibility.as_deref_mut() {
                self.probe(vis, &mut seeded, &mut report)?;
            }
            self.window.recompute_cache_ranges();
        }

        self.apply_states(&mut report.changes);
        if let Some(visible) = self.window.visible_range() {
            self.anchor = visible.start();
        }
        self.stats.last_settle_passes = report.passes;
        #[cfg(feature = "tracing")]
        self.trace_settle(&report);
        Ok(report)
    }

    #[cfg(feature = "tracing")]
    fn trace_settle(&self, report: &SettleReport) {
        let _span = tracing::debug_span!(
            "recycler.settle",
            passes = report.passes,
            materialized = report.materialized,
            recycled = report.recycled,
            active = self.active.len(),
            visible = ?self.window.visible_range()
        )
        .entered();
    }

    /// Fold the visibility of every active index into the visible range.
    fn probe(
        &mut self,
        visibility: &mut dyn VisibilityTest,
        seeded: &mut bool,
        report: &mut SettleReport,
    ) -> Result<()> {
        if !*seeded && !self.window.exists() && !self.items.is_empty() && self.active.is_empty()
        {
            *seeded = true;
            let seed = self.anchor.min(self.items.len() - 1);
            self.materialize(seed, report)?;
            // The seed sits outside any active range; the next pass recycles
            // it unless the probe below finds it visible.
            self.window.mark_dirty();
        }

        let mut first = None;
        let mut last = None;
        for index in self.active.indices() {
            if visibility.is_visible(index) {
                first.get_or_insert(index);
                last = Some(index);
            }
        }
        let visible = match (first, last) {
            (Some(start), Some(end)) => Some(IndexRange::new(start, end)?),
            _ => None,
        };
        self.window.set_visible_range(visible)?;
        if self.config.endcap {
            self.endcap_visible = visibility.is_endcap_visible();
        }
        Ok(())
    }

    /// Make the active registry match the active range. On failure the
    /// window stays dirty so the next settle picks up where this one stopped.
    fn reconcile(&mut self, report: &mut SettleReport) -> Result<()> {
        let result = self
            .recycle_outside(report)
            .and_then(|()| self.materialize_missing(report));
        if result.is_err() {
            self.window.mark_dirty();
        }
        result
    }

    /// Return every active view outside the active range to the pool.
    fn recycle_outside(&mut self, report: &mut SettleReport) -> Result<()> {
        for index in self.active.indices_outside(self.window.active_range()) {
            let Some(slot) = self.active.remove(index) else {
                continue;
            };
            if let Some(view) = self.arena.view_mut(slot) {
                view.unbind();
            }
            self.pool.return_bound(slot, index)?;
            self.transition(slot, StateTarget::Item(index), SlotState::Pooled, &mut report.changes);
            report.recycled += 1;
            self.stats.recycled += 1;
            #[cfg(feature = "tracing")]
            tracing::trace!(index, slot = %slot, "recycler.recycle");
        }
        Ok(())
    }

    /// Bind a view to every index in the active range that lacks one.
    fn materialize_missing(&mut self, report: &mut SettleReport) -> Result<()> {
        let Some(range) = self.window.active_range() else {
            return Ok(());
        };
        for index in range {
            if !self.active.contains(index) {
                self.materialize(index, report)?;
            }
        }
        Ok(())
    }

    /// Claim or create a view for `index`, bind it and mark it active.
    fn materialize(&mut self, index: usize, report: &mut SettleReport) -> Result<SlotId> {
        if index >= self.items.len() {
            return Err(RecycleError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let (slot, exact) = match self.pool.claim(index) {
            Some(claimed) => {
                match claimed.kind {
                    ClaimKind::Exact => self.stats.claims_exact += 1,
                    ClaimKind::Unbound => self.stats.claims_unbound += 1,
                    ClaimKind::Evicted { .. } => self.stats.claims_evicted += 1,
                }
                #[cfg(feature = "tracing")]
                tracing::trace!(index, slot = %claimed.slot, kind = ?claimed.kind, "recycler.claim");
                (claimed.slot, claimed.is_exact())
            }
            None => {
                let view = self.factory.create_view()?;
                let slot = self.arena.insert(view);
                self.stats.views_created += 1;
                #[cfg(feature = "tracing")]
                tracing::debug!(index, slot = %slot, views = self.arena.len(), "recycler.create_view");
                (slot, false)
            }
        };
        if let Some(view) = self.arena.view_mut(slot) {
            view.bind(index, &self.items[index], exact);
        }
        self.arena.set_binding(slot, Some(index));
        self.active.insert(index, slot)?;
        report.materialized += 1;
        Ok(slot)
    }

    /// Unbind a view whose item is gone and queue it as unbound.
    fn release_deleted(
        &mut self,
        slot: SlotId,
        index: usize,
        changes: &mut Vec<StateChange>,
    ) -> Result<()> {
        if let Some(view) = self.arena.view_mut(slot) {
            view.unbind();
        }
        self.arena.set_binding(slot, None);
        self.pool.release_unbound(slot)?;
        self.transition(slot, StateTarget::Item(index), SlotState::Pooled, changes);
        self.stats.recycled += 1;
        Ok(())
    }

    /// Assign final states from window membership, then the endcap.
    fn apply_states(&mut self, changes: &mut Vec<StateChange>) {
        let targets: Vec<(usize, SlotId, SlotState)> = self
            .active
            .iter()
            .map(|(index, slot)| {
                let state = self
                    .window
                    .region_of(index)
                    .map_or(SlotState::Pooled, Region::slot_state);
                (index, slot, state)
            })
            .collect();
        for (index, slot, state) in targets {
            self.transition(slot, StateTarget::Item(index), state, changes);
        }

        let len = self.items.len();
        let endcap = if !self.config.endcap {
            SlotState::Pooled
        } else if len == 0 || self.active.contains(len - 1) {
            if self.endcap_visible {
                SlotState::ActiveVisible
            } else {
                SlotState::ActiveCacheAfter
            }
        } else {
            self.endcap_visible = false;
            SlotState::Pooled
        };
        if endcap != self.endcap {
            let change = StateChange {
                target: StateTarget::Endcap,
                previous: std::mem::replace(&mut self.endcap, endcap),
                current: endcap,
            };
            if let Some(listener) = self.listener.as_mut() {
                listener(&change);
            }
            changes.push(change);
        }
    }

    fn transition(
        &mut self,
        slot: SlotId,
        target: StateTarget,
        state: SlotState,
        changes: &mut Vec<StateChange>,
    ) {
        let Some(previous) = self.arena.set_state(slot, state) else {
            return;
        };
        if previous == state {
            return;
        }
        if let Some(view) = self.arena.view_mut(slot) {
            view.set_state(state);
        }
        let change = StateChange {
            target,
            previous,
            current: state,
        };
        if let Some(listener) = self.listener.as_mut() {
            listener(&change);
        }
        changes.push(change);
    }

    fn debug_assert_consistent(&self) {
        #[cfg(debug_assertions)]
        if let Err(err) = self.check_invariants() {
            panic!("recycler invariant violated: {err}");
        }
    }
}
