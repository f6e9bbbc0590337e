//! Active window: the visible range and the cache bands around it.
//!
//! ```text
//!   index:   0 ..  8  9 | 10 11 12 13 14 15 | 16 17 .. 99
//!                cache  |      visible      |  cache
//!                before |                   |  after
//!                <---------- active range --------->
//! ```
//!
//! Cache bands are derived from the visible range, the list length and the
//! configured depth; they are never set directly. Every change to the visible
//! range or the list length raises the dirty flag, which the settle loop in
//! [`Recycler`](crate::Recycler) consumes.

use crate::config::AppendOrientation;
use crate::error::{RecycleError, Result};
use crate::range::IndexRange;
use crate::shift::{Shift, ShiftIndices};
use crate::slot::SlotState;

/// Which part of the active range an index falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Visible,
    CacheBefore,
    CacheAfter,
}

impl Region {
    /// The slot state of a view bound inside this region.
    #[must_use]
    pub const fn slot_state(self) -> SlotState {
        match self {
            Self::Visible => SlotState::ActiveVisible,
            Self::CacheBefore => SlotState::ActiveCacheBefore,
            Self::CacheAfter => SlotState::ActiveCacheAfter,
        }
    }
}

/// The two cache bands, in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheRanges {
    /// Indices just below the visible start.
    pub before: Option<IndexRange>,
    /// Indices just above the visible end.
    pub after: Option<IndexRange>,
}

impl CacheRanges {
    /// The band drawn on the leading screen edge (top or left).
    #[must_use]
    pub fn leading(self, orientation: AppendOrientation) -> Option<IndexRange> {
        match orientation {
            AppendOrientation::Forward => self.before,
            AppendOrientation::Reverse => self.after,
        }
    }

    /// The band drawn on the trailing screen edge (bottom or right).
    #[must_use]
    pub fn trailing(self, orientation: AppendOrientation) -> Option<IndexRange> {
        match orientation {
            AppendOrientation::Forward => self.after,
            AppendOrientation::Reverse => self.before,
        }
    }
}

/// Derive the cache bands for `visible` in a list of `len` items.
///
/// - before = `[max(start - depth, 0), start - 1]` when `start > 0`
/// - after = `[end + 1, min(end + depth, len - 1)]` when `end < len - 1`
///
/// Both are `None` without a visible range or with `depth == 0`.
#[must_use]
pub fn cache_ranges(visible: Option<IndexRange>, len: usize, depth: usize) -> CacheRanges {
    let Some(visible) = visible else {
        return CacheRanges::default();
    };
    if depth == 0 {
        return CacheRanges::default();
    }
    let before = (visible.start() > 0).then(|| {
        let start = visible.start().saturating_sub(depth);
        IndexRange::new(start, visible.start() - 1)
    });
    let after = (visible.end() + 1 < len).then(|| {
        let end = visible.end().saturating_add(depth).min(len - 1);
        IndexRange::new(visible.end() + 1, end)
    });
    CacheRanges {
        before: before.and_then(Result::ok),
        after: after.and_then(Result::ok),
    }
}

/// Visible range, cache bands and dirty tracking for one list.
#[derive(Debug, Clone)]
pub struct ActiveWindow {
    visible: Option<IndexRange>,
    cache: CacheRanges,
    /// List length the ranges are clamped to.
    len: usize,
    depth: usize,
    orientation: AppendOrientation,
    dirty: bool,
}

impl ActiveWindow {
    /// An empty window over an empty list.
    #[must_use]
    pub fn new(depth: usize, orientation: AppendOrientation) -> Self {
        Self {
            visible: None,
            cache: CacheRanges::default(),
            len: 0,
            depth,
            orientation,
            dirty: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cache depth `D`.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[must_use]
    pub fn orientation(&self) -> AppendOrientation {
        self.orientation
    }

    #[must_use]
    pub fn visible_range(&self) -> Option<IndexRange> {
        self.visible
    }

    #[must_use]
    pub fn cache_ranges(&self) -> CacheRanges {
        self.cache
    }

    #[must_use]
    pub fn cache_before(&self) -> Option<IndexRange> {
        self.cache.before
    }

    #[must_use]
    pub fn cache_after(&self) -> Option<IndexRange> {
        self.cache.after
    }

    /// Cache band on the leading screen edge for the configured orientation.
    #[must_use]
    pub fn leading_cache(&self) -> Option<IndexRange> {
        self.cache.leading(self.orientation)
    }

    /// Cache band on the trailing screen edge for the configured orientation.
    #[must_use]
    pub fn trailing_cache(&self) -> Option<IndexRange> {
        self.cache.trailing(self.orientation)
    }

    /// Union of the cache bands and the visible range.
    #[must_use]
    pub fn active_range(&self) -> Option<IndexRange> {
        let visible = self.visible?;
        let mut active = visible;
        if let Some(before) = self.cache.before {
            active = active.union(before);
        }
        if let Some(after) = self.cache.after {
            active = active.union(after);
        }
        Some(active)
    }

    /// True when there is a visible range to anchor the window on.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.visible.is_some()
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Consume the dirty flag, returning its previous value.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::replace(&mut self.dirty, false)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Set the visible range. Returns whether it changed.
    ///
    /// Fails with [`RecycleError::IndexOutOfRange`] when the range extends
    /// past the end of the list.
    pub fn set_visible_range(&mut self, range: Option<IndexRange>) -> Result<bool> {
        if let Some(r) = range
            && r.end() >= self.len
        {
            return Err(RecycleError::IndexOutOfRange {
                index: r.end(),
                len: self.len,
            });
        }
        let changed = self.visible != range;
        if changed {
            self.visible = range;
            self.dirty = true;
        }
        self.recompute_cache_ranges();
        Ok(changed)
    }

    /// Re-derive both cache bands from the visible range, length and depth.
    pub fn recompute_cache_ranges(&mut self) {
        self.cache = cache_ranges(self.visible, self.len, self.depth);
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.active_range().is_some_and(|r| r.contains(index))
    }

    #[must_use]
    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.is_some_and(|r| r.contains(index))
    }

    #[must_use]
    pub fn is_in_cache_before(&self, index: usize) -> bool {
        self.cache.before.is_some_and(|r| r.contains(index))
    }

    #[must_use]
    pub fn is_in_cache_after(&self, index: usize) -> bool {
        self.cache.after.is_some_and(|r| r.contains(index))
    }

    /// Which region `index` falls in, if it is active.
    #[must_use]
    pub fn region_of(&self, index: usize) -> Option<Region> {
        if self.is_visible(index) {
            Some(Region::Visible)
        } else if self.is_in_cache_before(index) {
            Some(Region::CacheBefore)
        } else if self.is_in_cache_after(index) {
            Some(Region::CacheAfter)
        } else {
            None
        }
    }

    /// `count` items were inserted before index `at` (`at == len` appends).
    ///
    /// Inserting at or before the visible start shifts the whole range;
    /// inserting strictly inside it only grows the end.
    pub fn insert_range(&mut self, at: usize, count: usize) -> Result<()> {
        self.shift_indices(Shift::Insert { at, count })
    }

    /// The item at `at` was removed.
    pub fn remove(&mut self, at: usize) -> Result<()> {
        self.remove_range(at, 1)
    }

    /// The `count` items starting at `at` were removed.
    ///
    /// A visible start inside the removed span advances to the next
    /// surviving item, a visible end inside it retreats to the previous one.
    /// Removing every visible item collapses the range to `None`.
    pub fn remove_range(&mut self, at: usize, count: usize) -> Result<()> {
        self.shift_indices(Shift::Remove { at, count })
    }

    /// Forget everything: no list, no visible range.
    pub fn reset(&mut self) {
        if self.visible.is_some() || self.len != 0 {
            self.dirty = true;
        }
        self.visible = None;
        self.len = 0;
        self.recompute_cache_ranges();
    }

    fn check_shift(&self, shift: Shift) -> Result<()> {
        let len = self.len;
        match shift {
            Shift::Insert { at, .. } if at > len => {
                Err(RecycleError::IndexOutOfRange { index: at, len })
            }
            Shift::Remove { at, count } if count > 0 => {
                if at >= len {
                    return Err(RecycleError::IndexOutOfRange { index: at, len });
                }
                if at.checked_add(count).is_none_or(|end| end > len) {
                    return Err(RecycleError::IndexOutOfRange {
                        index: at.saturating_add(count - 1),
                        len,
                    });
                }
                Ok(())
            }
            Shift::Remove { at, .. } if at > len => {
                Err(RecycleError::IndexOutOfRange { index: at, len })
            }
            _ => Ok(()),
        }
    }
}

impl ShiftIndices for ActiveWindow {
    fn shift_indices(&mut self, shift: Shift) -> Result<()> {
        self.check_shift(shift)?;
        if shift.is_noop() {
            return Ok(());
        }
        self.visible = self.visible.and_then(|visible| match shift {
            Shift::Insert { .. } => {
                let start = shift.map_index(visible.start())?;
                let end = shift.map_index(visible.end())?;
                IndexRange::new(start, end).ok()
            }
            Shift::Remove { at, .. } => {
                let start = shift.map_index(visible.start()).unwrap_or(at);
                let end = match shift.map_index(visible.end()) {
                    Some(end) => end,
                    None => at.checked_sub(1)?,
                };
                IndexRange::new(start, end).ok()
            }
        });
        self.len = shift.apply_len(self.len);
        self.dirty = true;
        self.recompute_cache_ranges();
        Ok(())
    }
}
