//! View-instances and the arena that owns them.
//!
//! Views are never referenced directly by the pool or the active registry.
//! Both store [`SlotId`]s into a flat [`SlotArena`]; which table an id sits
//! in is the only record of who currently "owns" the view.

use std::fmt;

use crate::error::FactoryError;

/// Handle into a [`SlotArena`].
///
/// Uses `u32` for compactness; a recycler never needs more views than fit on
/// a few screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    /// Create a SlotId from a raw u32 index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw u32 index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Where a view currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SlotState {
    /// In the recycling pool.
    #[default]
    Pooled,
    /// Bound to an index inside the visible range.
    ActiveVisible,
    /// Bound to an index in the cache band before the visible range.
    ActiveCacheBefore,
    /// Bound to an index in the cache band after the visible range.
    ActiveCacheAfter,
}

impl SlotState {
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Pooled)
    }
}

/// A bindable view for items of type `T`.
///
/// `bind` is the materialize hook: it runs every time the view is assigned
/// to an index. `exact` is true when the view was pooled while still bound
/// to the same item, so its contents are already correct and only the index
/// may have moved.
pub trait ItemView<T> {
    fn bind(&mut self, index: usize, item: &T, exact: bool);

    /// The recycle hook. Runs before the view goes back to the pool. The view
    /// may keep its contents for a later exact reuse.
    fn unbind(&mut self) {}

    /// Called after a settle when the view's [`SlotState`] changed.
    fn set_state(&mut self, _state: SlotState) {}
}

/// Creates views when the pool has nothing left to hand out.
pub trait ViewFactory<V> {
    fn create_view(&mut self) -> Result<V, FactoryError>;
}

impl<V, F> ViewFactory<V> for F
where
    F: FnMut() -> Result<V, FactoryError>,
{
    fn create_view(&mut self) -> Result<V, FactoryError> {
        self()
    }
}

/// Arena entry: the view plus its bookkeeping.
#[derive(Debug, Clone)]
struct Slot<V> {
    view: V,
    /// Index whose data the view currently holds, if any.
    binding: Option<usize>,
    state: SlotState,
}

/// Flat storage for every view the recycler has ever created.
///
/// Slots are appended and never removed, so a [`SlotId`] stays valid for
/// the lifetime of the arena.
#[derive(Debug, Clone)]
pub struct SlotArena<V> {
    slots: Vec<Slot<V>>,
}

impl<V> Default for SlotArena<V> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<V> SlotArena<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a freshly created, unbound view.
    pub fn insert(&mut self, view: V) -> SlotId {
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(Slot {
            view,
            binding: None,
            state: SlotState::Pooled,
        });
        id
    }

    /// Total number of views created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn view(&self, id: SlotId) -> Option<&V> {
        self.slots.get(id.0 as usize).map(|slot| &slot.view)
    }

    pub fn view_mut(&mut self, id: SlotId) -> Option<&mut V> {
        self.slots.get_mut(id.0 as usize).map(|slot| &mut slot.view)
    }

    pub fn state(&self, id: SlotId) -> Option<SlotState> {
        self.slots.get(id.0 as usize).map(|slot| slot.state)
    }

    /// Index whose data the view holds.
    pub fn binding(&self, id: SlotId) -> Option<usize> {
        self.slots.get(id.0 as usize).and_then(|slot| slot.binding)
    }

    /// Update the state; returns the previous one.
    pub(crate) fn set_state(&mut self, id: SlotId, state: SlotState) -> Option<SlotState> {
        let slot = self.slots.get_mut(id.0 as usize)?;
        Some(std::mem::replace(&mut slot.state, state))
    }

    pub(crate) fn set_binding(&mut self, id: SlotId, binding: Option<usize>) {
        if let Some(slot) = self.slots.get_mut(id.0 as usize) {
            slot.binding = binding;
        }
    }

    /// All ids in creation order.
    pub fn ids(&self) -> impl Iterator<Item = SlotId> + '_ {
        (0..self.slots.len()).map(|i| SlotId(i as u32))
    }
}
