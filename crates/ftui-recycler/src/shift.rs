//! Index renumbering for list mutations.
//!
//! Every insertion or removal moves the items behind the mutation point.
//! Each table addressed by index (key map, window, pool, active registry)
//! applies the same [`Shift`] so they keep agreeing on what an index means.
//!
//! The engine applies a shift to the tables in a fixed order: key map,
//! window, pool, active registry. Preconditions are checked up front, so a
//! failing shift leaves every table untouched.

use crate::error::Result;

/// One list mutation expressed as an index renumbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    /// `count` items inserted before the item at `at`.
    Insert { at: usize, count: usize },
    /// The `count` items starting at `at` were removed.
    Remove { at: usize, count: usize },
}

impl Shift {
    /// First index whose meaning changes.
    #[must_use]
    pub const fn from_index(self) -> usize {
        match self {
            Self::Insert { at, .. } | Self::Remove { at, .. } => at,
        }
    }

    /// True when the shift moves nothing.
    #[must_use]
    pub const fn is_noop(self) -> bool {
        match self {
            Self::Insert { count, .. } | Self::Remove { count, .. } => count == 0,
        }
    }

    /// Where an index ends up. `None` when its item was removed.
    #[must_use]
    pub const fn map_index(self, index: usize) -> Option<usize> {
        match self {
            Self::Insert { at, count } => {
                if index >= at {
                    Some(index + count)
                } else {
                    Some(index)
                }
            }
            Self::Remove { at, count } => {
                if index < at {
                    Some(index)
                } else if index < at + count {
                    None
                } else {
                    Some(index - count)
                }
            }
        }
    }

    /// Length of a list of `len` items after this shift.
    #[must_use]
    pub const fn apply_len(self, len: usize) -> usize {
        match self {
            Self::Insert { count, .. } => len + count,
            Self::Remove { count, .. } => len.saturating_sub(count),
        }
    }
}

/// A table whose entries are addressed by list index.
pub trait ShiftIndices {
    /// Renumber every entry according to `shift`.
    fn shift_indices(&mut self, shift: Shift) -> Result<()>;
}
