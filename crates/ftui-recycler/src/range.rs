//! Inclusive index ranges.

use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{RecycleError, Result};

/// An inclusive `[start, end]` range of list indices.
///
/// `start <= end` holds by construction; an empty window is modelled as
/// `Option<IndexRange>::None`, never as an empty range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexRange {
    start: usize,
    end: usize,
}

impl IndexRange {
    /// Create a range, rejecting `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if start > end {
            return Err(RecycleError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range covering exactly one index.
    #[must_use]
    pub const fn single(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    /// First index in the range.
    #[inline]
    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Last index in the range (inclusive).
    #[inline]
    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of indices covered. Always at least one.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start + 1
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    /// Smallest range covering both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Iterate the covered indices in ascending order.
    pub fn iter(self) -> RangeInclusive<usize> {
        self.start..=self.end
    }
}

impl IntoIterator for IndexRange {
    type Item = usize;
    type IntoIter = RangeInclusive<usize>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
