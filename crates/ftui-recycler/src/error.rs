//! Error model for the recycler.
//!
//! Every fallible operation returns [`RecycleError`]. Variants fall into three
//! classes, reported by [`RecycleError::severity`]:
//!
//! 1. **Precondition**: the caller passed a bad index or range. Nothing was
//!    changed; out-of-range requests are rejected, never clamped.
//! 2. **Invariant**: internal bookkeeping disagrees with itself. Debug builds
//!    assert on these after every public operation.
//! 3. **Resource**: the view factory could not produce a view, so the
//!    active range is only partly materialized.
//!
//! Operations are deterministic, so retrying the same call gives the same
//! error.

use crate::slot::SlotId;

/// Standard result type for recycler APIs.
pub type Result<T> = std::result::Result<T, RecycleError>;

/// Error reported by a [`ViewFactory`](crate::ViewFactory).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("view factory failed: {message}")]
pub struct FactoryError {
    message: String,
}

impl FactoryError {
    /// Create a factory error with a human-readable reason.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The reason supplied by the factory.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors produced by window, pool and engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecycleError {
    /// A range with `start > end`.
    #[error("invalid range: start {start} is past end {end}")]
    InvalidRange { start: usize, end: usize },

    /// An index outside the list bounds.
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// An inserted item reuses a key that is already present.
    #[error("duplicate item key at insertion offset {offset}")]
    DuplicateKey { offset: usize },

    /// A slot was returned for an index that already has a pooled slot.
    #[error("a slot for index {index} is already pooled")]
    DuplicateReturn { index: usize },

    /// A slot is tracked as active and pooled at the same time, or twice.
    #[error("slot {slot} is tracked in more than one place")]
    ActiveOverlap { slot: SlotId },

    /// An active index lies outside the active range.
    #[error("index {index} is active but outside the active range")]
    DanglingActive { index: usize },

    /// An index inside the active range has no slot.
    #[error("index {index} is in the active range but has no slot")]
    MissingActive { index: usize },

    /// A slot's recorded binding disagrees with the table holding it.
    #[error("slot {slot} is registered at index {index} but bound to {bound:?}")]
    BindingMismatch {
        slot: SlotId,
        index: usize,
        bound: Option<usize>,
    },

    /// A slot is in neither the active registry nor the pool.
    #[error("slot {slot} is neither active nor pooled")]
    OrphanSlot { slot: SlotId },

    /// The key map disagrees with the item at `index`.
    #[error("key map disagrees with item at index {index}")]
    KeyMismatch { index: usize },

    /// The window tracks a different list length than the engine holds.
    #[error("window tracks {window} items but the list has {list}")]
    LengthMismatch { window: usize, list: usize },

    /// The settle loop hit its pass limit without stabilizing.
    #[error("window did not settle after {passes} passes")]
    SettleDidNotConverge { passes: usize },

    /// The view factory failed while the pool was empty.
    #[error(transparent)]
    Factory(#[from] FactoryError),
}

/// Error class, see the module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Rejected input; state unchanged.
    Precondition,
    /// Bookkeeping bug in the engine or its integration.
    Invariant,
    /// The factory could not supply a view.
    Resource,
}

impl RecycleError {
    /// Classify this error.
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidRange { .. } | Self::IndexOutOfRange { .. } | Self::DuplicateKey { .. } => {
                Severity::Precondition
            }
            Self::DuplicateReturn { .. }
            | Self::ActiveOverlap { .. }
            | Self::DanglingActive { .. }
            | Self::MissingActive { .. }
            | Self::BindingMismatch { .. }
            | Self::OrphanSlot { .. }
            | Self::KeyMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::SettleDidNotConverge { .. } => Severity::Invariant,
            Self::Factory(_) => Severity::Resource,
        }
    }

    /// True when the error signals a bug rather than bad input.
    #[must_use]
    pub fn is_invariant_violation(&self) -> bool {
        self.severity() == Severity::Invariant
    }
}
