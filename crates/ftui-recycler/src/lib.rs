#![forbid(unsafe_code)]

//! Active-window tracking and view recycling for virtualized lists.
//!
//! A virtualized list shows a handful of rows out of a potentially huge
//! sequence. Instead of building a view per item, this crate keeps a small
//! set of reusable view-instances and rebinds them as the viewport moves or
//! the list changes.
//!
//! # Core Types
//!
//! - [`Recycler`] - owns the list, the window and the pool; runs the settle loop
//! - [`ActiveWindow`] - visible range plus the derived cache bands
//! - [`RecyclingPool`] - pooled views with the exact / unbound / LRU claim policy
//! - [`IndexKeyMap`] - stable item keys to volatile indices
//! - [`Shift`] - the renumbering applied to every index-addressed table
//!
//! Layout, measurement and scroll physics live elsewhere. The engine only
//! consumes a [`VisibilityTest`] and drives [`ItemView`] callbacks.
//!
//! # Example
//!
//! ```
//! use ftui_recycler::{FactoryError, ItemView, Keyed, Recycler, RecyclerConfig};
//!
//! struct Row(u32);
//!
//! impl Keyed for Row {
//!     type Key = u32;
//!     fn key(&self) -> u32 {
//!         self.0
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Label(Option<u32>);
//!
//! impl ItemView<Row> for Label {
//!     fn bind(&mut self, _index: usize, item: &Row, _exact: bool) {
//!         self.0 = Some(item.0);
//!     }
//! }
//!
//! let config = RecyclerConfig::default().with_cache_depth(1);
//! let mut recycler: Recycler<Row, Label> =
//!     Recycler::new(config, || Ok::<_, FactoryError>(Label::default())).unwrap();
//! recycler.append((0..100).map(Row)).unwrap();
//!
//! // The viewport shows rows 0..=4.
//! let mut visible = |index: usize| index < 5;
//! recycler.tick(&mut visible).unwrap();
//!
//! assert_eq!(recycler.visible_range().map(|r| (r.start(), r.end())), Some((0, 4)));
//! assert_eq!(recycler.active_range().map(|r| (r.start(), r.end())), Some((0, 5)));
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod keymap;
pub mod pool;
pub mod range;
pub mod registry;
pub mod shift;
pub mod slot;
pub mod window;

pub use config::{AppendOrientation, RecyclerConfig};
pub use engine::{
    Bias, Keyed, RecycleStats, Recycler, SettleReport, Splice, StateChange, StateTarget,
    VisibilityTest,
};
pub use error::{FactoryError, RecycleError, Result, Severity};
pub use keymap::IndexKeyMap;
pub use pool::{ClaimKind, Claimed, RecyclingPool};
pub use range::IndexRange;
pub use registry::ActiveRegistry;
pub use shift::{Shift, ShiftIndices};
pub use slot::{ItemView, SlotArena, SlotId, SlotState, ViewFactory};
pub use window::{ActiveWindow, CacheRanges, Region, cache_ranges};
