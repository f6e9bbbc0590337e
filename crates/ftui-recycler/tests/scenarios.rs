//! End-to-end recycler scenarios through the public API.
//!
//! Each test drives a small list through a realistic sequence (scrolling,
//! chat-style appends, bulk deletes) and checks the window, the pool and
//! the views the host would actually draw.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use ftui_recycler::{
    AppendOrientation, Bias, FactoryError, IndexRange, ItemView, Keyed, RecycleError, Recycler,
    RecyclerConfig, SlotState, StateChange, StateTarget, VisibilityTest,
};

#[derive(Debug, Clone, PartialEq, Eq)]
struct Message {
    id: u64,
    body: String,
}

impl Message {
    fn new(id: u64) -> Self {
        Self {
            id,
            body: format!("message #{id}"),
        }
    }
}

impl Keyed for Message {
    type Key = u64;

    fn key(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
struct Bubble {
    text: String,
    index: Option<usize>,
    rebinds: usize,
    unbinds: usize,
}

impl ItemView<Message> for Bubble {
    fn bind(&mut self, index: usize, item: &Message, exact: bool) {
        if exact {
            assert_eq!(self.text, item.body, "exact reuse must keep contents");
        } else {
            self.text.clone_from(&item.body);
            self.rebinds += 1;
        }
        self.index = Some(index);
    }

    fn unbind(&mut self) {
        self.unbinds += 1;
    }
}

fn bubble() -> Result<Bubble, FactoryError> {
    Ok(Bubble::default())
}

fn messages(ids: Range<u64>) -> Vec<Message> {
    ids.map(Message::new).collect()
}

fn range(start: usize, end: usize) -> Option<IndexRange> {
    IndexRange::new(start, end).ok()
}

struct Screen {
    rows: Range<usize>,
    endcap: bool,
}

impl Screen {
    fn rows(rows: Range<usize>) -> Self {
        Self {
            rows,
            endcap: false,
        }
    }
}

impl VisibilityTest for Screen {
    fn is_visible(&mut self, index: usize) -> bool {
        self.rows.contains(&index)
    }

    fn is_endcap_visible(&mut self) -> bool {
        self.endcap
    }
}

fn chat(config: RecyclerConfig, len: u64) -> Recycler<Message, Bubble> {
    let mut recycler = Recycler::new(config, bubble).expect("no prewarm failures");
    recycler.append(messages(0..len)).expect("fresh ids");
    recycler
}

fn drawn(recycler: &Recycler<Message, Bubble>) -> Vec<(usize, String)> {
    recycler
        .active_indices()
        .filter(|&index| recycler.window().is_visible(index))
        .map(|index| (index, recycler.view(index).expect("active").text.clone()))
        .collect()
}

#[test]
fn scrolling_through_a_long_list_keeps_view_count_flat() {
    let mut r = chat(RecyclerConfig::default(), 10_000);
    r.scroll_to(10).unwrap();
    r.tick(&mut Screen::rows(10..18)).unwrap();
    assert_eq!(r.active_range(), range(8, 19));
    let views = r.slot_count();
    assert_eq!(views, 12);

    for top in 11..500 {
        r.tick(&mut Screen::rows(top..top + 8)).unwrap();
        assert_eq!(r.visible_range(), range(top, top + 7));
        assert_eq!(r.slot_count(), views, "views leaked at top={top}");
    }
    assert_eq!(
        drawn(&r).first().map(|(index, text)| (*index, text.as_str())),
        Some((499, "message #499"))
    );
    r.check_invariants().unwrap();
}

#[test]
fn jump_scroll_evicts_least_recently_returned_views() {
    let mut r = chat(RecyclerConfig::default().with_cache_depth(1), 1_000);
    r.set_visible_range(range(100, 103)).unwrap();
    r.set_visible_range(range(800, 803)).unwrap();
    assert_eq!(r.stats().views_created, 6);
    assert_eq!(r.stats().claims_evicted, 6);
    assert_eq!(drawn(&r)[0], (800, "message #800".to_owned()));

    // Shrink, nudge, then jump: the oldest returns go first.
    r.set_visible_range(range(800, 800)).unwrap();
    r.set_visible_range(range(801, 801)).unwrap();
    assert_eq!(r.stats().claims_exact, 1);
    assert_eq!(r.pool().bound_indices().collect::<Vec<_>>(), vec![803, 804, 799]);

    r.set_visible_range(range(790, 790)).unwrap();
    assert_eq!(r.stats().claims_evicted, 9);
    assert_eq!(r.pool().bound_indices().collect::<Vec<_>>(), vec![800, 801, 802]);
    assert_eq!(r.slot_count(), 6);
}

#[test]
fn chat_append_while_pinned_to_bottom() {
    let config = RecyclerConfig::default()
        .with_orientation(AppendOrientation::Reverse)
        .with_endcap(true);
    let mut r = chat(config, 20);
    r.scroll_to(19).unwrap();
    r.tick(&mut Screen { rows: 15..20, endcap: true }).unwrap();
    assert_eq!(r.visible_range(), range(15, 19));
    assert_eq!(r.endcap_state(), SlotState::ActiveVisible);
    // Reversed lists grow upward, so the older band trails.
    assert_eq!(r.window().leading_cache(), None);
    assert_eq!(r.window().trailing_cache(), range(13, 14));

    r.append(messages(20..22)).unwrap();
    assert_eq!(r.active_range(), range(13, 21));
    assert_eq!(r.endcap_state(), SlotState::ActiveVisible);
    let splice = r.take_splices().pop().unwrap();
    assert_eq!((splice.at, splice.inserted, splice.bias), (20, 2, Bias::FixBefore));

    r.tick(&mut Screen { rows: 17..22, endcap: true }).unwrap();
    assert_eq!(r.visible_range(), range(17, 21));
    assert_eq!(r.endcap_state(), SlotState::ActiveVisible);
    assert_eq!(drawn(&r).last().unwrap().1, "message #21");
}

#[test]
fn bulk_delete_across_the_window() {
    let mut r = chat(RecyclerConfig::default(), 100);
    r.set_visible_range(range(40, 49)).unwrap();
    let removed = r.remove(35, 10, Bias::FixBoth).unwrap();

    assert_eq!(removed.first().map(|m| m.id), Some(35));
    assert_eq!(removed.len(), 10);
    // Items 45..=49 slide down to 35..=39.
    assert_eq!(r.visible_range(), range(35, 39));
    assert_eq!(r.index_of(&45), Some(35));
    assert_eq!(r.index_of(&40), None);
    assert_eq!(r.view(35).unwrap().text, "message #45");
    // Shifted views are not rebound and keep the index of their last bind.
    assert_eq!(r.view(35).unwrap().index, Some(45));
    r.check_invariants().unwrap();
}

#[test]
fn deleted_items_never_come_back_as_exact_reuse() {
    let mut r = chat(RecyclerConfig::default().with_cache_depth(0), 30);
    r.set_visible_range(range(10, 12)).unwrap();
    r.remove(10, 3, Bias::FixBoth).unwrap();
    assert_eq!(r.pool().unbound_len(), 3);

    r.set_visible_range(range(10, 12)).unwrap();
    assert_eq!(r.stats().claims_exact, 0);
    assert_eq!(r.stats().claims_unbound, 3);
    assert_eq!(r.view(10).unwrap().text, "message #13");
    assert_eq!(r.view(10).unwrap().rebinds, 2);
}

#[test]
fn every_view_sees_one_unbind_per_return() {
    let mut r = chat(RecyclerConfig::default().with_cache_depth(0), 50);
    r.set_visible_range(range(0, 1)).unwrap();
    r.set_visible_range(range(10, 11)).unwrap();
    r.clear().unwrap();

    let unbinds: usize = r
        .pool()
        .unbound_slots()
        .map(|slot| r.slot_view(slot).unwrap().unbinds)
        .sum();
    // Two recycled by the move, two released by the clear.
    assert_eq!(unbinds, 4);
    assert_eq!(r.pool().unbound_len(), 2);
}

#[test]
fn state_listener_and_report_agree() {
    let log: Rc<RefCell<Vec<StateChange>>> = Rc::default();
    let mut r = chat(RecyclerConfig::default().with_cache_depth(1), 40);
    let sink = Rc::clone(&log);
    r.set_state_listener(move |change: &StateChange| sink.borrow_mut().push(*change));

    r.scroll_to(20).unwrap();
    log.borrow_mut().clear();
    let report = r.tick(&mut Screen::rows(20..23)).unwrap();

    assert_eq!(*log.borrow(), report.changes);
    assert!(report.changes.contains(&StateChange {
        target: StateTarget::Item(21),
        previous: SlotState::ActiveCacheAfter,
        current: SlotState::ActiveVisible,
    }));
}

/// Flips between two single-row viewports on every probe round.
struct Flicker {
    last: Option<usize>,
    phase: bool,
}

impl VisibilityTest for Flicker {
    fn is_visible(&mut self, index: usize) -> bool {
        if self.last.is_none_or(|last| index <= last) {
            self.phase = !self.phase;
        }
        self.last = Some(index);
        index == if self.phase { 12 } else { 10 }
    }
}

#[test]
fn oscillating_visibility_fails_instead_of_spinning() {
    let config = RecyclerConfig::default().with_settle_pass_limit(Some(8));
    let mut r = chat(config, 100);
    r.scroll_to(10).unwrap();

    let err = r
        .tick(&mut Flicker {
            last: None,
            phase: false,
        })
        .unwrap_err();
    assert_eq!(err, RecycleError::SettleDidNotConverge { passes: 8 });
    r.check_invariants().unwrap();

    // A sane viewport recovers on the next tick.
    r.tick(&mut Screen::rows(10..13)).unwrap();
    assert_eq!(r.visible_range(), range(10, 12));
}

#[test]
fn duplicate_keys_are_rejected_whole() {
    let mut r = chat(RecyclerConfig::default(), 5);
    let err = r
        .insert(2, vec![Message::new(7), Message::new(7)], Bias::FixBoth)
        .unwrap_err();
    assert_eq!(err, RecycleError::DuplicateKey { offset: 1 });
    assert_eq!(r.len(), 5);
    assert_eq!(r.index_of(&7), None);
}

#[test]
fn prewarmed_views_serve_first_materialization() {
    let config = RecyclerConfig::default().with_prewarm(8);
    let mut r = chat(config, 100);
    assert_eq!(r.slot_count(), 8);
    r.set_visible_range(range(50, 53)).unwrap();

    assert_eq!(r.stats().claims_unbound, 8);
    assert_eq!(r.stats().views_created, 8);
    assert_eq!(r.pool().len(), 0);
}
