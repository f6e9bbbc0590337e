#![no_main]

use arbitrary::Arbitrary;
use ftui_recycler::{
    Bias, FactoryError, IndexRange, ItemView, Keyed, Recycler, RecyclerConfig, Severity,
    VisibilityTest,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Insert { at: u16, count: u8, bias: u8 },
    Remove { at: u16, count: u8 },
    SetVisible { start: u16, len: u8 },
    ClearVisible,
    ScrollTo { index: u16 },
    Tick { top: u16, height: u8, endcap: bool },
    Clear,
}

#[derive(Debug, Arbitrary)]
struct Input {
    depth: u8,
    endcap: bool,
    ops: Vec<Op>,
}

struct Item(u32);

impl Keyed for Item {
    type Key = u32;

    fn key(&self) -> u32 {
        self.0
    }
}

#[derive(Default)]
struct View(Option<u32>);

impl ItemView<Item> for View {
    fn bind(&mut self, _index: usize, item: &Item, exact: bool) {
        if exact {
            assert_eq!(self.0, Some(item.0), "exact reuse of a stale view");
        }
        self.0 = Some(item.0);
    }
}

fn view() -> Result<View, FactoryError> {
    Ok(View::default())
}

struct Viewport {
    rows: std::ops::Range<usize>,
    endcap: bool,
}

impl VisibilityTest for Viewport {
    fn is_visible(&mut self, index: usize) -> bool {
        self.rows.contains(&index)
    }

    fn is_endcap_visible(&mut self) -> bool {
        self.endcap
    }
}

fn bias(raw: u8) -> Bias {
    match raw % 3 {
        0 => Bias::FixBefore,
        1 => Bias::FixAfter,
        _ => Bias::FixBoth,
    }
}

fuzz_target!(|input: Input| {
    let config = RecyclerConfig::default()
        .with_cache_depth(usize::from(input.depth % 8))
        .with_endcap(input.endcap);
    let Ok(mut recycler) = Recycler::<Item, View>::new(config, view) else {
        return;
    };
    let mut next_id = 0u32;

    for op in input.ops.into_iter().take(256) {
        let result = match op {
            Op::Insert { at, count, bias: raw } => {
                let count = u32::from(count % 16);
                let items = (next_id..next_id + count).map(Item);
                next_id += count;
                recycler.insert(usize::from(at), items, bias(raw))
            }
            Op::Remove { at, count } => recycler
                .remove(usize::from(at), usize::from(count % 16), Bias::FixBoth)
                .map(drop),
            Op::SetVisible { start, len } => {
                let start = usize::from(start);
                let range = IndexRange::new(start, start + usize::from(len % 32)).ok();
                recycler.set_visible_range(range)
            }
            Op::ClearVisible => recycler.set_visible_range(None),
            Op::ScrollTo { index } => recycler.scroll_to(usize::from(index)),
            Op::Tick { top, height, endcap } => {
                let top = usize::from(top);
                let rows = top..top + usize::from(height % 64);
                recycler.tick(&mut Viewport { rows, endcap }).map(drop)
            }
            Op::Clear => recycler.clear(),
        };

        // Bad input is rejected; anything else is a bug.
        if let Err(err) = result {
            assert_eq!(err.severity(), Severity::Precondition, "{err}");
        }
        recycler
            .check_invariants()
            .unwrap_or_else(|err| panic!("invariant broken: {err}"));
    }
});
