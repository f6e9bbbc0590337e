#![cfg(feature = "tracing")]

//! Span coverage for the `tracing` feature.

use std::sync::{Arc, Mutex};

use ftui_recycler::{Bias, FactoryError, ItemView, Keyed, Recycler, RecyclerConfig};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Default)]
struct RecyclerTraceState {
    settle_spans: usize,
    splice_spans: usize,
    settle_has_passes_field: bool,
    settle_has_visible_field: bool,
    splice_has_bias_field: bool,
    last_splice_inserted: Option<u64>,
}

struct RecyclerTraceCapture {
    state: Arc<Mutex<RecyclerTraceState>>,
}

struct InsertedVisitor {
    inserted: Option<u64>,
}

impl tracing::field::Visit for InsertedVisitor {
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        if field.name() == "inserted" {
            self.inserted = Some(value);
        }
    }

    fn record_debug(&mut self, _field: &tracing::field::Field, _value: &dyn std::fmt::Debug) {}
}

impl<S> Layer<S> for RecyclerTraceCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::Id,
        _ctx: Context<'_, S>,
    ) {
        let fields = attrs.metadata().fields();
        let mut state = self.state.lock().expect("trace state lock");
        match attrs.metadata().name() {
            "recycler.settle" => {
                state.settle_spans += 1;
                state.settle_has_passes_field |= fields.field("passes").is_some();
                state.settle_has_visible_field |= fields.field("visible").is_some();
            }
            "recycler.splice" => {
                state.splice_spans += 1;
                state.splice_has_bias_field |= fields.field("bias").is_some();
                let mut visitor = InsertedVisitor { inserted: None };
                attrs.record(&mut visitor);
                if visitor.inserted.is_some() {
                    state.last_splice_inserted = visitor.inserted;
                }
            }
            _ => {}
        }
    }
}

struct Row(u32);

impl Keyed for Row {
    type Key = u32;

    fn key(&self) -> u32 {
        self.0
    }
}

#[derive(Default)]
struct Cell;

impl ItemView<Row> for Cell {
    fn bind(&mut self, _index: usize, _item: &Row, _exact: bool) {}
}

fn cell() -> Result<Cell, FactoryError> {
    Ok(Cell)
}

#[test]
fn settle_and_splice_spans_are_emitted() {
    let trace_state = Arc::new(Mutex::new(RecyclerTraceState::default()));
    let subscriber = tracing_subscriber::registry().with(RecyclerTraceCapture {
        state: Arc::clone(&trace_state),
    });
    let _guard = tracing::subscriber::set_default(subscriber);
    tracing::callsite::rebuild_interest_cache();

    let mut recycler: Recycler<Row, Cell> = Recycler::new(RecyclerConfig::default(), cell).unwrap();
    recycler.append((0..50).map(Row)).unwrap();
    recycler.insert(10, (100..103).map(Row), Bias::FixBoth).unwrap();
    recycler.scroll_to(5).unwrap();
    recycler.tick(&mut |index: usize| (5..9).contains(&index)).unwrap();

    let state = trace_state.lock().expect("trace state lock");
    assert_eq!(state.splice_spans, 2);
    assert!(state.splice_has_bias_field);
    assert_eq!(state.last_splice_inserted, Some(3));
    // One settle per mutation, scroll and tick.
    assert_eq!(state.settle_spans, 4);
    assert!(state.settle_has_passes_field);
    assert!(state.settle_has_visible_field);
}
