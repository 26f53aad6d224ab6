//! Tracing capture for asserting on controller spans and log lines.
//!
//! The dispatcher opens an `install`, `activate` or `fetch` span around
//! every event and background refreshes run inside `offload_task`. The
//! collector records those spans and every event emitted by the stashbox
//! crates, so tests can assert on what was logged without parsing output.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::Dispatch;
use tracing::span::{Attributes, Id, Record};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;

/// Span names opened by the controller.
pub const CONTROLLER_SPANS: [&str; 4] = ["install", "activate", "fetch", "offload_task"];

/// A captured span.
#[derive(Debug, Clone)]
pub struct CapturedSpan {
    pub id: u64,
    pub parent_id: Option<u64>,
    pub name: String,
    pub target: String,
    pub fields: Vec<(String, String)>,
}

/// A captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub message: String,
    /// Name of the innermost controller span the event was emitted in.
    pub span: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Default)]
struct Captured {
    spans: Vec<CapturedSpan>,
    events: Vec<CapturedEvent>,
}

/// A tracing layer that records controller spans and stashbox events.
pub struct CaptureLayer {
    captured: Arc<Mutex<Captured>>,
}

struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl FieldVisitor {
    fn new() -> Self {
        Self {
            message: None,
            fields: Vec::new(),
        }
    }

    fn push(&mut self, field: &tracing::field::Field, value: String) {
        if field.name() == "message" {
            self.message = Some(value);
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push(field, value.to_string());
    }
}

fn is_controller_span(name: &str) -> bool {
    CONTROLLER_SPANS.contains(&name)
}

fn lock(captured: &Mutex<Captured>) -> MutexGuard<'_, Captured> {
    captured.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let metadata = attrs.metadata();
        if !is_controller_span(metadata.name()) {
            return;
        }

        let mut visitor = FieldVisitor::new();
        attrs.record(&mut visitor);

        let parent_id = attrs
            .parent()
            .cloned()
            .or_else(|| {
                if attrs.is_contextual() {
                    ctx.current_span().id().cloned()
                } else {
                    None
                }
            })
            .map(|id| id.into_u64());

        lock(&self.captured).spans.push(CapturedSpan {
            id: id.into_u64(),
            parent_id,
            name: metadata.name().to_string(),
            target: metadata.target().to_string(),
            fields: visitor.fields,
        });
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span_ref) = ctx.span(id) else {
            return;
        };
        if !is_controller_span(span_ref.metadata().name()) {
            return;
        }

        let mut visitor = FieldVisitor::new();
        values.record(&mut visitor);

        let span_id = id.into_u64();
        let mut captured = lock(&self.captured);
        if let Some(span) = captured.spans.iter_mut().find(|s| s.id == span_id) {
            for (key, value) in visitor.fields {
                if let Some(existing) = span.fields.iter_mut().find(|(k, _)| k == &key) {
                    existing.1 = value;
                } else {
                    span.fields.push((key, value));
                }
            }
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if !metadata.target().starts_with("stashbox") {
            return;
        }

        let mut visitor = FieldVisitor::new();
        event.record(&mut visitor);

        let span = ctx.event_scope(event).and_then(|scope| {
            scope
                .from_root()
                .filter(|span| is_controller_span(span.name()))
                .last()
                .map(|span| span.name().to_string())
        });

        lock(&self.captured).events.push(CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            span,
            fields: visitor.fields,
        });
    }
}

/// Collector for captured spans and events.
#[derive(Clone)]
pub struct TraceCollector {
    captured: Arc<Mutex<Captured>>,
    dispatch: Dispatch,
}

/// Creates a collector and the dispatch feeding it.
pub fn create_collector() -> TraceCollector {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let layer = CaptureLayer {
        captured: captured.clone(),
    };
    let dispatch = Dispatch::new(Registry::default().with(layer));
    TraceCollector { captured, dispatch }
}

impl TraceCollector {
    /// The dispatch to install with [`tracing::dispatcher::set_default`].
    ///
    /// The default is thread-local; background refreshes are captured only
    /// on a current-thread runtime.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }

    pub fn spans(&self) -> Vec<CapturedSpan> {
        lock(&self.captured).spans.clone()
    }

    pub fn span_names(&self) -> Vec<String> {
        lock(&self.captured)
            .spans
            .iter()
            .map(|s| s.name.clone())
            .collect()
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        lock(&self.captured).events.clone()
    }

    /// Events whose message is exactly `message`.
    pub fn events_with_message(&self, message: &str) -> Vec<CapturedEvent> {
        lock(&self.captured)
            .events
            .iter()
            .filter(|e| e.message == message)
            .cloned()
            .collect()
    }

    pub fn has_span(&self, name: &str) -> bool {
        lock(&self.captured).spans.iter().any(|s| s.name == name)
    }

    pub fn has_event(&self, message: &str) -> bool {
        lock(&self.captured)
            .events
            .iter()
            .any(|e| e.message == message)
    }

    /// Last span named `name`.
    pub fn get_span(&self, name: &str) -> Option<CapturedSpan> {
        lock(&self.captured)
            .spans
            .iter()
            .rev()
            .find(|s| s.name == name)
            .cloned()
    }

    pub fn get_field(&self, span_name: &str, field_name: &str) -> Option<String> {
        self.get_span(span_name).and_then(|s| {
            s.fields
                .iter()
                .find(|(k, _)| k == field_name)
                .map(|(_, v)| v.clone())
        })
    }

    pub fn clear(&self) {
        let mut captured = lock(&self.captured);
        captured.spans.clear();
        captured.events.clear();
    }

    /// Asserts the given spans were opened in this order, allowing others
    /// in between.
    pub fn assert_span_sequence(&self, expected: &[&str]) {
        let names = self.span_names();
        let mut expected_iter = expected.iter();
        let mut current_expected = expected_iter.next();

        for name in &names {
            if let Some(exp) = current_expected
                && name == *exp
            {
                current_expected = expected_iter.next();
            }
        }

        if current_expected.is_some() {
            panic!("Expected span sequence {:?} but got {:?}", expected, names);
        }
    }

    pub fn assert_has_event(&self, message: &str) {
        if !self.has_event(message) {
            let messages: Vec<_> = self.events().into_iter().map(|e| e.message).collect();
            panic!(
                "Expected event '{}' not found. Captured events: {:?}",
                message, messages
            );
        }
    }
}

/// Runs `f` with capturing enabled on the current thread.
///
/// # Example
///
/// ```ignore
/// let (report, collector) = with_capture(|| block_on(dispatcher.dispatch(Event::Install)));
/// collector.assert_has_event("install complete");
/// ```
pub fn with_capture<F, R>(f: F) -> (R, TraceCollector)
where
    F: FnOnce() -> R,
{
    let collector = create_collector();
    let result = tracing::dispatcher::with_default(collector.dispatch(), f);
    (result, collector)
}
