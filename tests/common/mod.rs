//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{self, Poll};

use axum::body::Bytes;
use http_body::Frame;

use opentelemetry::trace::{
    SpanContext as OtelSpanContext, SpanId, TraceFlags, TraceId, TraceState,
};
use payment_auth::observability::trace::{Context, Span, SpanContext, Tracer};
use payment_auth::payment::{Authorisation, Health, PaymentError, Service};
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Subscriber};
use tracing_subscriber::layer::{self, SubscriberExt};
use tracing_subscriber::Layer;

/// One captured log event.
#[derive(Debug, Clone)]
pub struct CapturedEvent {
    pub target: String,
    pub fields: BTreeMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Emitted by the endpoint logging decorator.
    pub fn is_endpoint_line(&self) -> bool {
        self.target.ends_with("endpoint::logging")
    }

    /// Emitted by the service logging decorator.
    pub fn is_service_line(&self) -> bool {
        self.target.ends_with("payment::logging")
    }
}

/// Layer recording every event it sees.
#[derive(Clone, Default)]
pub struct CaptureLayer {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher to install with `tracing::dispatcher::with_default`.
    pub fn dispatch(&self) -> Dispatch {
        Dispatch::new(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn endpoint_lines(&self) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.is_endpoint_line()).collect()
    }

    pub fn service_lines(&self) -> Vec<CapturedEvent> {
        self.events().into_iter().filter(|e| e.is_service_line()).collect()
    }

    /// Run `f` with this layer capturing events on the current thread.
    pub fn capture<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch(), f)
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: layer::Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            fields: visitor.0,
        });
    }
}

#[derive(Default)]
struct FieldVisitor(BTreeMap<String, String>);

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0.insert(field.name().to_string(), format!("{:?}", value));
    }
}

/// Ordered record of what happened during a call.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// A span as seen by [`RecordingTracer`].
#[derive(Debug, Clone)]
pub struct RecordedSpan {
    pub operation: String,
    pub context: SpanContext,
    pub parent: Option<SpanContext>,
    pub tags: Vec<(String, String)>,
    pub finished: u32,
}

impl RecordedSpan {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Tracer recording every span it starts.
///
/// With `opaque` set its span contexts expose no independent ids.
#[derive(Clone, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<RecordedSpan>>>,
    journal: Option<Journal>,
    opaque: bool,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opaque() -> Self {
        Self {
            opaque: true,
            ..Self::default()
        }
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal: Some(journal),
            ..Self::default()
        }
    }

    pub fn spans(&self) -> Vec<RecordedSpan> {
        self.spans.lock().unwrap().clone()
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, ctx: &Context, operation: &str) -> Box<dyn Span> {
        let mut spans = self.spans.lock().unwrap();
        let index = spans.len();
        let span_id = index as u64 + 1;

        let context = if self.opaque {
            SpanContext::opaque(format!("recording-span-{}", span_id))
        } else {
            let trace_id = match ctx.span() {
                Some(SpanContext::Otel(parent)) => parent.trace_id(),
                _ => TraceId::from_u128(0x7000 + span_id as u128),
            };
            SpanContext::Otel(OtelSpanContext::new(
                trace_id,
                SpanId::from_u64(span_id),
                TraceFlags::SAMPLED,
                false,
                TraceState::default(),
            ))
        };

        spans.push(RecordedSpan {
            operation: operation.to_string(),
            context: context.clone(),
            parent: ctx.span().cloned(),
            tags: Vec::new(),
            finished: 0,
        });

        if let Some(journal) = &self.journal {
            journal.push("span:start");
        }

        Box::new(RecordingSpan {
            index,
            context,
            tracer: self.clone(),
        })
    }
}

struct RecordingSpan {
    index: usize,
    context: SpanContext,
    tracer: RecordingTracer,
}

impl Span for RecordingSpan {
    fn context(&self) -> SpanContext {
        self.context.clone()
    }

    fn set_tag(&mut self, key: &'static str, value: String) {
        self.tracer.spans.lock().unwrap()[self.index]
            .tags
            .push((key.to_string(), value));
    }

    fn finish(self: Box<Self>) {
        self.tracer.spans.lock().unwrap()[self.index].finished += 1;
        if let Some(journal) = &self.tracer.journal {
            journal.push("span:finish");
        }
    }
}

/// Service stub with a fixed threshold that writes to a journal.
pub struct JournalService {
    pub decline_over: f32,
    pub journal: Journal,
}

impl Service for JournalService {
    fn authorise(&self, amount: f32) -> Result<Authorisation, PaymentError> {
        self.journal.push(format!("business:{}", amount));
        if amount > self.decline_over {
            Ok(Authorisation::declined("declined"))
        } else {
            Ok(Authorisation::approved("authorised"))
        }
    }

    fn health(&self) -> Vec<Health> {
        self.journal.push("business:health");
        vec![Health::new("auth-service", "ok")]
    }
}

/// A span context as received from an upstream caller.
pub fn remote_span(trace_id: u128, span_id: u64) -> SpanContext {
    SpanContext::Otel(OtelSpanContext::new(
        TraceId::from_u128(trace_id),
        SpanId::from_u64(span_id),
        TraceFlags::SAMPLED,
        true,
        TraceState::default(),
    ))
}

/// Service whose rule always fails.
pub struct FailingService;

impl Service for FailingService {
    fn authorise(&self, _amount: f32) -> Result<Authorisation, PaymentError> {
        Err(PaymentError::Rule("ledger unavailable".into()))
    }

    fn health(&self) -> Vec<Health> {
        vec![Health::new("auth-service", "degraded")]
    }
}

/// Request body delivered in several data frames with no known length.
pub struct ChunkedBody {
    chunks: VecDeque<Bytes>,
}

impl ChunkedBody {
    pub fn new(chunks: &[&'static str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| Bytes::from_static(c.as_bytes())).collect(),
        }
    }
}

impl http_body::Body for ChunkedBody {
    type Data = Bytes;
    type Error = std::convert::Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
        Poll::Ready(self.chunks.pop_front().map(|chunk| Ok(Frame::data(chunk))))
    }
}
