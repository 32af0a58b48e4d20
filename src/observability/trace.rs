//! Distributed tracing primitives.
//!
//! # Responsibilities
//! - Carry the active span through a call as a read-only [`Context`]
//! - Start, tag and finish spans through the [`Tracer`] boundary
//! - Export finished spans to an OTLP collector ([`OtelTracer`])
//! - Extract trace/span identifiers for log correlation
//!
//! # Design Decisions
//! - `Context` is passed explicitly alongside business values; attaching a span
//!   returns a new context and never mutates the caller's
//! - The endpoint chain only sees the [`Tracer`]/[`Span`] traits; OpenTelemetry
//!   stays behind them
//! - Extraction never fails: no span yields empty ids, an unrecognised span
//!   context yields its string form for both ids

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use opentelemetry::trace::{
    Span as _, SpanKind, Status, TraceContextExt, TraceError, Tracer as _,
};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{self as sdktrace, Sampler},
    Resource,
};

use crate::config::TracingConfig;

/// Identity of a span as seen by the rest of the call chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanContext {
    /// An OpenTelemetry span context with independent trace and span ids.
    Otel(opentelemetry::trace::SpanContext),
    /// A span context whose shape is unknown to this crate.
    Opaque(Arc<str>),
}

impl SpanContext {
    pub fn opaque(repr: impl AsRef<str>) -> Self {
        Self::Opaque(Arc::from(repr.as_ref()))
    }
}

impl fmt::Display for SpanContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpanContext::Otel(cx) => write!(
                f,
                "{:032x}-{:016x}-{:02x}",
                cx.trace_id(),
                cx.span_id(),
                cx.trace_flags().to_u8()
            ),
            SpanContext::Opaque(repr) => f.write_str(repr),
        }
    }
}

/// Per-call correlation handle.
///
/// Cloning is cheap; every layer passes the context it received to the next
/// one unchanged, except the tracing decorator which attaches its span.
#[derive(Debug, Clone, Default)]
pub struct Context {
    span: Option<SpanContext>,
}

impl Context {
    /// A context with no active span.
    pub fn background() -> Self {
        Self::default()
    }

    /// The active span, if any.
    pub fn span(&self) -> Option<&SpanContext> {
        self.span.as_ref()
    }

    /// A new context with `span` as the active span.
    pub fn with_span(&self, span: SpanContext) -> Self {
        Self { span: Some(span) }
    }
}

/// A started span. Must be finished exactly once.
pub trait Span: Send {
    fn context(&self) -> SpanContext;

    fn set_tag(&mut self, key: &'static str, value: String);

    fn finish(self: Box<Self>);
}

/// Starts spans as children of whatever span the context carries.
pub trait Tracer: Send + Sync {
    fn start_span(&self, ctx: &Context, operation: &str) -> Box<dyn Span>;
}

/// Extract `(trace_id, span_id)` from the context for log correlation.
///
/// Without an active span both are empty. For a span context with no
/// independent accessors both fields carry the same string, so callers must
/// not assume the two ids are distinct.
pub fn extract_trace_ids(ctx: &Context) -> (String, String) {
    match ctx.span() {
        None => (String::new(), String::new()),
        Some(SpanContext::Otel(cx)) if cx.is_valid() => (
            format!("{:032x}", cx.trace_id()),
            format!("{:016x}", cx.span_id()),
        ),
        Some(other) => {
            let repr = other.to_string();
            (repr.clone(), repr)
        }
    }
}

/// Tracer backed by an OpenTelemetry SDK tracer.
///
/// Spans are started as `SpanKind::Server` children of the context's span and
/// handed to the SDK's span processor when finished.
#[derive(Clone)]
pub struct OtelTracer {
    tracer: sdktrace::Tracer,
}

impl OtelTracer {
    pub fn new(tracer: sdktrace::Tracer) -> Self {
        Self { tracer }
    }
}

impl Tracer for OtelTracer {
    fn start_span(&self, ctx: &Context, operation: &str) -> Box<dyn Span> {
        let parent = match ctx.span() {
            Some(SpanContext::Otel(cx)) => {
                opentelemetry::Context::new().with_remote_span_context(cx.clone())
            }
            _ => opentelemetry::Context::new(),
        };

        let span = self
            .tracer
            .span_builder(operation.to_string())
            .with_kind(SpanKind::Server)
            .start_with_context(&self.tracer, &parent);

        Box::new(OtelSpan(span))
    }
}

struct OtelSpan(sdktrace::Span);

impl Span for OtelSpan {
    fn context(&self) -> SpanContext {
        SpanContext::Otel(self.0.span_context().clone())
    }

    fn set_tag(&mut self, key: &'static str, value: String) {
        if key == "error" {
            self.0.set_status(Status::error(value.clone()));
        }
        self.0.set_attribute(KeyValue::new(key, value));
    }

    fn finish(mut self: Box<Self>) {
        self.0.end();
    }
}

/// Build the OTLP export pipeline and return its tracer.
///
/// Spans are batched on the Tokio runtime, so this must be called from within
/// one. The provider is registered globally; [`shutdown_tracer`] flushes it.
pub fn init_otlp_tracer(
    config: &TracingConfig,
    service_name: &str,
) -> Result<sdktrace::Tracer, TraceError> {
    let root = if config.sample {
        Sampler::AlwaysOn
    } else {
        Sampler::AlwaysOff
    };

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(config.otlp_endpoint.clone())
        .with_timeout(Duration::from_secs(config.export_timeout_secs));

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            sdktrace::Config::default()
                .with_sampler(Sampler::ParentBased(Box::new(root)))
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", service_name.to_string()),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .install_batch(runtime::Tokio)?;

    tracing::info!(
        endpoint = %config.otlp_endpoint,
        sample = config.sample,
        service = %service_name,
        "OTLP span export initialized"
    );

    Ok(tracer)
}

/// Flush and shut down the global tracer provider. Blocks until done.
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Tracer used when tracing is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

const NOOP_CONTEXT: &str = "{}";

impl Tracer for NoopTracer {
    fn start_span(&self, _ctx: &Context, _operation: &str) -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
}

struct NoopSpan;

impl Span for NoopSpan {
    fn context(&self) -> SpanContext {
        SpanContext::opaque(NOOP_CONTEXT)
    }

    fn set_tag(&mut self, _key: &'static str, _value: String) {}

    fn finish(self: Box<Self>) {}
}
