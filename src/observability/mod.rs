//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP transport:
//!     → metrics.rs (latency, in-flight, body sizes per request)
//!
//! Endpoint chain:
//!     → trace.rs (Context carries the active span; Tracer starts/finishes spans)
//!     → OTLP collector (finished spans, batched)
//!     → endpoint and service decorators emit log events with trace correlation
//!
//! Consumers:
//!     → logging.rs (stderr, text or JSON)
//!     → Metrics endpoint (Prometheus scrape of /metrics)
//! ```
//!
//! # Design Decisions
//! - Structured logging via `tracing` events, one line per event
//! - Metrics state is owned explicitly, never reached through globals
//! - Tracing never fails a request; missing span data degrades to empty ids

pub mod logging;
pub mod metrics;
pub mod trace;

pub use metrics::HttpMetrics;
pub use trace::{extract_trace_ids, Context, NoopTracer, OtelTracer, Span, SpanContext, Tracer};
