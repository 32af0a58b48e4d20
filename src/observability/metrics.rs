//! HTTP instrumentation and metrics exposition.
//!
//! # Responsibilities
//! - Own the Prometheus recorder for the process
//! - Instrument every HTTP request at the transport boundary
//! - Render the Prometheus text exposition for `/metrics`
//!
//! # Metrics
//! - `http_request_duration_seconds` (histogram): method, path, status_code, isWS
//! - `http_inflight_requests` (gauge): method, path
//! - `http_request_body_size_bytes` (histogram): method, path
//! - `http_response_body_size_bytes` (histogram): method, path
//!
//! # Design Decisions
//! - The recorder is never installed globally; `HttpMetrics` is created once by
//!   the composition root and injected, so tests get isolated registries
//! - Instruments are described exactly once, when the recorder is built
//! - Body sizes are the bytes actually read and written: both bodies are
//!   wrapped in a counting body and the request is recorded when the response
//!   body is dropped, so streamed bodies are measured without buffering

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{MatchedPath, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use http_body::{Frame, SizeHint};
use metrics::{describe_gauge, describe_histogram, gauge, histogram, with_local_recorder, Gauge};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

pub const HTTP_LATENCY: &str = "http_request_duration_seconds";
pub const HTTP_INFLIGHT: &str = "http_inflight_requests";
pub const HTTP_REQUEST_BODY_SIZE: &str = "http_request_body_size_bytes";
pub const HTTP_RESPONSE_BODY_SIZE: &str = "http_response_body_size_bytes";

/// Latency buckets in seconds.
pub const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Path label for requests that matched no route.
pub const UNMATCHED_PATH: &str = "other";

/// `count` buckets starting at `start`, each `factor` times the previous.
pub fn exponential_buckets(start: f64, factor: f64, count: usize) -> Vec<f64> {
    std::iter::successors(Some(start), |b| Some(b * factor))
        .take(count)
        .collect()
}

/// Process-scoped HTTP instruments.
#[derive(Clone)]
pub struct HttpMetrics {
    recorder: Arc<PrometheusRecorder>,
    handle: PrometheusHandle,
}

impl HttpMetrics {
    /// Build the recorder and describe the four instruments.
    pub fn new() -> Result<Self, BuildError> {
        let body_buckets = exponential_buckets(100.0, 10.0, 7);

        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(HTTP_LATENCY.to_string()), LATENCY_BUCKETS)?
            .set_buckets_for_metric(
                Matcher::Full(HTTP_REQUEST_BODY_SIZE.to_string()),
                &body_buckets,
            )?
            .set_buckets_for_metric(
                Matcher::Full(HTTP_RESPONSE_BODY_SIZE.to_string()),
                &body_buckets,
            )?
            .build_recorder();
        let handle = recorder.handle();

        with_local_recorder(&recorder, || {
            describe_histogram!(HTTP_LATENCY, "Time (in seconds) spent serving HTTP requests.");
            describe_gauge!(HTTP_INFLIGHT, "Current number of inflight requests.");
            describe_histogram!(HTTP_REQUEST_BODY_SIZE, "Size of HTTP request bodies.");
            describe_histogram!(HTTP_RESPONSE_BODY_SIZE, "Size of HTTP response bodies.");
        });

        Ok(Self {
            recorder: Arc::new(recorder),
            handle,
        })
    }

    /// Prometheus text exposition of everything recorded so far.
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Increment the in-flight gauge; the returned guard decrements it on drop.
    pub fn track_inflight(&self, method: &str, path: &str) -> InflightGuard {
        let gauge = with_local_recorder(&*self.recorder, || {
            gauge!(HTTP_INFLIGHT, "method" => method.to_string(), "path" => path.to_string())
        });
        gauge.increment(1.0);
        InflightGuard { gauge }
    }

    /// Record one completed request.
    pub fn record_request(&self, request: &RequestLabels, status: u16, took: Duration, sizes: (u64, u64)) {
        let (request_size, response_size) = sizes;
        with_local_recorder(&*self.recorder, || {
            histogram!(
                HTTP_LATENCY,
                "method" => request.method.clone(),
                "path" => request.path.clone(),
                "status_code" => status.to_string(),
                "isWS" => request.is_websocket.to_string()
            )
            .record(took.as_secs_f64());

            histogram!(
                HTTP_REQUEST_BODY_SIZE,
                "method" => request.method.clone(),
                "path" => request.path.clone()
            )
            .record(request_size as f64);

            histogram!(
                HTTP_RESPONSE_BODY_SIZE,
                "method" => request.method.clone(),
                "path" => request.path.clone()
            )
            .record(response_size as f64);
        });
    }
}

/// Decrements the in-flight gauge on every exit path, unwinding included.
pub struct InflightGuard {
    gauge: Gauge,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.gauge.decrement(1.0);
    }
}

/// Labels shared by every instrument for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLabels {
    pub method: String,
    pub path: String,
    pub is_websocket: bool,
}

impl RequestLabels {
    pub fn from_request(request: &Request) -> Self {
        let path = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|| UNMATCHED_PATH.to_string());

        Self {
            method: request.method().to_string(),
            path,
            is_websocket: is_websocket_upgrade(request.headers()),
        }
    }
}

/// Whether the headers describe a WebSocket upgrade handshake.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let upgrade = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("websocket"));

    let connection = headers
        .get(header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.split(',')
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
        });

    upgrade && connection
}

/// Body wrapper adding the length of every data frame to a shared counter.
///
/// Any [`Completion`] it carries is dropped with it.
struct CountingBody {
    inner: Body,
    counted: Arc<AtomicU64>,
    _completion: Option<Completion>,
}

impl CountingBody {
    fn new(inner: Body, counted: Arc<AtomicU64>, completion: Option<Completion>) -> Self {
        Self {
            inner,
            counted,
            _completion: completion,
        }
    }
}

impl HttpBody for CountingBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &polled {
            if let Some(data) = frame.data_ref() {
                this.counted.fetch_add(data.len() as u64, Ordering::Relaxed);
            }
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Records one request when dropped, then releases its in-flight slot.
struct Completion {
    metrics: HttpMetrics,
    labels: RequestLabels,
    status: u16,
    begin: Instant,
    request_bytes: Arc<AtomicU64>,
    response_bytes: Arc<AtomicU64>,
    _inflight: InflightGuard,
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.metrics.record_request(
            &self.labels,
            self.status,
            self.begin.elapsed(),
            (
                self.request_bytes.load(Ordering::Relaxed),
                self.response_bytes.load(Ordering::Relaxed),
            ),
        );
    }
}

/// Axum middleware instrumenting every request passing through it.
///
/// The request is recorded once its response body has been sent (or dropped).
pub async fn instrument(State(metrics): State<HttpMetrics>, request: Request, next: Next) -> Response {
    let begin = Instant::now();
    let labels = RequestLabels::from_request(&request);
    let inflight = metrics.track_inflight(&labels.method, &labels.path);

    let request_bytes = Arc::new(AtomicU64::new(0));
    let request =
        request.map(|body| Body::new(CountingBody::new(body, request_bytes.clone(), None)));

    let response = next.run(request).await;

    let response_bytes = Arc::new(AtomicU64::new(0));
    let completion = Completion {
        metrics,
        labels,
        status: response.status().as_u16(),
        begin,
        request_bytes,
        response_bytes: response_bytes.clone(),
        _inflight: inflight,
    };

    response.map(|body| Body::new(CountingBody::new(body, response_bytes, Some(completion))))
}
