//! HTTP transport: routing, JSON codec and status mapping.
//!
//! # Routes
//! - `POST /paymentAuth` `{"amount": number}` → `{"authorisation": {...}}`
//! - `GET /health` → `{"health": [...]}`
//! - `GET /metrics` → Prometheus text exposition
//!
//! # Status Mapping
//! - Decline: 200 with `authorised: false`
//! - Invalid amount (business error): 400
//! - Other business error: 500
//! - Undecodable body or endpoint error: 400
//!
//! An incoming `traceparent` header seeds the request [`Context`], so the
//! server span joins the caller's trace.

use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::TraceContextExt;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use serde::Serialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::PaymentConfig;
use crate::endpoint::{self, AuthoriseRequest, AuthoriseResponse, EndpointError, Endpoints};
use crate::observability::metrics::{instrument, HttpMetrics};
use crate::observability::trace::{Context, SpanContext};
use crate::payment::{Authorisation, PaymentError};

/// State injected into handlers.
#[derive(Clone)]
pub struct TransportState {
    pub endpoints: Endpoints,
    pub metrics: HttpMetrics,
}

/// Build the router; the instrumentation middleware is the outermost layer.
#[allow(deprecated)]
pub fn make_router(endpoints: Endpoints, metrics: HttpMetrics, config: &PaymentConfig) -> Router {
    let state = TransportState {
        endpoints,
        metrics: metrics.clone(),
    };

    Router::new()
        .route("/paymentAuth", post(authorise_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.limits.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn_with_state(metrics, instrument))
}

#[derive(Serialize)]
struct AuthoriseBody<'a> {
    authorisation: &'a Authorisation,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    status_code: u16,
    status_text: &'a str,
}

fn error_response(status: StatusCode, message: &str) -> Response {
    let body = ErrorBody {
        error: message,
        status_code: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default(),
    };
    (status, Json(body)).into_response()
}

fn business_status(err: &PaymentError) -> StatusCode {
    match err {
        PaymentError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
        PaymentError::Rule(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn endpoint_status(err: &EndpointError) -> StatusCode {
    match err {
        EndpointError::UnexpectedRequest { .. } => StatusCode::BAD_REQUEST,
    }
}

fn encode_authorise(response: &AuthoriseResponse) -> Response {
    match &response.err {
        Some(err) => error_response(business_status(err), &err.to_string()),
        None => (
            StatusCode::OK,
            Json(AuthoriseBody {
                authorisation: &response.authorisation,
            }),
        )
            .into_response(),
    }
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|k| k.as_str()).collect()
    }
}

/// Read the caller's span context from W3C trace context headers.
///
/// Missing or malformed headers yield `None`.
pub fn extract_remote(headers: &HeaderMap) -> Option<SpanContext> {
    let cx = TraceContextPropagator::new().extract(&HeaderExtractor(headers));
    let remote = cx.span().span_context().clone();
    remote.is_valid().then_some(SpanContext::Otel(remote))
}

/// The per-request correlation handle.
pub fn request_context(headers: &HeaderMap) -> Context {
    match extract_remote(headers) {
        Some(remote) => Context::background().with_span(remote),
        None => Context::background(),
    }
}

async fn authorise_handler(
    State(state): State<TransportState>,
    headers: HeaderMap,
    payload: Result<Json<AuthoriseRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected authorise request body");
            return error_response(StatusCode::BAD_REQUEST, &rejection.body_text());
        }
    };

    let ctx = request_context(&headers);
    match state
        .endpoints
        .authorise
        .call(&ctx, endpoint::Request::Authorise(request))
    {
        Ok(endpoint::Response::Authorise(response)) => encode_authorise(&response),
        Ok(other) => {
            tracing::error!(response = ?other, "Authorise endpoint returned a foreign response");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "unexpected response")
        }
        Err(err) => error_response(endpoint_status(&err), &err.to_string()),
    }
}

async fn health_handler(State(state): State<TransportState>, headers: HeaderMap) -> Response {
    let ctx = request_context(&headers);
    match state.endpoints.health.call(&ctx, endpoint::Request::Health) {
        Ok(endpoint::Response::Health(health)) => (StatusCode::OK, Json(health)).into_response(),
        Ok(other) => {
            tracing::error!(response = ?other, "Health endpoint returned a foreign response");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "unexpected response")
        }
        Err(err) => error_response(endpoint_status(&err), &err.to_string()),
    }
}

async fn metrics_handler(State(state): State<TransportState>) -> String {
    state.metrics.render()
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "no route")
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::{SpanId, TraceId};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    #[test]
    fn test_extract_remote() {
        let map = headers(&[(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01",
        )]);

        match extract_remote(&map) {
            Some(SpanContext::Otel(cx)) => {
                assert_eq!(
                    cx.trace_id(),
                    TraceId::from_u128(0x4bf92f3577b34da6a3ce929d0e0e4736)
                );
                assert_eq!(cx.span_id(), SpanId::from_u64(0x00f067aa0ba902b7));
                assert!(cx.is_sampled());
                assert!(cx.is_remote());
            }
            other => panic!("unexpected span context: {:?}", other),
        }
    }

    #[test]
    fn test_extract_remote_unsampled() {
        let map = headers(&[(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-00",
        )]);
        assert!(matches!(
            extract_remote(&map),
            Some(SpanContext::Otel(cx)) if !cx.is_sampled()
        ));
    }

    #[test]
    fn test_extract_remote_rejects_malformed() {
        assert_eq!(extract_remote(&headers(&[("traceparent", "garbage")])), None);
        assert_eq!(
            extract_remote(&headers(&[(
                "traceparent",
                "00-00000000000000000000000000000000-00f067aa0ba902b7-01",
            )])),
            None
        );
        assert_eq!(extract_remote(&HeaderMap::new()), None);
    }

    #[test]
    fn test_request_context_without_headers() {
        assert!(request_context(&HeaderMap::new()).span().is_none());
    }

    #[test]
    fn test_business_status_mapping() {
        assert_eq!(
            business_status(&PaymentError::InvalidAmount(0.0)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            business_status(&PaymentError::Rule("down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
