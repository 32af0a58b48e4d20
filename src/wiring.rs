//! Composition root.
//!
//! Builds the decorator chain once, before any request is served:
//!
//! ```text
//! Authorise: AuthorisationService
//!     → ServiceLoggingLayer   (payment::LoggingService)
//!     → AuthoriseEndpoint     (endpoint adapter)
//!     → LoggingLayer          (endpoint logging, trace-correlated)
//!     → TracingLayer          (one span per call)
//!
//! Health:    AuthorisationService → HealthEndpoint   (no span, no log line)
//! ```
//!
//! The finished endpoints, the metrics recorder and the router are immutable
//! after `wire_up` returns.

use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tower::ServiceBuilder;

use crate::config::{PaymentConfig, TracingConfig};
use crate::endpoint::{AuthoriseEndpoint, Endpoints, HealthEndpoint, LoggingLayer, TracingLayer};
use crate::http::transport::make_router;
use crate::observability::metrics::HttpMetrics;
use crate::observability::trace::{init_otlp_tracer, NoopTracer, OtelTracer, Tracer};
use crate::payment::{AuthorisationService, Service, ServiceLoggingLayer};

/// Span name of the Authorise server span.
pub const AUTHORISE_OPERATION: &str = "POST /paymentAuth";

/// Errors raised while assembling the application.
#[derive(Debug, Error)]
pub enum WiringError {
    #[error("failed to build metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build span exporter: {0}")]
    Tracing(#[from] opentelemetry::trace::TraceError),
}

/// Everything the transport needs, assembled once.
#[derive(Clone)]
pub struct App {
    pub endpoints: Endpoints,
    pub metrics: HttpMetrics,
    pub router: Router,
}

/// Choose the tracer for the configured tracing mode.
///
/// With tracing enabled this starts the OTLP export pipeline, so it must run
/// inside the Tokio runtime.
pub fn make_tracer(
    config: &TracingConfig,
    service_name: &str,
) -> Result<Arc<dyn Tracer>, WiringError> {
    if !config.enabled {
        tracing::info!("Span export disabled");
        return Ok(Arc::new(NoopTracer));
    }
    let tracer = init_otlp_tracer(config, service_name)?;
    Ok(Arc::new(OtelTracer::new(tracer)))
}

/// Decorate `service` and lift it into the endpoint set.
pub fn make_endpoints<S>(service: S, tracer: Arc<dyn Tracer>, service_name: &str) -> Endpoints
where
    S: Service + 'static,
{
    let service = Arc::new(ServiceBuilder::new().layer(ServiceLoggingLayer).service(service));

    // ServiceBuilder applies layers outside-in: tracing wraps logging wraps the adapter.
    let authorise = ServiceBuilder::new()
        .layer(TracingLayer::new(tracer, AUTHORISE_OPERATION, service_name))
        .layer(LoggingLayer)
        .service(AuthoriseEndpoint::new(service.clone()));

    let health = HealthEndpoint::new(service);

    Endpoints {
        authorise: Arc::new(authorise),
        health: Arc::new(health),
    }
}

/// Build the endpoint chain, metrics and router from configuration.
pub fn wire_up(config: &PaymentConfig, tracer: Arc<dyn Tracer>) -> Result<App, WiringError> {
    let service = AuthorisationService::new(
        config.service.decline_over_amount,
        config.service.health_name.clone(),
    );
    let endpoints = make_endpoints(service, tracer, &config.service.name);
    let metrics = HttpMetrics::new()?;
    let router = make_router(endpoints.clone(), metrics.clone(), config);

    tracing::info!(
        service = %config.service.name,
        decline_over_amount = config.service.decline_over_amount,
        tracing_enabled = config.tracing.enabled,
        "Endpoints wired"
    );

    Ok(App {
        endpoints,
        metrics,
        router,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::{AuthoriseRequest, Request, Response};
    use crate::observability::trace::Context;

    #[test]
    fn test_wire_up_builds_working_endpoints() {
        let app = wire_up(&PaymentConfig::default(), Arc::new(NoopTracer)).unwrap();

        let response = app
            .endpoints
            .authorise
            .call(
                &Context::background(),
                Request::Authorise(AuthoriseRequest { amount: 10.0 }),
            )
            .unwrap();
        assert!(matches!(response, Response::Authorise(r) if r.authorisation.authorised));

        let response = app
            .endpoints
            .health
            .call(&Context::background(), Request::Health)
            .unwrap();
        assert!(matches!(response, Response::Health(r) if r.health.len() == 1));
    }

    #[tokio::test]
    async fn test_make_tracer_respects_config() {
        let disabled = make_tracer(
            &TracingConfig {
                enabled: false,
                ..TracingConfig::default()
            },
            "payment",
        )
        .unwrap();
        let span = disabled.start_span(&Context::background(), "op");
        assert!(matches!(
            span.context(),
            crate::observability::trace::SpanContext::Opaque(_)
        ));
        span.finish();

        // Unsampled, so nothing is sent to the unreachable collector.
        let enabled = make_tracer(
            &TracingConfig {
                sample: false,
                ..TracingConfig::default()
            },
            "payment",
        )
        .unwrap();
        let span = enabled.start_span(&Context::background(), "op");
        assert!(matches!(
            span.context(),
            crate::observability::trace::SpanContext::Otel(cx) if cx.is_valid() && !cx.is_sampled()
        ));
        span.finish();
    }
}
