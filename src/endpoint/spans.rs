//! Endpoint-level tracing decorator.
//!
//! # Responsibilities
//! - Start one span per call, named after the logical operation
//! - Tag it with the owning service
//! - Hand the wrapped endpoint a context carrying the span
//! - Finish the span on every exit path
//!
//! # Design Decisions
//! - The span is owned by a drop guard, so it is finished exactly once even if
//!   the wrapped call unwinds
//! - Endpoint errors are tagged on the span but returned untouched

use std::sync::Arc;

use tower::Layer;

use crate::endpoint::{Endpoint, EndpointError, Request, Response};
use crate::observability::trace::{Context, Span, Tracer};

/// Layer producing [`Traced`].
#[derive(Clone)]
pub struct TracingLayer {
    tracer: Arc<dyn Tracer>,
    operation: Arc<str>,
    service: Arc<str>,
}

impl TracingLayer {
    pub fn new(tracer: Arc<dyn Tracer>, operation: &str, service: &str) -> Self {
        Self {
            tracer,
            operation: Arc::from(operation),
            service: Arc::from(service),
        }
    }
}

impl<E> Layer<E> for TracingLayer {
    type Service = Traced<E>;

    fn layer(&self, inner: E) -> Self::Service {
        Traced {
            next: inner,
            tracer: self.tracer.clone(),
            operation: self.operation.clone(),
            service: self.service.clone(),
        }
    }
}

pub struct Traced<E> {
    next: E,
    tracer: Arc<dyn Tracer>,
    operation: Arc<str>,
    service: Arc<str>,
}

impl<E: Endpoint> Endpoint for Traced<E> {
    fn call(&self, ctx: &Context, request: Request) -> Result<Response, EndpointError> {
        let mut span = self.tracer.start_span(ctx, &self.operation);
        span.set_tag("service", self.service.to_string());
        span.set_tag("span.kind", "server".to_string());

        let ctx = ctx.with_span(span.context());
        let mut guard = FinishOnDrop(Some(span));

        let result = self.next.call(&ctx, request);
        if let Err(err) = &result {
            guard.tag("error", err.to_string());
        }
        result
    }
}

struct FinishOnDrop(Option<Box<dyn Span>>);

impl FinishOnDrop {
    fn tag(&mut self, key: &'static str, value: String) {
        if let Some(span) = self.0.as_mut() {
            span.set_tag(key, value);
        }
    }
}

impl Drop for FinishOnDrop {
    fn drop(&mut self) {
        if let Some(span) = self.0.take() {
            span.finish();
        }
    }
}
