//! Endpoint-level logging with trace correlation.
//!
//! Only Authorise responses produce a line; every other outcome, including an
//! endpoint error, passes through silently and unchanged.

use std::time::Instant;

use tower::Layer;

use crate::endpoint::{Endpoint, EndpointError, Request, Response};
use crate::observability::trace::{extract_trace_ids, Context};

/// Layer producing [`Logging`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer;

impl<E> Layer<E> for LoggingLayer {
    type Service = Logging<E>;

    fn layer(&self, inner: E) -> Self::Service {
        Logging { next: inner }
    }
}

#[derive(Debug, Clone)]
pub struct Logging<E> {
    next: E,
}

impl<E: Endpoint> Endpoint for Logging<E> {
    fn call(&self, ctx: &Context, request: Request) -> Result<Response, EndpointError> {
        let begin = Instant::now();
        let result = self.next.call(ctx, request);

        match &result {
            Ok(Response::Authorise(response)) => {
                let (trace_id, span_id) = extract_trace_ids(ctx);
                let err = response.err.as_ref().map(ToString::to_string);
                tracing::info!(
                    traceid = %trace_id,
                    spanid = %span_id,
                    method = "Authorise",
                    result = response.authorisation.authorised,
                    err = err.as_deref(),
                    took = ?begin.elapsed(),
                    "endpoint call"
                );
            }
            Ok(Response::Health(_)) | Err(_) => {}
        }

        result
    }
}
