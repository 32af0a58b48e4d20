//! Endpoint layer: uniform call shape over the payment service.
//!
//! # Data Flow
//! ```text
//! transport decode
//!     → spans.rs (Traced: start span, attach to Context, finish on drop)
//!     → logging.rs (Logging: one correlated line for Authorise responses)
//!     → adapter.rs (AuthoriseEndpoint / HealthEndpoint → payment::Service)
//! ```
//!
//! # Design Decisions
//! - Requests and responses are closed enums, so decorators decide what to do
//!   with an exhaustive match instead of a runtime type check
//! - Business failures live inside `AuthoriseResponse::err`; `EndpointError` is
//!   reserved for requests the adapter cannot handle
//! - Decorators are `tower::Layer`s composed once at startup; the finished
//!   chain is immutable and shared by all requests

pub mod adapter;
pub mod logging;
pub mod spans;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::trace::Context;
use crate::payment::{Authorisation, Health, PaymentError};

pub use adapter::{AuthoriseEndpoint, HealthEndpoint};
pub use logging::{Logging, LoggingLayer};
pub use spans::{Traced, TracingLayer};

/// Input of the Authorise endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthoriseRequest {
    /// Total amount of the transaction.
    pub amount: f32,
}

/// Output of the Authorise endpoint: the decision plus any business error.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthoriseResponse {
    pub authorisation: Authorisation,
    pub err: Option<PaymentError>,
}

/// Output of the Health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    pub health: Vec<Health>,
}

/// Every request an endpoint may receive.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    Authorise(AuthoriseRequest),
    Health,
}

impl Request {
    pub fn name(&self) -> &'static str {
        match self {
            Request::Authorise(_) => "Authorise",
            Request::Health => "Health",
        }
    }
}

/// Every response an endpoint may produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Authorise(AuthoriseResponse),
    Health(HealthResponse),
}

/// Failures of the endpoint call itself, as opposed to business outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    #[error("{endpoint} endpoint cannot handle a {received} request")]
    UnexpectedRequest {
        endpoint: &'static str,
        received: &'static str,
    },
}

/// A callable unit: `(context, request) -> (response, error)`.
pub trait Endpoint: Send + Sync {
    fn call(&self, ctx: &Context, request: Request) -> Result<Response, EndpointError>;
}

impl<E: Endpoint + ?Sized> Endpoint for Arc<E> {
    fn call(&self, ctx: &Context, request: Request) -> Result<Response, EndpointError> {
        (**self).call(ctx, request)
    }
}

impl<E: Endpoint + ?Sized> Endpoint for Box<E> {
    fn call(&self, ctx: &Context, request: Request) -> Result<Response, EndpointError> {
        (**self).call(ctx, request)
    }
}

/// Type-erased endpoint shared across requests.
pub type SharedEndpoint = Arc<dyn Endpoint>;

/// The fully decorated endpoint set handed to the transport.
#[derive(Clone)]
pub struct Endpoints {
    pub authorise: SharedEndpoint,
    pub health: SharedEndpoint,
}
