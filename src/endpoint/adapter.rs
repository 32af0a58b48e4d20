//! Adapters lifting `payment::Service` operations into [`Endpoint`]s.

use crate::endpoint::{
    AuthoriseResponse, Endpoint, EndpointError, HealthResponse, Request, Response,
};
use crate::observability::trace::Context;
use crate::payment::{Authorisation, Service};

/// Endpoint backed by [`Service::authorise`].
///
/// Business errors are embedded in the response; only a request of the wrong
/// kind fails the call.
#[derive(Debug, Clone)]
pub struct AuthoriseEndpoint<S> {
    service: S,
}

impl<S> AuthoriseEndpoint<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S: Service> Endpoint for AuthoriseEndpoint<S> {
    fn call(&self, _ctx: &Context, request: Request) -> Result<Response, EndpointError> {
        let request = match request {
            Request::Authorise(request) => request,
            other => {
                return Err(EndpointError::UnexpectedRequest {
                    endpoint: "Authorise",
                    received: other.name(),
                })
            }
        };

        let (authorisation, err) = match self.service.authorise(request.amount) {
            Ok(authorisation) => (authorisation, None),
            Err(err) => (Authorisation::default(), Some(err)),
        };

        Ok(Response::Authorise(AuthoriseResponse { authorisation, err }))
    }
}

/// Endpoint backed by [`Service::health`]. Accepts any request.
#[derive(Debug, Clone)]
pub struct HealthEndpoint<S> {
    service: S,
}

impl<S> HealthEndpoint<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

impl<S: Service> Endpoint for HealthEndpoint<S> {
    fn call(&self, _ctx: &Context, _request: Request) -> Result<Response, EndpointError> {
        Ok(Response::Health(HealthResponse {
            health: self.service.health(),
        }))
    }
}
