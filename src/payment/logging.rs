//! Service-level logging decorator.
//!
//! # Responsibilities
//! - Emit one structured record per `authorise` call
//! - Pass `health` through untouched
//!
//! # Design Decisions
//! - The record is written from a drop guard, so it is emitted even when the
//!   wrapped call unwinds
//! - Fields: `method`, `amount`, `result`, `err`, `took`

use std::time::{Duration, Instant};

use tower::Layer;

use crate::payment::service::Service;
use crate::payment::types::{Authorisation, Health, PaymentError};

/// Layer producing [`LoggingService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceLoggingLayer;

impl<S> Layer<S> for ServiceLoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        LoggingService::new(inner)
    }
}

/// Logs every `authorise` call made through the wrapped service.
#[derive(Debug, Clone)]
pub struct LoggingService<S> {
    next: S,
}

impl<S> LoggingService<S> {
    pub fn new(next: S) -> Self {
        Self { next }
    }

    pub fn get_ref(&self) -> &S {
        &self.next
    }
}

impl<S: Service> Service for LoggingService<S> {
    fn authorise(&self, amount: f32) -> Result<Authorisation, PaymentError> {
        let mut record = AuthoriseRecord::begin(amount);
        let result = self.next.authorise(amount);
        record.complete(&result);
        result
    }

    fn health(&self) -> Vec<Health> {
        self.next.health()
    }
}

/// Pending log record for one `authorise` call, written on drop.
struct AuthoriseRecord {
    amount: f32,
    begin: Instant,
    outcome: Option<(bool, Option<String>)>,
}

impl AuthoriseRecord {
    fn begin(amount: f32) -> Self {
        Self {
            amount,
            begin: Instant::now(),
            outcome: None,
        }
    }

    fn complete(&mut self, result: &Result<Authorisation, PaymentError>) {
        self.outcome = Some(match result {
            Ok(auth) => (auth.authorised, None),
            Err(err) => (false, Some(err.to_string())),
        });
    }
}

impl Drop for AuthoriseRecord {
    fn drop(&mut self) {
        let took: Duration = self.begin.elapsed();
        match self.outcome.take() {
            Some((authorised, err)) => tracing::info!(
                method = "Authorise",
                amount = self.amount,
                result = authorised,
                err = err.as_deref(),
                took = ?took,
                "service call"
            ),
            None => tracing::warn!(
                method = "Authorise",
                amount = self.amount,
                took = ?took,
                "service call did not complete"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payment::service::AuthorisationService;

    #[test]
    fn test_behaviour_is_unchanged() {
        let inner = AuthorisationService::new(100.0, "auth-service");
        let logged = ServiceLoggingLayer.layer(inner.clone());

        for amount in [0.0, 50.0, 100.0, 150.0] {
            assert_eq!(logged.authorise(amount), inner.authorise(amount));
        }
        assert_eq!(logged.health(), inner.health());
    }
}
