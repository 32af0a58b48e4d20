//! The payment service boundary and its decline-threshold implementation.

use std::sync::Arc;

use crate::payment::types::{Authorisation, Health, PaymentError};

/// Capability consumed by the endpoint layer.
///
/// Implementations must be shareable across concurrent requests.
pub trait Service: Send + Sync {
    /// Decide whether `amount` can be authorised.
    fn authorise(&self, amount: f32) -> Result<Authorisation, PaymentError>;

    /// Report the health of the service and its dependencies.
    fn health(&self) -> Vec<Health>;
}

impl<S: Service + ?Sized> Service for Arc<S> {
    fn authorise(&self, amount: f32) -> Result<Authorisation, PaymentError> {
        (**self).authorise(amount)
    }

    fn health(&self) -> Vec<Health> {
        (**self).health()
    }
}

impl<S: Service + ?Sized> Service for Box<S> {
    fn authorise(&self, amount: f32) -> Result<Authorisation, PaymentError> {
        (**self).authorise(amount)
    }

    fn health(&self) -> Vec<Health> {
        (**self).health()
    }
}

/// Authorises every amount up to and including `decline_over_amount`.
#[derive(Debug, Clone)]
pub struct AuthorisationService {
    decline_over_amount: f32,
    health_name: String,
}

impl AuthorisationService {
    pub fn new(decline_over_amount: f32, health_name: impl Into<String>) -> Self {
        Self {
            decline_over_amount,
            health_name: health_name.into(),
        }
    }

    pub fn decline_over_amount(&self) -> f32 {
        self.decline_over_amount
    }
}

impl Service for AuthorisationService {
    fn authorise(&self, amount: f32) -> Result<Authorisation, PaymentError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        if amount <= self.decline_over_amount {
            Ok(Authorisation::approved("Payment authorised"))
        } else {
            Ok(Authorisation::declined(format!(
                "Payment declined: amount exceeds {:.2}",
                self.decline_over_amount
            )))
        }
    }

    fn health(&self) -> Vec<Health> {
        vec![Health::new(self.health_name.clone(), "ok")]
    }
}
