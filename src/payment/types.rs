//! Payment domain types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Outcome of an authorisation attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Authorisation {
    /// Whether the amount was authorised.
    pub authorised: bool,
    /// Human-readable reason for the decision.
    #[serde(default)]
    pub message: String,
}

impl Authorisation {
    pub fn approved(message: impl Into<String>) -> Self {
        Self {
            authorised: true,
            message: message.into(),
        }
    }

    pub fn declined(message: impl Into<String>) -> Self {
        Self {
            authorised: false,
            message: message.into(),
        }
    }
}

/// Health of one subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub name: String,
    pub status: String,
}

impl Health {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }
}

/// Business-level failures of an authorisation attempt.
///
/// These travel inside the endpoint response payload; they are never
/// returned as the endpoint's own error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PaymentError {
    /// The amount is zero, negative, or not a finite number.
    #[error("invalid payment amount: {0}")]
    InvalidAmount(f32),

    /// The authorisation rule itself failed.
    #[error("authorisation rule failed: {0}")]
    Rule(String),
}
