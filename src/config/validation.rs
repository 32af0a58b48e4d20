//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, threshold finite and positive)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PaymentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::PaymentConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("service.name must not be empty")]
    EmptyServiceName,

    #[error("service.health_name must not be empty")]
    EmptyHealthName,

    #[error("service.decline_over_amount must be a positive finite number, got {0}")]
    DeclineAmount(f32),

    #[error("observability.log_level '{0}' is not a valid level")]
    LogLevel(String),

    #[error("tracing.otlp_endpoint must not be empty when tracing is enabled")]
    OtlpEndpoint,

    #[error("tracing.export_timeout_secs must be greater than zero")]
    ExportTimeout,

    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,

    #[error("limits.max_body_size must be greater than zero")]
    MaxBodySize,
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &PaymentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.service.name.trim().is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    }

    if config.service.health_name.trim().is_empty() {
        errors.push(ValidationError::EmptyHealthName);
    }

    let decline = config.service.decline_over_amount;
    if !decline.is_finite() || decline <= 0.0 {
        errors.push(ValidationError::DeclineAmount(decline));
    }

    if config.observability.log_level.parse::<tracing::Level>().is_err() {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if config.tracing.enabled {
        if config.tracing.otlp_endpoint.trim().is_empty() {
            errors.push(ValidationError::OtlpEndpoint);
        }
        if config.tracing.export_timeout_secs == 0 {
            errors.push(ValidationError::ExportTimeout);
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::MaxBodySize);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
