//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use crate::config::validation::ValidationError;

/// Root configuration for the payment service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PaymentConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Service identity and business rule settings.
    pub service: ServiceConfig,

    /// Distributed tracing settings.
    pub tracing: TracingConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl ListenerConfig {
    /// Replace the port of the bind address.
    pub fn set_port(&mut self, port: u16) -> Result<(), ValidationError> {
        let mut addr = self
            .bind_address
            .parse::<SocketAddr>()
            .map_err(|_| ValidationError::BindAddress(self.bind_address.clone()))?;
        addr.set_port(port);
        self.bind_address = addr.to_string();
        Ok(())
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Service identity and authorisation rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name used to tag spans.
    pub name: String,

    /// Name reported by the health endpoint.
    pub health_name: String,

    /// Amounts strictly above this value are declined.
    pub decline_over_amount: f32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "payment".to_string(),
            health_name: "auth-service".to_string(),
            decline_over_amount: 105.0,
        }
    }
}

/// Distributed tracing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Enable span reporting. When disabled a no-op tracer is used.
    pub enabled: bool,

    /// Sampling decision for root spans. Spans joining a caller's trace
    /// follow the caller's decision.
    pub sample: bool,

    /// OTLP gRPC collector endpoint spans are exported to.
    pub otlp_endpoint: String,

    /// Export timeout in seconds.
    pub export_timeout_secs: u64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            sample: true,
            otlp_endpoint: "http://localhost:4317".to_string(),
            export_timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable key=value lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024, // 64KB
        }
    }
}
