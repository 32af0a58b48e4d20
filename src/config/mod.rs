//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + CLI overrides
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → PaymentConfig (validated, immutable)
//!     → read once by the composition root
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the endpoint chain is built from it once
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, PaymentConfig, ServiceConfig,
    TimeoutConfig, TracingConfig,
};
pub use validation::{validate_config, ValidationError};
