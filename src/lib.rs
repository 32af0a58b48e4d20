//! Payment authorisation service.
//!
//! An authorise/health service wrapped in a fixed chain of cross-cutting
//! decorators: distributed tracing, trace-correlated structured logging and
//! HTTP metrics instrumentation.

pub mod config;
pub mod endpoint;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payment;
pub mod wiring;

pub use config::PaymentConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
