//! Payment authorisation domain.
//!
//! # Data Flow
//! ```text
//! endpoint adapter
//!     → logging.rs (LoggingService: one record per Authorise call)
//!     → service.rs (AuthorisationService: decline-threshold rule)
//!     → types.rs (Authorisation, Health, PaymentError)
//! ```
//!
//! # Design Decisions
//! - `Service` is the only seam between the business rule and everything above it
//! - Business failures are values (`PaymentError`), never panics
//! - Health is never logged at this layer; it is polled far too often to be useful

pub mod logging;
pub mod service;
pub mod types;

pub use logging::{LoggingService, ServiceLoggingLayer};
pub use service::{AuthorisationService, Service};
pub use types::{Authorisation, Health, PaymentError};
