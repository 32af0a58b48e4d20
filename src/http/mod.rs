//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → observability::metrics::instrument (latency, in-flight, body sizes)
//!     → TraceLayer / timeout / body limit
//!     → transport.rs (decode JSON, traceparent → Context)
//!     → endpoint chain (wiring.rs)
//!     → transport.rs (encode JSON, map status)
//!     → Send to client
//! ```

pub mod server;
pub mod transport;

pub use server::HttpServer;
pub use transport::{make_router, TransportState};
