//! HTTP server setup.
//!
//! # Responsibilities
//! - Assemble the application through the composition root
//! - Bind the router to a listener
//! - Drain in-flight requests on shutdown

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::PaymentConfig;
use crate::observability::metrics::HttpMetrics;
use crate::observability::trace::Tracer;
use crate::wiring::{wire_up, WiringError};

/// HTTP server for the payment service.
pub struct HttpServer {
    router: Router,
    metrics: HttpMetrics,
    config: PaymentConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and tracer.
    pub fn new(config: PaymentConfig, tracer: Arc<dyn Tracer>) -> Result<Self, WiringError> {
        let app = wire_up(&config, tracer)?;
        Ok(Self {
            router: app.router,
            metrics: app.metrics,
            config,
        })
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router serving this server's routes.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The metrics recorder shared with the instrumentation middleware.
    pub fn metrics(&self) -> &HttpMetrics {
        &self.metrics
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &PaymentConfig {
        &self.config
    }
}
