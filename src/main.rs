//! Payment authorisation service.
//!
//! # Architecture Overview
//!
//! ```text
//!  Client ──▶ instrument (metrics) ──▶ transport decode ──▶ Traced ──▶ Logging
//!                                                                        │
//!                                                                        ▼
//!  Client ◀── instrument (metrics) ◀── transport encode ◀──────── AuthoriseEndpoint
//!                                                                        │
//!                                                                        ▼
//!                                                          LoggingService ──▶ AuthorisationService
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use payment_auth::config::{
    load_config, validate_config, ConfigError, LogFormat, PaymentConfig, ValidationError,
};
use payment_auth::lifecycle::{shutdown_signal, Shutdown};
use payment_auth::observability::{logging, trace};
use payment_auth::wiring::make_tracer;
use payment_auth::HttpServer;

#[derive(Parser)]
#[command(name = "payment-auth")]
#[command(about = "Payment authorisation service", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on, overriding the configured bind address port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Decline payments over this amount.
    #[arg(long)]
    decline: Option<f32>,

    /// Log output format.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Disable span reporting.
    #[arg(long)]
    no_tracing: bool,
}

impl Cli {
    fn apply(&self, config: &mut PaymentConfig) -> Result<(), ValidationError> {
        if let Some(port) = self.port {
            config.listener.set_port(port)?;
        }
        if let Some(decline) = self.decline {
            config.service.decline_over_amount = decline;
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
        if self.no_tracing {
            config.tracing.enabled = false;
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => PaymentConfig::default(),
    };
    cli.apply(&mut config)
        .map_err(|err| ConfigError::Validation(vec![err]))?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability)?;

    tracing::info!(
        bind_address = %config.listener.bind_address,
        decline_over_amount = config.service.decline_over_amount,
        tracing_enabled = config.tracing.enabled,
        "Configuration loaded"
    );

    let tracer = make_tracer(&config.tracing, &config.service.name)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let server = HttpServer::new(config, tracer)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    // Flush spans still buffered in the batch exporter.
    tokio::task::spawn_blocking(trace::shutdown_tracer).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
