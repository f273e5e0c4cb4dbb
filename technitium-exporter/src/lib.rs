//! Prometheus exporter for Technitium DNS Server.
//!
//! On every scrape the exporter calls the Technitium HTTP API, translates the
//! JSON responses into gauges and serves them on an HTTP `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │ Technitium API  │<────│    Collector    │<────│   HTTP Server   │
//! │  (/api/...)     │────>│  (translators)  │────>│   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! Upstream calls within a scrape run concurrently. A failed call is logged
//! and drops only its own metrics; `technitium_up` reports whether the
//! dashboard endpoint answered.
//!
//! # Usage
//!
//! ```bash
//! TECHNITIUM_TOKEN=... technitium-exporter --base-url http://dns.lan:5380
//! technitium-exporter --config technitium.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod api;
pub mod client;
pub mod collector;
pub mod config;
pub mod error;
pub mod exposition;
pub mod http;
pub mod model;
pub mod translate;

pub use client::{Endpoint, HttpTransport, Transport, UpstreamClient};
pub use collector::{CollectorStats, ScrapeCollector, SharedCollector};
pub use config::{ExporterConfig, ScrapeContext, StatsRange};
pub use error::{UpstreamError, UpstreamFailure, UpstreamResult};
pub use http::HttpServer;
pub use model::MetricSample;

use config::{ConfigError, LogFormat, LoggingConfig};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| {
                    ConfigError::Validation(format!("Failed to initialize tracing: {}", e))
                })?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| {
                    ConfigError::Validation(format!("Failed to initialize tracing: {}", e))
                })?;
        }
    }

    Ok(())
}
