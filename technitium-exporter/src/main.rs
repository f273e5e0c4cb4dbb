//! Prometheus exporter for Technitium DNS Server.

use std::sync::Arc;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use tokio::sync::watch;
use tracing::{error, info, warn};

use technitium_exporter::{
    ExporterConfig, HttpServer, HttpTransport, ScrapeCollector, ScrapeContext, StatsRange,
    UpstreamClient, init_tracing,
};

/// Prometheus exporter for Technitium DNS Server.
///
/// Settings from the configuration file are overridden by command-line
/// arguments and their environment variables.
#[derive(Parser, Debug)]
#[command(name = "technitium-exporter")]
#[command(about = "Export Technitium DNS Server statistics as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// HTTP listen port on all interfaces (ignored when --listen is given).
    #[arg(long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Technitium web console base URL.
    #[arg(long, env = "TECHNITIUM_BASE_URL")]
    base_url: Option<String>,

    /// Technitium API token.
    #[arg(long, env = "TECHNITIUM_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Statistics window (LastHour, LastDay, LastWeek, LastMonth, LastYear, Custom).
    #[arg(long, env = "TECHNITIUM_STATS_RANGE")]
    stats_range: Option<StatsRange>,

    /// Maximum entries per top list.
    #[arg(long, env = "TECHNITIUM_TOP_LIMIT")]
    top_limit: Option<u32>,

    /// Cluster node to query.
    #[arg(long, env = "TECHNITIUM_NODE")]
    node: Option<String>,

    /// Value of the `server` label.
    #[arg(long, env = "SERVER_LABEL")]
    server_label: Option<String>,

    /// Verify the Technitium TLS certificate (true/false, yes/no, 1/0; any case).
    #[arg(
        long,
        env = "TECHNITIUM_VERIFY_SSL",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new()
    )]
    verify_tls: Option<bool>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, config: &mut ExporterConfig) {
        if let Some(listen) = self.listen {
            config.prometheus.listen = listen;
        } else if let Some(port) = self.port {
            config.prometheus.listen = format!("0.0.0.0:{}", port);
        }
        if let Some(base_url) = self.base_url {
            config.technitium.base_url = base_url;
        }
        if let Some(token) = self.token {
            config.technitium.token = token;
        }
        if let Some(stats_range) = self.stats_range {
            config.technitium.stats_range = stats_range;
        }
        if let Some(top_limit) = self.top_limit {
            config.technitium.top_limit = top_limit;
        }
        if let Some(node) = self.node {
            config.technitium.node = Some(node);
        }
        if let Some(server_label) = self.server_label {
            config.prometheus.server_label = server_label;
        }
        if let Some(verify_tls) = self.verify_tls {
            config.technitium.verify_tls = verify_tls;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level.to_lowercase();
        }
        config.normalize();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };
    args.apply(&mut config);

    init_tracing(&config.logging)?;
    config.validate()?;

    let context = ScrapeContext::from_config(&config);

    info!(
        base_url = %config.technitium.base_url,
        server = %context.server_label,
        stats_range = %context.stats_range,
        top_limit = context.top_limit,
        "Starting Technitium exporter"
    );
    if context.stats_range == StatsRange::Custom {
        warn!("Custom stats range is sent without start/end; the dashboard call may fail");
    }
    if !config.technitium.verify_tls {
        warn!("TLS certificate verification is disabled");
    }

    let transport = HttpTransport::new(&config.technitium)?;
    let collector = Arc::new(ScrapeCollector::new(
        UpstreamClient::new(transport),
        context,
    ));

    let listen_addr = config
        .prometheus
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(
        collector.clone(),
        listen_addr,
        config.prometheus.path.clone(),
    );
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.run(shutdown_rx).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Wait for shutdown signal
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    shutdown_tx.send(true)?;

    let _ = tokio::time::timeout(Duration::from_secs(5), http_task).await;

    let stats = collector.stats();
    info!(
        scrapes_total = stats.scrapes_total,
        endpoint_failures = ?stats.endpoint_failures,
        "Final statistics"
    );

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
