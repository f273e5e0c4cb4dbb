//! Configuration for the Technitium exporter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] json5::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Upstream Technitium API settings.
    #[serde(default)]
    pub technitium: TechnitiumConfig,

    /// Prometheus endpoint settings.
    #[serde(default)]
    pub prometheus: PrometheusConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Statistics window requested from the dashboard API.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatsRange {
    #[default]
    LastHour,
    LastDay,
    LastWeek,
    LastMonth,
    LastYear,
    /// Explicit start/end range. Forwarded as-is; no start/end is sent.
    Custom,
}

impl StatsRange {
    /// Value of the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsRange::LastHour => "LastHour",
            StatsRange::LastDay => "LastDay",
            StatsRange::LastWeek => "LastWeek",
            StatsRange::LastMonth => "LastMonth",
            StatsRange::LastYear => "LastYear",
            StatsRange::Custom => "Custom",
        }
    }
}

impl fmt::Display for StatsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lasthour" => Ok(StatsRange::LastHour),
            "lastday" => Ok(StatsRange::LastDay),
            "lastweek" => Ok(StatsRange::LastWeek),
            "lastmonth" => Ok(StatsRange::LastMonth),
            "lastyear" => Ok(StatsRange::LastYear),
            "custom" => Ok(StatsRange::Custom),
            _ => Err(format!("unknown stats range: {}", s)),
        }
    }
}

/// Technitium API connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnitiumConfig {
    /// Base URL of the DNS server web console (default: "http://technitium:5380").
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API token sent with every request.
    #[serde(default)]
    pub token: String,

    /// Statistics window for dashboard and top-list calls.
    #[serde(default)]
    pub stats_range: StatsRange,

    /// Maximum entries requested per top list (default: 50).
    #[serde(default = "default_top_limit")]
    pub top_limit: u32,

    /// Cluster node to query, also exported as the `node` label.
    #[serde(default)]
    pub node: Option<String>,

    /// Verify the server TLS certificate (default: true).
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,

    /// Per-request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Page size for the zone listing (default: 1000).
    #[serde(default = "default_zone_page_size")]
    pub zone_page_size: u32,
}

fn default_base_url() -> String {
    "http://technitium:5380".to_string()
}

fn default_top_limit() -> u32 {
    50
}

fn default_verify_tls() -> bool {
    true
}

fn default_timeout() -> u64 {
    10
}

fn default_zone_page_size() -> u32 {
    1000
}

impl Default for TechnitiumConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
            stats_range: StatsRange::default(),
            top_limit: default_top_limit(),
            node: None,
            verify_tls: default_verify_tls(),
            timeout_secs: default_timeout(),
            zone_page_size: default_zone_page_size(),
        }
    }
}

/// Prometheus HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrometheusConfig {
    /// Address to listen on (default: "0.0.0.0:9105").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,

    /// Value of the `server` label on every sample (default: "technitium").
    #[serde(default = "default_server_label")]
    pub server_label: String,
}

fn default_listen() -> String {
    "0.0.0.0:9105".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

fn default_server_label() -> String {
    "technitium".to_string()
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
            server_label: default_server_label(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Per-scrape parameters derived from the configuration.
///
/// Built once at startup and shared read-only by every scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeContext {
    pub server_label: String,
    pub node_label: Option<String>,
    pub stats_range: StatsRange,
    pub top_limit: u32,
    pub zone_page_size: u32,
}

impl ScrapeContext {
    pub fn from_config(config: &ExporterConfig) -> Self {
        Self {
            server_label: config.prometheus.server_label.clone(),
            node_label: config
                .technitium
                .node
                .clone()
                .filter(|node| !node.is_empty()),
            stats_range: config.technitium.stats_range,
            top_limit: config.technitium.top_limit,
            zone_page_size: config.technitium.zone_page_size,
        }
    }
}

impl Default for ScrapeContext {
    fn default() -> Self {
        Self::from_config(&ExporterConfig::default())
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    ///
    /// The result is not validated; call [`ExporterConfig::validate`] once
    /// command-line and environment overrides have been applied.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: ExporterConfig = json5::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Trim the trailing slash off the base URL so paths can be appended.
    pub fn normalize(&mut self) {
        let trimmed = self.technitium.base_url.trim_end_matches('/').len();
        self.technitium.base_url.truncate(trimmed);
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.technitium.token.is_empty() {
            return Err(ConfigError::Validation(
                "technitium.token is required".to_string(),
            ));
        }

        if self.technitium.top_limit == 0 {
            return Err(ConfigError::Validation("top_limit must be > 0".to_string()));
        }

        if self.technitium.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        if self.technitium.zone_page_size == 0 {
            return Err(ConfigError::Validation(
                "zone_page_size must be > 0".to_string(),
            ));
        }

        match reqwest::Url::parse(&self.technitium.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(ConfigError::Validation(format!(
                    "Invalid base URL: {}",
                    self.technitium.base_url
                )));
            }
        }

        // Validate listen address format
        if self
            .prometheus
            .listen
            .parse::<std::net::SocketAddr>()
            .is_err()
        {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.prometheus.listen
            )));
        }

        if !self.prometheus.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        if self.prometheus.server_label.is_empty() {
            return Err(ConfigError::Validation(
                "server_label must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
