//! Upstream client for the Technitium HTTP API.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::trace;

use crate::api::decode_envelope;
use crate::config::{ScrapeContext, TechnitiumConfig};
use crate::error::{UpstreamError, UpstreamFailure, UpstreamResult};

/// Query parameters of a single request.
pub type Query = Vec<(&'static str, String)>;

/// The upstream calls issued on every scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Endpoint {
    DashboardStats,
    TopClients,
    TopDomains,
    TopBlockedDomains,
    Zones,
    DhcpLeases,
}

impl Endpoint {
    pub const ALL: [Endpoint; 6] = [
        Endpoint::DashboardStats,
        Endpoint::TopClients,
        Endpoint::TopDomains,
        Endpoint::TopBlockedDomains,
        Endpoint::Zones,
        Endpoint::DhcpLeases,
    ];

    /// Name used in logs and in the `endpoint` label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::DashboardStats => "dashboard_stats",
            Endpoint::TopClients => "top_clients",
            Endpoint::TopDomains => "top_domains",
            Endpoint::TopBlockedDomains => "top_blocked_domains",
            Endpoint::Zones => "zones",
            Endpoint::DhcpLeases => "dhcp_leases",
        }
    }

    /// API path relative to the base URL.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::DashboardStats => "/api/dashboard/stats/get",
            Endpoint::TopClients | Endpoint::TopDomains | Endpoint::TopBlockedDomains => {
                "/api/dashboard/stats/getTop"
            }
            Endpoint::Zones => "/api/zones/list",
            Endpoint::DhcpLeases => "/api/dhcp/leases/list",
        }
    }

    /// `statsType` value for the top-list endpoints.
    fn stats_type(&self) -> Option<&'static str> {
        match self {
            Endpoint::TopClients => Some("TopClients"),
            Endpoint::TopDomains => Some("TopDomains"),
            Endpoint::TopBlockedDomains => Some("TopBlockedDomains"),
            _ => None,
        }
    }

    /// Endpoint-specific query parameters. The token is added by the transport.
    pub fn query(&self, ctx: &ScrapeContext) -> Query {
        let mut query = Query::new();

        if let Some(node) = &ctx.node_label {
            query.push(("node", node.clone()));
        }

        match self {
            Endpoint::DashboardStats => {
                query.push(("type", ctx.stats_range.as_str().to_string()));
                query.push(("utc", "true".to_string()));
            }
            Endpoint::TopClients | Endpoint::TopDomains | Endpoint::TopBlockedDomains => {
                query.push(("type", ctx.stats_range.as_str().to_string()));
                if let Some(stats_type) = self.stats_type() {
                    query.push(("statsType", stats_type.to_string()));
                }
                query.push(("limit", ctx.top_limit.to_string()));
            }
            Endpoint::Zones => {
                query.push(("pageNumber", "1".to_string()));
                query.push(("pageSize", ctx.zone_page_size.to_string()));
            }
            Endpoint::DhcpLeases => {}
        }

        query
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Issues a single GET and returns the response body.
///
/// Implementations map every failure to an [`UpstreamError`]; nothing panics
/// or escapes as another error type.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        endpoint: Endpoint,
        query: Query,
    ) -> impl Future<Output = Result<String, UpstreamError>> + Send;
}

/// reqwest-backed transport with token authentication.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    /// Build a transport from the API settings.
    ///
    /// One pooled client is shared by all calls; the timeout applies per call.
    pub fn new(config: &TechnitiumConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(
                "TechnitiumPrometheusExporter/",
                env!("CARGO_PKG_VERSION")
            ))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    async fn send(&self, endpoint: Endpoint, mut query: Query) -> Result<String, UpstreamError> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        query.push(("token", self.token.clone()));

        let response = self.client.get(&url).query(&query).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(UpstreamError::Auth(format!("HTTP {}", status.as_u16())));
        }
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, endpoint: Endpoint, query: Query) -> Result<String, UpstreamError> {
        self.send(endpoint, query)
            .await
            .map_err(|e| e.redact(&self.token))
    }
}

/// Typed access to the API on top of a [`Transport`].
pub struct UpstreamClient<T: Transport = HttpTransport> {
    transport: T,
}

impl<T: Transport> UpstreamClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Call `endpoint` and decode its `response` object as `P`.
    pub async fn fetch<P: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        ctx: &ScrapeContext,
    ) -> UpstreamResult<P> {
        trace!(endpoint = %endpoint, "Calling upstream");

        let body = self
            .transport
            .get(endpoint, endpoint.query(ctx))
            .await
            .map_err(|e| UpstreamFailure::new(endpoint, e))?;

        decode_envelope(&body).map_err(|e| UpstreamFailure::new(endpoint, e))
    }
}
