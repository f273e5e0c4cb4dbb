//! Typed payloads of the Technitium HTTP API.
//!
//! Every response is wrapped in an [`Envelope`]; the structs below describe
//! the `response` object of each endpoint. Fields the exporter does not use
//! are ignored, and fields it does use are optional or defaulted so that a
//! shape change upstream degrades to zero values instead of a decode error.
//! The dashboard `stats` object is the exception: without it the reply is
//! not a dashboard reply at all and decoding fails.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::UpstreamError;

/// Common wrapper around every API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub status: Option<String>,
    pub response: Option<Value>,
    pub error_message: Option<String>,
}

/// Decode a response body, checking the envelope status first.
pub fn decode_envelope<P: DeserializeOwned>(body: &str) -> Result<P, UpstreamError> {
    let envelope: Envelope = serde_json::from_str(body)?;

    match envelope.status.as_deref() {
        Some("ok") => {}
        Some("invalid-token") => {
            return Err(UpstreamError::Auth(
                envelope
                    .error_message
                    .unwrap_or_else(|| "invalid token".to_string()),
            ));
        }
        Some(status) => {
            return Err(UpstreamError::Api {
                status: status.to_string(),
                message: envelope.error_message.unwrap_or_default(),
            });
        }
        None => {
            return Err(UpstreamError::Decode("missing status field".to_string()));
        }
    }

    let response = envelope
        .response
        .ok_or_else(|| UpstreamError::Decode("missing response object".to_string()))?;

    Ok(serde_json::from_value(response)?)
}

/// `/api/dashboard/stats/get`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: QueryStats,
    #[serde(default)]
    pub query_response_chart_data: Option<ChartData>,
    #[serde(default)]
    pub query_type_chart_data: Option<ChartData>,
    #[serde(default)]
    pub protocol_type_chart_data: Option<ChartData>,
}

/// Window totals and inventory counters of the dashboard.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryStats {
    pub total_queries: f64,
    pub total_no_error: f64,
    pub total_server_failure: f64,
    pub total_nx_domain: f64,
    pub total_refused: f64,
    pub total_authoritative: f64,
    pub total_recursive: f64,
    pub total_cached: f64,
    pub total_blocked: f64,
    pub total_dropped: f64,
    pub total_clients: f64,
    pub zones: f64,
    pub cached_entries: f64,
    pub allowed_zones: f64,
    pub blocked_zones: f64,
    pub allow_list_zones: f64,
    pub block_list_zones: f64,
}

/// Chart.js shaped breakdown: labels paired with the first dataset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub data: Vec<f64>,
}

impl ChartData {
    /// Label/value pairs of the first dataset.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, f64)> {
        let data = self
            .datasets
            .first()
            .map(|dataset| dataset.data.as_slice())
            .unwrap_or_default();
        self.labels
            .iter()
            .map(String::as_str)
            .zip(data.iter().copied())
    }
}

/// `/api/dashboard/stats/getTop?statsType=TopClients`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopClientsResponse {
    pub top_clients: Vec<TopClient>,
}

/// `/api/dashboard/stats/getTop?statsType=TopDomains`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopDomainsResponse {
    pub top_domains: Vec<TopDomain>,
}

/// `/api/dashboard/stats/getTop?statsType=TopBlockedDomains`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopBlockedDomainsResponse {
    pub top_blocked_domains: Vec<TopDomain>,
}

/// A top client. `name` is the client address, `domain` its reverse name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopClient {
    pub name: String,
    pub domain: Option<String>,
    pub hits: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TopDomain {
    pub name: String,
    pub hits: f64,
}

/// `/api/zones/list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZoneList {
    pub zones: Vec<Zone>,
    pub total_zones: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Zone {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub zone_type: Option<String>,
    pub disabled: bool,
    pub internal: bool,
    pub soa_serial: Option<u64>,
}

/// `/api/dhcp/leases/list`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DhcpLeaseList {
    pub leases: Vec<DhcpLease>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DhcpLease {
    pub scope: Option<String>,
    #[serde(rename = "type")]
    pub lease_type: Option<String>,
}
