//! Scrape orchestration: upstream calls, translation and health samples.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::api::{
    DashboardStats, DhcpLeaseList, TopBlockedDomainsResponse, TopClientsResponse,
    TopDomainsResponse, ZoneList,
};
use crate::client::{Endpoint, HttpTransport, Transport, UpstreamClient};
use crate::config::ScrapeContext;
use crate::error::UpstreamResult;
use crate::model::{MetricSample, SCRAPE_DURATION, SampleSet, UP};
use crate::translate::{self, TopLists};

/// Exporter statistics kept for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct CollectorStats {
    /// Scrapes served.
    pub scrapes_total: u64,
    /// Failed upstream calls per endpoint.
    pub endpoint_failures: BTreeMap<Endpoint, u64>,
    /// Whether the most recent scrape reached the dashboard endpoint.
    pub last_scrape_up: bool,
}

impl Default for CollectorStats {
    fn default() -> Self {
        Self {
            scrapes_total: 0,
            endpoint_failures: Endpoint::ALL.iter().map(|e| (*e, 0)).collect(),
            last_scrape_up: false,
        }
    }
}

/// Runs one collection cycle per scrape.
pub struct ScrapeCollector<T: Transport = HttpTransport> {
    client: UpstreamClient<T>,
    context: ScrapeContext,
    stats: RwLock<CollectorStats>,
}

/// Create a shareable collector handle.
pub type SharedCollector<T = HttpTransport> = Arc<ScrapeCollector<T>>;

impl<T: Transport> ScrapeCollector<T> {
    pub fn new(client: UpstreamClient<T>, context: ScrapeContext) -> Self {
        Self {
            client,
            context,
            stats: RwLock::new(CollectorStats::default()),
        }
    }

    pub fn context(&self) -> &ScrapeContext {
        &self.context
    }

    /// Get collector statistics.
    pub fn stats(&self) -> CollectorStats {
        self.stats.read().clone()
    }

    /// Collect one scrape worth of samples.
    ///
    /// Never fails: a failed upstream call is logged and its group contributes
    /// no samples. `technitium_up` and `technitium_scrape_duration_seconds`
    /// are always present.
    pub async fn collect(&self) -> Vec<MetricSample> {
        let started = Instant::now();
        let ctx = &self.context;
        let client = &self.client;

        let (dashboard, top_clients, top_domains, top_blocked, zones, leases) = tokio::join!(
            client.fetch::<DashboardStats>(Endpoint::DashboardStats, ctx),
            client.fetch::<TopClientsResponse>(Endpoint::TopClients, ctx),
            client.fetch::<TopDomainsResponse>(Endpoint::TopDomains, ctx),
            client.fetch::<TopBlockedDomainsResponse>(Endpoint::TopBlockedDomains, ctx),
            client.fetch::<ZoneList>(Endpoint::Zones, ctx),
            client.fetch::<DhcpLeaseList>(Endpoint::DhcpLeases, ctx),
        );

        let mut samples = SampleSet::new();
        let up = dashboard.is_ok();
        samples.push(UP.value(if up { 1.0 } else { 0.0 }));

        if let Some(payload) = self.accept(dashboard) {
            samples.extend(translate::dashboard::translate(&payload, ctx));
        }

        let lists = TopLists {
            clients: self.accept(top_clients).map(|r| r.top_clients),
            domains: self.accept(top_domains).map(|r| r.top_domains),
            blocked_domains: self.accept(top_blocked).map(|r| r.top_blocked_domains),
        };
        samples.extend(translate::top::translate(&lists, ctx));

        if let Some(payload) = self.accept(zones) {
            samples.extend(translate::zones::translate(&payload, ctx));
        }

        if let Some(payload) = self.accept(leases) {
            samples.extend(translate::dhcp::translate(&payload, ctx));
        }

        let elapsed = started.elapsed().as_secs_f64();
        samples.push(SCRAPE_DURATION.value(elapsed));

        {
            let mut stats = self.stats.write();
            stats.scrapes_total += 1;
            stats.last_scrape_up = up;
        }

        debug!(
            up,
            samples = samples.len(),
            duration_secs = elapsed,
            "Scrape complete"
        );

        samples
            .into_samples()
            .into_iter()
            .map(|sample| sample.with_context_labels(ctx))
            .collect()
    }

    /// Unwrap a result, logging and counting the failure otherwise.
    fn accept<P>(&self, result: UpstreamResult<P>) -> Option<P> {
        match result {
            Ok(payload) => Some(payload),
            Err(failure) => {
                error!(
                    endpoint = %failure.endpoint,
                    error = %failure.error,
                    "Upstream request failed"
                );
                *self
                    .stats
                    .write()
                    .endpoint_failures
                    .entry(failure.endpoint)
                    .or_default() += 1;
                None
            }
        }
    }
}
