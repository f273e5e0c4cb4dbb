//! Metric definitions and per-scrape samples.

use std::collections::HashSet;

use tracing::warn;

use crate::config::ScrapeContext;

/// Prometheus metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Gauge,
}

impl MetricKind {
    /// Get the TYPE comment string for Prometheus exposition format.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Gauge => "gauge",
        }
    }
}

/// Static description of one exported metric.
#[derive(Debug, PartialEq, Eq)]
pub struct MetricDefinition {
    pub name: &'static str,
    pub help: &'static str,
    /// Metric-specific label keys; `server` and `node` are added on top.
    pub labels: &'static [&'static str],
    pub kind: MetricKind,
}

impl MetricDefinition {
    const fn gauge(
        name: &'static str,
        help: &'static str,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            help,
            labels,
            kind: MetricKind::Gauge,
        }
    }

    /// Build a sample, pairing `values` with this metric's label keys in order.
    pub fn sample<I, V>(&self, values: I, value: f64) -> MetricSample
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let labels: Vec<(&'static str, String)> = self
            .labels
            .iter()
            .copied()
            .zip(values.into_iter().map(Into::into))
            .collect();
        debug_assert_eq!(
            labels.len(),
            self.labels.len(),
            "label values do not match the schema of {}",
            self.name
        );

        MetricSample {
            name: self.name,
            labels,
            value,
        }
    }

    /// Build a sample for a metric without labels of its own.
    pub fn value(&self, value: f64) -> MetricSample {
        self.sample(std::iter::empty::<String>(), value)
    }
}

pub static UP: MetricDefinition =
    MetricDefinition::gauge("technitium_up", "Technitium API reachable", &[]);

pub static SCRAPE_DURATION: MetricDefinition = MetricDefinition::gauge(
    "technitium_scrape_duration_seconds",
    "Exporter scrape duration",
    &[],
);

pub static QUERIES_WINDOW: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_queries_window",
    "Queries by result category in the current stats window",
    &["category"],
);

pub static RESPONSE_TYPE: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_response_type_total",
    "Response types in the current stats window",
    &["type"],
);

pub static QUERY_TYPE: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_query_type_total",
    "DNS query types in the current stats window",
    &["qtype"],
);

pub static PROTOCOL: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_protocol_queries",
    "Queries by protocol in the current stats window",
    &["protocol"],
);

pub static CLIENTS_WINDOW: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_clients_window",
    "Distinct clients seen in the current stats window",
    &[],
);

pub static CACHED_ENTRIES: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_cached_entries",
    "Entries in the DNS cache",
    &[],
);

pub static ALLOWED_ZONES: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_allowed_zones",
    "Manually allowed zones",
    &[],
);

pub static BLOCKED_ZONES: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_blocked_zones",
    "Manually blocked zones",
    &[],
);

pub static ALLOWLIST_ZONES: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_allowlist_zones",
    "Zones loaded from allow lists",
    &[],
);

pub static BLOCKLIST_ZONES: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_blocklist_zones",
    "Zones loaded from block lists",
    &[],
);

pub static TOP_CLIENT_HITS: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_top_client_hits",
    "Hits for TopClients",
    &["client_ip", "client_name"],
);

pub static TOP_DOMAIN_HITS: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_top_domain_hits",
    "Hits for TopDomains",
    &["domain"],
);

pub static TOP_BLOCKED_DOMAIN_HITS: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_top_blocked_domain_hits",
    "Hits for TopBlockedDomains",
    &["domain"],
);

pub static ZONE_INFO: MetricDefinition = MetricDefinition::gauge(
    "technitium_zone_info",
    "Zone detailed information",
    &["zone", "type", "disabled", "internal", "serial"],
);

pub static ZONES: MetricDefinition =
    MetricDefinition::gauge("technitium_dns_zones", "Zones hosted by the server", &[]);

pub static ZONES_DISABLED: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_zones_disabled",
    "Disabled zones in the listed page of the zone list",
    &[],
);

pub static ZONES_INTERNAL: MetricDefinition = MetricDefinition::gauge(
    "technitium_dns_zones_internal",
    "Internal zones in the listed page of the zone list",
    &[],
);

pub static DHCP_LEASES: MetricDefinition = MetricDefinition::gauge(
    "technitium_dhcp_leases_total",
    "Number of DHCP leases by scope and type",
    &["scope", "type"],
);

/// Every metric the exporter can emit.
pub static DEFINITIONS: &[&MetricDefinition] = &[
    &UP,
    &SCRAPE_DURATION,
    &QUERIES_WINDOW,
    &RESPONSE_TYPE,
    &QUERY_TYPE,
    &PROTOCOL,
    &CLIENTS_WINDOW,
    &CACHED_ENTRIES,
    &ALLOWED_ZONES,
    &BLOCKED_ZONES,
    &ALLOWLIST_ZONES,
    &BLOCKLIST_ZONES,
    &TOP_CLIENT_HITS,
    &TOP_DOMAIN_HITS,
    &TOP_BLOCKED_DOMAIN_HITS,
    &ZONE_INFO,
    &ZONES,
    &ZONES_DISABLED,
    &ZONES_INTERNAL,
    &DHCP_LEASES,
];

/// Look up a definition by metric name.
pub fn definition(name: &str) -> Option<&'static MetricDefinition> {
    DEFINITIONS.iter().copied().find(|def| def.name == name)
}

/// One value of one series in a single scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: &'static str,
    /// Label pairs in output order.
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl MetricSample {
    /// Look up a label value.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Prepend the `server` label, and `node` when configured.
    pub fn with_context_labels(mut self, ctx: &ScrapeContext) -> Self {
        let mut labels = Vec::with_capacity(self.labels.len() + 2);
        labels.push(("server", ctx.server_label.clone()));
        if let Some(node) = &ctx.node_label {
            labels.push(("node", node.clone()));
        }
        labels.append(&mut self.labels);
        self.labels = labels;
        self
    }

    fn identity(&self) -> (&'static str, Vec<(&'static str, String)>) {
        (self.name, self.labels.clone())
    }
}

/// Samples of one scrape with unique (name, labels) identities.
#[derive(Debug, Default)]
pub struct SampleSet {
    samples: Vec<MetricSample>,
    seen: HashSet<(&'static str, Vec<(&'static str, String)>)>,
}

impl SampleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sample. A repeated identity keeps the first value and is dropped.
    pub fn push(&mut self, sample: MetricSample) -> bool {
        if !self.seen.insert(sample.identity()) {
            warn!(
                metric = sample.name,
                labels = ?sample.labels,
                "Dropping duplicate sample"
            );
            return false;
        }
        self.samples.push(sample);
        true
    }

    pub fn extend<I: IntoIterator<Item = MetricSample>>(&mut self, samples: I) {
        for sample in samples {
            self.push(sample);
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn into_samples(self) -> Vec<MetricSample> {
        self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_pairs_schema_labels() {
        let sample = TOP_CLIENT_HITS.sample(["192.168.1.10", "laptop.lan"], 42.0);

        assert_eq!(sample.name, "technitium_dns_top_client_hits");
        assert_eq!(sample.label("client_ip"), Some("192.168.1.10"));
        assert_eq!(sample.label("client_name"), Some("laptop.lan"));
        assert_eq!(sample.value, 42.0);
    }

    #[test]
    fn test_value_without_labels() {
        let sample = UP.value(1.0);
        assert!(sample.labels.is_empty());
    }

    #[test]
    fn test_context_labels_prepended() {
        let ctx = ScrapeContext {
            node_label: Some("node-1".to_string()),
            ..ScrapeContext::default()
        };
        let sample = QUERIES_WINDOW
            .sample(["all"], 3.0)
            .with_context_labels(&ctx);

        let keys: Vec<_> = sample.labels.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["server", "node", "category"]);
        assert_eq!(sample.label("server"), Some("technitium"));
    }

    #[test]
    fn test_sample_set_rejects_duplicates() {
        let mut set = SampleSet::new();
        assert!(set.push(TOP_DOMAIN_HITS.sample(["example.com"], 5.0)));
        assert!(!set.push(TOP_DOMAIN_HITS.sample(["example.com"], 9.0)));
        assert!(set.push(TOP_BLOCKED_DOMAIN_HITS.sample(["example.com"], 9.0)));

        let samples = set.into_samples();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].value, 5.0);
    }

    #[test]
    fn test_definitions_are_unique_gauges() {
        let mut names = HashSet::new();
        for def in DEFINITIONS {
            assert!(names.insert(def.name), "duplicate definition {}", def.name);
            assert_eq!(def.kind, MetricKind::Gauge);
            assert!(def.name.starts_with("technitium_"));
        }
        assert_eq!(definition("technitium_zone_info"), Some(&ZONE_INFO));
        assert_eq!(definition("technitium_unknown"), None);
    }
}
