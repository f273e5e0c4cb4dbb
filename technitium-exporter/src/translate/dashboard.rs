//! Dashboard window statistics.

use crate::api::{ChartData, DashboardStats, QueryStats};
use crate::config::ScrapeContext;
use crate::model::{
    ALLOWED_ZONES, ALLOWLIST_ZONES, BLOCKED_ZONES, BLOCKLIST_ZONES, CACHED_ENTRIES,
    CLIENTS_WINDOW, MetricDefinition, MetricSample, PROTOCOL, QUERIES_WINDOW, QUERY_TYPE,
    RESPONSE_TYPE,
};

/// The fixed `category` label values, in output order.
pub const CATEGORIES: [&str; 10] = [
    "all",
    "no_error",
    "nxdomain",
    "servfail",
    "refused",
    "authoritative",
    "recursive",
    "cached",
    "blocked",
    "dropped",
];

fn category_values(stats: &QueryStats) -> [f64; 10] {
    [
        stats.total_queries,
        stats.total_no_error,
        stats.total_nx_domain,
        stats.total_server_failure,
        stats.total_refused,
        stats.total_authoritative,
        stats.total_recursive,
        stats.total_cached,
        stats.total_blocked,
        stats.total_dropped,
    ]
}

pub fn translate(payload: &DashboardStats, _ctx: &ScrapeContext) -> Vec<MetricSample> {
    let stats = &payload.stats;
    let mut samples = Vec::with_capacity(32);

    // Absent categories decode as 0, so all ten are always emitted.
    samples.extend(
        CATEGORIES
            .iter()
            .zip(category_values(stats))
            .map(|(category, value)| QUERIES_WINDOW.sample([*category], value)),
    );

    samples.extend(breakdown(&RESPONSE_TYPE, payload.query_response_chart_data.as_ref()));
    samples.extend(breakdown(&QUERY_TYPE, payload.query_type_chart_data.as_ref()));
    samples.extend(breakdown(&PROTOCOL, payload.protocol_type_chart_data.as_ref()));

    samples.push(CLIENTS_WINDOW.value(stats.total_clients));
    samples.push(CACHED_ENTRIES.value(stats.cached_entries));
    samples.push(ALLOWED_ZONES.value(stats.allowed_zones));
    samples.push(BLOCKED_ZONES.value(stats.blocked_zones));
    samples.push(ALLOWLIST_ZONES.value(stats.allow_list_zones));
    samples.push(BLOCKLIST_ZONES.value(stats.block_list_zones));

    samples
}

/// One sample per chart label, keyed verbatim by the label text.
fn breakdown(def: &MetricDefinition, chart: Option<&ChartData>) -> Vec<MetricSample> {
    chart
        .map(|chart| {
            chart
                .pairs()
                .map(|(label, value)| def.sample([label], value))
                .collect()
        })
        .unwrap_or_default()
}
