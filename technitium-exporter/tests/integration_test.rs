//! Integration tests for the Technitium exporter.
//!
//! These tests run a mock Technitium API on an ephemeral port and verify the
//! full flow from upstream HTTP calls to the rendered `/metrics` output.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::Query;
use axum::routing::get;
use serde_json::{Value, json};
use tokio::sync::watch;

use technitium_exporter::config::TechnitiumConfig;
use technitium_exporter::exposition::render;
use technitium_exporter::{
    HttpServer, HttpTransport, MetricSample, ScrapeCollector, ScrapeContext, StatsRange,
    UpstreamClient,
};

const TOKEN: &str = "test-token-123";

type Params = Query<HashMap<String, String>>;

fn ok(response: Value) -> Json<Value> {
    Json(json!({ "status": "ok", "response": response }))
}

fn invalid_token() -> Json<Value> {
    Json(json!({ "status": "invalid-token", "errorMessage": "Invalid token or session expired." }))
}

async fn dashboard(Query(params): Params) -> Json<Value> {
    if params.get("token").map(String::as_str) != Some(TOKEN) {
        return invalid_token();
    }
    assert_eq!(params.get("type").map(String::as_str), Some("LastDay"));

    ok(json!({
        "stats": {
            "totalQueries": 120,
            "totalNoError": 100,
            "totalBlocked": 20,
            "totalClients": 4,
            "cachedEntries": 1500,
            "blockListZones": 90000
        },
        "queryTypeChartData": {
            "labels": ["A", "AAAA"],
            "datasets": [{ "label": "Total", "data": [90, 30] }]
        },
        "protocolTypeChartData": {
            "labels": ["Udp", "Tcp"],
            "datasets": [{ "data": [118, 2] }]
        }
    }))
}

/// Honors `limit` like the real server does.
async fn top(Query(params): Params) -> Json<Value> {
    if params.get("token").map(String::as_str) != Some(TOKEN) {
        return invalid_token();
    }
    let limit: usize = params
        .get("limit")
        .and_then(|limit| limit.parse().ok())
        .unwrap_or(usize::MAX);

    let entries = |prefix: &str| -> Vec<Value> {
        (0..10)
            .map(|i| json!({ "name": format!("{}{}.example", prefix, i), "hits": 100 - i }))
            .take(limit)
            .collect()
    };

    match params.get("statsType").map(String::as_str) {
        Some("TopClients") => {
            let clients: Vec<Value> = (0..10)
                .map(|i| {
                    json!({
                        "name": format!("10.0.0.{}", i),
                        "domain": format!("host{}.lan", i),
                        "hits": 50 - i
                    })
                })
                .take(limit)
                .collect();
            ok(json!({ "topClients": clients }))
        }
        Some("TopDomains") => ok(json!({ "topDomains": entries("d") })),
        Some("TopBlockedDomains") => ok(json!({ "topBlockedDomains": entries("blocked") })),
        _ => Json(json!({ "status": "error", "errorMessage": "Unknown stats type" })),
    }
}

async fn zones(Query(params): Params) -> Json<Value> {
    if params.get("token").map(String::as_str) != Some(TOKEN) {
        return invalid_token();
    }
    ok(json!({
        "pageNumber": 1,
        "totalPages": 1,
        "totalZones": 2,
        "zones": [
            { "name": "example.com", "type": "Primary", "disabled": false, "internal": false, "soaSerial": 2024010101 },
            { "name": "0.in-addr.arpa", "type": "Primary", "disabled": false, "internal": true, "soaSerial": 1 }
        ]
    }))
}

async fn slow_zones() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(3)).await;
    ok(json!({ "zones": [] }))
}

async fn dhcp_disabled() -> Json<Value> {
    Json(json!({ "status": "error", "errorMessage": "DHCP server is not enabled." }))
}

fn mock_router() -> Router {
    Router::new()
        .route("/api/dashboard/stats/get", get(dashboard))
        .route("/api/dashboard/stats/getTop", get(top))
        .route("/api/zones/list", get(zones))
        .route("/api/dhcp/leases/list", get(dhcp_disabled))
}

/// Start a router on an ephemeral port and return its base URL.
async fn spawn_mock(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{}", addr)
}

fn make_collector(
    base_url: String,
    token: &str,
    top_limit: u32,
    timeout_secs: u64,
) -> Arc<ScrapeCollector> {
    let config = TechnitiumConfig {
        base_url,
        token: token.to_string(),
        stats_range: StatsRange::LastDay,
        top_limit,
        timeout_secs,
        ..Default::default()
    };
    let context = ScrapeContext {
        server_label: "dns-test".to_string(),
        node_label: None,
        stats_range: config.stats_range,
        top_limit,
        zone_page_size: config.zone_page_size,
    };
    let transport = HttpTransport::new(&config).unwrap();
    Arc::new(ScrapeCollector::new(UpstreamClient::new(transport), context))
}

fn find<'a>(
    samples: &'a [MetricSample],
    name: &str,
    label: (&str, &str),
) -> Option<&'a MetricSample> {
    samples
        .iter()
        .find(|s| s.name == name && s.label(label.0) == Some(label.1))
}

fn count(samples: &[MetricSample], name: &str) -> usize {
    samples.iter().filter(|s| s.name == name).count()
}

#[tokio::test]
async fn test_full_scrape_against_mock_api() {
    let base_url = spawn_mock(mock_router()).await;
    let collector = make_collector(base_url, TOKEN, 5, 5);

    let samples = collector.collect().await;

    let up = find(&samples, "technitium_up", ("server", "dns-test")).unwrap();
    assert_eq!(up.value, 1.0);

    assert_eq!(count(&samples, "technitium_dns_queries_window"), 10);
    let blocked = find(&samples, "technitium_dns_queries_window", ("category", "blocked")).unwrap();
    assert_eq!(blocked.value, 20.0);
    let refused = find(&samples, "technitium_dns_queries_window", ("category", "refused")).unwrap();
    assert_eq!(refused.value, 0.0);

    let aaaa = find(&samples, "technitium_dns_query_type_total", ("qtype", "AAAA")).unwrap();
    assert_eq!(aaaa.value, 30.0);
    assert_eq!(count(&samples, "technitium_dns_response_type_total"), 0);

    // limit=5 is passed upstream
    assert_eq!(count(&samples, "technitium_dns_top_domain_hits"), 5);
    assert_eq!(count(&samples, "technitium_dns_top_blocked_domain_hits"), 5);
    assert_eq!(count(&samples, "technitium_dns_top_client_hits"), 5);
    let client = find(&samples, "technitium_dns_top_client_hits", ("client_ip", "10.0.0.0")).unwrap();
    assert_eq!(client.label("client_name"), Some("host0.lan"));
    assert_eq!(client.value, 50.0);

    assert_eq!(count(&samples, "technitium_zone_info"), 2);
    let internal = find(&samples, "technitium_zone_info", ("zone", "0.in-addr.arpa")).unwrap();
    assert_eq!(internal.label("internal"), Some("true"));
    assert_eq!(
        find(&samples, "technitium_dns_zones", ("server", "dns-test")).unwrap().value,
        2.0
    );

    // DHCP disabled upstream: no lease samples, failure counted
    assert_eq!(count(&samples, "technitium_dhcp_leases_total"), 0);
    let stats = collector.stats();
    assert_eq!(
        stats.endpoint_failures[&technitium_exporter::Endpoint::DhcpLeases],
        1
    );

    let output = render(&samples, &stats, collector.context());
    assert!(output.contains("technitium_dns_cached_entries{server=\"dns-test\"} 1500"));
    assert!(output.contains("technitium_dns_blocklist_zones{server=\"dns-test\"} 90000"));
}

#[tokio::test]
async fn test_invalid_token_reports_down() {
    let base_url = spawn_mock(mock_router()).await;
    let collector = make_collector(base_url, "wrong-token", 5, 5);

    let samples = collector.collect().await;

    assert_eq!(samples.len(), 2);
    assert_eq!(
        find(&samples, "technitium_up", ("server", "dns-test")).unwrap().value,
        0.0
    );
    assert!(collector.stats().endpoint_failures.values().all(|n| *n == 1));
}

#[tokio::test]
async fn test_unreachable_upstream() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let collector = make_collector(format!("http://{}", addr), TOKEN, 5, 2);
    let samples = collector.collect().await;

    let mut names: Vec<_> = samples.iter().map(|s| s.name).collect();
    names.sort();
    assert_eq!(
        names,
        vec!["technitium_scrape_duration_seconds", "technitium_up"]
    );
    assert_eq!(
        find(&samples, "technitium_up", ("server", "dns-test")).unwrap().value,
        0.0
    );
}

#[tokio::test]
async fn test_slow_endpoint_times_out_alone() {
    let router = Router::new()
        .route("/api/dashboard/stats/get", get(dashboard))
        .route("/api/dashboard/stats/getTop", get(top))
        .route("/api/zones/list", get(slow_zones))
        .route("/api/dhcp/leases/list", get(dhcp_disabled));
    let base_url = spawn_mock(router).await;
    let collector = make_collector(base_url, TOKEN, 3, 1);

    let samples = collector.collect().await;

    assert_eq!(
        find(&samples, "technitium_up", ("server", "dns-test")).unwrap().value,
        1.0
    );
    assert_eq!(count(&samples, "technitium_zone_info"), 0);
    assert_eq!(count(&samples, "technitium_dns_zones"), 0);
    assert_eq!(count(&samples, "technitium_dns_top_domain_hits"), 3);

    let duration = find(
        &samples,
        "technitium_scrape_duration_seconds",
        ("server", "dns-test"),
    )
    .unwrap();
    assert!(duration.value < 3.0, "scrape took {}s", duration.value);
}

#[tokio::test]
async fn test_http_server_metrics_endpoint() {
    let base_url = spawn_mock(mock_router()).await;
    let collector = make_collector(base_url, TOKEN, 5, 5);

    // Bound before the server task starts, so requests queue until it accepts
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = HttpServer::new(collector, addr, "/metrics".to_string());
    let server_handle = tokio::spawn(async move { server.serve(listener, shutdown_rx).await });

    let response = reqwest::Client::new()
        .get(format!("http://{}/metrics", addr))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_success());
    let body = response.text().await.unwrap();
    assert!(body.contains("# TYPE technitium_up gauge"));
    assert!(body.contains("technitium_up{server=\"dns-test\"} 1"));
    assert!(body.contains("technitium_exporter_scrapes_total{server=\"dns-test\"} 1"));

    shutdown_tx.send(true).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server_handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
