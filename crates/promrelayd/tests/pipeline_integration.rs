//! End-to-end pipeline tests: resolve a source URI, scrape the target,
//! decode the families. This is the exact per-poll flow the agent runs.

use axum::extract::RawQuery;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;

use promrelay_core::SourceConfig;
use promrelay_scrape::{scrape, MetricType, ScrapeError};

const NODE_EXPOSITION: &str = "\
# HELP node_cpu_seconds_total Seconds the CPUs spent in each mode.
# TYPE node_cpu_seconds_total counter
node_cpu_seconds_total{cpu=\"0\",mode=\"idle\"} 312912.21
node_cpu_seconds_total{cpu=\"0\",mode=\"user\"} 7612.45
# HELP node_memory_active_bytes Memory information field Active_bytes.
# TYPE node_memory_active_bytes gauge
node_memory_active_bytes 2.379128832e+09
";

async fn serve(router: Router) -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let port = listener.local_addr().expect("listener addr").port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    port
}

/// Scrape the way the agent does: the resolver keeps a leading slash on
/// the path and the scrape call strips it before the verbatim append.
async fn scrape_config(
    config: &SourceConfig,
) -> Result<std::collections::HashMap<String, promrelay_scrape::MetricFamily>, ScrapeError> {
    scrape(
        &config.host,
        config.port,
        config.path.trim_start_matches('/'),
        config.matchers.as_deref(),
    )
    .await
}

#[tokio::test]
async fn resolved_source_scrapes_default_path() {
    let port = serve(Router::new().route("/metrics", get(|| async { NODE_EXPOSITION }))).await;

    let config = SourceConfig::from_uri("node-exporter", &format!("http://127.0.0.1:{port}"))
        .expect("resolve source");
    assert_eq!(config.path, "/metrics");

    let families = scrape_config(&config).await.expect("scrape source");

    assert_eq!(families.len(), 2);
    let cpu = &families["node_cpu_seconds_total"];
    assert_eq!(cpu.kind, MetricType::Counter);
    assert_eq!(cpu.samples.len(), 2);
    assert_eq!(cpu.samples[0].label("mode"), Some("idle"));
    assert_eq!(
        families["node_memory_active_bytes"].samples[0].value,
        2.379128832e+09
    );
}

#[tokio::test]
async fn resolved_federate_source_forwards_matchers() {
    let router = Router::new().route(
        "/federate",
        get(|RawQuery(query): RawQuery| async move {
            format!(
                "# TYPE federate_query_echo gauge\nfederate_query_echo{{query=\"{}\"}} 1\n",
                query.unwrap_or_default()
            )
        }),
    );
    let port = serve(router).await;

    let uri = format!(
        "http://127.0.0.1:{port}/federate?match[]=up&match[]=node_cpu_seconds_total"
    );
    let config = SourceConfig::from_uri("federation", &uri).expect("resolve source");
    assert_eq!(
        config.matchers.as_deref(),
        Some(&["up".to_string(), "node_cpu_seconds_total".to_string()][..])
    );

    let families = scrape_config(&config).await.expect("scrape source");
    assert_eq!(
        families["federate_query_echo"].samples[0].label("query"),
        Some("match[]=up&match[]=node_cpu_seconds_total")
    );
}

#[tokio::test]
async fn unavailable_source_reports_status_and_body() {
    let router = Router::new().route(
        "/metrics",
        get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "draining") }),
    );
    let port = serve(router).await;

    let config = SourceConfig::from_uri("draining-target", &format!("http://127.0.0.1:{port}"))
        .expect("resolve source");
    let err = scrape_config(&config).await.expect_err("must surface 503");

    match err {
        ScrapeError::Status { status, body } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "draining");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn whitelist_stays_attached_to_the_resolved_source() {
    // The whitelist rides along for the downstream forwarding stage; the
    // scrape itself does not filter.
    let port = serve(Router::new().route("/metrics", get(|| async { NODE_EXPOSITION }))).await;

    let uri = format!(
        "http://127.0.0.1:{port}/metrics?whitelisted=node_cpu_seconds_total"
    );
    let config = SourceConfig::from_uri("node-exporter", &uri).expect("resolve source");
    assert_eq!(
        config.whitelisted.as_deref(),
        Some(&["node_cpu_seconds_total".to_string()][..])
    );

    let families = scrape_config(&config).await.expect("scrape source");
    // Both families come back; filtering is not this layer's job.
    assert_eq!(families.len(), 2);
}
