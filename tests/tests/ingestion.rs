mod utils;
use utils::*;

use mock_service::MockConfig;
use ntest::timeout;
use std::time::Duration;
use surge_sim::prelude::*;

fn ingest_config(base_url: String, rps: f64, concurrency: usize) -> IngestConfig {
    IngestConfig {
        base_url,
        points: parse_points("37.7749,-122.4194;37.7849,-122.4094").unwrap(),
        drivers: build_driver_ids(20, "driver_"),
        rps,
        duration: Duration::from_secs(1),
        concurrency,
    }
}

#[tokio::test]
#[timeout(10_000)]
async fn ingestion_matches_service_counters() {
    let service = mock(MockConfig::default()).await;

    let summary = run_ingestion(&ingest_config(service.base_url(), 100., 4))
        .await
        .unwrap();

    assert_eq!(summary.errors, 0);
    assert!((80..=110).contains(&summary.sent), "sent {}", summary.sent);
    assert_eq!(summary.success, service.counters.locations());

    let latency = summary.latency.unwrap();
    assert!(latency.p50 <= latency.p95);
    assert!(latency.avg > 0.);
}

#[tokio::test]
#[timeout(10_000)]
async fn zero_concurrency_runs_one_worker() {
    let service = mock(MockConfig::default()).await;

    let summary = run_ingestion(&ingest_config(service.base_url(), 20., 0))
        .await
        .unwrap();

    assert!((16..=22).contains(&summary.success), "success {}", summary.success);
    assert_eq!(summary.errors, 0);
}

#[tokio::test]
#[timeout(10_000)]
async fn slow_service_caps_throughput() {
    let service = mock(MockConfig {
        delay: Duration::from_millis(200),
        ..Default::default()
    })
    .await;

    // Two workers at 50 rps each can only complete about five requests a second.
    let summary = run_ingestion(&ingest_config(service.base_url(), 100., 2))
        .await
        .unwrap();

    assert!(summary.sent <= 14, "sent {}", summary.sent);
    assert_eq!(summary.errors, 0);
    assert!(summary.latency.unwrap().p50 >= 200.);
}

#[tokio::test]
#[timeout(10_000)]
async fn unreachable_service_counts_errors() {
    init();
    let summary = run_ingestion(&ingest_config(dead_base_url().await, 20., 2))
        .await
        .unwrap();

    assert_eq!(summary.success, 0);
    assert!(summary.errors > 0);
    assert_eq!(summary.sent, summary.errors);
}
