mod utils;
use utils::*;

use mock_service::MockConfig;
use ntest::timeout;
use std::num::NonZeroU32;
use std::time::Duration;
use surge_sim::prelude::*;

#[tokio::test]
#[timeout(10_000)]
async fn throttled_price_load_reports_errors() {
    let service = mock(MockConfig {
        price_tps_limit: NonZeroU32::new(20),
        ..Default::default()
    })
    .await;

    let config = PriceLoadConfig {
        base_url: service.base_url(),
        point: GeoPoint::default(),
        rps: 100.,
        duration: Duration::from_secs(1),
        concurrency: 4,
    };
    let summary = run_price_load(&config).await.unwrap();

    assert!(summary.errors > 0);
    assert!(summary.success <= 45, "success {}", summary.success);
    assert_eq!(summary.sent, service.counters.prices());
    assert_eq!(summary.errors, service.counters.throttled());
}

#[tokio::test]
#[timeout(10_000)]
async fn sampling_keeps_last_quote() {
    let service = mock(MockConfig::default()).await;
    let executor = Executor::new(2).unwrap();
    let url = format!("{}/price?lat=37.7749&lng=-122.4194", service.base_url());

    let sample = sample_price(&executor, &url, 3, Duration::from_millis(10)).await;

    assert_eq!(sample.summary.success, 3);
    assert_eq!(sample.summary.errors, 0);
    let quote = sample.quote.unwrap();
    assert_eq!(quote.base_fare, Some(5.));
    assert_eq!(quote.geofence_id.as_deref(), Some("37.77:-122.42"));
    // No drivers reported, so supply is empty.
    assert_eq!(quote.surge_multiplier, Some(3.));
}

#[tokio::test]
#[timeout(10_000)]
async fn non_json_body_is_a_failure() {
    let service = mock(MockConfig::default()).await;
    let executor = Executor::new(2).unwrap();

    let (outcome, quote) = executor
        .get_json(&format!("{}/ping", service.base_url()))
        .await;

    assert!(!outcome.success);
    assert!(quote.is_empty());
}

#[tokio::test]
#[timeout(10_000)]
async fn sampling_unreachable_service_yields_no_quote() {
    init();
    let executor = Executor::new(2).unwrap();
    let url = format!("{}/price?lat=1&lng=2", dead_base_url().await);

    let sample = sample_price(&executor, &url, 2, Duration::ZERO).await;

    assert!(sample.quote.is_none());
    assert_eq!(sample.summary.errors, 2);
    assert!(sample.summary.latency.is_some());
}
