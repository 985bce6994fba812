mod utils;
use utils::*;

use mock_service::MockConfig;
use ntest::timeout;
use std::time::{Duration, Instant};
use surge_sim::prelude::*;

fn short_scenario(base_url: String, drivers: usize) -> ScenarioConfig {
    let mut config = ScenarioConfig::new(
        vec![GeoPoint::default()],
        build_driver_ids(drivers, "driver_"),
    );
    config.base_url = base_url;
    config.rps = 40.;
    config.concurrency = 2;
    config.warmup = Duration::from_millis(500);
    config.drop = Duration::from_millis(500);
    config.freshness_wait = Duration::ZERO;
    config.pause = Duration::from_millis(100);
    config.sample_interval = Duration::from_millis(20);
    config
}

#[tokio::test]
#[timeout(15_000)]
async fn scenario_runs_every_phase() {
    let service = mock(MockConfig::default()).await;
    let config = short_scenario(service.base_url(), 10);

    let report = run_scenario(&config).await.unwrap();

    assert!(report.warmup.success > 0);
    assert_eq!(report.warmup.errors, 0);
    assert!(report.drop.success > 0);
    // Half the fleet reports at half the rate.
    assert!(report.drop.sent < report.warmup.sent);
    assert_eq!(
        service.counters.locations(),
        report.warmup.success + report.drop.success
    );

    for sample in [&report.baseline, &report.post_drop, &report.post_pause] {
        assert_eq!(sample.summary.success, 3);
        let quote = sample.quote.as_ref().unwrap();
        assert!(quote.surge_multiplier.unwrap() >= 1.);
        assert_eq!(quote.geofence_id.as_deref(), Some("37.77:-122.42"));
    }
    assert_eq!(service.counters.prices(), 9);
}

#[tokio::test]
#[timeout(15_000)]
async fn freshness_wait_sends_no_traffic() {
    let service = mock(MockConfig::default()).await;
    let counters = service.counters.clone();
    let mut config = short_scenario(service.base_url(), 10);
    config.freshness_wait = Duration::from_millis(700);

    let start = Instant::now();
    let run = tokio::spawn(async move { run_scenario(&config).await });

    // Longest stretch during which the service saw no request at all.
    let mut seen = 0;
    let mut quiet_since = Instant::now();
    let mut longest_quiet = Duration::ZERO;
    while !run.is_finished() {
        tokio::time::sleep(Duration::from_millis(10)).await;
        let now = counters.locations() + counters.prices();
        if now != seen {
            seen = now;
            quiet_since = Instant::now();
        }
        longest_quiet = longest_quiet.max(quiet_since.elapsed());
    }

    let report = run.await.unwrap().unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500 + 500 + 700 + 100));
    assert!(longest_quiet >= Duration::from_millis(600), "{longest_quiet:?}");
    assert!(report.drop.success > 0);
    assert_eq!(report.post_drop.summary.success, 3);
}

#[tokio::test]
#[timeout(15_000)]
async fn scenario_survives_unreachable_service() {
    init();
    let config = short_scenario(dead_base_url().await, 4);

    let report = run_scenario(&config).await.unwrap();

    assert_eq!(report.warmup.success, 0);
    assert!(report.warmup.errors > 0);
    assert!(report.baseline.quote.is_none());
    assert_eq!(report.post_pause.summary.errors, 3);
}

#[tokio::test]
#[timeout(5_000)]
async fn scenario_rejects_bad_drop_ratio() {
    init();
    let mut config = short_scenario(dead_base_url().await, 4);
    config.drop_ratio = 1.5;

    let err = run_scenario(&config).await.unwrap_err();
    assert!(matches!(
        err,
        SimError::Config(ConfigError::InvalidDropRatio(_))
    ));
}
