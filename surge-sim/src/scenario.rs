//! Ingestion, price load and the multi-phase driver drop scenario.
//!
//! Every run validates its configuration and builds its HTTP clients before
//! the first request is sent. From then on nothing fails: per-request errors
//! only show up in the phase [Summary].
use crate::sampler::run_phase;
use crate::transaction::{Executor, PriceQuote};
use crate::{measurement::PhaseMetrics, SimError};
use std::sync::Arc;
use std::time::Duration;
use surge_sim_core::{
    select, GeoPoint, IngestConfig, PhaseConfig, PriceLoadConfig, ScenarioConfig, Summary,
    LOCATION_PATH, POOL_SLOTS_PER_WORKER, PRICE_PATH,
};
use tokio::time::sleep;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Result of a sequential price sampling phase.
#[derive(Debug, Clone)]
pub struct PriceSample {
    pub summary: Summary,
    /// The last non-empty quote returned, if any.
    pub quote: Option<PriceQuote>,
}

/// Per-phase results of [run_scenario].
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub warmup: Summary,
    pub baseline: PriceSample,
    pub drop: Summary,
    pub post_drop: PriceSample,
    pub post_pause: PriceSample,
}

/// Send location updates for the configured drivers at a steady rate.
///
/// # Example
/// ```no_run
/// use surge_sim::prelude::*;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), SimError> {
///     let config = IngestConfig {
///         base_url: "http://localhost:8081".to_string(),
///         points: parse_points("37.7749,-122.4194")?,
///         drivers: build_driver_ids(2000, "driver_"),
///         rps: 5000.,
///         duration: Duration::from_secs(30),
///         concurrency: 20,
///     };
///     println!("{}", run_ingestion(&config).await?);
///     Ok(())
/// }
/// ```
#[instrument(name = "ingest", skip_all)]
pub async fn run_ingestion(config: &IngestConfig) -> Result<Summary, SimError> {
    config.validate()?;
    let phase = config.phase();
    let executor = Executor::new(phase.pool_size())?;

    Ok(ingest(base(&config.base_url), &phase, executor).await)
}

/// Query the price at a single point from many concurrent workers.
#[instrument(name = "price", skip_all)]
pub async fn run_price_load(config: &PriceLoadConfig) -> Result<Summary, SimError> {
    let phase = config.phase();
    let executor = Executor::new(phase.pool_size())?;
    let url: Arc<str> = price_url(base(&config.base_url), config.point).into();

    let request = move |_idx: u64| {
        let executor = executor.clone();
        let url = url.clone();
        async move { executor.get_json(&url).await.0 }
    };

    Ok(run_phase(&phase, request).await)
}

/// Run the full scenario: warmup, baseline price, driver drop, freshness wait,
/// post-drop price, pause and post-pause price. Phases never overlap.
#[instrument(name = "scenario", skip_all)]
pub async fn run_scenario(config: &ScenarioConfig) -> Result<ScenarioReport, SimError> {
    config.validate()?;

    let base_url = base(&config.base_url);
    let price_url = price_url(base_url, config.primary_point());

    let warmup_phase = config.warmup_phase();
    let drop_phase = config.drop_phase();
    let warmup_executor = Executor::new(warmup_phase.pool_size())?;
    let drop_executor = Executor::new(drop_phase.pool_size())?;
    let sample_executor = Executor::new(POOL_SLOTS_PER_WORKER)?;
    debug!("Planned {warmup_phase}");
    debug!("Planned {drop_phase}");

    info!("Phase 1: warmup ingestion");
    let warmup = ingest(base_url, &warmup_phase, warmup_executor).await;
    let baseline = sample("Baseline", &sample_executor, &price_url, config).await;

    info!(
        "Phase 2: driver drop ingestion ({} of {} drivers)",
        drop_phase.drivers.len(),
        config.drivers.len()
    );
    let drop = ingest(base_url, &drop_phase, drop_executor).await;

    if !config.freshness_wait.is_zero() {
        info!(
            "Waiting {} for freshness window",
            humantime::format_duration(config.freshness_wait)
        );
        sleep(config.freshness_wait).await;
    }
    let post_drop = sample("Post-drop", &sample_executor, &price_url, config).await;

    info!("Phase 3: ingestion pause");
    sleep(config.pause).await;
    let post_pause = sample("Post-pause", &sample_executor, &price_url, config).await;

    info!("Scenario complete");

    Ok(ScenarioReport {
        warmup,
        baseline,
        drop,
        post_drop,
        post_pause,
    })
}

/// Issue `samples` price queries one after another, sleeping `interval` after
/// each of them.
pub async fn sample_price(
    executor: &Executor,
    url: &str,
    samples: usize,
    interval: Duration,
) -> PriceSample {
    let metrics = PhaseMetrics::new("sample");
    let mut last = None;

    for _ in 0..samples {
        let (outcome, quote) = executor.get_json(url).await;
        metrics.record(&outcome);
        if !quote.is_empty() {
            last = Some(quote);
        }
        sleep(interval).await;
    }

    PriceSample {
        summary: metrics.summarize(),
        quote: last,
    }
}

async fn sample(
    label: &str,
    executor: &Executor,
    url: &str,
    config: &ScenarioConfig,
) -> PriceSample {
    let sample = sample_price(executor, url, config.sample_count, config.sample_interval).await;
    if let Some(quote) = &sample.quote {
        info!("{label} price sample: {quote}");
    }
    info!("{label} price metrics: {}", sample.summary);
    sample
}

async fn ingest(base_url: &str, phase: &PhaseConfig, executor: Executor) -> Summary {
    let url: Arc<str> = format!("{base_url}{LOCATION_PATH}").into();
    let drivers = phase.drivers.clone();
    let points = phase.points.clone();

    let request = move |idx: u64| {
        let executor = executor.clone();
        let url = url.clone();
        let drivers = drivers.clone();
        let points = points.clone();
        async move {
            let (driver, point) = select(idx, &drivers, &points);
            executor.post_location(&url, driver, point).await
        }
    };

    run_phase(phase, request).await
}

fn base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

pub(crate) fn price_url(base_url: &str, point: GeoPoint) -> String {
    format!("{base_url}{PRICE_PATH}?lat={}&lng={}", point.lat, point.lng)
}
