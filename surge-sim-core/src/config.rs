use crate::{
    remaining_after_drop, ConfigError, DriverId, GeoPoint, DEFAULT_BASE_URL,
    POOL_SLOTS_PER_WORKER, PRICE_SAMPLE_COUNT, PRICE_SAMPLE_INTERVAL,
};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Traffic parameters for a single phase. Immutable once built.
#[derive(Clone, Debug)]
pub struct PhaseConfig {
    pub name: String,
    pub target_rps: f64,
    pub duration: Duration,
    pub concurrency: usize,
    pub drivers: Arc<[DriverId]>,
    pub points: Arc<[GeoPoint]>,
}

impl PhaseConfig {
    /// Number of workers actually spawned. A concurrency of zero runs a single worker.
    pub fn workers(&self) -> usize {
        self.concurrency.max(1)
    }

    pub fn per_worker_rps(&self) -> f64 {
        self.target_rps / self.workers() as f64
    }

    /// Size of the phase's shared connection pool.
    pub fn pool_size(&self) -> usize {
        self.workers() * POOL_SLOTS_PER_WORKER
    }
}

impl fmt::Display for PhaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: rps={:.1} duration={} workers={} drivers={} points={}",
            self.name,
            self.target_rps,
            humantime::format_duration(self.duration),
            self.workers(),
            self.drivers.len(),
            self.points.len(),
        )
    }
}

/// A single ingestion run (`ingest` mode).
#[derive(Clone, Debug)]
pub struct IngestConfig {
    pub base_url: String,
    pub points: Vec<GeoPoint>,
    pub drivers: Vec<DriverId>,
    pub rps: f64,
    pub duration: Duration,
    pub concurrency: usize,
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sets(&self.drivers, &self.points)
    }

    pub fn phase(&self) -> PhaseConfig {
        PhaseConfig {
            name: "ingest".to_string(),
            target_rps: self.rps,
            duration: self.duration,
            concurrency: self.concurrency,
            drivers: self.drivers.clone().into(),
            points: self.points.clone().into(),
        }
    }
}

/// Concurrent price queries against a single point (`price` mode).
#[derive(Clone, Debug)]
pub struct PriceLoadConfig {
    pub base_url: String,
    pub point: GeoPoint,
    pub rps: f64,
    pub duration: Duration,
    pub concurrency: usize,
}

impl PriceLoadConfig {
    pub fn phase(&self) -> PhaseConfig {
        PhaseConfig {
            name: "price".to_string(),
            target_rps: self.rps,
            duration: self.duration,
            concurrency: self.concurrency,
            drivers: Arc::new([]),
            points: Arc::new([self.point]),
        }
    }
}

/// Static parameters of a full warmup/drop/pause scenario.
#[derive(Clone, Debug)]
pub struct ScenarioConfig {
    pub base_url: String,
    pub points: Vec<GeoPoint>,
    pub drivers: Vec<DriverId>,
    pub rps: f64,
    pub concurrency: usize,
    pub warmup: Duration,
    pub drop: Duration,
    pub drop_ratio: f64,
    pub freshness_wait: Duration,
    pub pause: Duration,
    pub sample_count: usize,
    pub sample_interval: Duration,
}

impl ScenarioConfig {
    pub fn new(points: Vec<GeoPoint>, drivers: Vec<DriverId>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            points,
            drivers,
            rps: 5000.,
            concurrency: 20,
            warmup: Duration::from_secs(40),
            drop: Duration::from_secs(40),
            drop_ratio: 0.5,
            freshness_wait: Duration::from_secs(35),
            pause: Duration::from_secs(5),
            sample_count: PRICE_SAMPLE_COUNT,
            sample_interval: PRICE_SAMPLE_INTERVAL,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_sets(&self.drivers, &self.points)?;
        if !(0.0..=1.0).contains(&self.drop_ratio) {
            return Err(ConfigError::InvalidDropRatio(self.drop_ratio));
        }
        Ok(())
    }

    /// Price queries are always issued against the first configured point.
    pub fn primary_point(&self) -> GeoPoint {
        self.points.first().copied().unwrap_or_default()
    }

    pub fn warmup_phase(&self) -> PhaseConfig {
        PhaseConfig {
            name: "warmup".to_string(),
            target_rps: self.rps,
            duration: self.warmup,
            concurrency: self.concurrency,
            drivers: self.drivers.clone().into(),
            points: self.points.clone().into(),
        }
    }

    /// The reduced-fleet phase. The ingestion rate scales with the fraction of
    /// drivers still reporting.
    pub fn drop_phase(&self) -> PhaseConfig {
        let remaining = remaining_after_drop(&self.drivers, self.drop_ratio);
        let scale = if self.drivers.is_empty() {
            0.
        } else {
            remaining.len() as f64 / self.drivers.len() as f64
        };

        PhaseConfig {
            name: "drop".to_string(),
            target_rps: self.rps * scale,
            duration: self.drop,
            concurrency: self.concurrency,
            drivers: remaining.into(),
            points: self.points.clone().into(),
        }
    }
}

fn validate_sets(drivers: &[DriverId], points: &[GeoPoint]) -> Result<(), ConfigError> {
    if drivers.is_empty() {
        return Err(ConfigError::NoDrivers);
    }
    if points.is_empty() {
        return Err(ConfigError::NoPoints);
    }
    Ok(())
}

/// Convert a user-supplied number of seconds into a [Duration].
pub fn duration_from_secs(name: &'static str, value: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(value).map_err(|_| ConfigError::InvalidDuration { name, value })
}
