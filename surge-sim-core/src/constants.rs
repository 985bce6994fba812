use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Latitude of the point used when no `--points` are given.
pub const DEFAULT_LAT: f64 = 37.7749;
/// Longitude of the point used when no `--points` are given.
pub const DEFAULT_LNG: f64 = -122.4194;

pub const DEFAULT_DRIVER_PREFIX: &str = "driver_";

/// Width of the zero-padded sequence number in generated driver ids.
pub const DRIVER_ID_WIDTH: usize = 6;

/// Fixed per-request timeout. Requests exceeding it are recorded as errors.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Number of price queries issued by each sampling phase of a scenario.
pub const PRICE_SAMPLE_COUNT: usize = 3;

/// Spacing between the price queries of a sampling phase.
pub const PRICE_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Connection slots per worker in a phase's shared pool.
pub const POOL_SLOTS_PER_WORKER: usize = 2;

pub const LOCATION_PATH: &str = "/driver/location";
pub const PRICE_PATH: &str = "/price";
