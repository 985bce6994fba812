//! In-process stand-in for the surge-pricing service.
//!
//! Serves the same endpoints the load generator hits, keeps driver sightings in
//! memory and derives a surge multiplier from them.
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Answer `/price` with 503 once this rate is exceeded.
    pub price_tps_limit: Option<NonZeroU32>,
    /// Fixed delay added to every handler.
    pub delay: Duration,
    /// Upper bound of a uniformly distributed extra delay.
    pub jitter: Duration,
    /// Sightings older than this no longer count towards supply.
    pub freshness: Duration,
    pub base_fare: f64,
    pub max_surge: f64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            price_tps_limit: None,
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
            freshness: Duration::from_secs(30),
            base_fare: 5.0,
            max_surge: 3.0,
        }
    }
}

/// Requests seen by the mock, for cross-checking what the client reports.
#[derive(Debug, Default)]
pub struct Counters {
    pub locations: AtomicU64,
    pub prices: AtomicU64,
    pub throttled: AtomicU64,
}

impl Counters {
    pub fn locations(&self) -> u64 {
        self.locations.load(Ordering::Relaxed)
    }

    pub fn prices(&self) -> u64 {
        self.prices.load(Ordering::Relaxed)
    }

    pub fn throttled(&self) -> u64 {
        self.throttled.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverLocation {
    pub driver_id: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Deserialize)]
pub struct PricePoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceResponse {
    pub base_fare: f64,
    pub surge_multiplier: f64,
    pub geofence_id: String,
}

struct Sighting {
    geofence: String,
    seen: Instant,
}

struct AppState {
    config: MockConfig,
    sightings: RwLock<HashMap<String, Sighting>>,
    demand: RwLock<HashMap<String, u64>>,
    limiter: Option<DefaultDirectRateLimiter>,
    counters: Arc<Counters>,
}

impl AppState {
    async fn delay(&self) {
        let mut delay = self.config.delay;
        if !self.config.jitter.is_zero() {
            delay += self.config.jitter.mul_f64(rand::thread_rng().gen::<f64>());
        }
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, location: &DriverLocation) {
        self.sightings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                location.driver_id.clone(),
                Sighting {
                    geofence: geofence_id(location.lat, location.lng),
                    seen: Instant::now(),
                },
            );
        self.counters.locations.fetch_add(1, Ordering::Relaxed);
    }

    fn fresh_drivers(&self, geofence: &str) -> u64 {
        let freshness = self.config.freshness;
        self.sightings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.geofence == geofence && s.seen.elapsed() <= freshness)
            .count() as u64
    }
}

pub fn router(config: MockConfig) -> (Router, Arc<Counters>) {
    let counters = Arc::new(Counters::default());
    let state = Arc::new(AppState {
        limiter: config.price_tps_limit.map(rate_limiter),
        config,
        sightings: RwLock::new(HashMap::new()),
        demand: RwLock::new(HashMap::new()),
        counters: counters.clone(),
    });

    let app = Router::new()
        .route("/driver/location", post(location))
        .route("/driver/location/batch", post(location_batch))
        .route("/driver/health", get(health))
        .route("/price", get(price))
        .route("/ping", get(ping))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    (app, counters)
}

/// A mock bound to an ephemeral local port. Stops serving when dropped.
pub struct MockService {
    pub addr: SocketAddr,
    pub counters: Arc<Counters>,
    task: JoinHandle<()>,
}

impl MockService {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockService {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub async fn spawn(config: MockConfig) -> std::io::Result<MockService> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (app, counters) = router(config);

    let task = tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            error!("Mock service stopped: {err}");
        }
    });

    Ok(MockService {
        addr,
        counters,
        task,
    })
}

async fn location(
    State(state): State<Arc<AppState>>,
    Json(location): Json<DriverLocation>,
) -> impl IntoResponse {
    state.delay().await;
    state.record(&location);
    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "accepted", "driverId": location.driver_id})),
    )
}

async fn location_batch(
    State(state): State<Arc<AppState>>,
    Json(locations): Json<Vec<DriverLocation>>,
) -> impl IntoResponse {
    state.delay().await;
    for location in &locations {
        state.record(location);
    }
    (
        StatusCode::ACCEPTED,
        Json(json!({"status": "accepted", "count": locations.len().to_string()})),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "healthy", "service": "driver-location"}))
}

async fn ping() -> &'static str {
    "pong"
}

async fn price(
    State(state): State<Arc<AppState>>,
    Query(point): Query<PricePoint>,
) -> Result<Json<PriceResponse>, StatusCode> {
    state.counters.prices.fetch_add(1, Ordering::Relaxed);
    state.delay().await;

    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            debug!("Price request throttled");
            state.counters.throttled.fetch_add(1, Ordering::Relaxed);
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    let geofence = geofence_id(point.lat, point.lng);
    let requests = {
        let mut demand = state.demand.write().unwrap_or_else(PoisonError::into_inner);
        let count = demand.entry(geofence.clone()).or_default();
        *count += 1;
        *count
    };
    let drivers = state.fresh_drivers(&geofence);

    Ok(Json(PriceResponse {
        base_fare: state.config.base_fare,
        surge_multiplier: calculate_surge(requests, drivers, state.config.max_surge),
        geofence_id: geofence,
    }))
}

/// Coarse cell of roughly a kilometre, keyed by coordinates rounded to two decimals.
pub fn geofence_id(lat: f64, lng: f64) -> String {
    format!("{lat:.2}:{lng:.2}")
}

/// No surge while demand is at or below supply, then half a point per unit of
/// excess ratio, capped at `max_surge`. No supply at all means maximum surge.
pub fn calculate_surge(requests: u64, drivers: u64, max_surge: f64) -> f64 {
    if drivers == 0 {
        return max_surge;
    }
    let ratio = requests as f64 / drivers as f64;
    if ratio <= 1.0 {
        1.0
    } else {
        (1.0 + ratio / 2.0).min(max_surge)
    }
}

pub fn rate_limiter(tps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(tps))
}

/** TPS Printer **/

pub async fn tps_measure_task(counters: Arc<Counters>) {
    let (mut locations, mut prices) = (0, 0);
    loop {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let (l, p) = (counters.locations(), counters.prices());
        println!("{} location TPS, {} price TPS", l - locations, p - prices);
        (locations, prices) = (l, p);
    }
}
