//! Single HTTP attempts against the surge-pricing service.
//!
//! Every failure, whether transport-level or a non-2xx status, is folded into
//! an [Outcome] with `success == false`. Nothing here returns an error to the
//! caller once the client is built.
use crate::SimError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use surge_sim_core::{DriverId, GeoPoint, REQUEST_TIMEOUT};
use tokio::sync::Semaphore;
use tokio::time::timeout;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Result of one request attempt.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Outcome {
    pub success: bool,
    pub latency: Duration,
}

impl Outcome {
    pub fn latency_ms(&self) -> f64 {
        self.latency.as_secs_f64() * 1000.
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationUpdate<'a> {
    driver_id: &'a str,
    lat: f64,
    lng: f64,
}

/// Body of a `GET /price` response.
///
/// Only logged, so every field is optional and unknown fields are ignored. A
/// failed request yields the empty (default) quote.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceQuote {
    pub base_fare: Option<f64>,
    pub surge_multiplier: Option<f64>,
    pub geofence_id: Option<String>,
}

impl PriceQuote {
    pub fn is_empty(&self) -> bool {
        self.base_fare.is_none() && self.surge_multiplier.is_none() && self.geofence_id.is_none()
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "-".to_string(), T::to_string)
        }

        write!(
            f,
            "baseFare={} surgeMultiplier={} geofenceId={}",
            opt(&self.base_fare),
            opt(&self.surge_multiplier),
            opt(&self.geofence_id),
        )
    }
}

/// Issues requests for one phase.
///
/// Clones share the underlying HTTP client and the phase's connection pool,
/// which caps the number of requests in flight at once.
#[derive(Clone)]
pub struct Executor {
    client: Client,
    pool: Arc<Semaphore>,
}

impl Executor {
    pub fn new(pool_size: usize) -> Result<Self, SimError> {
        let pool_size = pool_size.max(1);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(pool_size)
            .build()?;

        Ok(Self {
            client,
            pool: Arc::new(Semaphore::new(pool_size)),
        })
    }

    /// `POST` a location update for `driver_id`. The response body is fully
    /// read before the latency is taken.
    pub async fn post_location(
        &self,
        url: &str,
        driver_id: &DriverId,
        point: GeoPoint,
    ) -> Outcome {
        let body = LocationUpdate {
            driver_id: driver_id.as_str(),
            lat: point.lat,
            lng: point.lng,
        };

        let start = Instant::now();
        let res = timeout(REQUEST_TIMEOUT, async {
            let _permit = self.pool.acquire().await;
            let res = self.client.post(url).json(&body).send().await?;
            let status = res.status();
            res.bytes().await?;
            Ok::<_, reqwest::Error>(status)
        })
        .await;
        let latency = start.elapsed();

        let success = match res {
            Ok(Ok(status)) => status.is_success(),
            Ok(Err(err)) => {
                trace!("Location update for {driver_id} failed: {err}");
                false
            }
            Err(_) => {
                trace!("Location update for {driver_id} timed out");
                false
            }
        };

        Outcome { success, latency }
    }

    /// `GET` a JSON document. A body that is not valid JSON counts as a
    /// failure.
    pub async fn get_json(&self, url: &str) -> (Outcome, PriceQuote) {
        let start = Instant::now();
        let res = timeout(REQUEST_TIMEOUT, async {
            let _permit = self.pool.acquire().await;
            let res = self.client.get(url).send().await?;
            let status = res.status();
            let quote = res.json::<PriceQuote>().await?;
            Ok::<_, reqwest::Error>((status, quote))
        })
        .await;
        let latency = start.elapsed();

        match res {
            Ok(Ok((status, quote))) if status.is_success() => {
                (Outcome { success: true, latency }, quote)
            }
            Ok(Ok((status, _))) => {
                trace!("Price query returned {status}");
                (Outcome { success: false, latency }, PriceQuote::default())
            }
            Ok(Err(err)) => {
                trace!("Price query failed: {err}");
                (Outcome { success: false, latency }, PriceQuote::default())
            }
            Err(_) => {
                trace!("Price query timed out");
                (Outcome { success: false, latency }, PriceQuote::default())
            }
        }
    }
}
