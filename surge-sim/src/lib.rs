#![cfg_attr(docsrs, feature(doc_cfg))]
//! Synthetic load for a surge-pricing service.
//!
//! Drives rate-paced driver location ingestion and price queries, and runs a
//! multi-phase scenario that simulates drivers dropping off and data going
//! stale. See [scenario] for the entry points.

pub mod measurement;
pub mod scenario;
pub mod transaction;

mod error;
pub(crate) mod sampler;

pub use error::SimError;
pub use scenario::{run_ingestion, run_price_load, run_scenario, ScenarioReport};
pub use surge_sim_core as core;

pub mod prelude {
    pub use crate::scenario::{
        run_ingestion, run_price_load, run_scenario, sample_price, PriceSample, ScenarioReport,
    };
    pub use crate::transaction::{Executor, Outcome, PriceQuote};
    pub use crate::SimError;

    pub use surge_sim_core::{
        build_driver_ids, parse_points, ConfigError, DriverId, GeoPoint, IngestConfig,
        PriceLoadConfig, ScenarioConfig, Summary,
    };
}
