use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use surge_sim::core::{
    build_driver_ids, duration_from_secs, parse_points, ConfigError, IngestConfig,
    PriceLoadConfig, ScenarioConfig, DEFAULT_BASE_URL, DEFAULT_DRIVER_PREFIX,
};
use surge_sim::{run_ingestion, run_price_load, run_scenario};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_FILTER: &str = "surge_sim=info";

/// Surge pricing simulation utilities
#[derive(Parser, Debug)]
#[command(name = "surge-sim", version)]
struct Cli {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Send driver location updates at a steady rate
    Ingest(IngestArgs),

    /// Query the price at the first point at a steady rate
    Price(PriceArgs),

    /// Run the warmup / driver drop / pause scenario
    Scenario(ScenarioArgs),
}

impl Mode {
    fn common(&self) -> &CommonArgs {
        match self {
            Mode::Ingest(args) => &args.common,
            Mode::Price(args) => &args.common,
            Mode::Scenario(args) => &args.common,
        }
    }
}

#[derive(Args, Debug)]
struct CommonArgs {
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Semicolon-separated `lat,lng` pairs
    #[arg(long, default_value = "37.7749,-122.4194")]
    points: String,

    #[arg(long, default_value_t = 20)]
    concurrency: usize,

    #[arg(long, default_value = DEFAULT_DRIVER_PREFIX)]
    driver_prefix: String,

    /// Serve Prometheus metrics on this address while running
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

#[derive(Args, Debug)]
struct IngestArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, default_value_t = 2000)]
    drivers: usize,

    #[arg(long, default_value_t = 5000.)]
    rps: f64,

    /// Seconds
    #[arg(long, default_value_t = 30.)]
    duration: f64,
}

impl IngestArgs {
    fn config(&self) -> Result<IngestConfig, ConfigError> {
        Ok(IngestConfig {
            base_url: self.common.base_url.clone(),
            points: parse_points(&self.common.points)?,
            drivers: build_driver_ids(self.drivers, &self.common.driver_prefix),
            rps: self.rps,
            duration: duration_from_secs("duration", self.duration)?,
            concurrency: self.common.concurrency,
        })
    }
}

#[derive(Args, Debug)]
struct PriceArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, default_value_t = 10000.)]
    rps: f64,

    /// Seconds
    #[arg(long, default_value_t = 20.)]
    duration: f64,
}

impl PriceArgs {
    fn config(&self) -> Result<PriceLoadConfig, ConfigError> {
        let points = parse_points(&self.common.points)?;
        Ok(PriceLoadConfig {
            base_url: self.common.base_url.clone(),
            point: points.first().copied().ok_or(ConfigError::NoPoints)?,
            rps: self.rps,
            duration: duration_from_secs("duration", self.duration)?,
            concurrency: self.common.concurrency,
        })
    }
}

#[derive(Args, Debug)]
struct ScenarioArgs {
    #[command(flatten)]
    common: CommonArgs,

    #[arg(long, default_value_t = 2000)]
    drivers: usize,

    #[arg(long, default_value_t = 5000.)]
    rps: f64,

    #[arg(long, default_value_t = 40.)]
    warmup_seconds: f64,

    #[arg(long, default_value_t = 40.)]
    drop_seconds: f64,

    /// Fraction of drivers that stop reporting during the drop phase, within
    /// 0..=1. At least one driver always keeps reporting.
    #[arg(long, default_value_t = 0.5)]
    drop_ratio: f64,

    /// Seconds to wait before sampling prices after the drop
    #[arg(long, default_value_t = 35.)]
    data_freshness_wait: f64,

    #[arg(long, default_value_t = 5.)]
    pause_seconds: f64,
}

impl ScenarioArgs {
    fn config(&self) -> Result<ScenarioConfig, ConfigError> {
        let points = parse_points(&self.common.points)?;
        let drivers = build_driver_ids(self.drivers, &self.common.driver_prefix);

        let mut config = ScenarioConfig::new(points, drivers);
        config.base_url = self.common.base_url.clone();
        config.rps = self.rps;
        config.concurrency = self.common.concurrency;
        config.warmup = duration_from_secs("warmup-seconds", self.warmup_seconds)?;
        config.drop = duration_from_secs("drop-seconds", self.drop_seconds)?;
        config.drop_ratio = self.drop_ratio;
        config.freshness_wait =
            duration_from_secs("data-freshness-wait", self.data_freshness_wait)?;
        config.pause = duration_from_secs("pause-seconds", self.pause_seconds)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    FmtSubscriber::builder().with_env_filter(filter).init();

    if let Some(addr) = cli.mode.common().metrics_addr {
        PrometheusBuilder::new().with_http_listener(addr).install()?;
    }

    match &cli.mode {
        Mode::Ingest(args) => {
            let summary = run_ingestion(&args.config()?).await?;
            println!("{summary}");
        }
        Mode::Price(args) => {
            let summary = run_price_load(&args.config()?).await?;
            println!("{summary}");
        }
        Mode::Scenario(args) => {
            let report = run_scenario(&args.config()?).await?;
            println!("warmup: {}", report.warmup);
            println!("baseline price: {}", report.baseline.summary);
            println!("drop: {}", report.drop);
            println!("post-drop price: {}", report.post_drop.summary);
            println!("post-pause price: {}", report.post_pause.summary);
        }
    }

    Ok(())
}
