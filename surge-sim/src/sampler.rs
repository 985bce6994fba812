use crate::measurement::PhaseMetrics;
use crate::transaction::Outcome;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use surge_sim_core::{PhaseConfig, Summary};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
#[allow(unused)]
use tracing::{debug, error, info, instrument, trace, warn};

/// Run one phase: spawn its workers, wait for every one of them, then
/// summarize what they recorded.
///
/// `request` maps a worker's sequence index to a single attempt. Each worker
/// gets its own clone and its own index starting at zero.
#[instrument(name = "phase", skip_all, fields(name = %config.name))]
pub(crate) async fn run_phase<T, F>(config: &PhaseConfig, request: T) -> Summary
where
    T: Fn(u64) -> F + Send + Sync + 'static + Clone,
    F: Future<Output = Outcome> + Send + 'static,
{
    info!("Running {config}");

    let metrics = Arc::new(PhaseMetrics::new(&config.name));
    let deadline = Instant::now() + config.duration;
    let rps = config.per_worker_rps();
    debug!("Per-worker rate: {rps:.2}");

    let tasks: Vec<JoinHandle<u64>> = (0..config.workers())
        .map(|_| {
            let request = request.clone();
            let metrics = metrics.clone();
            tokio::spawn(async move { run_worker(request, rps, deadline, &metrics).await })
        })
        .collect();

    for task in tasks {
        match task.await {
            Ok(count) => trace!("Worker finished after {count} requests"),
            Err(err) => error!("Worker task failed: {err}"),
        }
    }

    let summary = metrics.summarize();
    info!("{} metrics: {summary}", config.name);
    summary
}

/// Issue requests at `rps` until `deadline`, returning how many were sent.
///
/// After each attempt the worker sleeps for whatever is left of the interval.
/// A slow attempt is never compensated for with a burst afterwards, and an
/// attempt started before the deadline always runs to completion.
pub(crate) async fn run_worker<T, F>(
    request: T,
    rps: f64,
    deadline: Instant,
    metrics: &PhaseMetrics,
) -> u64
where
    T: Fn(u64) -> F,
    F: Future<Output = Outcome>,
{
    if !rps.is_finite() || rps <= 0. {
        return 0;
    }
    let interval = Duration::try_from_secs_f64(1. / rps).unwrap_or(Duration::MAX);

    let mut idx = 0;
    while Instant::now() < deadline {
        let outcome = request(idx).await;
        metrics.record(&outcome);
        idx += 1;

        if let Some(sleep_for) = interval.checked_sub(outcome.latency) {
            if !sleep_for.is_zero() {
                // Sleeping past the deadline would only delay the end of the phase.
                let wake = Instant::now()
                    .checked_add(sleep_for)
                    .map_or(deadline, |wake| wake.min(deadline));
                sleep_until(wake).await;
            }
        }
    }

    idx
}
