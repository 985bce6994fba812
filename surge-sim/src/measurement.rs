use crate::transaction::Outcome;
use metrics_util::AtomicBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use surge_sim_core::Summary;

/// Outcomes recorded by every worker of one phase.
///
/// Writers never block each other: counters are atomics and latencies go into
/// a lock-free bucket. `sent` is derived as `success + errors`, so it can never
/// disagree with the counters.
pub struct PhaseMetrics {
    #[cfg_attr(not(feature = "metrics"), allow(unused))]
    label: String,
    success: AtomicU64,
    error: AtomicU64,
    latency: AtomicBucket<f64>,
}

impl PhaseMetrics {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            success: AtomicU64::new(0),
            error: AtomicU64::new(0),
            latency: AtomicBucket::new(),
        }
    }

    pub fn record(&self, outcome: &Outcome) {
        let latency_ms = outcome.latency_ms();
        self.latency.push(latency_ms);

        #[cfg(feature = "metrics")]
        metrics::histogram!("surge_sim_latency", "phase" => self.label.clone()).record(latency_ms);

        if outcome.success {
            self.success.fetch_add(1, Ordering::Relaxed);

            #[cfg(feature = "metrics")]
            metrics::counter!("surge_sim_success", "phase" => self.label.clone()).increment(1);
        } else {
            self.error.fetch_add(1, Ordering::Relaxed);

            #[cfg(feature = "metrics")]
            metrics::counter!("surge_sim_error", "phase" => self.label.clone()).increment(1);
        }
    }

    pub fn sent(&self) -> u64 {
        self.success.load(Ordering::Relaxed) + self.error.load(Ordering::Relaxed)
    }

    /// Snapshot the recorded outcomes. Intended to be called once all writers
    /// have finished.
    pub fn summarize(&self) -> Summary {
        Summary::new(
            self.success.load(Ordering::Relaxed),
            self.error.load(Ordering::Relaxed),
            self.latency.data(),
        )
    }
}
