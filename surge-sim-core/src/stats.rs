use std::fmt;

/// Outcome counts and latency statistics for a single phase.
///
/// Latencies are in milliseconds. `latency` is `None` when the phase recorded
/// no samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sent: u64,
    pub success: u64,
    pub errors: u64,
    pub latency: Option<LatencyStats>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LatencyStats {
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Summary {
    pub fn new(success: u64, errors: u64, mut latencies: Vec<f64>) -> Self {
        let latency = if latencies.is_empty() {
            None
        } else {
            let avg = statistical::mean(&latencies);
            latencies.sort_by(f64::total_cmp);
            Some(LatencyStats {
                avg,
                p50: nearest_rank(&latencies, 0.50),
                p95: nearest_rank(&latencies, 0.95),
            })
        };

        Self {
            sent: success + errors,
            success,
            errors,
            latency,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latency.is_none()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.latency {
            None => write!(f, "no samples"),
            Some(LatencyStats { avg, p50, p95 }) => write!(
                f,
                "sent={} success={} errors={} avg={avg:.1}ms p50={p50:.1}ms p95={p95:.1}ms",
                self.sent, self.success, self.errors,
            ),
        }
    }
}

/// Zero-indexed nearest-rank percentile over ascending `sorted`.
fn nearest_rank(sorted: &[f64], quantile: f64) -> f64 {
    let idx = (quantile * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx]
}
