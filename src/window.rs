//! Windowed loss-rate measurement.
//!
//! Runs repeated probes over a fixed wall-clock budget and aggregates them
//! into one [`LossMeasurement`]. Deliberately blocking (in the async sense):
//! measuring loss means spending real elapsed time, so one call occupies the
//! control cycle for roughly the window length.

use crate::core::{LossMeasurement, Probe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, trace};

/// Accumulates probes into per-window loss measurements.
pub struct LossWindow {
    probe: Arc<dyn Probe>,
    probe_interval: Duration,
}

impl LossWindow {
    /// `probe_interval` is both the spacing between probe starts and the
    /// per-probe timeout.
    pub fn new(probe: Arc<dyn Probe>, probe_interval: Duration) -> Self {
        Self {
            probe,
            probe_interval,
        }
    }

    /// Probes `host` repeatedly until `window` wall-clock time has elapsed
    /// and returns the aggregate loss rate.
    ///
    /// Probes start `probe_interval` apart; probe execution time counts
    /// toward the spacing, so a slow probe does not add an extra wait on
    /// top of its own duration. At least one probe runs whenever
    /// `window > 0`. The exact count depends on probe latency; callers
    /// should only rely on `count >= window / probe_interval` (floored).
    pub async fn measure(&self, host: &str, window: Duration) -> LossMeasurement {
        let mut count: u64 = 0;
        let mut lost: u64 = 0;
        let started = Instant::now();

        while started.elapsed() < window {
            let probe_started = Instant::now();
            let reachable = self.probe.probe(host, self.probe_interval).await;
            count += 1;
            if !reachable {
                lost += 1;
            }
            trace!(host, reachable, count, lost, "Probe completed");
            sleep_until(probe_started + self.probe_interval).await;
        }

        let measurement = LossMeasurement::from_counts(count, lost);
        debug!(
            host,
            window_secs = window.as_secs(),
            count = measurement.count,
            lost = measurement.lost,
            rate = measurement.rate,
            "Window complete"
        );
        measurement
    }
}
