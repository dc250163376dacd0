//! A metrics recorder that periodically logs all captured metrics.
//!
//! The control loop emits gauges and counters through the `metrics` facade;
//! this recorder captures them in an in-process registry and prints a
//! snapshot on a fixed interval. There is no exporter and no listening
//! socket, the log stream is the only output.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A metrics recorder that periodically logs all captured metrics.
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

impl LoggingRecorder {
    /// Creates a new `LoggingRecorder` and starts a background task that
    /// prints a metrics snapshot every `snapshot_interval`.
    pub fn new(
        snapshot_interval: Duration,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> (Self, JoinHandle<()>) {
        let registry = Arc::new(Registry::new(AtomicStorage));
        let recorder = Self {
            registry: registry.clone(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(snapshot_interval);
            // The first tick fires immediately; skip it so the first
            // snapshot covers a full interval.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        debug!("--- Metrics Snapshot ---");
                        for (key, counter) in registry.get_counter_handles() {
                            let value = counter.load(Ordering::Relaxed);
                            info!("[Counter] {}: {}", key, value);
                        }
                        for (key, gauge) in registry.get_gauge_handles() {
                            let value = f64::from_bits(gauge.load(Ordering::Relaxed));
                            info!("[Gauge] {}: {:.2}", key, value);
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Metrics logging task received shutdown signal.");
                        break;
                    }
                }
            }
        });

        (recorder, handle)
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    fn register_histogram(&self, key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        self.registry
            .get_or_create_histogram(key, |h| h.clone())
            .into()
    }
}
