//! The failover state machine and control loop.
//!
//! Two states, one threshold in both directions: at or above the threshold
//! the record is pointed at the standby IP, below it at the primary. State
//! only advances after the primary record write succeeds, so the recorded
//! state always matches the last value the DNS provider acknowledged; a
//! failed write is retried naturally when the next window reports the same
//! condition.

use crate::core::{DnsTarget, FailoverState, LossMeasurement, RecordStore};
use crate::window::LossWindow;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Static inputs of the failover policy.
#[derive(Debug, Clone)]
pub struct FailoverPolicy {
    /// IP of the monitored primary server; also the healthy record value.
    pub server_ip: String,
    /// Standby record value applied while the primary is considered down.
    pub failover_ip: String,
    /// Loss percentage at or above which the standby is activated.
    pub threshold_percent: f64,
    /// The record being managed.
    pub target: DnsTarget,
    /// Window length; also the pacing of the control loop.
    pub window: Duration,
}

/// Owns the failover state and drives DNS writes from loss measurements.
pub struct FailoverController {
    window: LossWindow,
    store: Arc<dyn RecordStore>,
    policy: FailoverPolicy,
    state: FailoverState,
}

impl FailoverController {
    /// A fresh controller always assumes the record points at the primary;
    /// if that is wrong after a restart, the first cycle corrects it.
    pub fn new(window: LossWindow, store: Arc<dyn RecordStore>, policy: FailoverPolicy) -> Self {
        Self {
            window,
            store,
            policy,
            state: FailoverState::Primary,
        }
    }

    pub fn state(&self) -> FailoverState {
        self.state
    }

    /// Runs measurement cycles until the shutdown signal fires.
    ///
    /// The window itself consumes one period of wall-clock time, so no extra
    /// sleep is needed between cycles. Shutdown is checked via `select!`, so
    /// a cycle in progress is abandoned rather than drained.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            host = %self.policy.server_ip,
            threshold = self.policy.threshold_percent,
            window_secs = self.policy.window.as_secs(),
            "Failover controller started."
        );
        loop {
            // Bind the measurement first; the window future is dropped when
            // the select ends, before the state machine borrows mutably.
            let measurement = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => {
                    info!("Failover controller received shutdown signal.");
                    break;
                }
                measurement = self.measure() => measurement,
            };
            self.observe(measurement.rate).await;
        }
        info!("Failover controller stopped.");
    }

    /// One measurement window against the primary server.
    ///
    /// The primary is probed even while failed over; recovery is detected
    /// the same way degradation is.
    async fn measure(&self) -> LossMeasurement {
        let measurement = self
            .window
            .measure(&self.policy.server_ip, self.policy.window)
            .await;
        info!(
            host = %self.policy.server_ip,
            count = measurement.count,
            lost = measurement.lost,
            rate = %format_args!("{:.2}%", measurement.rate),
            "Window loss rate"
        );
        metrics::gauge!("loss_rate_percent").set(measurement.rate);
        measurement
    }

    /// Applies the hysteresis rule to one loss rate.
    ///
    /// A rate exactly at the threshold counts as exceeded. Rates on the same
    /// side as the current state are no-ops; nothing is re-written while
    /// already in the target state.
    pub async fn observe(&mut self, rate: f64) {
        let exceeded = rate >= self.policy.threshold_percent;
        match (self.state, exceeded) {
            (FailoverState::Primary, true) => {
                let failover_ip = self.policy.failover_ip.clone();
                warn!(
                    rate = %format_args!("{:.2}%", rate),
                    threshold = self.policy.threshold_percent,
                    "Loss rate exceeded threshold, switching record to failover IP."
                );
                self.transition(FailoverState::Failover, &failover_ip).await;
            }
            (FailoverState::Failover, false) => {
                let server_ip = self.policy.server_ip.clone();
                warn!(
                    rate = %format_args!("{:.2}%", rate),
                    threshold = self.policy.threshold_percent,
                    "Loss rate recovered, switching record back to primary IP."
                );
                self.transition(FailoverState::Primary, &server_ip).await;
            }
            _ => {}
        }
    }

    /// Writes `value` to the target record and, on success, advances the
    /// state. When the record name is the wildcard `*`, the apex record `@`
    /// is mirrored best-effort afterwards; an apex failure is logged but
    /// does not block the transition (the provider offers no multi-record
    /// transaction).
    async fn transition(&mut self, next: FailoverState, value: &str) {
        let spec = self.policy.target.with_value(value);
        match self.store.upsert(&spec).await {
            Ok(()) => {
                self.state = next;
                metrics::counter!("dns_upserts_total", "outcome" => "success").increment(1);
                metrics::counter!("failover_transitions_total", "direction" => next.to_string())
                    .increment(1);
                info!(rr = %spec.rr, value, state = %next, "Record updated.");
            }
            Err(error) => {
                metrics::counter!("dns_upserts_total", "outcome" => "failure").increment(1);
                error!(
                    rr = %spec.rr,
                    value,
                    %error,
                    "Record update failed, keeping state and retrying next cycle."
                );
                return;
            }
        }

        if self.policy.target.rr == "*" {
            let apex = self.policy.target.at_apex().with_value(value);
            match self.store.upsert(&apex).await {
                Ok(()) => info!(value, "Apex record (@) mirrored."),
                Err(error) => {
                    metrics::counter!("dns_upserts_total", "outcome" => "failure").increment(1);
                    warn!(value, %error, "Apex record (@) mirror failed, continuing.");
                }
            }
        }
    }
}
