//! Application wiring, decoupled from the entry point.

use crate::config::Config;
use crate::controller::{FailoverController, FailoverPolicy};
use crate::core::{Probe, RecordStore};
use crate::dns::AlidnsStore;
use crate::probe::PingProbe;
use crate::task_manager::TaskManager;
use crate::window::LossWindow;
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

/// A handle to the running application.
pub struct App {
    task_manager: TaskManager,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Waits for the shutdown signal, then joins all tasks.
    pub async fn run(self) -> Result<()> {
        let mut shutdown_rx = self.task_manager.get_shutdown_rx();
        shutdown_rx.changed().await.ok();
        info!("Shutdown signal received, waiting for tasks.");
        self.task_manager.shutdown().await;
        info!("All tasks shut down gracefully.");
        Ok(())
    }
}

/// Builder for the main application.
///
/// Separates component construction from running, and lets tests swap the
/// probe and the record store for fakes.
pub struct AppBuilder {
    config: Config,
    probe_override: Option<Arc<dyn Probe>>,
    record_store_override: Option<Arc<dyn RecordStore>>,
}

impl AppBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            probe_override: None,
            record_store_override: None,
        }
    }

    /// Overrides the probe for testing.
    pub fn probe_override(mut self, probe: Arc<dyn Probe>) -> Self {
        self.probe_override = Some(probe);
        self
    }

    /// Overrides the record store for testing.
    pub fn record_store_override(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.record_store_override = Some(store);
        self
    }

    /// Validates the configuration, builds all components, and starts the
    /// control loop under the task manager.
    pub fn build(self, shutdown_rx: watch::Receiver<bool>) -> Result<App> {
        let config = self.config;
        config.validate()?;

        let task_manager = TaskManager::new(shutdown_rx);

        // Probe capability is checked here, once; a missing ping binary
        // aborts the run before the loop starts.
        let probe: Arc<dyn Probe> = match self.probe_override {
            Some(probe) => probe,
            None => Arc::new(PingProbe::detect()?),
        };

        let store: Arc<dyn RecordStore> = match self.record_store_override {
            Some(store) => store,
            None => {
                config.provider.validate()?;
                Arc::new(AlidnsStore::from_config(&config.provider)?)
            }
        };

        let window = LossWindow::new(probe, Duration::from_millis(config.probe_interval_ms));
        let policy = FailoverPolicy {
            server_ip: config.server_ip.clone(),
            failover_ip: config.failover_ip.clone(),
            threshold_percent: config.failover_threshold_percent,
            target: config.dns.clone(),
            window: Duration::from_secs(config.check_time_seconds),
        };
        let controller = FailoverController::new(window, store, policy);

        let controller_shutdown_rx = task_manager.get_shutdown_rx();
        task_manager.spawn("FailoverController", async move {
            controller.run(controller_shutdown_rx).await;
        });

        Ok(App { task_manager })
    }
}
