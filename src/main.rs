//! dnsguard - packet-loss triggered DNS failover
//!
//! Periodically measures packet loss to a primary server and fails a DNS
//! record over to a standby IP when loss crosses the configured threshold.

use anyhow::Result;
use clap::Parser;
use dnsguard::{app::App, cli::Cli, config::Config, internal_metrics::LoggingRecorder};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli).unwrap_or_else(|err| {
        eprintln!("failed to load configuration: {err:#}");
        std::process::exit(1);
    });

    let filter = EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("DnsGuard starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Primary Server IP: {}", config.server_ip);
    info!("Failover IP: {}", config.failover_ip);
    info!("Check Window: {}s", config.check_time_seconds);
    info!("Failover Threshold: {}%", config.failover_threshold_percent);
    info!("Probe Interval: {}ms", config.probe_interval_ms);
    info!("Log Metrics: {}", config.metrics.log_metrics);
    info!(
        "Managed Record: {} {} ({}, ttl {})",
        config.dns.rr, config.dns.domain, config.dns.record_type, config.dns.ttl
    );
    info!("Provider Endpoint: {}", config.provider.endpoint);
    info!("-------------------------------------------------------");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut metrics_task: Option<JoinHandle<()>> = None;
    if config.metrics.log_metrics {
        info!(
            "Logging recorder enabled. Metrics will be printed every {} seconds.",
            config.metrics.log_aggregation_seconds
        );
        let (recorder, handle) = LoggingRecorder::new(
            Duration::from_secs(config.metrics.log_aggregation_seconds),
            shutdown_rx.clone(),
        );
        metrics::set_global_recorder(recorder).expect("Failed to install logging recorder");
        metrics_task = Some(handle);
    }

    let app = App::builder(config).build(shutdown_rx).map_err(|err| {
        error!("Startup failed: {err:#}");
        err
    })?;

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down.");
            let _ = shutdown_tx.send(true);
        }
    });

    app.run().await?;

    if let Some(handle) = metrics_task {
        let _ = handle.await;
    }
    Ok(())
}
