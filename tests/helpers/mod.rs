//! Shared builders for integration tests.

#![allow(dead_code)]

use dnsguard::config::{Config, ProviderConfig};
use dnsguard::controller::{FailoverController, FailoverPolicy};
use dnsguard::core::DnsTarget;
use dnsguard::dns::MemoryRecordStore;
use dnsguard::probe::FakeProbe;
use dnsguard::window::LossWindow;
use std::sync::Arc;
use std::time::Duration;

pub const PRIMARY_IP: &str = "198.51.100.1";
pub const FAILOVER_IP: &str = "203.0.113.1";

/// A fully filled-in configuration that passes validation.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.server_ip = PRIMARY_IP.to_string();
    config.failover_ip = FAILOVER_IP.to_string();
    config.check_time_seconds = 1;
    config.probe_interval_ms = 100;
    config
}

pub fn test_target(rr: &str) -> DnsTarget {
    DnsTarget {
        domain: "example.com".to_string(),
        rr: rr.to_string(),
        record_type: "A".to_string(),
        ttl: 600,
    }
}

pub fn test_policy(rr: &str, threshold: f64) -> FailoverPolicy {
    FailoverPolicy {
        server_ip: PRIMARY_IP.to_string(),
        failover_ip: FAILOVER_IP.to_string(),
        threshold_percent: threshold,
        target: test_target(rr),
        window: Duration::from_secs(5),
    }
}

/// Controller wired to an in-memory record store and an always-up probe.
/// Tests drive it through `observe` directly.
pub fn test_controller(rr: &str, threshold: f64) -> (FailoverController, Arc<MemoryRecordStore>) {
    let store = Arc::new(MemoryRecordStore::new());
    let window = LossWindow::new(Arc::new(FakeProbe::always_up()), Duration::from_secs(1));
    let controller = FailoverController::new(window, store.clone(), test_policy(rr, threshold));
    (controller, store)
}

/// Provider config pointing at a local mock server.
pub fn mock_provider(endpoint: &str) -> ProviderConfig {
    ProviderConfig {
        access_key_id: "test-access-key".to_string(),
        access_key_secret: "test-secret".to_string(),
        endpoint: endpoint.to_string(),
    }
}
