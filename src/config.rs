//! Configuration management for dnsguard
//!
//! Defines the `Config` struct and loads it with `figment`, layering
//! defaults, a TOML file, `DNSGUARD_`-prefixed environment variables, and
//! command-line flags. Validation runs once at startup; an invalid
//! configuration is fatal before the control loop starts.

use crate::cli::Cli;
use crate::core::DnsTarget;
use anyhow::{bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default config file path, next to the binary's working directory.
pub const DEFAULT_CONFIG_PATH: &str = "dnsguard.toml";

/// Placeholder IP shipped in the default config; refusing to run with it
/// forces the operator to actually fill the file in.
const PLACEHOLDER_IP: &str = "127.0.0.1";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Tracing filter, e.g. `info` or `dnsguard=debug`.
    pub log_level: String,
    /// IP of the primary server; both the probe target and the healthy
    /// record value.
    pub server_ip: String,
    /// Standby record value applied when loss exceeds the threshold.
    pub failover_ip: String,
    /// Measurement window length in seconds; also the control cycle period.
    pub check_time_seconds: u64,
    /// Loss percentage at or above which failover triggers.
    pub failover_threshold_percent: f64,
    /// Spacing between probes and per-probe timeout, in milliseconds.
    pub probe_interval_ms: u64,
    /// The DNS record being managed.
    pub dns: DnsTarget,
    /// DNS provider endpoint and credentials.
    pub provider: ProviderConfig,
    /// Periodic metrics logging.
    pub metrics: MetricsConfig,
}

/// Controls the periodic logging of internal metrics.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MetricsConfig {
    /// Log captured metrics to the console periodically.
    #[serde(default)]
    pub log_metrics: bool,
    /// The interval at which metrics are printed, in seconds.
    pub log_aggregation_seconds: u64,
}

/// DNS provider access configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    pub access_key_id: String,
    pub access_key_secret: String,
    /// API endpoint; overridable for tests.
    pub endpoint: String,
}

impl ProviderConfig {
    /// Credentials are only required when the real provider client is
    /// constructed; tests with an injected record store skip this.
    pub fn validate(&self) -> Result<()> {
        if self.access_key_id.is_empty() || self.access_key_secret.is_empty() {
            bail!("provider.access_key_id and provider.access_key_secret must be set");
        }
        if self.endpoint.is_empty() {
            bail!("provider.endpoint must not be empty");
        }
        Ok(())
    }
}

impl Config {
    /// Loads the configuration by layering defaults <- TOML file <-
    /// environment <- CLI flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .as_deref()
            .unwrap_or_else(|| std::path::Path::new(DEFAULT_CONFIG_PATH));
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. DNSGUARD_SERVER_IP=198.51.100.1, DNSGUARD_DNS__RR=www
            .merge(Env::prefixed("DNSGUARD_").split("__"))
            .merge(cli.clone())
            .extract()
            .context("failed to load configuration")?;
        Ok(config)
    }

    /// Rejects configurations the control loop cannot run with. Called once
    /// at startup; the placeholder-IP check mirrors the shipped default
    /// config, which must be edited before first use.
    pub fn validate(&self) -> Result<()> {
        if self.server_ip.is_empty() || self.server_ip == PLACEHOLDER_IP {
            bail!(
                "server_ip is unset (or still the placeholder {}); edit the config before starting",
                PLACEHOLDER_IP
            );
        }
        if self.failover_ip.is_empty() || self.failover_ip == PLACEHOLDER_IP {
            bail!("failover_ip is unset; edit the config before starting");
        }
        if self.check_time_seconds == 0 {
            bail!("check_time_seconds must be at least 1");
        }
        if self.probe_interval_ms == 0 {
            bail!("probe_interval_ms must be at least 1");
        }
        if !(0.0..=100.0).contains(&self.failover_threshold_percent) {
            bail!(
                "failover_threshold_percent must be within [0, 100], got {}",
                self.failover_threshold_percent
            );
        }
        if self.dns.domain.is_empty() || self.dns.rr.is_empty() || self.dns.record_type.is_empty()
        {
            bail!("dns.domain, dns.rr and dns.record_type must all be set");
        }
        if self.metrics.log_metrics && self.metrics.log_aggregation_seconds == 0 {
            bail!("metrics.log_aggregation_seconds must be at least 1 when log_metrics is enabled");
        }
        Ok(())
    }
}

// Defaults double as the base figment layer and as the shipped sample config.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server_ip: PLACEHOLDER_IP.to_string(),
            failover_ip: PLACEHOLDER_IP.to_string(),
            check_time_seconds: 60,
            failover_threshold_percent: 10.0,
            probe_interval_ms: 1000,
            dns: DnsTarget {
                domain: "example.com".to_string(),
                rr: "www".to_string(),
                record_type: "A".to_string(),
                ttl: 600,
            },
            provider: ProviderConfig {
                access_key_id: String::new(),
                access_key_secret: String::new(),
                endpoint: "https://alidns.aliyuncs.com".to_string(),
            },
            metrics: MetricsConfig {
                log_metrics: false,
                log_aggregation_seconds: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            server_ip: "198.51.100.1".to_string(),
            failover_ip: "203.0.113.1".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn default_config_is_rejected_as_placeholder() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("server_ip"));
    }

    #[test]
    fn filled_in_config_validates() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = Config {
            check_time_seconds: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn threshold_outside_percent_range_is_rejected() {
        for threshold in [-1.0, 100.5] {
            let config = Config {
                failover_threshold_percent: threshold,
                ..valid()
            };
            assert!(config.validate().is_err(), "accepted {threshold}");
        }
    }

    #[test]
    fn empty_record_name_is_rejected() {
        let mut config = valid();
        config.dns.rr.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_metrics_interval_is_rejected_when_logging_enabled() {
        let mut config = valid();
        config.metrics.log_metrics = true;
        config.metrics.log_aggregation_seconds = 0;
        assert!(config.validate().is_err());
        config.metrics.log_metrics = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_credentials_are_rejected_by_provider_validation() {
        let config = valid();
        assert!(config.provider.validate().is_err());
    }
}
