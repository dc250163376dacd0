//! Command-line interface.
//!
//! The CLI carries only diagnostic and override flags; everything of
//! substance lives in the config file. The struct doubles as a
//! `figment::Provider` so flags land in the same layering as the file and
//! environment.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Packet-loss monitor that fails a DNS record over to a standby IP.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Force debug-level logging regardless of the configured level.
    #[arg(long)]
    pub debug: bool,

    /// Override the failover threshold percentage.
    #[arg(long, value_name = "PERCENT")]
    pub threshold: Option<f64>,

    /// Override the measurement window length in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub check_time: Option<u64>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if self.debug {
            dict.insert("log_level".into(), Value::from("debug"));
        }
        if let Some(threshold) = self.threshold {
            dict.insert("failover_threshold_percent".into(), Value::from(threshold));
        }
        if let Some(check_time) = self.check_time {
            dict.insert("check_time_seconds".into(), Value::from(check_time));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
