//! dnsguard - packet-loss triggered DNS failover
//!
//! This library monitors packet loss to a primary server and repoints a DNS
//! record at a standby IP when loss crosses a threshold, reverting once the
//! primary recovers.

pub mod app;
pub mod cli;
pub mod config;
pub mod controller;
pub mod core;
pub mod dns;
pub mod internal_metrics;
pub mod probe;
pub mod task_manager;
pub mod window;

// Re-export core types for convenience
pub use self::core::*;
