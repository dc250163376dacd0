//! Core domain types and service traits for dnsguard
//!
//! This module defines the fundamental data structures and trait contracts
//! that govern component interactions throughout the application.

use crate::dns::DnsError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which IP the monitored DNS record currently points at.
///
/// There is exactly one instance per run, owned by the controller. It is only
/// mutated after the corresponding DNS write has succeeded, so it always
/// reflects the last value the provider acknowledged. It is never persisted;
/// a restart starts at `Primary` and is corrected by the first control cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverState {
    Primary,
    Failover,
}

impl fmt::Display for FailoverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailoverState::Primary => write!(f, "primary"),
            FailoverState::Failover => write!(f, "failover"),
        }
    }
}

/// Aggregate outcome of one measurement window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossMeasurement {
    /// Probes sent during the window.
    pub count: u64,
    /// Probes that received no reply.
    pub lost: u64,
    /// Loss percentage in `[0, 100]`. `0.0` for an empty window.
    pub rate: f64,
}

impl LossMeasurement {
    /// Builds a measurement from raw tallies, deriving the loss percentage.
    pub fn from_counts(count: u64, lost: u64) -> Self {
        let rate = if count > 0 {
            lost as f64 / count as f64 * 100.0
        } else {
            0.0
        };
        Self { count, lost, rate }
    }
}

/// The DNS record the controller manages, minus its value.
///
/// Static for the lifetime of a run; paired with either the primary or the
/// failover IP at transition time to form a [`RecordSpec`].
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DnsTarget {
    /// Registered domain, e.g. `example.com`.
    pub domain: String,
    /// Record name (RR), e.g. `www` or `*`.
    pub rr: String,
    /// Record type, e.g. `A`.
    pub record_type: String,
    /// Record TTL in seconds.
    pub ttl: u32,
}

impl DnsTarget {
    /// Pairs this target with a concrete value for an upsert.
    pub fn with_value(&self, value: &str) -> RecordSpec {
        RecordSpec {
            domain: self.domain.clone(),
            rr: self.rr.clone(),
            record_type: self.record_type.clone(),
            value: value.to_string(),
            ttl: self.ttl,
        }
    }

    /// The same target addressed at the zone apex (`@`). Used to mirror
    /// wildcard records.
    pub fn at_apex(&self) -> DnsTarget {
        DnsTarget {
            rr: "@".to_string(),
            ..self.clone()
        }
    }
}

/// One fully-specified DNS record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    pub domain: String,
    pub rr: String,
    pub record_type: String,
    pub value: String,
    pub ttl: u32,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Issues one reachability check against a host.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Sends a single echo request to `host`, waiting at most `timeout`.
    ///
    /// Fails closed: transport errors, malformed hosts, and timeouts all
    /// return `false`. Never retries; retrying is a windowing concern.
    async fn probe(&self, host: &str, timeout: Duration) -> bool;
}

/// Create-or-update access to a DNS record directory.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Idempotently applies `spec`: a record matching the exact
    /// `(domain, rr, record_type)` key is overwritten in place, preserving
    /// its identity; otherwise a new record is created. Records of a
    /// different type under the same name are never touched.
    async fn upsert(&self, spec: &RecordSpec) -> Result<(), DnsError>;
}
