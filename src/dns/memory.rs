//! In-memory record store for tests.

use crate::core::{RecordSpec, RecordStore};
use crate::dns::DnsError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A stored record. `id` is assigned at creation and preserved across
/// updates, mirroring the provider's record identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub id: u64,
    pub domain: String,
    pub rr: String,
    pub record_type: String,
    pub value: String,
    pub ttl: u32,
}

/// In-memory [`RecordStore`] implementing the upsert contract exactly,
/// plus scripting hooks for failure injection and a log of every call.
#[derive(Default)]
pub struct MemoryRecordStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: Vec<StoredRecord>,
    next_id: u64,
    upserts: Vec<RecordSpec>,
    failures: VecDeque<DnsError>,
    failing_rrs: Vec<String>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an error to be returned by the next upsert call instead of
    /// applying it.
    pub fn fail_next_upsert(&self) {
        self.inner.lock().unwrap().failures.push_back(DnsError::Api {
            code: "Throttling".to_string(),
            message: "simulated provider failure".to_string(),
        });
    }

    /// Makes every upsert for the given record name fail, regardless of the
    /// queued one-shot failures. Useful to fail only the apex mirror while
    /// the wildcard write succeeds.
    pub fn fail_upserts_for(&self, rr: &str) {
        self.inner.lock().unwrap().failing_rrs.push(rr.to_string());
    }

    /// Every upsert attempted so far, including failed ones, in order.
    pub fn upserts(&self) -> Vec<RecordSpec> {
        self.inner.lock().unwrap().upserts.clone()
    }

    /// Current record set.
    pub fn records(&self) -> Vec<StoredRecord> {
        self.inner.lock().unwrap().records.clone()
    }

    /// The record with the exact `(domain, rr, record_type)` key, if present.
    pub fn record(&self, domain: &str, rr: &str, record_type: &str) -> Option<StoredRecord> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.domain == domain && r.rr == rr && r.record_type == record_type)
            .cloned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert(&self, spec: &RecordSpec) -> Result<(), DnsError> {
        let mut inner = self.inner.lock().unwrap();
        inner.upserts.push(spec.clone());
        if let Some(err) = inner.failures.pop_front() {
            return Err(err);
        }
        if inner.failing_rrs.iter().any(|rr| rr == &spec.rr) {
            return Err(DnsError::Api {
                code: "OperationDenied".to_string(),
                message: format!("simulated failure for rr {}", spec.rr),
            });
        }

        if let Some(existing) = inner.records.iter_mut().find(|r| {
            r.domain == spec.domain && r.rr == spec.rr && r.record_type == spec.record_type
        }) {
            existing.value = spec.value.clone();
            existing.ttl = spec.ttl;
        } else {
            inner.next_id += 1;
            let id = inner.next_id;
            inner.records.push(StoredRecord {
                id,
                domain: spec.domain.clone(),
                rr: spec.rr.clone(),
                record_type: spec.record_type.clone(),
                value: spec.value.clone(),
                ttl: spec.ttl,
            });
        }
        Ok(())
    }
}
