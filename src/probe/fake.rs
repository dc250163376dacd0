//! Scripted probe for tests.

use crate::core::Probe;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Fake [`Probe`] returning scripted outcomes, then a default.
///
/// Outcomes are consumed front-to-back; once the script is exhausted every
/// further probe returns the default outcome. The fake never sleeps, so
/// paused-clock tests control window timing precisely.
pub struct FakeProbe {
    outcomes: Mutex<VecDeque<bool>>,
    default_outcome: bool,
    calls: Mutex<u64>,
}

impl FakeProbe {
    /// A probe that always reports the host reachable.
    pub fn always_up() -> Self {
        Self::with_default(true)
    }

    /// A probe that always reports the host unreachable.
    pub fn always_down() -> Self {
        Self::with_default(false)
    }

    pub fn with_default(default_outcome: bool) -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            default_outcome,
            calls: Mutex::new(0),
        }
    }

    /// Queues outcomes for the next probe calls.
    pub fn script(&self, outcomes: impl IntoIterator<Item = bool>) {
        self.outcomes.lock().unwrap().extend(outcomes);
    }

    /// Number of probe calls observed so far.
    pub fn calls(&self) -> u64 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn probe(&self, _host: &str, _timeout: Duration) -> bool {
        *self.calls.lock().unwrap() += 1;
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.default_outcome)
    }
}
