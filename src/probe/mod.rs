//! Host reachability probing via the system `ping` binary.

pub mod ping;
#[cfg(any(test, feature = "test-utils"))]
pub mod fake;

pub use ping::PingProbe;
#[cfg(any(test, feature = "test-utils"))]
pub use fake::FakeProbe;

use thiserror::Error;

/// Probe capability errors. Only surfaced at startup; per-probe failures
/// never propagate and are absorbed into the loss tally instead.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("no `ping` executable found on PATH; cannot measure reachability")]
    PingUnavailable,
}
