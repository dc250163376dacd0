pub mod alidns;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use thiserror::Error;

pub use crate::core::RecordStore;
pub use alidns::AlidnsStore;
#[cfg(any(test, feature = "test-utils"))]
pub use memory::MemoryRecordStore;

/// Errors surfaced by a [`RecordStore`].
///
/// All variants are recoverable from the controller's point of view: a failed
/// upsert is logged and the state machine stays put, so the same transition
/// is re-attempted on the next cycle.
#[derive(Error, Debug)]
pub enum DnsError {
    /// The provider rejected the request.
    #[error("DNS API error {code}: {message}")]
    Api { code: String, message: String },

    /// Transport-level failure talking to the provider.
    #[error("DNS API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with something we could not interpret.
    #[error("unexpected DNS API response: {0}")]
    Response(String),
}
