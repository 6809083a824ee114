//! Rate limiting configuration.
//!
//! Describes how gently a provider has to be called: how long to back off
//! after it rate limits us, and how far apart consecutive calls of one batch
//! should be.

use std::time::Duration;

/// Rate limiting configuration for a provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimit {
    /// Base of the exponential backoff after a rate-limited attempt.
    /// The delay after attempt `n` (0-based) is `backoff_base * 2^n`.
    pub backoff_base: Duration,

    /// Minimum delay between consecutive calls of one batch.
    pub min_delay: Duration,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self {
            backoff_base: Duration::from_secs(1),
            min_delay: Duration::from_secs(1),
        }
    }
}
