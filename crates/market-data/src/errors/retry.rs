/// Classification for retry policy.
///
/// Used by the gateway's retry loop to decide whether another attempt
/// against the same upstream makes sense.
///
/// | Class | Retry? | Delay |
/// |-------|--------|-------|
/// | `Never` | No | - |
/// | `WithBackoff` | Yes, until the attempt budget is spent | `base * 2^attempt` |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never retry - bad symbol, validation error, upstream failure.
    /// Retrying the same call won't help.
    Never,

    /// Retry after an exponential delay.
    ///
    /// Used for rate limiting (HTTP 429 or the provider's equivalent).
    WithBackoff,
}
