/// Configures HTTP timeout and retry behavior.
///
/// Applying options to a client replaces every field; nothing is merged with
/// the previous values.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds, including reading a streamed body.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub retry_backoff_ms: u64,
    /// Upper bound for a single backoff delay.
    pub max_retry_backoff_ms: u64,
    /// Randomizes each delay within its upper half.
    pub retry_jitter: bool,
    /// Stops retrying once this much time has passed since the first attempt.
    pub max_retry_elapsed_ms: Option<u64>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 3,
            retry_backoff_ms: 250,
            max_retry_backoff_ms: 8_000,
            retry_jitter: false,
            max_retry_elapsed_ms: None,
        }
    }
}
