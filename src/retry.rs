use std::future::Future;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::time::sleep;

use crate::{ClientOptions, ErrorKind, Result, SharpAiError};

/// Exponential backoff retry policy.
///
/// Runs one logical call as a sequence of attempts, never more than one in
/// flight at a time. Only failures reported by
/// [`SharpAiError::is_retryable`] trigger another attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
    jitter: bool,
    max_elapsed: Option<Duration>,
}

/// Bookkeeping for one logical call.
#[derive(Clone, Copy, Debug)]
pub(crate) struct AttemptRecord {
    pub(crate) index: usize,
    started: Instant,
    // Only logged; kept so the give-up event names the failure category.
    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    last_failure: Option<ErrorKind>,
}

impl AttemptRecord {
    fn new() -> Self {
        Self {
            index: 0,
            started: Instant::now(),
            last_failure: None,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    fn record_failure(&mut self, err: &SharpAiError) {
        self.last_failure = Some(err.kind());
    }

    /// Whether another retry is left within `max_retries`.
    fn has_retry_left(&self, max_retries: usize) -> bool {
        self.index < max_retries
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            max_delay,
            jitter: false,
            max_elapsed: None,
        }
    }

    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            base_delay: Duration::from_millis(options.retry_backoff_ms),
            max_delay: Duration::from_millis(options.max_retry_backoff_ms),
            jitter: options.retry_jitter,
            max_elapsed: options.max_retry_elapsed_ms.map(Duration::from_millis),
        }
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Option<Duration>) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Upper bound of the delay slept after failed attempt `attempt` (0-based).
    ///
    /// Grows as `base * 2^attempt` and saturates at the configured maximum.
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let exp = attempt.min(16) as u32;
        let multiplier = 1u32 << exp;
        self.base_delay
            .checked_mul(multiplier)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    fn sleep_duration(&self, attempt: usize) -> Duration {
        let delay = self.delay_for(attempt);
        if !self.jitter {
            return delay;
        }
        let ceiling = delay.as_millis() as u64;
        let floor = ceiling / 2;
        Duration::from_millis(rand::thread_rng().gen_range(floor..=ceiling))
    }

    /// Runs `attempt` until it succeeds, fails permanently, or the retry
    /// budget is spent.
    ///
    /// When at least one retry happened before giving up, the last failure is
    /// wrapped in [`SharpAiError::RetriesExhausted`].
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn run<T, F, Fut>(&self, target: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut record = AttemptRecord::new();
        loop {
            #[cfg(feature = "tracing")]
            tracing::debug!(attempt = record.index + 1, request = target, "sending request");

            let err = match attempt().await {
                Ok(value) => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(attempt = record.index + 1, request = target, "request succeeded");
                    return Ok(value);
                }
                Err(err) => err,
            };
            record.record_failure(&err);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                attempt = record.index + 1,
                request = target,
                category = ?err.kind(),
                "request attempt failed: {err}"
            );

            if !err.is_retryable() {
                return Err(err);
            }

            let delay = self.sleep_duration(record.index);
            let over_deadline = self
                .max_elapsed
                .is_some_and(|limit| record.elapsed() + delay > limit);

            if !record.has_retry_left(self.max_retries) || over_deadline {
                if record.index == 0 {
                    return Err(err);
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    attempts = record.index + 1,
                    request = target,
                    category = ?record.last_failure,
                    elapsed_ms = record.elapsed().as_millis() as u64,
                    "giving up after retries"
                );
                return Err(SharpAiError::RetriesExhausted {
                    attempts: record.index + 1,
                    last: Box::new(err),
                });
            }

            #[cfg(feature = "tracing")]
            tracing::debug!(
                request = target,
                delay_ms = delay.as_millis() as u64,
                "retrying request"
            );

            sleep(delay).await;
            record.index += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_options(&ClientOptions::default())
    }
}
