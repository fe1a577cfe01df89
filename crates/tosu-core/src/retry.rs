//! Retry strategies for address resolution.
//!
//! Resolution either succeeds for the whole pattern table or fails, so each
//! attempt starts from scratch and the strategy only decides how often and how
//! long to wait in between.

use std::time::Duration;

use crate::config::retry as retry_config;

/// How often resolution is attempted and how long to wait in between.
pub trait RetryStrategy {
    /// Maximum number of attempts. Values below one are treated as one.
    fn max_attempts(&self) -> u32;

    /// Delay after the given failed attempt (0-indexed).
    fn delay_for_attempt(&self, attempt: u32) -> Option<Duration>;

    /// Execute `f` with retry logic.
    ///
    /// `f` receives the attempt index. `should_continue` is consulted before
    /// every new attempt so callers can abort when the owner goes away; when it
    /// returns `false` the last error is returned immediately.
    fn execute<T, E, F, C>(&self, mut f: F, mut should_continue: C) -> Result<T, E>
    where
        F: FnMut(u32) -> Result<T, E>,
        C: FnMut() -> bool,
    {
        let max = self.max_attempts().max(1);
        let mut attempt = 0;

        loop {
            match f(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt + 1 >= max || !should_continue() {
                        return Err(e);
                    }
                    if let Some(delay) = self.delay_for_attempt(attempt) {
                        std::thread::sleep(delay);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

/// Same delay after every failed attempt.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    max_attempts: u32,
    delay: Duration,
}

impl FixedDelay {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(
            retry_config::RESOLVE_ATTEMPTS,
            Duration::from_millis(retry_config::RESOLVE_RETRY_DELAY_MS),
        )
    }
}

impl RetryStrategy for FixedDelay {
    fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    fn delay_for_attempt(&self, _attempt: u32) -> Option<Duration> {
        Some(self.delay)
    }
}
