use std::fmt::Display;
use std::thread;
use std::time::Duration;

/// Attempts made by a retried operation, including the first one
pub const MAX_ATTEMPTS: u32 = 3;

/// Pause between two attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryPolicy {
            attempts: attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retries
    pub fn once() -> Self {
        RetryPolicy::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::new(MAX_ATTEMPTS, RETRY_DELAY)
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. Each attempt starts from
/// scratch; the error of the final attempt is returned unchanged.
pub fn with_retry<T, E, F>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, E>
where
    E: Display,
    F: FnMut(u32) -> Result<T, E>,
{
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                log::warn!("{} failed (attempt {}/{}): {}", what, attempt, attempts, e);
                if !policy.delay.is_zero() {
                    thread::sleep(policy.delay);
                }
                attempt += 1;
            }
            Err(e) => {
                log::warn!("{} failed after {} attempts: {}", what, attempts, e);
                return Err(e);
            }
        }
    }
}
