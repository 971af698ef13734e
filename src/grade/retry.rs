use std::thread;
use std::time::Duration;

/// Total attempts per grading call, counting the first.
const MAX_ATTEMPTS: u32 = 2;

/// Fixed pause between attempts. No backoff growth, no jitter.
const PAUSE: Duration = Duration::from_secs(1);

/// How many times to try an operation and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            pause: PAUSE,
        }
    }
}

impl RetryPolicy {
    /// Effective attempt count; a policy of zero still tries once.
    pub const fn attempts(&self) -> u32 {
        if self.max_attempts == 0 {
            1
        } else {
            self.max_attempts
        }
    }
}

/// Execute `f` up to `policy.attempts()` times, sleeping `policy.pause`
/// between failures. Every error is retried.
///
/// # Errors
///
/// Returns the error from the final attempt if all attempts fail.
pub fn with_retry<T, F>(policy: RetryPolicy, operation: &str, mut f: F) -> anyhow::Result<T>
where
    F: FnMut() -> anyhow::Result<T>,
{
    let attempts = policy.attempts();
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(val) => return Ok(val),
            Err(e) => {
                if attempt >= attempts {
                    return Err(e);
                }
                tracing::debug!(
                    "{operation}: attempt {attempt}/{attempts} failed ({e:#}), retrying in {:?}",
                    policy.pause
                );
                attempt += 1;
                thread::sleep(policy.pause);
            }
        }
    }
}
