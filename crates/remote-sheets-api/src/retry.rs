//! Randomized exponential backoff with a wall-clock budget
//!
//! Every call to the remote service goes through [`RetryPolicy::run`]. A
//! transient failure (see [`Transient`]) is retried after sleeping a uniformly
//! random duration in `[0, 2^N)` seconds on the Nth retry. The sleeps share one
//! budget: the wait that would overrun it is shortened to exactly the time left,
//! and the failure after that wait is returned to the caller unchanged.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

use crate::error::ApiError;

/// Default budget for the total time spent sleeping between retries
pub const MAX_WAIT_TIME: Duration = Duration::from_secs(200);

/// Errors that can be told apart into "try again" and "give up"
pub trait Transient {
    fn is_transient(&self) -> bool;
}

impl Transient for ApiError {
    fn is_transient(&self) -> bool {
        ApiError::is_transient(self)
    }
}

/// Backoff state for one wrapped call
#[derive(Debug, Clone)]
pub struct Backoff {
    max_wait_time: Duration,
    num_retry: u32,
    total_wait_time: Duration,
    can_still_wait: bool,
}

impl Backoff {
    pub fn new(max_wait_time: Duration) -> Self {
        Self {
            max_wait_time,
            num_retry: 0,
            total_wait_time: Duration::ZERO,
            can_still_wait: true,
        }
    }

    pub fn num_retry(&self) -> u32 {
        self.num_retry
    }

    pub fn total_wait_time(&self) -> Duration {
        self.total_wait_time
    }

    pub fn can_still_wait(&self) -> bool {
        self.can_still_wait
    }

    /// How long to sleep before the next attempt, or `None` when the budget is spent.
    ///
    /// The returned delay is already accounted for in [`Backoff::total_wait_time`].
    pub fn next_delay<R: Rng>(&mut self, rng: &mut R) -> Option<Duration> {
        if !self.can_still_wait {
            return None;
        }

        self.num_retry += 1;
        let upper_bound = 2f64.powi(self.num_retry.min(62) as i32);
        let candidate = rng.gen::<f64>() * upper_bound;

        let remaining = self.max_wait_time.saturating_sub(self.total_wait_time);
        let delay = if candidate >= remaining.as_secs_f64() {
            self.can_still_wait = false;
            remaining
        } else {
            Duration::from_secs_f64(candidate)
        };

        self.total_wait_time += delay;
        Some(delay)
    }
}

/// Something that can block the current thread for a while
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeps with [`std::thread::sleep`]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Retry configuration shared by every call a client makes
#[derive(Clone)]
pub struct RetryPolicy {
    /// Budget for the total time slept between attempts of one call
    pub max_wait_time: Duration,
    sleeper: Arc<dyn Sleeper + Send + Sync>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_wait_time: MAX_WAIT_TIME,
            sleeper: Arc::new(ThreadSleeper),
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_wait_time", &self.max_wait_time)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn new(max_wait_time: Duration) -> Self {
        Self {
            max_wait_time,
            ..Self::default()
        }
    }

    /// Replace the sleeper, e.g. to record delays instead of blocking
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + Send + Sync + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Call `op` until it succeeds, fails permanently or the budget runs out
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, E>
    where
        E: Transient + fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let mut backoff = Backoff::new(self.max_wait_time);
        let mut rng = rand::thread_rng();

        loop {
            let err = match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => err,
                Err(err) => return Err(err),
            };

            match backoff.next_delay(&mut rng) {
                Some(delay) => {
                    warn!(
                        retry = backoff.num_retry(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, backing off"
                    );
                    self.sleeper.sleep(delay);
                }
                None => {
                    warn!(
                        retries = backoff.num_retry(),
                        waited_ms = backoff.total_wait_time().as_millis() as u64,
                        error = %err,
                        "retry budget exhausted"
                    );
                    return Err(err);
                }
            }
        }
    }

    /// Turn `op` into an operation that retries under this policy
    pub fn wrap<'a, T, E, F>(&'a self, mut op: F) -> impl FnMut() -> Result<T, E> + 'a
    where
        E: Transient + fmt::Display,
        F: FnMut() -> Result<T, E> + 'a,
    {
        move || self.run(&mut op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_delay_bounds_grow_exponentially() {
        // A generator that always yields the largest possible fraction
        let mut rng = StepRng::new(u64::MAX, 0);
        let mut backoff = Backoff::new(Duration::from_secs(10_000));

        for n in 1..=5u32 {
            let delay = backoff.next_delay(&mut rng).unwrap();
            let bound = 2f64.powi(n as i32);
            assert!(delay.as_secs_f64() <= bound);
            assert!(delay.as_secs_f64() > bound * 0.99);
        }
        assert_eq!(backoff.num_retry(), 5);
        assert!(backoff.can_still_wait());
    }

    #[test]
    fn test_final_delay_is_clamped_to_budget() {
        let mut rng = StepRng::new(u64::MAX, 0);
        let mut backoff = Backoff::new(Duration::from_secs(5));

        // ~2s, then ~4s is clamped to what is left of the 5s budget
        let first = backoff.next_delay(&mut rng).unwrap();
        let second = backoff.next_delay(&mut rng).unwrap();
        assert_eq!(first + second, Duration::from_secs(5));
        assert!(!backoff.can_still_wait());
        assert_eq!(backoff.next_delay(&mut rng), None);
        assert_eq!(backoff.total_wait_time(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_budget_waits_once_for_nothing() {
        let mut rng = StepRng::new(0, 0);
        let mut backoff = Backoff::new(Duration::ZERO);
        assert_eq!(backoff.next_delay(&mut rng), Some(Duration::ZERO));
        assert_eq!(backoff.next_delay(&mut rng), None);
    }
}
