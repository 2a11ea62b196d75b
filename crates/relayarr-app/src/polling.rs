//! Bounded polling with capped exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, sleep};

/// Delay schedule for a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay before the second check.
    pub initial: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
}

impl Backoff {
    /// Library scan and clean completion (1s → 10s).
    pub const SCAN: Self = Self {
        initial: Duration::from_secs(1),
        max: Duration::from_secs(10),
    };
    /// Waiting for a player to go idle (2s → 30s).
    pub const PLAYBACK: Self = Self {
        initial: Duration::from_secs(2),
        max: Duration::from_secs(30),
    };
    /// Companion file appearance (1s → 5s).
    pub const FILES: Self = Self {
        initial: Duration::from_secs(1),
        max: Duration::from_secs(5),
    };

    /// Delay after the `attempt`-th failed check (0-based).
    #[must_use]
    pub fn delay(self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.min(16));
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The condition held.
    Ready,
    /// The budget elapsed first.
    TimedOut,
}

/// Run `check` until it returns `true` or `budget` elapses.
///
/// The condition is always checked at least once, and once more at the deadline.
pub async fn poll_until<F, Fut>(budget: Duration, backoff: Backoff, mut check: F) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let started = Instant::now();
    let mut attempt = 0;
    loop {
        if check().await {
            return PollOutcome::Ready;
        }
        let elapsed = started.elapsed();
        if elapsed >= budget {
            return PollOutcome::TimedOut;
        }
        sleep(backoff.delay(attempt).min(budget - elapsed)).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_is_bounded() {
        assert_eq!(Backoff::SCAN.delay(0), Duration::from_secs(1));
        assert_eq!(Backoff::SCAN.delay(3), Duration::from_secs(8));
        assert_eq!(Backoff::SCAN.delay(40), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn ready_after_a_few_checks() {
        let counter = AtomicU32::new(0);
        let checks = &counter;
        let outcome = poll_until(Duration::from_secs(60), Backoff::SCAN, move || async move {
            checks.fetch_add(1, Ordering::SeqCst) >= 2
        })
        .await;
        assert_eq!(outcome, PollOutcome::Ready);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_at_budget() {
        let started = Instant::now();
        let outcome =
            poll_until(Duration::from_secs(25), Backoff::SCAN, || async { false }).await;
        assert_eq!(outcome, PollOutcome::TimedOut);
        assert_eq!(started.elapsed(), Duration::from_secs(25));
    }
}
