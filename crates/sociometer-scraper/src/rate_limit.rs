//! Minimum spacing between outbound page loads.
//!
//! State is private to each scraper instance: two platform scrapers running
//! concurrently never throttle each other.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Option<Instant>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Sleeps until at least `min_interval` has passed since the previous
    /// call, then records the current instant. The first call returns
    /// immediately.
    pub async fn wait(&mut self) {
        if let Some(last) = self.last {
            let ready_at = last + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                let delay = ready_at - now;
                tracing::debug!(delay_ms = delay.as_millis(), "rate limiter sleeping");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        self.last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_call_does_not_wait() {
        let mut limiter = RateLimiter::new(Duration::from_secs(3));
        let start = Instant::now();
        limiter.wait().await;
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn second_call_waits_for_the_remaining_interval() {
        let mut limiter = RateLimiter::new(Duration::from_secs(3));
        let start = Instant::now();
        limiter.wait().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        limiter.wait().await;
        assert!(Instant::now() - start >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn no_wait_when_interval_already_elapsed() {
        let mut limiter = RateLimiter::new(Duration::from_millis(500));
        limiter.wait().await;
        tokio::time::advance(Duration::from_secs(2)).await;
        let before = Instant::now();
        limiter.wait().await;
        assert_eq!(Instant::now() - before, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn instances_are_independent() {
        let mut a = RateLimiter::new(Duration::from_secs(10));
        let mut b = RateLimiter::new(Duration::from_secs(10));
        a.wait().await;
        let before = Instant::now();
        b.wait().await;
        assert_eq!(Instant::now() - before, Duration::ZERO);
    }
}
