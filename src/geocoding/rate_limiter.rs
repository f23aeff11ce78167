use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Enforces a minimum spacing between successive provider calls
pub struct RateLimiter {
    min_delay: Duration,
    last_call: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_call: None,
        }
    }

    /// Time left before the next call may start
    pub fn time_until_next_request(&self) -> Duration {
        match self.last_call {
            Some(last) => self.min_delay.saturating_sub(last.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Wait out the remaining delay, then record the new call
    pub async fn acquire(&mut self) {
        let wait = self.time_until_next_request();
        if !wait.is_zero() {
            debug!("Rate limiting: waiting {:.2}s", wait.as_secs_f64());
            tokio::time::sleep(wait).await;
        }
        self.last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_call_is_immediate() {
        let mut limiter = RateLimiter::new(Duration::from_secs(60));
        assert_eq!(limiter.time_until_next_request(), Duration::ZERO);

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_calls_are_spaced() {
        let mut limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        limiter.acquire().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_zero_delay_never_waits() {
        let mut limiter = RateLimiter::new(Duration::ZERO);
        limiter.acquire().await;
        assert_eq!(limiter.time_until_next_request(), Duration::ZERO);
    }
}
