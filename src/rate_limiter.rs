use std::time::{ Duration, Instant };
use tokio::sync::Mutex;

/// Minimum-interval floor for provider endpoints.
///
/// The provider contract is a spacing guarantee, not a quota: at least
/// `min_interval` between consecutive calls on an endpoint. One slot
/// remembering the previous call time is all that takes.
pub struct RateLimiter {
    last_call: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            last_call: Mutex::new(None),
            min_interval,
        }
    }

    /// Wait until the minimum interval since the previous call has passed,
    /// then claim the slot.
    pub async fn wait_for_request(&self) {
        loop {
            let mut last_call = self.last_call.lock().await;
            let now = Instant::now();

            let remaining = match *last_call {
                Some(last) => self.min_interval.saturating_sub(now.duration_since(last)),
                None => Duration::ZERO,
            };

            if remaining.is_zero() {
                *last_call = Some(now);
                return;
            }

            // Sleep without holding the slot; another caller may claim it
            // first, in which case we go around again
            drop(last_call);
            tokio::time::sleep(remaining).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_min_interval_enforced() {
        let limiter = RateLimiter::new(Duration::from_millis(50));

        let start = Instant::now();
        limiter.wait_for_request().await;
        limiter.wait_for_request().await;
        limiter.wait_for_request().await;

        // Two gaps of >= 50ms each
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_first_request_immediate() {
        let limiter = RateLimiter::new(Duration::from_secs(10));
        let start = Instant::now();
        limiter.wait_for_request().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_concurrent_callers_are_spaced() {
        let limiter = std::sync::Arc::new(RateLimiter::new(Duration::from_millis(30)));

        let start = Instant::now();
        let tasks: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.wait_for_request().await;
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(60));
    }
}
