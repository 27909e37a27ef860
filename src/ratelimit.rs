use std::time::Duration;

use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::{QuantaClock, QuantaInstant},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};

type SpecificGovernorRateLimiter =
    GovernorRateLimiter<NotKeyed, InMemoryState, QuantaClock, NoOpMiddleware<QuantaInstant>>;

/// Courtesy pause between page fetches: the first request goes out
/// immediately, every later one waits until `delay` has passed since the
/// previous one.
pub struct RateLimiter {
    between_requests: SpecificGovernorRateLimiter,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> anyhow::Result<Self> {
        // A zero period is rejected by governor; treat it as "barely any".
        let period = delay.max(Duration::from_millis(1));
        let quota = Quota::with_period(period)
            .ok_or_else(|| anyhow::anyhow!("invalid request delay: {:?}", delay))?;
        Ok(RateLimiter {
            between_requests: GovernorRateLimiter::direct(quota),
        })
    }

    pub async fn wait_until_ready(&self) {
        self.between_requests.until_ready().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn spaces_out_consecutive_requests() {
        let limiter = RateLimiter::new(Duration::from_millis(50)).unwrap();
        let start = Instant::now();
        limiter.wait_until_ready().await;
        limiter.wait_until_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(40));
    }
}
