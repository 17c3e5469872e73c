use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Spaces out outgoing requests to stay under the API's flood limits
pub struct RateLimiter {
    delay: Duration,
    last_request: Option<Instant>,
}

impl RateLimiter {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_request: None,
        }
    }

    pub async fn wait(&mut self) {
        if let Some(remaining) = self.remaining() {
            sleep(remaining).await;
        }
        self.last_request = Some(Instant::now());
    }

    /// Time still to wait before the next request may go out
    fn remaining(&self) -> Option<Duration> {
        let elapsed = self.last_request?.elapsed();
        self.delay.checked_sub(elapsed).filter(|d| !d.is_zero())
    }
}
