//! Transfer throttling using a token bucket.
//!
//! Tokens are bytes. The bucket refills at `rate` bytes per second and holds
//! at most one second's worth, which bounds the short-term burst: over any
//! window of `t` seconds at most `rate + rate * t` bytes pass.

use std::time::Duration;
use tokio::time::Instant;

/// Shortest sleep while waiting for a refill.
const MIN_WAIT: Duration = Duration::from_millis(1);

/// Token bucket owned by a single transfer.
///
/// The bucket starts full, so the first second's worth of bytes passes
/// without delay.
#[derive(Debug)]
pub struct RateLimiter {
    /// Refill rate in bytes per second.
    rate: u64,
    /// Bucket capacity in bytes.
    capacity: u64,
    /// Available tokens. Fractional so slow refills are not rounded away.
    tokens: f64,
    last_refill: Instant,
}

impl RateLimiter {
    /// Creates a limiter capping throughput at `bytes_per_second`.
    ///
    /// A rate of zero is raised to one byte per second.
    #[must_use]
    pub fn new(bytes_per_second: u64) -> Self {
        let rate = bytes_per_second.max(1);
        Self {
            rate,
            capacity: rate,
            tokens: rate as f64,
            last_refill: Instant::now(),
        }
    }

    /// Bytes per second this limiter admits on average.
    pub fn rate(&self) -> u64 {
        self.rate
    }

    /// Waits until `bytes` may be transferred.
    ///
    /// Requests larger than the bucket are admitted piecewise as tokens
    /// accumulate, so a single large chunk cannot exceed the burst bound.
    pub async fn acquire(&mut self, bytes: u64) {
        let mut remaining = bytes;

        while remaining > 0 {
            self.refill();

            let available = self.tokens.floor() as u64;
            let take = remaining.min(available);
            if take > 0 {
                self.tokens -= take as f64;
                remaining -= take;
                continue;
            }

            let wanted = remaining.min(self.capacity) as f64 - self.tokens;
            let wait = Duration::from_secs_f64(wanted / self.rate as f64).max(MIN_WAIT);
            tokio::time::sleep(wait).await;
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.last_refill = now;

        let added = self.rate as f64 * elapsed.as_secs_f64();
        self.tokens = (self.tokens + added).min(self.capacity as f64);
    }
}
