use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Per-IP sliding-window limiter applied to the whole API surface.
pub struct ApiRateLimiter {
    /// ip -> (count, window_start)
    entries: DashMap<IpAddr, (u32, Instant)>,
}

impl ApiRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if a request is allowed. Returns Ok(()) or Err with
    /// retry-after seconds.
    pub fn check(&self, ip: IpAddr, limit: u32, window_secs: u64) -> Result<(), u64> {
        let window = Duration::from_secs(window_secs);
        let now = Instant::now();

        let mut entry = self.entries.entry(ip).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(window_secs.saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Remove stale entries older than the given duration.
    pub fn cleanup(&self, max_age: Duration) {
        let now = Instant::now();
        self.entries.retain(|_, (_, start)| now.duration_since(*start) < max_age);
    }
}

impl Default for ApiRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::from([127, 0, 0, last])
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = ApiRateLimiter::new();

        for _ in 0..3 {
            assert!(limiter.check(ip(1), 3, 60).is_ok());
        }
        assert!(limiter.check(ip(1), 3, 60).is_err());
    }

    #[test]
    fn limits_are_tracked_per_ip() {
        let limiter = ApiRateLimiter::new();

        assert!(limiter.check(ip(1), 1, 60).is_ok());
        assert!(limiter.check(ip(1), 1, 60).is_err());
        assert!(limiter.check(ip(2), 1, 60).is_ok());
    }

    #[test]
    fn cleanup_drops_stale_entries() {
        let limiter = ApiRateLimiter::new();
        let _ = limiter.check(ip(1), 10, 60);

        limiter.cleanup(Duration::from_secs(0));
        assert!(limiter.entries.is_empty());
    }
}
