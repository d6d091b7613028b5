//! Per-client rate limiting with fixed rolling windows.
//!
//! Each (client, scope) pair owns a counter that resets when its window
//! elapses. Counters live in memory only and are cleared on restart; that is
//! an accepted limitation at this scale of service.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A named rate-limit bucket class: capacity per fixed window.
#[derive(Debug, Clone, Copy)]
pub struct RateScope {
    pub name: &'static str,
    pub capacity: u32,
    pub window: Duration,
}

impl RateScope {
    /// Coarse cap applied to every gated request, regardless of endpoint.
    pub const DAILY: RateScope = RateScope {
        name: "daily",
        capacity: 200,
        window: Duration::from_secs(86_400),
    };

    /// Payment endpoints (process/initiate).
    pub const PAYMENT: RateScope = RateScope {
        name: "payment",
        capacity: 10,
        window: Duration::from_secs(3_600),
    };

    /// Document generation.
    pub const DOCUMENT: RateScope = RateScope {
        name: "document",
        capacity: 20,
        window: Duration::from_secs(3_600),
    };
}

struct Window {
    count: u32,
    started: Instant,
}

/// Rejection outcome carrying the time until the current window resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateExceeded {
    pub retry_after: Duration,
}

/// In-memory fixed-window counter table, keyed by (client, scope).
///
/// The whole table sits behind one mutex: increments are check-then-update
/// under the lock, so concurrent hits from the same client cannot lose
/// updates.
pub struct RateLimiter {
    windows: Mutex<HashMap<(String, &'static str), Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Counts one hit for `client` in `scope`. Rejects once the
    /// post-increment count exceeds the scope capacity.
    pub fn check(&self, client: &str, scope: &RateScope) -> Result<(), RateExceeded> {
        self.check_at(client, scope, Instant::now())
    }

    /// Like [`check`](Self::check) with an explicit clock, so window expiry
    /// is testable without sleeping.
    pub fn check_at(
        &self,
        client: &str,
        scope: &RateScope,
        now: Instant,
    ) -> Result<(), RateExceeded> {
        let mut windows = self.windows.lock().expect("rate limiter mutex poisoned");
        let window = windows
            .entry((client.to_string(), scope.name))
            .or_insert_with(|| Window {
                count: 0,
                started: now,
            });

        let elapsed = now.saturating_duration_since(window.started);
        if elapsed >= scope.window {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        if window.count > scope.capacity {
            let remaining = scope
                .window
                .saturating_sub(now.saturating_duration_since(window.started));
            tracing::warn!(client, scope = scope.name, "Rate limit exceeded");
            return Err(RateExceeded {
                retry_after: remaining,
            });
        }
        Ok(())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_PER_HOUR: RateScope = RateScope {
        name: "test",
        capacity: 10,
        window: Duration::from_secs(3_600),
    };

    #[test]
    fn test_eleventh_request_rejected_with_retry_after() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..10 {
            assert!(limiter.check_at("1.2.3.4", &TEN_PER_HOUR, t0).is_ok());
        }
        let err = limiter.check_at("1.2.3.4", &TEN_PER_HOUR, t0).unwrap_err();
        assert!(err.retry_after > Duration::ZERO);
        assert!(err.retry_after <= TEN_PER_HOUR.window);
    }

    #[test]
    fn test_window_elapse_resets_counter() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..11 {
            let _ = limiter.check_at("1.2.3.4", &TEN_PER_HOUR, t0);
        }
        let later = t0 + TEN_PER_HOUR.window + Duration::from_secs(1);
        assert!(limiter.check_at("1.2.3.4", &TEN_PER_HOUR, later).is_ok());
    }

    #[test]
    fn test_clients_counted_independently() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..10 {
            assert!(limiter.check_at("1.2.3.4", &TEN_PER_HOUR, t0).is_ok());
        }
        assert!(limiter.check_at("5.6.7.8", &TEN_PER_HOUR, t0).is_ok());
    }

    #[test]
    fn test_scopes_counted_independently() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..10 {
            assert!(limiter.check_at("1.2.3.4", &TEN_PER_HOUR, t0).is_ok());
        }
        assert!(limiter
            .check_at("1.2.3.4", &RateScope::DOCUMENT, t0)
            .is_ok());
    }

    #[test]
    fn test_retry_after_shrinks_within_window() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..10 {
            let _ = limiter.check_at("c", &TEN_PER_HOUR, t0);
        }
        let early = limiter.check_at("c", &TEN_PER_HOUR, t0).unwrap_err();
        let late = limiter
            .check_at("c", &TEN_PER_HOUR, t0 + Duration::from_secs(1800))
            .unwrap_err();
        assert!(late.retry_after < early.retry_after);
    }
}
