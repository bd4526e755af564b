//! Sign-in throttling against password guessing
//!
//! Failed sign-ins are counted per normalized email inside a sliding
//! window. Reaching the limit locks the key out for a fixed period; a
//! successful sign-in clears the record.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failed sign-ins tolerated inside one window
    pub max_failures: u32,
    /// Window in seconds, measured from the first failure
    pub window_seconds: u64,
    /// Lockout duration in seconds
    pub lockout_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_seconds: 300,
            lockout_seconds: 900,
        }
    }
}

#[derive(Debug)]
struct FailureRecord {
    count: u32,
    window_start: Instant,
    locked_until: Option<Instant>,
}

/// Per-email sign-in failure tracker
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    failures: Arc<Mutex<HashMap<String, FailureRecord>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            failures: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Ok when the key may try to sign in, otherwise the remaining lockout
    pub async fn check(&self, key: &str) -> Result<(), Duration> {
        let mut failures = self.failures.lock().await;
        let now = Instant::now();

        let Some(record) = failures.get(key) else {
            return Ok(());
        };

        match record.locked_until {
            Some(until) if until > now => Err(until - now),
            Some(_) => {
                failures.remove(key);
                Ok(())
            }
            None => Ok(()),
        }
    }

    /// Count a failed sign-in, locking the key out once the limit is hit
    pub async fn record_failure(&self, key: &str) {
        let mut failures = self.failures.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(self.config.window_seconds);

        // Drop records whose window has passed and whose lockout, if any, is over
        failures.retain(|_, record| {
            now.duration_since(record.window_start) < window
                || record.locked_until.is_some_and(|until| until > now)
        });

        let record = failures.entry(key.to_string()).or_insert(FailureRecord {
            count: 0,
            window_start: now,
            locked_until: None,
        });

        if now.duration_since(record.window_start) >= window {
            record.count = 0;
            record.window_start = now;
        }

        record.count += 1;
        if record.count >= self.config.max_failures {
            record.locked_until = Some(now + Duration::from_secs(self.config.lockout_seconds));
            warn!(
                "Locked out sign-in after {} failures for {} seconds",
                record.count, self.config.lockout_seconds
            );
        }
    }

    /// Forget recorded failures after a successful sign-in
    pub async fn reset(&self, key: &str) {
        self.failures.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_failures: u32, lockout_seconds: u64) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_failures,
            window_seconds: 300,
            lockout_seconds,
        })
    }

    #[tokio::test]
    async fn test_locks_out_after_max_failures() {
        let limiter = limiter(3, 600);
        for _ in 0..2 {
            limiter.record_failure("jane@example.com").await;
            assert!(limiter.check("jane@example.com").await.is_ok());
        }

        limiter.record_failure("jane@example.com").await;
        let remaining = limiter.check("jane@example.com").await.unwrap_err();
        assert!(remaining <= Duration::from_secs(600));
        assert!(remaining > Duration::from_secs(590));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = limiter(1, 600);
        limiter.record_failure("a@example.com").await;
        assert!(limiter.check("a@example.com").await.is_err());
        assert!(limiter.check("b@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_clears_failures() {
        let limiter = limiter(2, 600);
        limiter.record_failure("jane@example.com").await;
        limiter.reset("jane@example.com").await;
        limiter.record_failure("jane@example.com").await;
        assert!(limiter.check("jane@example.com").await.is_ok());
    }

    #[tokio::test]
    async fn test_lockout_expires() {
        let limiter = limiter(1, 0);
        limiter.record_failure("jane@example.com").await;
        assert!(limiter.check("jane@example.com").await.is_ok());
        // The expired record is dropped, so counting starts over
        assert!(limiter.failures.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_stale_records_are_evicted() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_failures: 5,
            window_seconds: 0,
            lockout_seconds: 0,
        });
        for i in 0..10_000 {
            limiter.record_failure(&format!("user{i}@example.com")).await;
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        limiter.record_failure("last@example.com").await;

        assert!(limiter.failures.lock().await.len() < 100);
    }

    #[tokio::test]
    async fn test_locked_records_survive_eviction() {
        let limiter = RateLimiter::new(RateLimiterConfig {
            max_failures: 1,
            window_seconds: 0,
            lockout_seconds: 600,
        });
        limiter.record_failure("jane@example.com").await;
        limiter.record_failure("other@example.com").await;

        assert!(limiter.check("jane@example.com").await.is_err());
    }

    #[test]
    fn test_default_config() {
        let config = RateLimiterConfig::default();
        assert_eq!(config.max_failures, 5);
        assert_eq!(config.window_seconds, 300);
    }
}
