use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// Request budget for one `identifier:action` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// The maximum number of requests allowed within the `window`.
    pub max_requests: u32,
    /// The duration of the sliding window.
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    pub(crate) fn window_ms(&self) -> i64 {
        i64::try_from(self.window.as_millis()).unwrap_or(i64::MAX)
    }
}

impl Default for RateLimitPolicy {
    /// Ten requests per minute.
    fn default() -> Self {
        Self::new(10, Duration::from_secs(60))
    }
}

/// Outcome of a rate limit check. Same shape as the rate-limiter service response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    /// Requests counted in the current window, this one included when allowed.
    pub count: u32,
    pub limit: u32,
    /// Epoch milliseconds at which the oldest counted request leaves the window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_time: Option<i64>,
}

impl RateLimitDecision {
    /// Decision used when the limiter cannot be consulted.
    pub fn fail_open(limit: u32) -> Self {
        Self {
            allowed: true,
            count: 0,
            limit,
            reset_time: None,
        }
    }
}

/// Anything that can decide whether a request may proceed.
///
/// Implementations never fail: when the backing store is unreachable they
/// allow the request and log the problem.
#[async_trait]
pub trait RateLimitService: Send + Sync + 'static {
    async fn check(&self, identifier: &str, action: &str, policy: RateLimitPolicy) -> RateLimitDecision;
}

/// Builds the key under which requests are counted.
pub fn rate_limit_key(identifier: &str, action: &str) -> String {
    format!("{}:{}", identifier, action)
}

/// A rate limiter using a sliding window algorithm.
///
/// It tracks request timestamps (epoch millis) for each `identifier:action`
/// key. Expired timestamps are dropped lazily when their key is checked.
#[derive(Debug, Default)]
pub struct RateLimiter {
    requests: HashMap<String, Vec<i64>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks and records a request at the current time.
    pub fn check(&mut self, identifier: &str, action: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        self.check_at(identifier, action, policy, Utc::now().timestamp_millis())
    }

    /// Checks and records a request at `now_ms`.
    ///
    /// Allowed requests are recorded; denied requests are not.
    pub fn check_at(
        &mut self,
        identifier: &str,
        action: &str,
        policy: RateLimitPolicy,
        now_ms: i64,
    ) -> RateLimitDecision {
        let window_ms = policy.window_ms();
        let window_start = now_ms.saturating_sub(window_ms);

        let timestamps = self
            .requests
            .entry(rate_limit_key(identifier, action))
            .or_default();

        // Remove timestamps older than the window; one exactly at its start still counts
        timestamps.retain(|&t| t >= window_start);

        let count = u32::try_from(timestamps.len()).unwrap_or(u32::MAX);
        if count >= policy.max_requests {
            return RateLimitDecision {
                allowed: false,
                count,
                limit: policy.max_requests,
                reset_time: timestamps.first().map(|&t| t.saturating_add(window_ms)),
            };
        }

        timestamps.push(now_ms);
        RateLimitDecision {
            allowed: true,
            count: count + 1,
            limit: policy.max_requests,
            reset_time: timestamps.first().map(|&t| t.saturating_add(window_ms)),
        }
    }

    /// Drops every timestamp older than `cutoff_ms` and forgets empty keys.
    pub fn purge_older_than(&mut self, cutoff_ms: i64) {
        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&t| t >= cutoff_ms);
            !timestamps.is_empty()
        });
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.requests.len()
    }
}

/// How long recorded requests are kept before a purge drops them.
const RETENTION_MS: i64 = 24 * 60 * 60 * 1000;

/// In-process `RateLimitService`, shared behind a mutex.
#[derive(Debug, Default)]
pub struct LocalRateLimiter {
    inner: Mutex<RateLimiter>,
}

impl LocalRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitService for LocalRateLimiter {
    async fn check(&self, identifier: &str, action: &str, policy: RateLimitPolicy) -> RateLimitDecision {
        let mut limiter = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("Rate limiter mutex poisoned, recovering state");
                poisoned.into_inner()
            }
        };
        let now_ms = Utc::now().timestamp_millis();
        let decision = limiter.check_at(identifier, action, policy, now_ms);
        if decision.allowed {
            limiter.purge_older_than(now_ms.saturating_sub(RETENTION_MS));
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn policy(max_requests: u32, window_ms: u64) -> RateLimitPolicy {
        RateLimitPolicy::new(max_requests, Duration::from_millis(window_ms))
    }

    #[test]
    fn test_rate_limiter_allows_requests_within_limit() {
        let mut limiter = RateLimiter::new();
        for i in 1..=5 {
            let decision = limiter.check_at("client1", "chat", policy(5, 1000), 1_000);
            assert!(decision.allowed);
            assert_eq!(decision.count, i);
        }
        let denied = limiter.check_at("client1", "chat", policy(5, 1000), 1_000);
        assert!(!denied.allowed);
        assert_eq!(denied.count, 5);
        assert_eq!(denied.limit, 5);
        assert_eq!(denied.reset_time, Some(2_000));
    }

    #[test]
    fn test_rate_limiter_resets_after_window() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check_at("client2", "chat", policy(2, 50), 0).allowed);
        assert!(limiter.check_at("client2", "chat", policy(2, 50), 10).allowed);
        assert!(!limiter.check_at("client2", "chat", policy(2, 50), 20).allowed);

        // First request leaves the window
        let decision = limiter.check_at("client2", "chat", policy(2, 50), 51);
        assert!(decision.allowed);
        assert_eq!(decision.count, 2);
        assert_eq!(decision.reset_time, Some(60));
    }

    #[test]
    fn test_request_at_window_start_still_counts() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check_at("client4", "chat", policy(1, 50), 0).allowed);

        let at_edge = limiter.check_at("client4", "chat", policy(1, 50), 50);
        assert!(!at_edge.allowed);
        assert_eq!(at_edge.count, 1);
        assert_eq!(at_edge.reset_time, Some(50));

        assert!(limiter.check_at("client4", "chat", policy(1, 50), 51).allowed);
    }

    #[test]
    fn test_actions_are_counted_separately() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check_at("user", "chat", policy(1, 1000), 0).allowed);
        assert!(!limiter.check_at("user", "chat", policy(1, 1000), 1).allowed);
        assert!(limiter.check_at("user", "login", policy(1, 1000), 1).allowed);
        assert!(limiter.check_at("other", "chat", policy(1, 1000), 1).allowed);
    }

    #[test]
    fn test_purge_forgets_stale_keys() {
        let mut limiter = RateLimiter::new();
        limiter.check_at("a", "chat", policy(5, 1000), 0);
        limiter.check_at("b", "chat", policy(5, 1000), 5_000);
        assert_eq!(limiter.tracked_keys(), 2);

        limiter.purge_older_than(1_000);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_check_uses_wall_clock() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("client3", "chat", policy(1, 30)).allowed);
        assert!(!limiter.check("client3", "chat", policy(1, 30)).allowed);

        thread::sleep(Duration::from_millis(40));

        assert!(limiter.check("client3", "chat", policy(1, 30)).allowed);
    }

    #[tokio::test]
    async fn test_local_service() {
        let service = LocalRateLimiter::new();
        let p = policy(2, 60_000);
        assert!(service.check("anonymous", "chat", p).await.allowed);
        assert!(service.check("anonymous", "chat", p).await.allowed);
        let denied = service.check("anonymous", "chat", p).await;
        assert!(!denied.allowed);
        assert!(denied.reset_time.is_some());
    }

    #[test]
    fn test_decision_wire_format() {
        let json = serde_json::to_value(RateLimitDecision {
            allowed: false,
            count: 3,
            limit: 3,
            reset_time: Some(42),
        })
        .unwrap();
        assert_eq!(json["resetTime"], 42);

        let decoded: RateLimitDecision =
            serde_json::from_str(r#"{"allowed":true,"count":1,"limit":10}"#).unwrap();
        assert_eq!(decoded.reset_time, None);
    }
}
