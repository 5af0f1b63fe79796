//! Per-sender admission control for attachment-carrying events.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

/// Decides whether a sender may have another event processed.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Count one event for `address`; `false` means reject.
    async fn admit(&self, address: &str) -> bool;

    /// The configured number of events per window.
    fn limit(&self) -> u32;
}

/// Admission counter for one sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    pub count: u32,
    pub window_start: DateTime<Utc>,
}

/// Fixed one-hour windows kept in process memory.
///
/// A window opens on the first admitted event and lasts one hour; the first
/// event after it expires opens a new one.
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl InMemoryRateLimiter {
    /// Create a limiter admitting `limit` events per hour.
    pub fn new(limit: u32) -> Self {
        Self::with_window(limit, Duration::hours(1))
    }

    /// Create a limiter with a custom window length.
    pub fn with_window(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// [`RateLimiter::admit`] at an explicit instant.
    pub async fn admit_at(&self, address: &str, now: DateTime<Utc>) -> bool {
        let mut windows = self.windows.lock().await;

        match windows.get_mut(address) {
            Some(w) if now <= w.window_start + self.window => {
                if w.count < self.limit {
                    w.count += 1;
                    true
                } else {
                    debug!(address, count = w.count, "Rate limit reached");
                    false
                }
            }
            _ => {
                if self.limit == 0 {
                    return false;
                }
                windows.insert(
                    address.to_string(),
                    RateWindow {
                        count: 1,
                        window_start: now,
                    },
                );
                true
            }
        }
    }

    /// Drop windows that have expired by `now`. Returns how many were removed.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now <= w.window_start + self.window);
        before - windows.len()
    }

    /// Current window for `address`, if any.
    pub async fn window(&self, address: &str) -> Option<RateWindow> {
        self.windows.lock().await.get(address).copied()
    }

    /// Number of tracked senders.
    pub async fn tracked(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn admit(&self, address: &str) -> bool {
        self.admit_at(address, Utc::now()).await
    }

    fn limit(&self) -> u32 {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[tokio::test]
    async fn twenty_first_event_in_the_hour_is_rejected() {
        let limiter = InMemoryRateLimiter::new(20);
        for i in 0..20 {
            let now = t0() + Duration::minutes(i);
            assert!(limiter.admit_at("+1", now).await, "event {i}");
        }
        assert!(!limiter.admit_at("+1", t0() + Duration::minutes(59)).await);
        assert_eq!(limiter.window("+1").await.unwrap().count, 20);
    }

    #[tokio::test]
    async fn window_resets_strictly_after_one_hour() {
        let limiter = InMemoryRateLimiter::new(1);
        assert!(limiter.admit_at("+1", t0()).await);
        assert!(!limiter.admit_at("+1", t0() + Duration::hours(1)).await);

        let later = t0() + Duration::hours(1) + Duration::milliseconds(1);
        assert!(limiter.admit_at("+1", later).await);
        assert_eq!(limiter.window("+1").await.unwrap().window_start, later);
    }

    #[tokio::test]
    async fn rejection_does_not_extend_window() {
        let limiter = InMemoryRateLimiter::new(1);
        assert!(limiter.admit_at("+1", t0()).await);
        assert!(!limiter.admit_at("+1", t0() + Duration::minutes(30)).await);
        let window = limiter.window("+1").await.unwrap();
        assert_eq!(window.window_start, t0());
        assert_eq!(window.count, 1);
    }

    #[tokio::test]
    async fn senders_are_independent() {
        let limiter = InMemoryRateLimiter::new(1);
        assert!(limiter.admit_at("+1", t0()).await);
        assert!(limiter.admit_at("+2", t0()).await);
        assert!(!limiter.admit_at("+1", t0()).await);
    }

    #[tokio::test]
    async fn prune_drops_only_expired_windows() {
        let limiter = InMemoryRateLimiter::new(5);
        limiter.admit_at("+old", t0()).await;
        limiter.admit_at("+new", t0() + Duration::minutes(50)).await;

        let removed = limiter.prune_expired(t0() + Duration::minutes(61)).await;
        assert_eq!(removed, 1);
        assert_eq!(limiter.tracked().await, 1);
        assert!(limiter.window("+new").await.is_some());
    }

    #[tokio::test]
    async fn zero_limit_rejects_everything() {
        let limiter = InMemoryRateLimiter::new(0);
        assert!(!limiter.admit_at("+1", t0()).await);
        assert_eq!(limiter.tracked().await, 0);
    }
}
