use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Fixed-window rate limiter keyed by caller identity.
///
/// Each identity keeps the timestamps of its admitted requests. On every check
/// the timestamps older than the window are pruned first, then the request is
/// admitted only while fewer than `max_requests` remain.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: DashMap<String, VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: DashMap::new(),
        }
    }

    /// Limiter that spaces calls at least `interval` apart
    pub fn spacing(interval: Duration) -> Self {
        Self::new(1, interval)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Check if a request is allowed and record it
    pub fn allow_request(&self, identity: &str) -> bool {
        self.try_admit(identity).is_ok()
    }

    /// Get time until the next request for `identity` would be admitted
    pub fn time_until_next_request(&self, identity: &str) -> Duration {
        let now = Instant::now();
        let Some(mut window) = self.windows.get_mut(identity) else {
            return Duration::ZERO;
        };
        self.prune(&mut window, now);
        self.wait_for(&window, now)
    }

    /// Wait until a request for `identity` is admitted, then record it
    pub async fn acquire(&self, identity: &str) {
        loop {
            match self.try_admit(identity) {
                Ok(()) => return,
                Err(wait) => {
                    debug!("Outbound limit for {identity}, waiting {:.3}s", wait.as_secs_f64());
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Drop windows that no longer hold any timestamps
    pub fn purge_idle(&self) {
        let now = Instant::now();
        self.windows.retain(|_, window| {
            window
                .back()
                .is_some_and(|last| now.duration_since(*last) < self.window)
        });
    }

    /// Prune, count and record under one shard lock. On rejection returns the
    /// time until the oldest timestamp leaves the window.
    fn try_admit(&self, identity: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let mut window = self.windows.entry(identity.to_string()).or_default();
        self.prune(&mut window, now);

        if window.len() >= self.max_requests as usize {
            Err(self.wait_for(&window, now))
        } else {
            window.push_back(now);
            Ok(())
        }
    }

    /// Remove requests older than the window
    fn prune(&self, window: &mut VecDeque<Instant>, now: Instant) {
        while window
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= self.window)
        {
            window.pop_front();
        }
    }

    fn wait_for(&self, window: &VecDeque<Instant>, now: Instant) -> Duration {
        if window.len() < self.max_requests as usize {
            return Duration::ZERO;
        }
        window
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_quota_plus_one_is_rejected() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        assert!(limiter.allow_request("client"));
        assert!(limiter.allow_request("client"));
        assert!(limiter.allow_request("client"));
        assert!(!limiter.allow_request("client"));

        let wait_time = limiter.time_until_next_request("client");
        assert!(wait_time > Duration::ZERO);
        assert!(wait_time <= Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_window_admits_again() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        assert!(limiter.allow_request("client"));
        assert!(limiter.allow_request("client"));
        assert!(!limiter.allow_request("client"));

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(limiter.allow_request("client"));
        assert_eq!(limiter.time_until_next_request("client"), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_identities_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.allow_request("10.0.0.1"));
        assert!(!limiter.allow_request("10.0.0.1"));
        assert!(limiter.allow_request("10.0.0.2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_request_is_not_recorded() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        assert!(limiter.allow_request("c"));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!limiter.allow_request("c"));
        tokio::time::advance(Duration::from_secs(5)).await;
        // only the first timestamp counted, and it has now aged out
        assert!(limiter.allow_request("c"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_spaces_requests() {
        let limiter = RateLimiter::spacing(Duration::from_secs(1));
        let start = Instant::now();
        limiter.acquire("nominatim").await;
        limiter.acquire("nominatim").await;
        limiter.acquire("nominatim").await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_checks_never_overrun_quota() {
        let limiter = Arc::new(RateLimiter::new(10, Duration::from_secs(60)));
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.allow_request("shared") })
            })
            .collect();

        let admitted = futures::future::join_all(handles)
            .await
            .into_iter()
            .filter(|result| *result.as_ref().unwrap())
            .count();
        assert_eq!(admitted, 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_idle_windows() {
        let limiter = RateLimiter::new(5, Duration::from_secs(1));
        limiter.allow_request("a");
        tokio::time::advance(Duration::from_secs(2)).await;
        limiter.allow_request("b");
        limiter.purge_idle();
        assert_eq!(limiter.windows.len(), 1);
        assert!(limiter.windows.contains_key("b"));
    }
}
