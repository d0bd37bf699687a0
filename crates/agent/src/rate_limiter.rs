//! Sliding-window limiter for model requests.
//!
//! Keeps the timestamps of recently issued requests. Admission waits until
//! fewer than `max_requests` of them fall inside the trailing window. The
//! caller records a timestamp only after a request was actually issued, so a
//! request that fails before issuance costs no quota.

use shellsmith_config::RateLimitConfig;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const DEFAULT_MAX_REQUESTS_PER_MINUTE: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_millis(60_000);

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    timestamps: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// `max_requests` is clamped to at least one.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests: max_requests.max(1) as usize,
            window,
            timestamps: Mutex::new(VecDeque::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_requests_per_minute,
            Duration::from_millis(config.window_ms),
        )
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more request would not exceed the ceiling.
    ///
    /// Returns how long the caller was held back.
    pub async fn wait_for_admission(&self) -> Duration {
        let started = Instant::now();
        loop {
            let wait = {
                let mut timestamps = self.timestamps.lock().await;
                let now = Instant::now();
                Self::evict_expired(&mut timestamps, now, self.window);

                match timestamps.front() {
                    Some(oldest) if timestamps.len() >= self.max_requests => {
                        self.window - now.duration_since(*oldest)
                    }
                    _ => return started.elapsed(),
                }
            };

            debug!(
                wait_ms = wait.as_millis() as u64,
                max_requests = self.max_requests,
                "Request rate ceiling reached, waiting"
            );
            // Re-check after sleeping: the clock may have drifted.
            tokio::time::sleep(wait).await;
        }
    }

    /// Record that a request was issued now.
    pub async fn record(&self) {
        self.timestamps.lock().await.push_back(Instant::now());
    }

    /// Number of recorded requests still inside the window.
    pub async fn in_window(&self) -> usize {
        let mut timestamps = self.timestamps.lock().await;
        Self::evict_expired(&mut timestamps, Instant::now(), self.window);
        timestamps.len()
    }

    /// Drop timestamps that are a full window old or older.
    fn evict_expired(timestamps: &mut VecDeque<Instant>, now: Instant, window: Duration) {
        while timestamps
            .front()
            .is_some_and(|oldest| now.duration_since(*oldest) >= window)
        {
            timestamps.pop_front();
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS_PER_MINUTE, DEFAULT_WINDOW)
    }
}
