// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Fixed-window request limiting per client address.
//!
//! Each key gets a counter and a reset deadline. Once the deadline passes the
//! next request starts a brand new window; there is no gradual decay. Keys are
//! raw client addresses, so clients behind one NAT share an allowance.

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;

/// Default steady budget per window
pub const DEFAULT_RATE: u32 = 10;

/// Default extra allowance on top of the steady budget
pub const DEFAULT_BURST: u32 = 5;

/// Default window length (1 minute)
pub const DEFAULT_WINDOW_SECS: i64 = 60;

/// Counter state for one client key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Requests admitted in the current window
    pub count: u32,
    /// When the current window ends
    pub reset_at: DateTime<Utc>,
}

/// In-process fixed-window rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    /// Map of client keys to their windows
    windows: DashMap<String, RateWindow>,
    rate: u32,
    burst: u32,
    window: TimeDelta,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE, DEFAULT_BURST, TimeDelta::seconds(DEFAULT_WINDOW_SECS))
    }
}

impl RateLimiter {
    pub fn new(rate: u32, burst: u32, window: TimeDelta) -> Self {
        Self {
            windows: DashMap::new(),
            rate,
            burst,
            window,
        }
    }

    /// Maximum admitted requests per window
    pub fn ceiling(&self) -> u32 {
        self.rate.saturating_add(self.burst)
    }

    /// Decide whether a request from `key` at `now` is admitted.
    ///
    /// The entry guard holds the shard lock for the whole read-check-increment,
    /// so concurrent requests for one key are linearized.
    pub fn admit(&self, key: &str, now: DateTime<Utc>) -> bool {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateWindow {
                count: 0,
                reset_at: now + self.window,
            });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + self.window;
        }

        if entry.count >= self.ceiling() {
            return false;
        }

        entry.count += 1;
        true
    }

    /// Snapshot of the window for `key`, if one exists
    pub fn window(&self, key: &str) -> Option<RateWindow> {
        self.windows.get(key).map(|w| *w)
    }

    /// Number of tracked keys
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Drop windows whose deadline has passed; returns how many were removed
    pub fn cleanup(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| now <= window.reset_at);
        before.saturating_sub(self.windows.len())
    }
}
