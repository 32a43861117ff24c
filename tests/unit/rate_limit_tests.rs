// ==============================
// tests/unit/rate_limit_tests.rs
// ==============================
//! This test suite is designed to validate the functionality of the `RateLimiter`
use backend_lib::auth::RateLimiter;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::thread;

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[test]
fn test_rate_limiter_allows_initial_requests() {
    let limiter = RateLimiter::default();
    assert_eq!(limiter.ceiling(), 15);
    assert!(limiter.admit("127.0.0.1", t0()));
    assert_eq!(limiter.window("127.0.0.1").unwrap().count, 1);
}

#[test]
fn test_rate_limiter_blocks_after_ceiling() {
    let limiter = RateLimiter::default();
    for _ in 0..15 {
        assert!(limiter.admit("127.0.0.2", t0()));
    }
    assert!(!limiter.admit("127.0.0.2", t0()));
    assert!(!limiter.admit("127.0.0.2", t0() + TimeDelta::seconds(59)));
}

#[test]
fn test_rate_limiter_resets_after_window() {
    let limiter = RateLimiter::default();
    for _ in 0..15 {
        limiter.admit("127.0.0.3", t0());
    }

    let later = t0() + TimeDelta::seconds(61);
    assert!(limiter.admit("127.0.0.3", later));
    let window = limiter.window("127.0.0.3").unwrap();
    assert_eq!(window.count, 1);
    assert_eq!(window.reset_at, later + TimeDelta::seconds(60));
}

#[test]
fn test_rate_limiter_keys_are_independent() {
    let limiter = RateLimiter::new(1, 0, TimeDelta::seconds(60));
    assert!(limiter.admit("a", t0()));
    assert!(!limiter.admit("a", t0()));
    assert!(limiter.admit("b", t0()));
}

#[test]
fn test_rate_limiter_cleanup() {
    let limiter = RateLimiter::default();
    limiter.admit("old", t0());
    limiter.admit("new", t0() + TimeDelta::seconds(30));
    assert_eq!(limiter.tracked(), 2);

    let removed = limiter.cleanup(t0() + TimeDelta::seconds(61));
    assert_eq!(removed, 1);
    assert!(limiter.window("old").is_none());
    assert!(limiter.window("new").is_some());
}

#[test]
fn test_rate_limiter_under_contention() {
    let limiter = Arc::new(RateLimiter::default());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            thread::spawn(move || (0..10).filter(|_| limiter.admit("shared", t0())).count())
        })
        .collect();

    let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(admitted, 15);
}
