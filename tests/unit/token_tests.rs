// =========================
// tests/unit/token_tests.rs
// =========================
//! Token service behavior visible to callers
use backend_lib::auth::{TokenError, TokenService};
use chrono::{DateTime, TimeDelta, Utc};

fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[test]
fn test_empty_secret_is_refused() {
    assert!(matches!(TokenService::new(b""), Err(TokenError::MissingSecret)));
}

#[test]
fn test_custom_ttl() {
    let service = TokenService::with_ttl(b"secret", TimeDelta::seconds(30)).unwrap();
    assert_eq!(service.ttl(), TimeDelta::seconds(30));

    let token = service.issue(5, false, t0()).unwrap();
    assert!(service.verify(&token, t0() + TimeDelta::seconds(30)).is_ok());
    assert!(matches!(
        service.verify(&token, t0() + TimeDelta::seconds(31)),
        Err(TokenError::Expired)
    ));
}

#[test]
fn test_token_is_three_segment_jwt() {
    let service = TokenService::new(b"secret").unwrap();
    let token = service.issue(1, true, t0()).unwrap();
    assert_eq!(token.split('.').count(), 3);
}

#[test]
fn test_garbage_token_is_rejected() {
    let service = TokenService::new(b"secret").unwrap();
    for token in ["", "abc", "a.b.c"] {
        assert!(service.verify(token, t0()).is_err(), "{token:?}");
    }
}
