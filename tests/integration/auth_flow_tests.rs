// ===================================
// tests/integration/auth_flow_tests.rs
// ===================================
//! Register, login, and bearer-token flows through the full router
use crate::test_utils::{setup_test_app, setup_test_app_with, test_settings};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use backend_lib::{auth::TOKEN_TTL_SECS, clock::Clock, storage::UserDirectory};
use chrono::TimeDelta;
use serde_json::json;

#[tokio::test]
async fn test_register_then_login() {
    let app = setup_test_app();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/register",
            Some(json!({"username": "alice", "email": "a@x.io", "password": "secret1", "isAdmin": false})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        body,
        json!({"message": "New user created successfully", "status": "success", "code": 201})
    );

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/login",
            Some(json!({"username": "alice", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Authentication successful");
    assert_eq!(body["status"], "success");

    let token = body["data"].as_str().expect("token in data");
    let claims = app.state.tokens.verify(token, app.clock.now()).unwrap();
    assert!(!claims.is_admin);
    assert_eq!(
        claims.expires_at,
        (app.clock.now() + TimeDelta::seconds(TOKEN_TTL_SECS)).timestamp()
    );
}

#[tokio::test]
async fn test_register_duplicate_username_and_email() {
    let app = setup_test_app();
    app.seed_user("alice", "a@x.io", "secret1", false).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/register",
            Some(json!({"username": "alice", "email": "other@x.io", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Username already exists");

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/register",
            Some(json!({"username": "bob", "email": "a@x.io", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email already exists");

    // Both taken: username wins
    let (_, body) = app
        .send(
            Method::POST,
            "/api/v1/register",
            Some(json!({"username": "alice", "email": "a@x.io", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn test_register_validation_messages() {
    let app = setup_test_app();

    let payload = |username: &str, email: &str, password: &str| {
        json!({"username": username, "email": email, "password": password})
    };
    let cases = [
        (payload("", "a@x.io", "secret1"), "Username cannot be empty"),
        (payload("bob", "", "secret1"), "Email cannot be empty"),
        (payload("bob", "a@x.io", ""), "Password cannot be empty"),
        (payload("bob", "a@x.io", "abcd"), "Password must be at least 5 characters"),
        (payload("bob", "bob@", "secret1"), "Invalid email format"),
    ];

    for (payload, expected) in cases {
        let (status, body) = app
            .send(Method::POST, "/api/v1/register", Some(payload), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{expected}");
        assert_eq!(body["message"], expected);
        assert_eq!(body["status"], "error");
    }

    // Nothing was written
    assert!(app.state.directory.list_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_register_rejects_malformed_json() {
    let app = setup_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\": "))
        .unwrap();
    let (status, body) = app.send_raw(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid request payload");
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let app = setup_test_app();
    app.seed_user("alice", "a@x.io", "secret1", false).await;

    let (status, wrong_password) = app
        .send(
            Method::POST,
            "/api/v1/login",
            Some(json!({"username": "alice", "password": "nottheone"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, unknown_user) = app
        .send(
            Method::POST,
            "/api/v1/login",
            Some(json!({"username": "mallory", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["message"], "Invalid username or password");
}

#[tokio::test]
async fn test_login_validation() {
    let app = setup_test_app();

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/login",
            Some(json!({"username": "alice", "password": "abc"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Password must be at least 5 characters");
}

#[tokio::test]
async fn test_token_grants_access_until_expiry() {
    let app = setup_test_app();
    let id = app.seed_user("alice", "a@x.io", "secret1", false).await;

    let (_, body) = app
        .send(
            Method::POST,
            "/api/v1/login",
            Some(json!({"username": "alice", "password": "secret1"})),
            None,
        )
        .await;
    let token = body["data"].as_str().unwrap().to_string();
    let uri = format!("/api/v1/users?id={id}");

    let (status, _) = app.send(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    // Still valid at the expiry instant
    app.clock.advance(TimeDelta::seconds(TOKEN_TTL_SECS));
    let (status, _) = app.send(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(TimeDelta::seconds(1));
    let (status, body) = app.send(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid auth token");
}

#[tokio::test]
async fn test_users_requires_bearer_token() {
    let app = setup_test_app();

    let (status, body) = app.send(Method::GET, "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");

    let (status, body) = app
        .send(Method::GET, "/api/v1/users", None, Some("not-a-jwt"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid auth token");
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let app = setup_test_app();
    let mut settings = test_settings();
    settings.auth.jwt_secret = "a-different-secret".to_string();
    let other = setup_test_app_with(settings);

    let foreign = other.token_for(1, true);
    let (status, _) = app
        .send(Method::GET, "/api/v1/users", None, Some(&foreign))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rate_limit_applies_to_login() {
    let app = setup_test_app_with(test_settings());
    let payload = json!({"username": "ghost", "password": "secret1"});

    for _ in 0..15 {
        let (status, _) = app
            .send(Method::POST, "/api/v1/login", Some(payload.clone()), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = app
        .send(Method::POST, "/api/v1/login", Some(payload.clone()), None)
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["message"], "Too Many Requests");

    app.clock.advance(TimeDelta::seconds(61));
    let (status, _) = app
        .send(Method::POST, "/api/v1/login", Some(payload), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsupported_method() {
    let app = setup_test_app();

    let (status, _) = app.send(Method::GET, "/api/v1/login", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    // Protected routes authenticate before the method is checked
    let (status, _) = app.send(Method::PATCH, "/api/v1/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = app.token_for(1, true);
    let (status, _) = app
        .send(Method::PATCH, "/api/v1/users", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
