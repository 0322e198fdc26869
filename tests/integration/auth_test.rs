//! Integration tests for signup, login, and bearer authentication.

mod helpers;

use http::StatusCode;
use serde_json::json;

use helpers::TestApp;

#[tokio::test]
async fn test_signup_and_login() {
    let app = TestApp::new().await;

    let resp = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({
                "username": "alice",
                "email": "alice@example.com",
                "password": "password123",
            })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.body["message"], "User created successfully");

    let token = app.login("alice", "password123").await;
    assert_eq!(token.split('.').count(), 3);
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = TestApp::new().await;
    app.create_user("alice", "password123").await;

    let resp = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({
                "username": "alice2",
                "email": "ALICE@example.com",
                "password": "password123",
            })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new().await;

    let resp = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({
                "username": "bob",
                "email": "not-an-email",
                "password": "password123",
            })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.body["message"], "A valid email is required");

    let resp = app
        .request(
            "POST",
            "/api/auth/signup",
            Some(json!({
                "username": "bob",
                "email": "bob@example.com",
                "password": "abc",
            })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_failures() {
    let app = TestApp::new().await;
    app.create_user("alice", "password123").await;

    let resp = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "nobody@example.com", "password": "password123" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.body["message"], "User not found");

    let resp = app
        .request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": "alice@example.com", "password": "wrong-password" })),
            None,
        )
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let app = TestApp::new().await;

    let resp = app
        .request("GET", "/api/messages/conversations", None, None)
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Authentication error");

    let resp = app
        .request("GET", "/api/messages/conversations", None, Some("a.b.c"))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Authentication error");
}

#[tokio::test]
async fn test_token_from_other_secret_is_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.user_with_token("alice").await;

    let other = TestApp::with_config({
        let mut config = chathub_core::config::AppConfig::default();
        config.database.provider = chathub_core::config::StoreProvider::Memory;
        config.auth.jwt_secret = "a-different-secret".to_string();
        config
    })
    .await;

    let resp = other
        .request("GET", "/api/messages/unread-count", None, Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);

    let status = other.connect_rejected(&other.ws_url(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_for_deleted_user_is_rejected_on_rest() {
    // Same secret, but the second app's store has never seen this user.
    let app = TestApp::new().await;
    let (_, token) = app.user_with_token("alice").await;

    let fresh = TestApp::new().await;
    let resp = fresh
        .request("GET", "/api/messages/unread-count", None, Some(&token))
        .await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.body["message"], "Authentication error");
}
