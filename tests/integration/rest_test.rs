//! Integration tests for the message history REST endpoints.

mod helpers;

use http::StatusCode;
use serde_json::json;

use chathub_core::types::id::{MessageId, UserId};
use chathub_database::MessageStore;
use chathub_entity::message::NewMessage;

use helpers::TestApp;

async fn seed(app: &TestApp, from: UserId, to: UserId, content: &str) -> MessageId {
    app.store
        .create_message(NewMessage {
            sender_id: from,
            receiver_id: to,
            content: content.to_string(),
        })
        .await
        .expect("seed message")
        .id
}

#[tokio::test]
async fn test_root_and_health() {
    let app = TestApp::new().await;

    let root = app.request("GET", "/", None, None).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(root.body, "Real time chat backend is running");

    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, json!({ "status": "ok", "onlineUsers": 0 }));
}

#[tokio::test]
async fn test_conversation_is_ordered_oldest_first() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, _) = app.user_with_token("bob").await;
    let (carol, _) = app.user_with_token("carol").await;

    seed(&app, alice, bob, "one").await;
    seed(&app, bob, alice, "two").await;
    seed(&app, alice, carol, "elsewhere").await;
    seed(&app, alice, bob, "three").await;

    let resp = app
        .request(
            "GET",
            &format!("/api/messages/conversation/{}", bob.0),
            None,
            Some(&alice_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let contents: Vec<_> = resp
        .body
        .as_array()
        .expect("array")
        .iter()
        .map(|m| m["content"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(contents, vec!["one", "two", "three"]);

    let messages = resp.body.as_array().expect("array");
    assert_eq!(
        messages[0]["sender"],
        json!({ "id": alice.0, "username": "alice", "email": "alice@example.com" })
    );
    assert_eq!(
        messages[0]["receiver"],
        json!({ "id": bob.0, "username": "bob", "email": "bob@example.com" })
    );
    assert_eq!(messages[1]["sender"]["username"], "bob");
    assert_eq!(messages[1]["receiver"]["username"], "alice");
    assert_eq!(messages[1]["senderId"], bob.0);
}

#[tokio::test]
async fn test_conversations_list_most_recent_first() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, _) = app.user_with_token("bob").await;
    let (carol, _) = app.user_with_token("carol").await;

    seed(&app, bob, alice, "from bob").await;
    seed(&app, carol, alice, "from carol").await;
    seed(&app, carol, alice, "carol again").await;

    let resp = app
        .request("GET", "/api/messages/conversations", None, Some(&alice_token))
        .await;
    assert_eq!(resp.status, StatusCode::OK);

    let rows = resp.body.as_array().expect("array");
    assert_eq!(rows.len(), 2);

    assert_eq!(rows[0]["partner"]["id"], carol.0);
    assert_eq!(rows[0]["partner"]["username"], "carol");
    assert_eq!(rows[0]["lastMessage"]["content"], "carol again");
    assert_eq!(rows[0]["lastMessage"]["sender"]["username"], "carol");
    assert_eq!(rows[0]["lastMessage"]["receiver"]["id"], alice.0);
    assert!(rows[0]["lastMessage"]["sender"].get("passwordHash").is_none());
    assert_eq!(rows[0]["unreadCount"], 2);
    assert!(rows[0]["partner"].get("passwordHash").is_none());

    assert_eq!(rows[1]["partner"]["id"], bob.0);
    assert_eq!(rows[1]["unreadCount"], 1);
}

#[tokio::test]
async fn test_unread_count_and_mark_as_read_by_ids() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let first = seed(&app, alice, bob, "a").await;
    let second = seed(&app, alice, bob, "b").await;
    seed(&app, alice, bob, "c").await;

    let unread = app
        .request("GET", "/api/messages/unread-count", None, Some(&bob_token))
        .await;
    assert_eq!(unread.body, json!({ "unreadCount": 3 }));

    // The sender cannot mark its own outgoing messages.
    let resp = app
        .request(
            "POST",
            "/api/messages/mark-as-read",
            Some(json!({ "messageIds": [first.0, second.0] })),
            Some(&alice_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["count"], 0);

    let resp = app
        .request(
            "POST",
            "/api/messages/mark-as-read",
            Some(json!({ "messageIds": [first.0, second.0] })),
            Some(&bob_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["count"], 2);

    let unread = app
        .request("GET", "/api/messages/unread-count", None, Some(&bob_token))
        .await;
    assert_eq!(unread.body["unreadCount"], 1);
}

#[tokio::test]
async fn test_mark_as_read_by_sender() {
    let app = TestApp::new().await;
    let (alice, _) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;
    let (carol, _) = app.user_with_token("carol").await;

    seed(&app, alice, bob, "a1").await;
    seed(&app, alice, bob, "a2").await;
    seed(&app, carol, bob, "c1").await;

    let resp = app
        .request(
            "POST",
            "/api/messages/mark-as-read",
            Some(json!({ "senderId": alice.0 })),
            Some(&bob_token),
        )
        .await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body["count"], 2);

    let unread = app
        .request("GET", "/api/messages/unread-count", None, Some(&bob_token))
        .await;
    assert_eq!(unread.body["unreadCount"], 1);
}

#[tokio::test]
async fn test_mark_as_read_requires_ids_or_sender() {
    let app = TestApp::new().await;
    let (_, token) = app.user_with_token("alice").await;

    for body in [json!({}), json!({ "messageIds": [] })] {
        let resp = app
            .request("POST", "/api/messages/mark-as-read", Some(body), Some(&token))
            .await;
        assert_eq!(resp.status, StatusCode::BAD_REQUEST);
        assert_eq!(resp.body["message"], "messageIds or senderId required");
    }
}

#[tokio::test]
async fn test_rest_and_realtime_read_state_agree() {
    let app = TestApp::new().await;
    let (alice, _) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let id = seed(&app, alice, bob, "hello").await;
    app.request(
        "POST",
        "/api/messages/mark-as-read",
        Some(json!({ "messageIds": [id.0] })),
        Some(&bob_token),
    )
    .await;

    let stored = app
        .store
        .find_message(id)
        .await
        .expect("lookup")
        .expect("message");
    assert!(stored.is_read);
}
