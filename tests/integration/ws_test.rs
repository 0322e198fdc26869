//! Integration tests for the realtime protocol over a real WebSocket.

mod helpers;

use http::StatusCode;
use serde_json::json;

use chathub_database::MessageStore;

use helpers::{
    TestApp, expect_closed, expect_event, expect_silence, recv_event, send_event, send_raw,
    wait_for_presence, wait_until,
};

#[tokio::test]
async fn test_handshake_rejected_without_valid_token() {
    let app = TestApp::new().await;

    let status = app
        .connect_rejected(&format!("ws://{}/ws", app.addr))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let status = app.connect_rejected(&app.ws_url("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert_eq!(app.state.realtime.online_count(), 0);
}

#[tokio::test]
async fn test_send_message_to_online_receiver() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    let mut b = app.connect(bob, &bob_token).await;

    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": bob.0, "content": "hello bob" }),
    )
    .await;

    let sent = expect_event(&mut a, "messageSent").await;
    let received = expect_event(&mut b, "receiveMessage").await;

    assert_eq!(sent, received);
    assert_eq!(sent["senderId"], alice.0);
    assert_eq!(sent["receiverId"], bob.0);
    assert_eq!(sent["content"], "hello bob");
    assert_eq!(sent["isRead"], false);
}

#[tokio::test]
async fn test_send_message_to_offline_receiver_is_stored() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": bob.0, "content": "while you were out" }),
    )
    .await;
    let sent = expect_event(&mut a, "messageSent").await;

    let history = app
        .request(
            "GET",
            &format!("/api/messages/conversation/{}", alice.0),
            None,
            Some(&bob_token),
        )
        .await;
    assert_eq!(history.status, StatusCode::OK);
    let messages = history.body.as_array().expect("array");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["id"], sent["id"]);
    assert_eq!(messages[0]["isRead"], false);
}

#[tokio::test]
async fn test_send_message_rejects_empty_and_unknown_receiver() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, _) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;

    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": bob.0, "content": "   " }),
    )
    .await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Message content cannot be empty");

    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": 999_999, "content": "anyone?" }),
    )
    .await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Receiver not found");

    assert_eq!(app.store.message_count().await, 0);
}

#[tokio::test]
async fn test_invalid_frames_keep_connection_open() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, _) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;

    send_raw(&mut a, "{not json").await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Invalid event payload");

    send_event(&mut a, "launchRockets", json!({})).await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Invalid event payload");

    send_event(&mut a, "sendMessage", json!({ "receiverId": "bob" })).await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Invalid event payload");

    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": bob.0, "content": "still here" }),
    )
    .await;
    expect_event(&mut a, "messageSent").await;
}

#[tokio::test]
async fn test_message_read_notifies_both_sides() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    let mut b = app.connect(bob, &bob_token).await;

    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": bob.0, "content": "read me" }),
    )
    .await;
    let sent = expect_event(&mut a, "messageSent").await;
    expect_event(&mut b, "receiveMessage").await;

    send_event(&mut b, "messageRead", json!({ "messageId": sent["id"] })).await;

    let confirmed = expect_event(&mut b, "messageReadConfirmed").await;
    let by_receiver = expect_event(&mut a, "messageReadByReceiver").await;
    assert_eq!(confirmed["id"], sent["id"]);
    assert_eq!(confirmed["isRead"], true);
    assert_eq!(confirmed, by_receiver);
}

#[tokio::test]
async fn test_message_read_by_sender_is_refused() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, _) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    send_event(
        &mut a,
        "sendMessage",
        json!({ "receiverId": bob.0, "content": "mine" }),
    )
    .await;
    let sent = expect_event(&mut a, "messageSent").await;

    send_event(&mut a, "messageRead", json!({ "messageId": sent["id"] })).await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Not authorized to mark this message as read");

    send_event(&mut a, "messageRead", json!({ "messageId": 424_242 })).await;
    let err = expect_event(&mut a, "error").await;
    assert_eq!(err["message"], "Message not found");
}

#[tokio::test]
async fn test_mark_all_as_read_reports_count() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    for i in 0..3 {
        send_event(
            &mut a,
            "sendMessage",
            json!({ "receiverId": bob.0, "content": format!("msg {i}") }),
        )
        .await;
        expect_event(&mut a, "messageSent").await;
    }

    let mut b = app.connect(bob, &bob_token).await;
    send_event(&mut b, "markAllAsRead", json!({ "senderId": alice.0 })).await;

    let ack = expect_event(&mut b, "allMessagesRead").await;
    assert_eq!(ack, json!({ "senderId": alice.0, "count": 3 }));

    let notice = expect_event(&mut a, "messagesReadByReceiver").await;
    assert_eq!(notice, json!({ "receiverId": bob.0, "count": 3 }));

    send_event(&mut b, "markAllAsRead", json!({ "senderId": alice.0 })).await;
    let ack = expect_event(&mut b, "allMessagesRead").await;
    assert_eq!(ack["count"], 0);
    expect_silence(&mut a, 200).await;
}

#[tokio::test]
async fn test_typing_is_relayed_only_to_online_receiver() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;
    let (carol, _) = app.user_with_token("carol").await;

    let mut a = app.connect(alice, &alice_token).await;
    let mut b = app.connect(bob, &bob_token).await;

    send_event(&mut a, "typing", json!({ "receiverId": bob.0 })).await;
    let typing = expect_event(&mut b, "typing").await;
    assert_eq!(typing, json!({ "senderId": alice.0 }));

    send_event(&mut a, "stopTyping", json!({ "receiverId": bob.0 })).await;
    let stop = expect_event(&mut b, "stopTyping").await;
    assert_eq!(stop, json!({ "senderId": alice.0 }));

    // Carol is offline: dropped without an error to the typist.
    send_event(&mut a, "typing", json!({ "receiverId": carol.0 })).await;
    expect_silence(&mut a, 200).await;
}

#[tokio::test]
async fn test_second_connection_evicts_first() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut first = app.connect(alice, &alice_token).await;
    let mut second = app.connect(alice, &alice_token).await;

    expect_closed(&mut first).await;
    assert!(app.state.realtime.registry.is_online(alice));
    assert_eq!(app.state.realtime.online_count(), 1);

    // Pushes now reach the surviving session.
    let mut b = app.connect(bob, &bob_token).await;
    send_event(
        &mut b,
        "sendMessage",
        json!({ "receiverId": alice.0, "content": "which tab?" }),
    )
    .await;
    expect_event(&mut b, "messageSent").await;
    let received = expect_event(&mut second, "receiveMessage").await;
    assert_eq!(received["content"], "which tab?");

    // The evicted session never wrote an offline flag.
    wait_for_presence(&app, alice, &[true, true]).await;
}

#[tokio::test]
async fn test_disconnect_marks_user_offline() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;

    let mut a = app.connect(alice, &alice_token).await;
    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.body["onlineUsers"], 1);

    a.close(None).await.expect("close");

    let registry = std::sync::Arc::clone(&app.state.realtime.registry);
    wait_until(|| !registry.is_online(alice)).await;

    wait_for_presence(&app, alice, &[true, false]).await;

    let user = app
        .store
        .find_user(alice)
        .await
        .expect("lookup")
        .expect("user");
    assert!(!user.is_online);
    assert!(user.last_seen.is_some());

    let health = app.request("GET", "/api/health", None, None).await;
    assert_eq!(health.body["onlineUsers"], 0);
}

#[tokio::test]
async fn test_shutdown_closes_live_sessions() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    let mut b = app.connect(bob, &bob_token).await;

    app.state
        .realtime
        .shutdown(std::time::Duration::from_secs(2))
        .await;

    expect_closed(&mut a).await;
    expect_closed(&mut b).await;
    assert_eq!(app.state.realtime.online_count(), 0);
    wait_for_presence(&app, alice, &[true, false]).await;
    wait_for_presence(&app, bob, &[true, false]).await;
}

#[tokio::test]
async fn test_events_from_one_session_are_processed_in_order() {
    let app = TestApp::new().await;
    let (alice, alice_token) = app.user_with_token("alice").await;
    let (bob, bob_token) = app.user_with_token("bob").await;

    let mut a = app.connect(alice, &alice_token).await;
    let mut b = app.connect(bob, &bob_token).await;

    for i in 0..10 {
        send_event(
            &mut a,
            "sendMessage",
            json!({ "receiverId": bob.0, "content": format!("#{i}") }),
        )
        .await;
    }

    let mut last_id = 0;
    for i in 0..10 {
        let event = recv_event(&mut b).await;
        assert_eq!(event["event"], "receiveMessage");
        assert_eq!(event["data"]["content"], format!("#{i}"));
        let id = event["data"]["id"].as_i64().expect("id");
        assert!(id > last_id);
        last_id = id;
    }
}
