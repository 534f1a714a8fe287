//! Hub Integration Tests
//!
//! Each test spawns an in-process server on an ephemeral port and drives it
//! with real WebSocket clients.
//!
//! Run with: cargo test -p integration-tests --test hub_tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chat_hub::protocol::{HubFrame, OpCode};
use integration_tests::{expect_close, test_config, TestServer};
use reqwest::StatusCode;
use serde_json::json;

/// Window in which a frame that should not arrive is given to show up
const QUIET: Duration = Duration::from_millis(200);

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");

    let response = server.get("/health").await.expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

// ============================================================================
// Connection Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_hello_assigns_distinct_ids() {
    let server = TestServer::start().await.expect("Failed to start server");

    let a = server.connect().await.unwrap();
    let b = server.connect().await.unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(
        a.heartbeat_interval,
        test_config().limits.heartbeat_interval_ms
    );

    server.wait_for_connections(2).await.unwrap();
    assert!(server.hub().contains(a.id));
    assert!(server.hub().contains(b.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hello_arrives_before_room_traffic() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut talker = server.connect().await.unwrap();
    let stop = Arc::new(AtomicBool::new(false));

    let chatter = {
        let stop = stop.clone();
        tokio::spawn(async move {
            while !stop.load(Ordering::SeqCst) {
                talker.say("talker", "busy room").await.unwrap();
                // Wait for the echo so the talker's queue never backs up
                talker.next_frame().await.unwrap();
            }
        })
    };

    // `connect` fails unless the first frame is Hello
    for _ in 0..50 {
        let client = server.connect().await.unwrap();
        client.close().await.unwrap();
    }

    stop.store(true, Ordering::SeqCst);
    chatter.await.unwrap();
}

#[tokio::test]
async fn test_client_close_removes_connection() {
    let server = TestServer::start().await.expect("Failed to start server");

    let a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    let a_id = a.id;
    a.close().await.unwrap();
    server.wait_for_connections(1).await.unwrap();
    assert!(!server.hub().contains(a_id));

    // The remaining member still gets its own messages
    b.say("bob", "still here").await.unwrap();
    let received = b.next_frame().await.unwrap().as_receive_message().unwrap();
    assert_eq!(received.message, "still here");
}

#[tokio::test]
async fn test_server_full_rejects_with_close_code() {
    let mut config = test_config();
    config.limits.max_connections = 1;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let _a = server.connect().await.unwrap();
    server.wait_for_connections(1).await.unwrap();

    let mut rejected = server.connect_raw().await.unwrap();
    let code = expect_close(&mut rejected).await.unwrap();

    assert_eq!(code, Some(4013));
    assert_eq!(server.hub().connection_count(), 1);
}

#[tokio::test]
async fn test_capacity_frees_after_disconnect() {
    let mut config = test_config();
    config.limits.max_connections = 1;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let a = server.connect().await.unwrap();
    a.close().await.unwrap();
    server.wait_for_connections(0).await.unwrap();

    let b = server.connect().await;
    assert!(b.is_ok());
}

#[tokio::test]
async fn test_idle_connection_times_out() {
    let mut config = test_config();
    config.limits.idle_timeout_ms = 200;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let mut a = server.connect().await.unwrap();

    assert_eq!(a.expect_close().await.unwrap(), Some(4009));
    server.wait_for_connections(0).await.unwrap();
}

// ============================================================================
// Messaging Tests
// ============================================================================

#[tokio::test]
async fn test_message_reaches_every_connection() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    let mut c = server.connect().await.unwrap();
    server.wait_for_connections(3).await.unwrap();

    a.say("alice", "hello").await.unwrap();

    let a_id = a.id;
    for client in [&mut a, &mut b, &mut c] {
        let frame = client.next_frame().await.unwrap();
        assert_eq!(frame.op, OpCode::Dispatch);
        assert_eq!(frame.t.as_deref(), Some(HubFrame::RECEIVE_MESSAGE));

        let received = frame.as_receive_message().unwrap();
        assert_eq!(received.connection_id, a_id);
        assert_eq!(received.user, "alice");
        assert_eq!(received.message, "hello");
    }
}

#[tokio::test]
async fn test_exclude_self_skips_sender() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    a.send_json(&json!({
        "op": 2,
        "d": { "user": "alice", "message": "psst", "exclude_self": true }
    }))
    .await
    .unwrap();

    let received = b.next_frame().await.unwrap().as_receive_message().unwrap();
    assert_eq!(received.message, "psst");
    assert!(a.try_next_frame(QUIET).await.unwrap().is_none());
}

#[tokio::test]
async fn test_messages_from_one_sender_arrive_in_order() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    for i in 0..10 {
        a.say("alice", &format!("message {i}")).await.unwrap();
    }

    for i in 0..10 {
        let received = b.next_frame().await.unwrap().as_receive_message().unwrap();
        assert_eq!(received.message, format!("message {i}"));
    }
}

#[tokio::test]
async fn test_set_name_labels_messages() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    a.send_json(&json!({ "op": 3, "d": { "name": "  carol  " } }))
        .await
        .unwrap();
    a.send_json(&json!({ "op": 2, "d": { "message": "hi" } }))
        .await
        .unwrap();

    let received = b.next_frame().await.unwrap().as_receive_message().unwrap();
    assert_eq!(received.user, "carol");
}

#[tokio::test]
async fn test_heartbeat_is_acknowledged() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();

    a.send_json(&json!({ "op": 1 })).await.unwrap();

    assert_eq!(a.next_frame().await.unwrap().op, OpCode::HeartbeatAck);
    assert!(b.try_next_frame(QUIET).await.unwrap().is_none());
}

// ============================================================================
// Protocol Error Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_json_closes_with_decode_error() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    a.send_text("{not json").await.unwrap();

    assert_eq!(a.expect_close().await.unwrap(), Some(4002));
    server.wait_for_connections(0).await.unwrap();
}

#[tokio::test]
async fn test_server_opcode_closes_with_unknown_opcode() {
    let server = TestServer::start().await.expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    a.send_json(&json!({ "op": 10 })).await.unwrap();

    assert_eq!(a.expect_close().await.unwrap(), Some(4001));
}

#[tokio::test]
async fn test_overlong_message_closes_with_too_large() {
    let mut config = test_config();
    config.limits.max_message_length = 8;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connections(2).await.unwrap();

    a.say("alice", "this is far too long").await.unwrap();

    assert_eq!(a.expect_close().await.unwrap(), Some(4003));
    assert!(b.try_next_frame(QUIET).await.unwrap().is_none());
}
