use serde_json::json;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use super::*;
use crate::state::test_helpers::{test_app_state, test_app_state_with_limit, test_client};

async fn recv(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("broadcast receive timed out")
        .expect("broadcast channel closed unexpectedly")
}

fn assert_empty(rx: &mut mpsc::Receiver<Frame>) {
    assert!(rx.try_recv().is_err(), "expected no queued frame");
}

// =============================================================================
// join / part
// =============================================================================

#[tokio::test]
async fn first_join_creates_room() {
    let state = test_app_state();
    let (client, _rx) = test_client("ann");
    let peers = join_room(&state, "r1", Uuid::new_v4(), client).await.unwrap();
    assert_eq!(peers, 0);
    assert_eq!(client_count(&state, "r1").await, 1);
}

#[tokio::test]
async fn join_reports_existing_peers() {
    let state = test_app_state();
    let (a, _ra) = test_client("ann");
    let (b, _rb) = test_client("bob");
    join_room(&state, "r1", Uuid::new_v4(), a).await.unwrap();
    assert_eq!(join_room(&state, "r1", Uuid::new_v4(), b).await.unwrap(), 1);
}

#[tokio::test]
async fn blank_room_id_is_rejected() {
    let state = test_app_state();
    let (client, _rx) = test_client("ann");
    let err = join_room(&state, "  ", Uuid::new_v4(), client).await.unwrap_err();
    assert_eq!(err.error_code(), "E_MISSING_ROOM_ID");
    assert_eq!(state.room_count().await, 0);
}

#[tokio::test]
async fn full_room_rejects_new_clients() {
    let state = test_app_state_with_limit(1);
    let (a, _ra) = test_client("ann");
    let (b, _rb) = test_client("bob");
    let ann = Uuid::new_v4();
    join_room(&state, "r1", ann, a.clone()).await.unwrap();

    let err = join_room(&state, "r1", Uuid::new_v4(), b).await.unwrap_err();
    assert_eq!(err.error_code(), "E_ROOM_FULL");
    assert!(err.retryable());
    assert_eq!(client_count(&state, "r1").await, 1);

    // The same connection may rejoin a full room.
    assert!(join_room(&state, "r1", ann, a).await.is_ok());
}

#[tokio::test]
async fn zero_limit_leaves_no_empty_room() {
    let state = test_app_state_with_limit(0);
    let (client, _rx) = test_client("ann");
    assert!(join_room(&state, "r1", Uuid::new_v4(), client).await.is_err());
    assert_eq!(state.room_count().await, 0);
}

#[tokio::test]
async fn last_part_evicts_room() {
    let state = test_app_state();
    let (a, _ra) = test_client("ann");
    let (b, _rb) = test_client("bob");
    let (ann, bob) = (Uuid::new_v4(), Uuid::new_v4());
    join_room(&state, "r1", ann, a).await.unwrap();
    join_room(&state, "r1", bob, b).await.unwrap();

    part_room(&state, "r1", ann).await;
    assert_eq!(client_count(&state, "r1").await, 1);
    part_room(&state, "r1", bob).await;
    assert_eq!(state.room_count().await, 0);
}

#[tokio::test]
async fn part_of_unknown_room_or_client_is_noop() {
    let state = test_app_state();
    let (a, _ra) = test_client("ann");
    join_room(&state, "r1", Uuid::new_v4(), a).await.unwrap();
    part_room(&state, "r2", Uuid::new_v4()).await;
    part_room(&state, "r1", Uuid::new_v4()).await;
    assert_eq!(client_count(&state, "r1").await, 1);
}

// =============================================================================
// broadcast
// =============================================================================

#[tokio::test]
async fn broadcast_excludes_sender() {
    let state = test_app_state();
    let (a, mut ra) = test_client("ann");
    let (b, mut rb) = test_client("bob");
    let (ann, bob) = (Uuid::new_v4(), Uuid::new_v4());
    join_room(&state, "r1", ann, a).await.unwrap();
    join_room(&state, "r1", bob, b).await.unwrap();

    let frame = Frame::request("element:mutate", json!({"action": "add"})).with_room_id("r1");
    assert_eq!(broadcast(&state, "r1", &frame, Some(ann)).await, 1);

    assert_eq!(recv(&mut rb).await, frame);
    assert_empty(&mut ra);
}

#[tokio::test]
async fn broadcast_stays_inside_the_room() {
    let state = test_app_state();
    let (a, _ra) = test_client("ann");
    let (b, mut rb) = test_client("bob");
    join_room(&state, "r1", Uuid::new_v4(), a).await.unwrap();
    join_room(&state, "r2", Uuid::new_v4(), b).await.unwrap();

    let frame = Frame::request("cursor:move", json!({}));
    assert_eq!(broadcast(&state, "r1", &frame, None).await, 1);
    assert_empty(&mut rb);
    assert_eq!(broadcast(&state, "missing", &frame, None).await, 0);
}

#[tokio::test]
async fn full_or_closed_peer_is_skipped() {
    let state = test_app_state();
    let (tx_full, _rx_full) = mpsc::channel(1);
    let (closed, rx_closed) = test_client("gone");
    let (ok, mut rx_ok) = test_client("ok");
    drop(rx_closed);
    let full = ConnectedClient { tx: tx_full, name: "slow".into() };
    full.tx.try_send(Frame::request("cursor:move", json!({}))).unwrap();

    join_room(&state, "r1", Uuid::new_v4(), full).await.unwrap();
    join_room(&state, "r1", Uuid::new_v4(), closed).await.unwrap();
    join_room(&state, "r1", Uuid::new_v4(), ok).await.unwrap();

    let frame = Frame::request("history:action", json!({"action": "clear"}));
    assert_eq!(broadcast(&state, "r1", &frame, None).await, 1);
    assert_eq!(recv(&mut rx_ok).await.syscall, "history:action");
}
