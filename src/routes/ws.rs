//! WebSocket handler: per-connection room relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames → decode + dispatch by syscall prefix
//! - Broadcast frames from room peers → forward to client
//!
//! Handler functions validate and return an `Outcome`. The dispatch layer
//! owns all outbound concerns: reply to sender and fan-out to peers.
//! Element, history and permission payloads are forwarded untouched; the
//! relay only stamps the envelope (`from`, `room_id`, `ts`).
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → send `session:connected` with `client_id`
//! 2. Client sends frames → dispatch → handler returns Outcome
//! 3. Dispatch applies Outcome (reply / broadcast)
//! 4. Close → broadcast `room:peer_left` → part
//!
//! ENCODING
//! ========
//! A client may speak JSON (text messages) or protobuf (binary messages).
//! Every frame to a client goes out in the encoding it last used.

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use frames::event::{SYSCALL_CONNECTED, SYSCALL_PEER_LEFT};
use frames::{Frame, Status};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::room::{self, RoomError};
use crate::state::{AppState, ConnectedClient};

/// Display name used when the upgrade request carries none.
pub const DEFAULT_NAME: &str = "anonymous";

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions. The dispatch layer uses this to
/// decide who receives what; handlers never send frames directly.
#[derive(Debug)]
enum Outcome {
    /// Fan the stamped frame out to every room peer except the sender.
    BroadcastExcludeSender(Frame),
    /// Send done+data to sender only.
    Reply(Value),
    /// Nothing to send.
    Silent,
}

// =============================================================================
// CONNECTION
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    Json,
    Protobuf,
}

/// Per-connection relay state.
struct Connection {
    client_id: Uuid,
    name: String,
    /// Sender half of this connection's peer queue, handed to rooms on join.
    tx: mpsc::Sender<Frame>,
    room_id: Option<String>,
}

impl Connection {
    fn new(name: impl Into<String>, tx: mpsc::Sender<Frame>) -> Self {
        Self { client_id: Uuid::new_v4(), name: name.into(), tx, room_id: None }
    }

    fn as_client(&self) -> ConnectedClient {
        ConnectedClient { tx: self.tx.clone(), name: self.name.clone() }
    }
}

// =============================================================================
// UPGRADE
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    name: Option<String>,
}

pub async fn handle_ws(State(state): State<AppState>, Query(params): Query<WsParams>, ws: WebSocketUpgrade) -> Response {
    let name = display_name(params.name.as_deref());
    ws.on_upgrade(move |socket| run_ws(socket, state, name))
}

fn display_name(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(DEFAULT_NAME)
        .to_owned()
}

async fn run_ws(mut socket: WebSocket, state: AppState, name: String) {
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.config.channel_capacity);
    let mut conn = Connection::new(name, client_tx);
    let mut encoding = Encoding::Json;

    let welcome = Frame::request(SYSCALL_CONNECTED, json!({"client_id": conn.client_id.to_string(), "name": conn.name}))
        .with_ts(now_ms());
    if send_frame(&mut socket, &welcome, encoding).await.is_err() {
        return;
    }

    info!(client_id = %conn.client_id, name = %conn.name, "ws: client connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                if matches!(msg, Message::Close(_)) {
                    break;
                }
                let Some((replies, used)) = process_message(&state, &mut conn, msg).await else {
                    continue;
                };
                encoding = used;
                for frame in replies {
                    let _ = send_frame(&mut socket, &frame, encoding).await;
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame, encoding).await.is_err() {
                    break;
                }
            }
        }
    }

    leave_current_room(&state, &mut conn).await;
    info!(client_id = %conn.client_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Decode one socket message and process it.
///
/// Returns the frames for the sender and the encoding the message used, or
/// `None` for control messages (ping/pong).
async fn process_message(state: &AppState, conn: &mut Connection, msg: Message) -> Option<(Vec<Frame>, Encoding)> {
    let (decoded, encoding) = match msg {
        Message::Text(text) => {
            (serde_json::from_str::<Frame>(text.as_str()).map_err(|e| format!("invalid json: {e}")), Encoding::Json)
        }
        Message::Binary(bytes) => (frames::decode_frame(&bytes).map_err(|e| e.to_string()), Encoding::Protobuf),
        _ => return None,
    };
    let replies = match decoded {
        Ok(req) => process_inbound(state, conn, req).await,
        Err(message) => {
            warn!(client_id = %conn.client_id, error = %message, "ws: invalid inbound frame");
            vec![Frame::request("gateway:error", json!({})).with_data(frames::FRAME_MESSAGE, message).with_ts(now_ms())]
        }
    };
    Some((replies, encoding))
}

/// Process one decoded inbound frame and return frames for the sender.
///
/// Kept apart from the socket so tests can drive dispatch directly.
async fn process_inbound(state: &AppState, conn: &mut Connection, req: Frame) -> Vec<Frame> {
    if req.status != Status::Request {
        debug!(client_id = %conn.client_id, syscall = %req.syscall, "ws: ignoring non-request frame");
        return Vec::new();
    }

    let prefix = req.prefix();
    if prefix != "cursor" {
        info!(client_id = %conn.client_id, id = %req.id, syscall = %req.syscall, "ws: recv frame");
    }

    let result = match prefix {
        "room" => handle_room(state, conn, &req).await,
        "element" => forward(conn, &req, "mutate"),
        "history" => forward(conn, &req, "action"),
        "permission" => forward(conn, &req, "update"),
        "cursor" => handle_cursor(conn, &req),
        _ => Err(req.error(format!("unknown prefix: {prefix}"))),
    };

    match result {
        Ok(Outcome::BroadcastExcludeSender(frame)) => {
            if let Some(room_id) = conn.room_id.as_deref() {
                room::broadcast(state, room_id, &frame, Some(conn.client_id)).await;
            }
            Vec::new()
        }
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Silent) => Vec::new(),
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// ROOM HANDLERS
// =============================================================================

async fn handle_room(state: &AppState, conn: &mut Connection, req: &Frame) -> Result<Outcome, Frame> {
    match req.op() {
        "join" => {
            let Some(room_id) = req.data_str("room_id").or(req.room_id.as_deref()).map(str::to_owned) else {
                return Err(req.error_from(&RoomError::MissingRoomId));
            };

            if conn.room_id.as_deref().is_some_and(|current| current != room_id) {
                leave_current_room(state, conn).await;
            }

            match room::join_room(state, &room_id, conn.client_id, conn.as_client()).await {
                Ok(peers) => {
                    let reply = json!({"room_id": room_id, "client_id": conn.client_id.to_string(), "peers": peers});
                    conn.room_id = Some(room_id);
                    Ok(Outcome::Reply(reply))
                }
                Err(e) => Err(req.error_from(&e)),
            }
        }
        "leave" => {
            leave_current_room(state, conn).await;
            Ok(Outcome::Silent)
        }
        op => Err(req.error(format!("unknown room op: {op}"))),
    }
}

/// Announce the departure to the current room's peers, then part it.
async fn leave_current_room(state: &AppState, conn: &mut Connection) {
    let Some(room_id) = conn.room_id.take() else {
        return;
    };
    let notice = Frame::request(SYSCALL_PEER_LEFT, json!({"client_id": conn.client_id.to_string()}))
        .with_room_id(room_id.as_str())
        .with_from(conn.client_id.to_string())
        .with_ts(now_ms());
    room::broadcast(state, &room_id, &notice, Some(conn.client_id)).await;
    room::part_room(state, &room_id, conn.client_id).await;
}

// =============================================================================
// RELAYED EVENTS
// =============================================================================

/// Element, history and permission events: room-scoped, forwarded as-is.
fn forward(conn: &Connection, req: &Frame, expected_op: &str) -> Result<Outcome, Frame> {
    let Some(room_id) = conn.room_id.as_deref() else {
        return Err(req.error_from(&RoomError::NotInRoom));
    };
    if req.op() != expected_op {
        return Err(req.error(format!("unknown {} op: {}", req.prefix(), req.op())));
    }
    Ok(Outcome::BroadcastExcludeSender(stamp(req, room_id, conn.client_id)))
}

fn handle_cursor(conn: &Connection, req: &Frame) -> Result<Outcome, Frame> {
    // Cursor moves before joining are dropped silently.
    let Some(room_id) = conn.room_id.as_deref() else {
        return Ok(Outcome::Silent);
    };
    if req.op() != "move" {
        return Err(req.error(format!("unknown cursor op: {}", req.op())));
    }
    let frame = stamp(req, room_id, conn.client_id)
        .with_data("client_id", conn.client_id.to_string())
        .with_data("room_id", room_id);
    Ok(Outcome::BroadcastExcludeSender(frame))
}

/// Copy of `req` as peers see it: fresh id, sender and room stamped.
fn stamp(req: &Frame, room_id: &str, client_id: Uuid) -> Frame {
    let ts = if req.ts > 0 { req.ts } else { now_ms() };
    Frame::request(req.syscall.as_str(), req.data.clone())
        .with_room_id(room_id)
        .with_from(client_id.to_string())
        .with_ts(ts)
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_frame(socket: &mut WebSocket, frame: &Frame, encoding: Encoding) -> Result<(), ()> {
    let msg = match encoding {
        Encoding::Protobuf => Message::Binary(frames::encode_frame(frame).into()),
        Encoding::Json => match serde_json::to_string(frame) {
            Ok(json) => Message::Text(json.into()),
            Err(e) => {
                warn!(error = %e, "ws: failed to serialize frame");
                return Err(());
            }
        },
    };
    if !frame.syscall.starts_with("cursor:") {
        if frame.status == Status::Error {
            let code = frame.data_str(frames::FRAME_CODE).unwrap_or("-");
            let message = frame.data_str(frames::FRAME_MESSAGE).unwrap_or("-");
            warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
        } else {
            info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
        }
    }
    socket.send(msg).await.map_err(|_| ())
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
