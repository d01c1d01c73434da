//! Room service: join, part, and fan-out.
//!
//! DESIGN
//! ======
//! A room is created by its first join and evicted by its last part. The
//! relay never looks inside the frames it fans out; ordering is whatever
//! order frames reach the room.
//!
//! ERROR HANDLING
//! ==============
//! Fan-out never blocks the room. A peer whose queue is full or closed
//! misses that frame and the drop is logged.

#[cfg(test)]
#[path = "room_test.rs"]
mod room_test;

use frames::{ErrorCode, Frame};
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::{AppState, ConnectedClient, RoomState};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("room_id required")]
    MissingRoomId,
    #[error("room {room_id} is full ({limit} clients)")]
    Full { room_id: String, limit: usize },
    #[error("must join a room first")]
    NotInRoom,
}

impl ErrorCode for RoomError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingRoomId => "E_MISSING_ROOM_ID",
            Self::Full { .. } => "E_ROOM_FULL",
            Self::NotInRoom => "E_NOT_IN_ROOM",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Full { .. })
    }
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Add a client to a room, creating the room if needed.
///
/// Returns the number of other clients already in the room.
///
/// # Errors
///
/// Returns [`RoomError::MissingRoomId`] for a blank id and [`RoomError::Full`]
/// when the room is at the configured limit.
pub async fn join_room(
    state: &AppState,
    room_id: &str,
    client_id: Uuid,
    client: ConnectedClient,
) -> Result<usize, RoomError> {
    if room_id.trim().is_empty() {
        return Err(RoomError::MissingRoomId);
    }
    let limit = state.config.max_room_clients;

    let mut rooms = state.rooms.write().await;
    let room = rooms.entry(room_id.to_owned()).or_insert_with(RoomState::new);
    let rejoin = room.clients.contains_key(&client_id);
    if !rejoin && room.clients.len() >= limit {
        // An empty room can only be full with a zero limit; don't leave it behind.
        if room.clients.is_empty() {
            rooms.remove(room_id);
        }
        return Err(RoomError::Full { room_id: room_id.to_owned(), limit });
    }

    let name = client.name.clone();
    room.clients.insert(client_id, client);
    let peers = room.clients.len() - 1;
    info!(%room_id, %client_id, %name, clients = room.clients.len(), "client joined room");
    Ok(peers)
}

/// Remove a client from a room. Evicts the room when it becomes empty.
pub async fn part_room(state: &AppState, room_id: &str, client_id: Uuid) {
    let mut rooms = state.rooms.write().await;
    let Some(room) = rooms.get_mut(room_id) else {
        return;
    };

    if room.clients.remove(&client_id).is_none() {
        return;
    }
    info!(%room_id, %client_id, remaining = room.clients.len(), "client left room");

    if room.clients.is_empty() {
        rooms.remove(room_id);
        info!(%room_id, "evicted empty room");
    }
}

/// Number of clients currently in `room_id`.
pub async fn client_count(state: &AppState, room_id: &str) -> usize {
    state.rooms.read().await.get(room_id).map_or(0, |room| room.clients.len())
}

// =============================================================================
// FAN-OUT
// =============================================================================

/// Queue `frame` for every client in `room_id` except `exclude`.
///
/// Returns how many peers accepted the frame.
pub async fn broadcast(state: &AppState, room_id: &str, frame: &Frame, exclude: Option<Uuid>) -> usize {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(room_id) else {
        return 0;
    };

    let mut delivered = 0;
    for (client_id, client) in &room.clients {
        if exclude == Some(*client_id) {
            continue;
        }
        match client.tx.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(TrySendError::Full(_)) => {
                warn!(%room_id, %client_id, syscall = %frame.syscall, "room: peer queue full; frame dropped");
            }
            Err(TrySendError::Closed(_)) => {
                warn!(%room_id, %client_id, syscall = %frame.syscall, "room: peer queue closed; frame dropped");
            }
        }
    }
    delivered
}
