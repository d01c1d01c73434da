//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the relay config and the live room registry. A room exists only
//! while at least one connection is in it; the relay keeps no element state.

#[cfg(test)]
#[path = "state_test.rs"]
mod state_test;

use std::collections::HashMap;
use std::sync::Arc;

use frames::Frame;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::config::Config;

/// A connection that has joined a room.
#[derive(Debug, Clone)]
pub struct ConnectedClient {
    /// Outbound queue drained by the connection's socket task.
    pub tx: mpsc::Sender<Frame>,
    /// Display name from the upgrade request, used in logs only.
    pub name: String,
}

/// Live membership of one room.
#[derive(Debug, Default)]
pub struct RoomState {
    pub clients: HashMap<Uuid, ConnectedClient>,
}

impl RoomState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clone is required by Axum; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub rooms: Arc<RwLock<HashMap<String, RoomState>>>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config: Arc::new(config), rooms: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[cfg(test)]
pub mod test_helpers {
    use super::*;

    /// App state with default config.
    #[must_use]
    pub fn test_app_state() -> AppState {
        AppState::new(Config::default())
    }

    /// App state with a custom room limit.
    #[must_use]
    pub fn test_app_state_with_limit(max_room_clients: usize) -> AppState {
        AppState::new(Config { max_room_clients, ..Config::default() })
    }

    /// A client entry plus the receiver for its outbound queue.
    #[must_use]
    pub fn test_client(name: &str) -> (ConnectedClient, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectedClient { tx, name: name.to_owned() }, rx)
    }
}
