//! Typed room events carried inside [`Frame`] payloads.
//!
//! Each variant of [`RoomEvent`] maps to exactly one syscall. Element payloads
//! stay as raw JSON here: the relay forwards them untouched and only the
//! canvas client decides whether it recognizes the shape.

#[cfg(test)]
#[path = "event_test.rs"]
mod event_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Frame, Status};

pub const SYSCALL_CONNECTED: &str = "session:connected";
pub const SYSCALL_JOIN: &str = "room:join";
pub const SYSCALL_LEAVE: &str = "room:leave";
pub const SYSCALL_PEER_LEFT: &str = "room:peer_left";
pub const SYSCALL_ELEMENT: &str = "element:mutate";
pub const SYSCALL_CURSOR: &str = "cursor:move";
pub const SYSCALL_HISTORY: &str = "history:action";
pub const SYSCALL_PERMISSION: &str = "permission:update";

/// Error returned when a frame cannot be viewed as a [`RoomEvent`].
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
    #[error("invalid {syscall} payload: {source}")]
    Payload {
        syscall: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Whether an element mutation creates or replaces an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationAction {
    Add,
    Update,
}

/// History operation broadcast to peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryAction {
    Undo,
    Redo,
    Clear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomRef {
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementMutation {
    /// Serialized element; shape-specific fields are flattened next to `type`.
    pub element: Value,
    pub action: MutationAction,
}

/// Cursor position in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorMove {
    pub room_id: String,
    /// Relay connection id of the sender. Clients may leave it empty; the
    /// relay overwrites it on rebroadcast.
    #[serde(default)]
    pub client_id: String,
    pub display_name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEvent {
    pub room_id: String,
    pub action: HistoryAction,
    /// Id of the element removed by an undo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,
    /// Element restored by a redo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionUpdate {
    pub can_draw: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerLeft {
    pub client_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Connected {
    client_id: String,
}

/// A typed view of every frame exchanged inside a room.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// Relay greeting carrying the connection id.
    Connected { client_id: String },
    Join(RoomRef),
    Leave(RoomRef),
    PeerLeft(PeerLeft),
    Element(ElementMutation),
    Cursor(CursorMove),
    History(HistoryEvent),
    Permission(PermissionUpdate),
}

impl RoomEvent {
    /// Syscall name this event travels under.
    #[must_use]
    pub fn syscall(&self) -> &'static str {
        match self {
            Self::Connected { .. } => SYSCALL_CONNECTED,
            Self::Join(_) => SYSCALL_JOIN,
            Self::Leave(_) => SYSCALL_LEAVE,
            Self::PeerLeft(_) => SYSCALL_PEER_LEFT,
            Self::Element(_) => SYSCALL_ELEMENT,
            Self::Cursor(_) => SYSCALL_CURSOR,
            Self::History(_) => SYSCALL_HISTORY,
            Self::Permission(_) => SYSCALL_PERMISSION,
        }
    }

    /// Wrap this event in a request frame.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::Payload`] if the payload fails to serialize.
    pub fn to_frame(&self) -> Result<Frame, EventError> {
        let syscall = self.syscall();
        let data = match self {
            Self::Connected { client_id } => to_value(syscall, &Connected { client_id: client_id.clone() }),
            Self::Join(r) | Self::Leave(r) => to_value(syscall, r),
            Self::PeerLeft(p) => to_value(syscall, p),
            Self::Element(m) => to_value(syscall, m),
            Self::Cursor(c) => to_value(syscall, c),
            Self::History(h) => to_value(syscall, h),
            Self::Permission(p) => to_value(syscall, p),
        }?;
        Ok(Frame::request(syscall, data))
    }

    /// Parse a request frame into a typed event.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::UnknownSyscall`] for syscalls outside the room
    /// protocol and [`EventError::Payload`] when `data` has the wrong shape.
    pub fn from_frame(frame: &Frame) -> Result<Self, EventError> {
        let syscall = frame.syscall.as_str();
        let data = frame.data.clone();
        match syscall {
            SYSCALL_CONNECTED => {
                from_value::<Connected>(syscall, data).map(|c| Self::Connected { client_id: c.client_id })
            }
            SYSCALL_JOIN => from_value(syscall, data).map(Self::Join),
            SYSCALL_LEAVE => from_value(syscall, data).map(Self::Leave),
            SYSCALL_PEER_LEFT => from_value(syscall, data).map(Self::PeerLeft),
            SYSCALL_ELEMENT => from_value(syscall, data).map(Self::Element),
            SYSCALL_CURSOR => from_value(syscall, data).map(Self::Cursor),
            SYSCALL_HISTORY => from_value(syscall, data).map(Self::History),
            SYSCALL_PERMISSION => from_value(syscall, data).map(Self::Permission),
            other => Err(EventError::UnknownSyscall(other.to_owned())),
        }
    }
}

impl Frame {
    /// Whether this frame is a relay reply rather than a room event.
    #[must_use]
    pub fn is_reply(&self) -> bool {
        self.status != Status::Request
    }
}

fn to_value<T: Serialize>(syscall: &str, payload: &T) -> Result<Value, EventError> {
    serde_json::to_value(payload).map_err(|source| EventError::Payload { syscall: syscall.to_owned(), source })
}

fn from_value<T: for<'de> Deserialize<'de>>(syscall: &str, data: Value) -> Result<T, EventError> {
    serde_json::from_value(data).map_err(|source| EventError::Payload { syscall: syscall.to_owned(), source })
}
