//! Room session: turns engine actions into frames and inbound frames into
//! engine updates.
//!
//! A [`Session`] is bound to at most one room at a time. While joined it
//! forwards mutation, history, permission and (throttled) cursor actions
//! through its [`Transport`]; inbound frames are applied to an
//! [`EngineCore`] only when they belong to the joined room. After
//! [`Session::leave`] nothing is sent and nothing is applied until the next
//! [`Session::join`].
//!
//! Sends are fire-and-forget. A disconnected transport or a failed send is
//! logged and the action stays applied locally. The one exception is
//! `room:join`: if it could not be sent, it is sent again on the next
//! `session:connected`.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use frames::{
    CursorMove, ElementMutation, EventError, Frame, HistoryAction, HistoryEvent, MutationAction, PeerLeft,
    PermissionUpdate, RoomEvent, RoomRef, Status,
};

use crate::consts::CURSOR_MIN_SEND_INTERVAL_MS;
use crate::element::{Element, ElementError, ElementId};
use crate::engine::{Action, EngineCore};
use crate::viewport::Point;

/// Error returned by transports and frame construction.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    Disconnected,
    #[error("send failed: {0}")]
    Send(String),
    #[error("undecodable message: {0}")]
    Decode(String),
    #[error(transparent)]
    Event(#[from] EventError),
    #[error(transparent)]
    Element(#[from] ElementError),
}

/// Outbound half of a realtime connection.
pub trait Transport {
    fn is_connected(&self) -> bool;

    /// Queue `frame` for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the frame cannot be handed to the connection.
    fn send(&mut self, frame: Frame) -> Result<(), TransportError>;
}

/// Client side of one room membership.
pub struct Session<T: Transport> {
    transport: T,
    display_name: String,
    room_id: Option<String>,
    /// The relay has not been told about `room_id` yet.
    join_pending: bool,
    /// Connection id assigned by the relay.
    client_id: Option<String>,
    last_cursor_ms: Option<i64>,
}

impl<T: Transport> Session<T> {
    #[must_use]
    pub fn new(transport: T, display_name: impl Into<String>) -> Self {
        Self {
            transport,
            display_name: display_name.into(),
            room_id: None,
            join_pending: false,
            client_id: None,
            last_cursor_ms: None,
        }
    }

    #[must_use]
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Join `room_id`, leaving the current room first. The engine is reset:
    /// a new room always starts from an empty canvas.
    pub fn join(&mut self, room_id: &str, core: &mut EngineCore) {
        if self.room_id.is_some() {
            self.leave();
        }
        core.reset();
        self.room_id = Some(room_id.to_owned());
        self.last_cursor_ms = None;
        log::info!("joining room {room_id}");
        self.join_pending = !self.emit(&RoomEvent::Join(RoomRef { room_id: room_id.to_owned() }));
    }

    /// Leave the current room. A no-op when not joined.
    pub fn leave(&mut self) {
        self.join_pending = false;
        let Some(room_id) = self.room_id.take() else {
            return;
        };
        log::info!("leaving room {room_id}");
        self.send_event(&room_id, &RoomEvent::Leave(RoomRef { room_id: room_id.clone() }));
    }

    // --- Outbound ---

    /// Forward the collaborative subset of `actions` to the room.
    ///
    /// Returns how many frames were handed to the transport.
    pub fn dispatch(&mut self, actions: &[Action], now_ms: i64) -> usize {
        let Some(room_id) = self.room_id.clone() else {
            if actions.iter().any(is_shared) {
                log::warn!("not in a room; dropping {} local action(s)", actions.iter().filter(|a| is_shared(a)).count());
            }
            return 0;
        };
        let mut sent = 0;
        for action in actions {
            let event = match self.event_for(&room_id, action, now_ms) {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    log::warn!("dropping {action:?}: {e}");
                    continue;
                }
            };
            if self.send_event(&room_id, &event) {
                sent += 1;
            }
        }
        sent
    }

    fn event_for(&mut self, room_id: &str, action: &Action, now_ms: i64) -> Result<Option<RoomEvent>, TransportError> {
        let event = match action {
            Action::ElementAdded(e) => mutation(e, MutationAction::Add)?,
            Action::ElementUpdated(e) => mutation(e, MutationAction::Update)?,
            Action::Undone(e) => history(room_id, HistoryAction::Undo, Some(e.id.to_string()), None),
            Action::Redone(e) => history(room_id, HistoryAction::Redo, Some(e.id.to_string()), Some(e.to_wire()?)),
            Action::Cleared => history(room_id, HistoryAction::Clear, None, None),
            Action::PermissionChanged(can_draw) => RoomEvent::Permission(PermissionUpdate { can_draw: *can_draw }),
            Action::CursorMoved(p) => {
                if self.last_cursor_ms.is_some_and(|last| now_ms - last < CURSOR_MIN_SEND_INTERVAL_MS) {
                    return Ok(None);
                }
                self.last_cursor_ms = Some(now_ms);
                RoomEvent::Cursor(CursorMove {
                    room_id: room_id.to_owned(),
                    client_id: self.client_id.clone().unwrap_or_default(),
                    display_name: self.display_name.clone(),
                    x: p.x,
                    y: p.y,
                })
            }
            Action::OpenTextInput { .. }
            | Action::CloseTextInput
            | Action::Notice(_)
            | Action::RenderNeeded => return Ok(None),
        };
        Ok(Some(event))
    }

    fn emit(&mut self, event: &RoomEvent) -> bool {
        match self.room_id.clone() {
            Some(room_id) => self.send_event(&room_id, event),
            None => false,
        }
    }

    fn send_event(&mut self, room_id: &str, event: &RoomEvent) -> bool {
        if !self.transport.is_connected() {
            log::warn!("transport disconnected; dropping {}", event.syscall());
            return false;
        }
        let frame = match event.to_frame() {
            Ok(frame) => frame.with_room_id(room_id),
            Err(e) => {
                log::warn!("dropping {}: {e}", event.syscall());
                return false;
            }
        };
        match self.transport.send(frame) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("send of {} failed: {e}", event.syscall());
                false
            }
        }
    }

    // --- Inbound ---

    /// Apply one inbound frame. Returns the UI actions it produced.
    ///
    /// Malformed frames, frames for another room, and anything arriving
    /// while not joined are ignored.
    pub fn receive(&mut self, frame: &Frame, core: &mut EngineCore, now_ms: i64) -> Vec<Action> {
        if frame.is_reply() {
            if frame.status == Status::Error {
                log::warn!("{} rejected: {}", frame.syscall, frame.data);
            }
            return Vec::new();
        }
        let event = match RoomEvent::from_frame(frame) {
            Ok(event) => event,
            Err(e) => {
                log::debug!("ignoring frame: {e}");
                return Vec::new();
            }
        };
        if let RoomEvent::Connected { client_id } = event {
            return self.on_connected(client_id, core);
        }

        let Some(room_id) = self.room_id.as_deref() else {
            return Vec::new();
        };
        if frame.room_id.as_deref().is_some_and(|r| r != room_id) {
            log::debug!("ignoring {} for another room", frame.syscall);
            return Vec::new();
        }

        let changed = match event {
            RoomEvent::Element(m) => apply_mutation(core, m),
            RoomEvent::History(h) => apply_history(core, h),
            RoomEvent::Permission(p) => return core.apply_remote_permission(p.can_draw),
            RoomEvent::Cursor(c) => self.apply_cursor(core, frame, c, now_ms),
            RoomEvent::PeerLeft(PeerLeft { client_id }) => core.remove_peer(&client_id),
            RoomEvent::Connected { .. } | RoomEvent::Join(_) | RoomEvent::Leave(_) => false,
        };
        if changed { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Record the relay-assigned connection id. A changed id means a fresh
    /// connection, so the current room is rejoined from an empty canvas.
    /// A join that never reached the relay is sent now, keeping local state.
    fn on_connected(&mut self, client_id: String, core: &mut EngineCore) -> Vec<Action> {
        let reconnected = self.client_id.as_ref().is_some_and(|old| *old != client_id);
        core.set_client_id(&client_id);
        self.client_id = Some(client_id);
        let Some(room_id) = self.room_id.clone() else {
            return Vec::new();
        };
        if !reconnected {
            if self.join_pending {
                log::info!("connected; sending pending join for room {room_id}");
                self.join_pending = !self.emit(&RoomEvent::Join(RoomRef { room_id }));
            }
            return Vec::new();
        }
        log::info!("reconnected; rejoining room {room_id}");
        self.room_id = None;
        self.join(&room_id, core);
        vec![Action::RenderNeeded]
    }

    fn apply_cursor(&self, core: &mut EngineCore, frame: &Frame, c: CursorMove, now_ms: i64) -> bool {
        let sender = if c.client_id.is_empty() { frame.from.clone().unwrap_or_default() } else { c.client_id };
        if sender.is_empty() || self.client_id.as_deref() == Some(sender.as_str()) {
            return false;
        }
        core.apply_remote_cursor(&sender, &c.display_name, Point::new(c.x, c.y), now_ms);
        true
    }

    /// Evict stale remote cursors. Call periodically while joined.
    pub fn tick(&self, core: &mut EngineCore, now_ms: i64) -> Vec<Action> {
        if self.room_id.is_none() || core.evict_stale_cursors(now_ms) == 0 {
            return Vec::new();
        }
        vec![Action::RenderNeeded]
    }
}

fn is_shared(action: &Action) -> bool {
    matches!(
        action,
        Action::ElementAdded(_)
            | Action::ElementUpdated(_)
            | Action::Undone(_)
            | Action::Redone(_)
            | Action::Cleared
            | Action::PermissionChanged(_)
    )
}

fn mutation(element: &Element, action: MutationAction) -> Result<RoomEvent, TransportError> {
    Ok(RoomEvent::Element(ElementMutation { element: element.to_wire()?, action }))
}

fn history(
    room_id: &str,
    action: HistoryAction,
    element_id: Option<String>,
    element: Option<serde_json::Value>,
) -> RoomEvent {
    RoomEvent::History(HistoryEvent { room_id: room_id.to_owned(), action, element_id, element })
}

fn apply_mutation(core: &mut EngineCore, m: ElementMutation) -> bool {
    let element = match Element::from_wire(m.element) {
        Ok(element) => element,
        Err(e) => {
            log::debug!("ignoring element mutation: {e}");
            return false;
        }
    };
    match m.action {
        MutationAction::Add => core.apply_remote_add(element),
        MutationAction::Update => core.apply_remote_update(element),
    }
}

fn apply_history(core: &mut EngineCore, h: HistoryEvent) -> bool {
    match h.action {
        HistoryAction::Undo => match h.element_id.as_deref().map(str::parse::<ElementId>) {
            None => core.apply_remote_undo(None),
            Some(Ok(id)) => core.apply_remote_undo(Some(&id)),
            Some(Err(e)) => {
                log::debug!("ignoring undo: {e}");
                false
            }
        },
        HistoryAction::Redo => {
            let Some(value) = h.element else {
                log::debug!("ignoring redo without element");
                return false;
            };
            match Element::from_wire(value) {
                Ok(element) => core.apply_remote_redo(element),
                Err(e) => {
                    log::debug!("ignoring redo: {e}");
                    false
                }
            }
        }
        HistoryAction::Clear => {
            core.apply_remote_clear();
            true
        }
    }
}
