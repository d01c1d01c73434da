//! Remote cursor presence: who else is pointing where.

#[cfg(test)]
#[path = "presence_test.rs"]
mod presence_test;

use std::collections::HashMap;

use crate::consts::CURSOR_STALE_MS;
use crate::viewport::Point;

/// Last known position of a remote client's pointer, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCursor {
    pub client_id: String,
    pub display_name: String,
    pub position: Point,
    /// Local clock (ms) when this entry was last refreshed.
    pub updated_at: i64,
}

/// Remote cursors keyed by client id.
///
/// Entries are removed explicitly on peer-left, and evicted when they have
/// not been refreshed within [`CURSOR_STALE_MS`].
#[derive(Debug, Default)]
pub struct Presence {
    cursors: HashMap<String, RemoteCursor>,
}

impl Presence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a cursor.
    pub fn upsert(&mut self, client_id: &str, display_name: &str, position: Point, now_ms: i64) {
        let cursor = self.cursors.entry(client_id.to_owned()).or_insert_with(|| RemoteCursor {
            client_id: client_id.to_owned(),
            display_name: String::new(),
            position,
            updated_at: now_ms,
        });
        display_name.clone_into(&mut cursor.display_name);
        cursor.position = position;
        cursor.updated_at = now_ms;
    }

    /// Remove a client's cursor. Returns whether one was present.
    pub fn remove(&mut self, client_id: &str) -> bool {
        self.cursors.remove(client_id).is_some()
    }

    /// Drop cursors older than [`CURSOR_STALE_MS`]. Returns how many were dropped.
    pub fn evict_stale(&mut self, now_ms: i64) -> usize {
        let before = self.cursors.len();
        self.cursors.retain(|_, c| now_ms - c.updated_at < CURSOR_STALE_MS);
        before - self.cursors.len()
    }

    #[must_use]
    pub fn get(&self, client_id: &str) -> Option<&RemoteCursor> {
        self.cursors.get(client_id)
    }

    /// Cursors sorted by client id, for stable draw order.
    #[must_use]
    pub fn sorted(&self) -> Vec<&RemoteCursor> {
        let mut out: Vec<&RemoteCursor> = self.cursors.values().collect();
        out.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        out
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }
}
