//! Host-controlled write permission.

#[cfg(test)]
#[path = "permission_test.rs"]
mod permission_test;

/// Whether this client may invoke mutating tools.
///
/// The host's `can_draw` is authoritative and never blocks the host itself;
/// other clients hold a cached copy updated by `permission:update` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGate {
    is_host: bool,
    can_draw: bool,
}

impl Default for PermissionGate {
    fn default() -> Self {
        Self { is_host: false, can_draw: true }
    }
}

impl PermissionGate {
    #[must_use]
    pub fn new(is_host: bool) -> Self {
        Self { is_host, ..Self::default() }
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.is_host
    }

    pub fn set_host(&mut self, is_host: bool) {
        self.is_host = is_host;
    }

    #[must_use]
    pub fn can_draw(&self) -> bool {
        self.can_draw
    }

    /// Whether mutating tools are currently allowed for this client.
    #[must_use]
    pub fn allows_mutation(&self) -> bool {
        self.is_host || self.can_draw
    }

    /// Host-side toggle. Returns `false` (and changes nothing) for non-hosts.
    pub fn set_can_draw(&mut self, can_draw: bool) -> bool {
        if !self.is_host {
            return false;
        }
        self.can_draw = can_draw;
        true
    }

    /// Apply a remote `permission:update`. Returns `true` if the cached value
    /// changed. The host's own value is never overwritten by peers.
    pub fn apply_remote(&mut self, can_draw: bool) -> bool {
        if self.is_host || self.can_draw == can_draw {
            return false;
        }
        self.can_draw = can_draw;
        true
    }

    /// Back to the default state, keeping the host flag.
    pub fn reset(&mut self) {
        self.can_draw = true;
    }
}
