use super::*;

#[test]
fn defaults_allow_drawing() {
    let gate = PermissionGate::default();
    assert!(!gate.is_host());
    assert!(gate.can_draw());
    assert!(gate.allows_mutation());
}

#[test]
fn non_host_follows_remote_updates() {
    let mut gate = PermissionGate::new(false);
    assert!(gate.apply_remote(false));
    assert!(!gate.allows_mutation());
    assert!(!gate.apply_remote(false));
    assert!(gate.apply_remote(true));
    assert!(gate.allows_mutation());
}

#[test]
fn host_is_never_blocked() {
    let mut gate = PermissionGate::new(true);
    assert!(gate.set_can_draw(false));
    assert!(!gate.can_draw());
    assert!(gate.allows_mutation());
}

#[test]
fn host_ignores_remote_updates() {
    let mut gate = PermissionGate::new(true);
    gate.set_can_draw(false);
    assert!(!gate.apply_remote(true));
    assert!(!gate.can_draw());
}

#[test]
fn only_host_may_toggle() {
    let mut gate = PermissionGate::new(false);
    assert!(!gate.set_can_draw(false));
    assert!(gate.can_draw());
}

#[test]
fn reset_restores_default_permission() {
    let mut gate = PermissionGate::new(false);
    gate.apply_remote(false);
    gate.reset();
    assert!(gate.allows_mutation());
    assert!(!gate.is_host());
}
