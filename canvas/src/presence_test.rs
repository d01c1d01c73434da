use super::*;

#[test]
fn upsert_creates_then_refreshes() {
    let mut p = Presence::new();
    p.upsert("b", "Bea", Point::new(1.0, 2.0), 100);
    p.upsert("b", "Bea R.", Point::new(5.0, 6.0), 200);
    assert_eq!(p.len(), 1);
    let c = p.get("b").expect("cursor");
    assert_eq!(c.position, Point::new(5.0, 6.0));
    assert_eq!(c.display_name, "Bea R.");
    assert_eq!(c.updated_at, 200);
}

#[test]
fn remove_reports_presence() {
    let mut p = Presence::new();
    p.upsert("b", "Bea", Point::default(), 0);
    assert!(p.remove("b"));
    assert!(!p.remove("b"));
    assert!(p.is_empty());
}

#[test]
fn stale_cursors_are_evicted() {
    let mut p = Presence::new();
    p.upsert("old", "Old", Point::default(), 0);
    p.upsert("fresh", "Fresh", Point::default(), 2500);
    assert_eq!(p.evict_stale(CURSOR_STALE_MS - 1), 0);
    assert_eq!(p.evict_stale(CURSOR_STALE_MS), 1);
    assert!(p.get("old").is_none());
    assert!(p.get("fresh").is_some());
}

#[test]
fn refresh_postpones_eviction() {
    let mut p = Presence::new();
    p.upsert("b", "Bea", Point::default(), 0);
    p.upsert("b", "Bea", Point::default(), 2000);
    assert_eq!(p.evict_stale(4000), 0);
}

#[test]
fn sorted_is_ordered_by_client() {
    let mut p = Presence::new();
    for id in ["c", "a", "b"] {
        p.upsert(id, id, Point::default(), 0);
    }
    let ids: Vec<&str> = p.sorted().iter().map(|c| c.client_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    p.clear();
    assert!(p.is_empty());
}
