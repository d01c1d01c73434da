#![allow(clippy::float_cmp)]

use super::*;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn point_approx_eq(a: Point, b: Point) -> bool {
    approx_eq(a.x, b.x) && approx_eq(a.y, b.y)
}

fn vp(scale: f64, ox: f64, oy: f64) -> Viewport {
    Viewport { scale, offset: Point::new(ox, oy) }
}

// --- Point ---

#[test]
fn point_distance() {
    assert!(approx_eq(Point::new(0.0, 0.0).distance_to(Point::new(3.0, 4.0)), 5.0));
}

#[test]
fn point_offset() {
    assert_eq!(Point::new(1.0, 2.0).offset(3.0, -4.0), Point::new(4.0, -2.0));
}

#[test]
fn point_serializes_as_object() {
    let json = serde_json::to_value(Point::new(1.5, 2.0)).expect("serialize");
    assert_eq!(json, serde_json::json!({"x": 1.5, "y": 2.0}));
}

// --- Defaults ---

#[test]
fn default_is_identity() {
    let v = Viewport::default();
    assert_eq!(v.scale, 1.0);
    assert_eq!(v.offset, Point::new(0.0, 0.0));
    assert!(point_approx_eq(v.screen_to_world(Point::new(50.0, 75.0)), Point::new(50.0, 75.0)));
}

// --- Conversions ---

#[test]
fn screen_to_world_with_pan_and_scale() {
    let v = vp(2.0, 20.0, 10.0);
    assert!(point_approx_eq(v.screen_to_world(Point::new(20.0, 10.0)), Point::new(0.0, 0.0)));
    assert!(point_approx_eq(v.screen_to_world(Point::new(0.0, 0.0)), Point::new(-10.0, -5.0)));
}

#[test]
fn world_to_screen_matches_formula() {
    let v = vp(3.0, 5.0, -7.0);
    assert!(point_approx_eq(v.world_to_screen(Point::new(2.0, 4.0)), Point::new(11.0, 5.0)));
}

#[test]
fn conversions_are_inverse() {
    let v = vp(0.37, -120.0, 48.5);
    let world = Point::new(123.4, -56.7);
    assert!(point_approx_eq(v.screen_to_world(v.world_to_screen(world)), world));
}

#[test]
fn screen_dist_scales_inversely() {
    assert!(approx_eq(vp(4.0, 0.0, 0.0).screen_dist_to_world(8.0), 2.0));
}

// --- Zoom ---

#[test]
fn zoom_preserves_focal_world_point() {
    let mut v = vp(1.3, 200.0, 150.0);
    let focal = Point::new(500.0, 400.0);
    let before = v.screen_to_world(focal);
    v.zoom_by(1.1, focal);
    assert!(point_approx_eq(v.screen_to_world(focal), before));
    v.zoom_by(0.5, focal);
    assert!(point_approx_eq(v.screen_to_world(focal), before));
}

#[test]
fn zoom_preserves_focal_point_when_clamped() {
    let mut v = vp(4.9, -1000.0, -800.0);
    let focal = Point::new(300.0, 200.0);
    let before = v.screen_to_world(focal);
    v.zoom_by(100.0, focal);
    assert_eq!(v.scale, MAX_SCALE);
    assert!(point_approx_eq(v.screen_to_world(focal), before));
}

#[test]
fn zoom_sequence_stays_within_limits() {
    let mut v = Viewport::default();
    let factors = [1e9, 0.5, 1e-9, 3.0, 3.0, 3.0, 0.01, 7.5, 1.0001, 0.2];
    for f in factors {
        v.zoom_by(f, Point::new(17.0, 33.0));
        assert!((MIN_SCALE..=MAX_SCALE).contains(&v.scale), "scale {} out of range", v.scale);
    }
}

#[test]
fn zoom_ignores_invalid_factors() {
    let mut v = vp(2.0, 10.0, 10.0);
    for f in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        v.zoom_by(f, Point::new(1.0, 1.0));
    }
    assert_eq!(v, vp(2.0, 10.0, 10.0));
}

#[test]
fn zoom_at_center_keeps_center_fixed() {
    let mut v = vp(1.0, 30.0, 40.0);
    let center = Point::new(400.0, 300.0);
    let before = v.screen_to_world(center);
    v.zoom_at_center(2.0, 800.0, 600.0);
    assert_eq!(v.scale, 2.0);
    assert!(point_approx_eq(v.screen_to_world(center), before));
}

// --- Pan ---

#[test]
fn pan_translates_offset_only() {
    let mut v = vp(2.5, 1.0, 2.0);
    v.pan_by(10.0, -20.0);
    assert_eq!(v.offset, Point::new(11.0, -18.0));
    assert_eq!(v.scale, 2.5);
}

#[test]
fn pan_ignores_non_finite_deltas() {
    let mut v = vp(1.0, 5.0, 5.0);
    v.pan_by(f64::INFINITY, 0.0);
    v.pan_by(0.0, f64::NAN);
    v.pan_by(f64::MAX, 0.0);
    v.pan_by(f64::MAX, 0.0);
    assert!(v.offset.x.is_finite() && v.offset.y.is_finite());
    assert_eq!(v.offset.y, 5.0);
}
