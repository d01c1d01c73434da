#![allow(clippy::float_cmp)]

use super::*;
use crate::element::{ElementId, Segment};

fn el(seq: u64, shape: Shape) -> Element {
    Element::new(ElementId::new("r", seq), "#123456", shape)
}

fn rect(seq: u64) -> Element {
    el(seq, Shape::Rectangle(Segment { x1: 10.0, y1: 10.0, x2: 0.0, y2: 0.0 }))
}

fn cursor(id: &str, x: f64, y: f64) -> RemoteCursor {
    RemoteCursor { client_id: id.into(), display_name: format!("user {id}"), position: Point::new(x, y), updated_at: 0 }
}

fn scene<'a>(elements: &'a [Element]) -> Scene<'a> {
    Scene {
        elements,
        in_flight: None,
        selected: None,
        viewport: Viewport::default(),
        width: 200.0,
        height: 100.0,
        cursors: Vec::new(),
    }
}

fn shape_cmds(cmds: &[DrawCmd]) -> Vec<&DrawCmd> {
    cmds.iter()
        .filter(|c| {
            !matches!(
                c,
                DrawCmd::GridLine { .. } | DrawCmd::Fill { .. } | DrawCmd::WorldTransform { .. } | DrawCmd::ScreenTransform
            )
        })
        .collect()
}

// =============================================================
// Layering
// =============================================================

#[test]
fn frame_starts_with_background_then_world_transform() {
    let cmds = display_list(&scene(&[]));
    assert_eq!(cmds[0], DrawCmd::ScreenTransform);
    assert_eq!(cmds[1], DrawCmd::Fill { width: 200.0, height: 100.0, color: BACKGROUND });
    assert_eq!(cmds[2], DrawCmd::WorldTransform { scale: 1.0, offset: Point::new(0.0, 0.0) });
}

#[test]
fn elements_render_in_insertion_order_then_in_flight() {
    let elements = vec![rect(1), el(2, Shape::Text { x: 0.0, y: 0.0, text: "hi".into() })];
    let drawing = el(3, Shape::Line(Segment { x1: 0.0, y1: 0.0, x2: 5.0, y2: 5.0 }));
    let mut s = scene(&elements);
    s.in_flight = Some(&drawing);
    let cmds = display_list(&s);
    let shapes = shape_cmds(&cmds);
    assert_eq!(shapes.len(), 3);
    assert!(matches!(shapes[0], DrawCmd::Rect { .. }));
    assert!(matches!(shapes[1], DrawCmd::Text { .. }));
    assert!(matches!(shapes[2], DrawCmd::Line { .. }));
}

#[test]
fn rectangle_is_normalized() {
    let elements = vec![rect(1)];
    let cmds = display_list(&scene(&elements));
    let shapes = shape_cmds(&cmds);
    assert_eq!(
        shapes[0],
        &DrawCmd::Rect {
            min: Point::new(0.0, 0.0),
            max: Point::new(10.0, 10.0),
            color: "#123456".into(),
            width: STROKE_WIDTH,
        }
    );
}

#[test]
fn eraser_paints_background_wide() {
    let elements = vec![el(1, Shape::Eraser { points: vec![Point::new(1.0, 1.0)] })];
    let cmds = display_list(&scene(&elements));
    let shapes = shape_cmds(&cmds);
    let DrawCmd::Polyline { color, width, .. } = shapes[0] else {
        panic!("expected polyline");
    };
    assert_eq!(color, BACKGROUND);
    assert_eq!(*width, ERASER_WIDTH);
}

#[test]
fn circle_uses_anchor_distance_as_radius() {
    let elements = vec![el(1, Shape::Circle(Segment { x1: 1.0, y1: 1.0, x2: 4.0, y2: 5.0 }))];
    let cmds = display_list(&scene(&elements));
    let shapes = shape_cmds(&cmds);
    let DrawCmd::Circle { center, radius, .. } = shapes[0] else {
        panic!("expected circle");
    };
    assert_eq!(*center, Point::new(1.0, 1.0));
    assert_eq!(*radius, 5.0);
}

// =============================================================
// Selection
// =============================================================

#[test]
fn selection_outline_is_padded_in_screen_pixels() {
    let elements = vec![rect(1)];
    let mut s = scene(&elements);
    s.viewport = Viewport { scale: 2.0, offset: Point::new(0.0, 0.0) };
    s.selected = Some(&elements[0]);
    let cmds = display_list(&s);
    let outline = cmds.iter().find(|c| matches!(c, DrawCmd::DashedRect { .. })).expect("outline");
    assert_eq!(
        outline,
        &DrawCmd::DashedRect { min: Point::new(-2.0, -2.0), max: Point::new(12.0, 12.0), width: 0.5, dash: 2.0 }
    );
}

#[test]
fn no_outline_without_selection() {
    let elements = vec![rect(1)];
    let cmds = display_list(&scene(&elements));
    assert!(!cmds.iter().any(|c| matches!(c, DrawCmd::DashedRect { .. })));
}

// =============================================================
// Grid
// =============================================================

#[test]
fn grid_covers_visible_area() {
    let cmds = display_list(&scene(&[]));
    let lines = cmds.iter().filter(|c| matches!(c, DrawCmd::GridLine { .. })).count();
    // x = 0, 50, 100, 150, 200 and y = 0, 50, 100
    assert_eq!(lines, 8);
}

#[test]
fn grid_stays_bounded_far_from_origin() {
    for offset in [-1e19, 1e300, f64::INFINITY, f64::NAN] {
        let mut s = scene(&[]);
        s.viewport = Viewport { scale: 1.0, offset: Point::new(offset, offset) };
        let cmds = display_list(&s);
        let lines = cmds.iter().filter(|c| matches!(c, DrawCmd::GridLine { .. })).count();
        assert!(lines <= 2 * GRID_MAX_LINES, "offset {offset}: {lines} lines");
    }
}

#[test]
fn grid_positions_are_capped() {
    assert_eq!(grid_positions(0.0, 1e12).count(), GRID_MAX_LINES);
    assert_eq!(grid_positions(10.0, 0.0).count(), 0);
    assert_eq!(grid_positions(f64::NEG_INFINITY, 0.0).count(), 0);
}

#[test]
fn grid_is_skipped_when_too_dense() {
    let mut s = scene(&[]);
    s.viewport = Viewport { scale: 0.1, offset: Point::new(0.0, 0.0) };
    let cmds = display_list(&s);
    assert!(!cmds.iter().any(|c| matches!(c, DrawCmd::GridLine { .. })));
}

// =============================================================
// Cursors
// =============================================================

#[test]
fn cursors_are_drawn_last_in_screen_space() {
    let elements = vec![rect(1)];
    let a = cursor("a", 10.0, 20.0);
    let mut s = scene(&elements);
    s.viewport = Viewport { scale: 2.0, offset: Point::new(5.0, 5.0) };
    s.cursors = vec![&a];
    let cmds = display_list(&s);
    let n = cmds.len();
    assert_eq!(cmds[n - 2], DrawCmd::ScreenTransform);
    assert_eq!(
        cmds[n - 1],
        DrawCmd::Cursor { at: Point::new(25.0, 45.0), color: cursor_color("a"), label: "user a".into() }
    );
}

#[test]
fn cursor_color_is_stable_and_from_palette() {
    assert_eq!(cursor_color("client-1"), cursor_color("client-1"));
    for id in ["a", "b", "c", "3f2a", ""] {
        assert!(CURSOR_PALETTE.contains(&cursor_color(id)));
    }
}
