//! Rendering: turns engine state into a display list and paints it.
//!
//! [`display_list`] is pure: it reads a [`Scene`] and produces the ordered
//! [`DrawCmd`]s for one frame, so layering and visibility rules are testable
//! without a browser. [`paint`] is the only place that touches
//! [`web_sys::CanvasRenderingContext2d`]; it replays the list and propagates
//! every fallible `Canvas2D` call via `Result<(), JsValue>`.
//!
//! Layers, bottom first: background, grid, committed elements in insertion
//! order, the in-flight element, the selection outline, remote cursors.

#[cfg(test)]
#[path = "render_test.rs"]
mod render_test;

use std::f64::consts::TAU;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::consts::{
    BACKGROUND, ERASER_WIDTH, GRID_MAX_LINES, GRID_MIN_SCREEN_PX, GRID_SPACING, SELECTION_DASH_PX, SELECTION_PADDING_PX,
    STROKE_WIDTH,
};
use crate::element::{Element, Shape};
use crate::hit;
use crate::presence::RemoteCursor;
use crate::viewport::{Point, Viewport};

const GRID_COLOR: &str = "#ECE8E4";
const SELECTION_COLOR: &str = "#1E90FF";
const TEXT_FONT: &str = "20px sans-serif";
const CURSOR_FONT: &str = "12px sans-serif";
const CURSOR_RADIUS_PX: f64 = 4.0;
const CURSOR_LABEL_OFFSET_PX: f64 = 8.0;

const CURSOR_PALETTE: [&str; 8] = [
    "#E6194B", "#3CB44B", "#4363D8", "#F58231", "#911EB4", "#42D4F4", "#F032E6", "#9A6324",
];

/// Read-only view of everything drawn in one frame.
#[derive(Debug)]
pub struct Scene<'a> {
    pub elements: &'a [Element],
    pub in_flight: Option<&'a Element>,
    pub selected: Option<&'a Element>,
    pub viewport: Viewport,
    /// CSS pixels.
    pub width: f64,
    pub height: f64,
    pub cursors: Vec<&'a RemoteCursor>,
}

/// One drawing step. Coordinates are world units after [`DrawCmd::WorldTransform`]
/// and screen pixels after [`DrawCmd::ScreenTransform`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Fill { width: f64, height: f64, color: &'static str },
    WorldTransform { scale: f64, offset: Point },
    ScreenTransform,
    GridLine { from: Point, to: Point, width: f64 },
    Polyline { points: Vec<Point>, color: String, width: f64 },
    Line { from: Point, to: Point, color: String, width: f64 },
    Rect { min: Point, max: Point, color: String, width: f64 },
    Circle { center: Point, radius: f64, color: String, width: f64 },
    Text { at: Point, text: String, color: String },
    DashedRect { min: Point, max: Point, width: f64, dash: f64 },
    Cursor { at: Point, color: &'static str, label: String },
}

/// Build the display list for `scene`.
#[must_use]
pub fn display_list(scene: &Scene<'_>) -> Vec<DrawCmd> {
    let vp = scene.viewport;
    let mut cmds = vec![
        DrawCmd::ScreenTransform,
        DrawCmd::Fill { width: scene.width, height: scene.height, color: BACKGROUND },
        DrawCmd::WorldTransform { scale: vp.scale, offset: vp.offset },
    ];

    grid(scene, &mut cmds);

    for element in scene.elements {
        cmds.push(element_cmd(element));
    }
    if let Some(element) = scene.in_flight {
        cmds.push(element_cmd(element));
    }

    if let Some(element) = scene.selected {
        let pad = vp.screen_dist_to_world(SELECTION_PADDING_PX);
        let b = hit::bounds(element).expand(pad);
        cmds.push(DrawCmd::DashedRect {
            min: Point::new(b.min_x, b.min_y),
            max: Point::new(b.max_x, b.max_y),
            width: vp.screen_dist_to_world(1.0),
            dash: vp.screen_dist_to_world(SELECTION_DASH_PX),
        });
    }

    if !scene.cursors.is_empty() {
        cmds.push(DrawCmd::ScreenTransform);
        for cursor in &scene.cursors {
            cmds.push(DrawCmd::Cursor {
                at: vp.world_to_screen(cursor.position),
                color: cursor_color(&cursor.client_id),
                label: cursor.display_name.clone(),
            });
        }
    }

    cmds
}

/// Stable color for a remote client.
#[must_use]
pub fn cursor_color(client_id: &str) -> &'static str {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in client_id.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    CURSOR_PALETTE[hash as usize % CURSOR_PALETTE.len()]
}

fn grid(scene: &Scene<'_>, cmds: &mut Vec<DrawCmd>) {
    let vp = scene.viewport;
    if GRID_SPACING * vp.scale < GRID_MIN_SCREEN_PX || scene.width <= 0.0 || scene.height <= 0.0 {
        return;
    }
    let top_left = vp.screen_to_world(Point::new(0.0, 0.0));
    let bottom_right = vp.screen_to_world(Point::new(scene.width, scene.height));
    let width = vp.screen_dist_to_world(1.0);

    for x in grid_positions(top_left.x, bottom_right.x) {
        cmds.push(DrawCmd::GridLine { from: Point::new(x, top_left.y), to: Point::new(x, bottom_right.y), width });
    }
    for y in grid_positions(top_left.y, bottom_right.y) {
        cmds.push(DrawCmd::GridLine { from: Point::new(top_left.x, y), to: Point::new(bottom_right.x, y), width });
    }
}

/// World coordinates of grid lines in `[start, end]`, at most
/// [`GRID_MAX_LINES`]. Empty when the range is not finite.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn grid_positions(start: f64, end: f64) -> impl Iterator<Item = f64> {
    let first = (start / GRID_SPACING).floor() * GRID_SPACING;
    let span = ((end - first) / GRID_SPACING).floor();
    let count = if first.is_finite() && span.is_finite() && span >= 0.0 {
        let n = span.min(GRID_MAX_LINES as f64) as usize + 1;
        n.min(GRID_MAX_LINES)
    } else {
        0
    };
    (0..count).map(move |i| first + i as f64 * GRID_SPACING)
}

fn element_cmd(element: &Element) -> DrawCmd {
    let color = element.stroke.clone();
    match &element.shape {
        Shape::Freehand { points } => DrawCmd::Polyline { points: points.clone(), color, width: STROKE_WIDTH },
        Shape::Eraser { points } => {
            DrawCmd::Polyline { points: points.clone(), color: BACKGROUND.to_owned(), width: ERASER_WIDTH }
        }
        Shape::Line(s) => DrawCmd::Line { from: s.start(), to: s.end(), color, width: STROKE_WIDTH },
        Shape::Rectangle(s) => {
            let b = hit::Bounds::from_corners(s.start(), s.end());
            DrawCmd::Rect {
                min: Point::new(b.min_x, b.min_y),
                max: Point::new(b.max_x, b.max_y),
                color,
                width: STROKE_WIDTH,
            }
        }
        Shape::Circle(s) => DrawCmd::Circle { center: s.start(), radius: s.length(), color, width: STROKE_WIDTH },
        Shape::Text { x, y, text } => DrawCmd::Text { at: Point::new(*x, *y), text: text.clone(), color },
    }
}

// =============================================================
// Canvas2D
// =============================================================

/// Replay `cmds` onto `ctx`. `dpr` is the device pixel ratio.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn paint(ctx: &CanvasRenderingContext2d, cmds: &[DrawCmd], dpr: f64) -> Result<(), JsValue> {
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    for cmd in cmds {
        paint_one(ctx, cmd, dpr)?;
    }
    Ok(())
}

fn paint_one(ctx: &CanvasRenderingContext2d, cmd: &DrawCmd, dpr: f64) -> Result<(), JsValue> {
    match cmd {
        DrawCmd::ScreenTransform => ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?,
        DrawCmd::WorldTransform { scale, offset } => {
            ctx.set_transform(dpr * scale, 0.0, 0.0, dpr * scale, dpr * offset.x, dpr * offset.y)?;
        }
        DrawCmd::Fill { width, height, color } => {
            ctx.set_fill_style_str(color);
            ctx.fill_rect(0.0, 0.0, *width, *height);
        }
        DrawCmd::GridLine { from, to, width } => stroke_path(ctx, &[*from, *to], GRID_COLOR, *width),
        DrawCmd::Polyline { points, color, width } => {
            if let [only] = points.as_slice() {
                ctx.begin_path();
                ctx.arc(only.x, only.y, width * 0.5, 0.0, TAU)?;
                ctx.set_fill_style_str(color);
                ctx.fill();
            } else {
                stroke_path(ctx, points, color, *width);
            }
        }
        DrawCmd::Line { from, to, color, width } => stroke_path(ctx, &[*from, *to], color, *width),
        DrawCmd::Rect { min, max, color, width } => {
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*width);
            ctx.stroke_rect(min.x, min.y, max.x - min.x, max.y - min.y);
        }
        DrawCmd::Circle { center, radius, color, width } => {
            ctx.begin_path();
            ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
            ctx.set_stroke_style_str(color);
            ctx.set_line_width(*width);
            ctx.stroke();
        }
        DrawCmd::Text { at, text, color } => {
            ctx.set_font(TEXT_FONT);
            ctx.set_text_baseline("alphabetic");
            ctx.set_fill_style_str(color);
            ctx.fill_text(text, at.x, at.y)?;
        }
        DrawCmd::DashedRect { min, max, width, dash } => {
            let dash_array = js_sys::Array::new();
            dash_array.push(&(*dash).into());
            dash_array.push(&(*dash).into());
            ctx.set_line_dash(&dash_array)?;
            ctx.set_stroke_style_str(SELECTION_COLOR);
            ctx.set_line_width(*width);
            ctx.stroke_rect(min.x, min.y, max.x - min.x, max.y - min.y);
            ctx.set_line_dash(&js_sys::Array::new())?;
        }
        DrawCmd::Cursor { at, color, label } => {
            ctx.begin_path();
            ctx.arc(at.x, at.y, CURSOR_RADIUS_PX, 0.0, TAU)?;
            ctx.set_fill_style_str(color);
            ctx.fill();
            ctx.set_font(CURSOR_FONT);
            ctx.set_text_baseline("middle");
            ctx.fill_text(label, at.x + CURSOR_LABEL_OFFSET_PX, at.y)?;
        }
    }
    Ok(())
}

fn stroke_path(ctx: &CanvasRenderingContext2d, points: &[Point], color: &str, width: f64) {
    let Some((first, rest)) = points.split_first() else {
        return;
    };
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(width);
    ctx.stroke();
}
