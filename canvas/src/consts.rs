//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_SCALE: f64 = 0.1;

/// Largest allowed viewport scale.
pub const MAX_SCALE: f64 = 5.0;

/// Multiplicative zoom step for one wheel notch or toolbar press.
pub const ZOOM_FACTOR: f64 = 1.1;

// ── Hit-testing ─────────────────────────────────────────────────

/// Slack for the sum-of-distances line test, in world units.
pub const LINE_EPSILON: f64 = 1.0;

/// Padding around a stroke's bounding box, in world units.
pub const STROKE_TOLERANCE: f64 = 5.0;

/// Approximate horizontal advance of one text character, in world units.
pub const TEXT_ADVANCE: f64 = 12.0;

/// Height of the text band above the anchor, in world units.
pub const TEXT_HEIGHT: f64 = 24.0;

// ── Drawing ─────────────────────────────────────────────────────

/// Stroke color applied to new elements until the host picks another.
pub const DEFAULT_STROKE: &str = "#1F1A17";

/// Canvas background; eraser strokes paint with it.
pub const BACKGROUND: &str = "#FFFFFF";

/// Line width for shapes and freehand strokes, in world units.
pub const STROKE_WIDTH: f64 = 2.0;

/// Line width for eraser strokes, in world units.
pub const ERASER_WIDTH: f64 = 20.0;

/// Grid spacing in world units.
pub const GRID_SPACING: f64 = 50.0;

/// Grid lines closer than this on screen are skipped.
pub const GRID_MIN_SCREEN_PX: f64 = 8.0;

/// Upper bound on grid lines per axis in one frame.
pub const GRID_MAX_LINES: usize = 1024;

/// Gap between an element's bounds and its selection outline, in screen pixels.
pub const SELECTION_PADDING_PX: f64 = 4.0;

/// Selection dash segment length in screen pixels.
pub const SELECTION_DASH_PX: f64 = 4.0;

// ── Collaboration ───────────────────────────────────────────────

/// Maximum number of undone elements kept for redo.
pub const HISTORY_CAPACITY: usize = 100;

/// Remote cursors not refreshed within this window are dropped.
pub const CURSOR_STALE_MS: i64 = 3000;

/// Minimum gap between outbound cursor frames.
pub const CURSOR_MIN_SEND_INTERVAL_MS: i64 = 33;
