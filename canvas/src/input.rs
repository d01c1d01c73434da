//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool` and `Modifiers` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture tracked between pointer-down and
//! pointer-up, carrying what is needed to extend, move, or commit on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use std::str::FromStr;

use crate::consts::DEFAULT_STROKE;
use crate::element::{Element, ElementId};
use crate::viewport::Point;

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tool {
    /// Select and move elements (default).
    #[default]
    Select,
    /// Drag the view.
    Pan,
    /// Freehand pen stroke.
    Freehand,
    /// Background-colored stroke that paints over content.
    Eraser,
    /// Straight line segment.
    Line,
    /// Axis-aligned rectangle.
    Rectangle,
    /// Circle from center to rim.
    Circle,
    /// Inline text label.
    Text,
}

impl Tool {
    /// Whether this tool creates elements and is therefore gated by permission.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        !matches!(self, Self::Select | Self::Pan)
    }

    /// Whether this tool draws an element by dragging.
    #[must_use]
    pub fn is_drawing(self) -> bool {
        matches!(self, Self::Freehand | Self::Eraser | Self::Line | Self::Rectangle | Self::Circle)
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "select" => Ok(Self::Select),
            "pan" => Ok(Self::Pan),
            "freehand" | "pen" => Ok(Self::Freehand),
            "eraser" => Ok(Self::Eraser),
            "line" => Ok(Self::Line),
            "rectangle" | "rect" => Ok(Self::Rectangle),
            "circle" => Ok(Self::Circle),
            "text" => Ok(Self::Text),
            other => Err(format!("unknown tool: {other}")),
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// A keyboard key as reported by the browser (e.g. `"Escape"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    /// Case-insensitive comparison against a key name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Wheel / trackpad scroll delta in screen pixels.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    pub dx: f64,
    /// Positive = down.
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone)]
pub struct UiState {
    pub tool: Tool,
    pub selected: Option<ElementId>,
    /// Stroke color applied to new elements.
    pub stroke: String,
}

impl Default for UiState {
    fn default() -> Self {
        Self { tool: Tool::default(), selected: None, stroke: DEFAULT_STROKE.to_owned() }
    }
}

/// Internal state for the input state machine.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress.
    #[default]
    Idle,
    /// Dragging the view.
    Panning {
        /// Screen position of the previous pointer event.
        last_screen: Point,
    },
    /// Dragging a committed element.
    Moving {
        id: ElementId,
        /// World position of the pointer-down, so an abandoned drag can be undone.
        origin: Point,
        /// World position of the previous pointer event.
        last_world: Point,
        /// Whether any movement happened since pointer-down.
        moved: bool,
    },
    /// Sizing or extending an element that is not yet committed.
    Drawing { element: Element },
    /// An inline text input is open at `anchor`.
    Writing { anchor: Point, text: String },
}

impl InputState {
    /// The element being drawn, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<&Element> {
        match self {
            Self::Drawing { element } => Some(element),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}
