//! Containment, bounds, and top-most hit-testing for elements.
//!
//! These are deliberately coarse stand-ins for exact geometry: lines use a
//! sum-of-distances test, strokes use a padded bounding box, and text uses a
//! fixed per-character advance. Bounds mirror containment and are only used
//! for the selection outline.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::consts::{LINE_EPSILON, STROKE_TOLERANCE, TEXT_ADVANCE, TEXT_HEIGHT};
use crate::element::{Element, ElementStore, Segment, Shape};
use crate::viewport::Point;

/// Axis-aligned box in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Box spanned by two corners given in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Self::from_corners(*first, *first);
        for p in rest {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    /// This box grown by `by` on every side.
    #[must_use]
    pub fn expand(self, by: f64) -> Self {
        Self {
            min_x: self.min_x - by,
            min_y: self.min_y - by,
            max_x: self.max_x + by,
            max_y: self.max_y + by,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) * 0.5, (self.min_y + self.max_y) * 0.5)
    }

    /// Inclusive containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Whether `p` (world space) falls on `element`.
#[must_use]
pub fn contains(element: &Element, p: Point) -> bool {
    match &element.shape {
        Shape::Rectangle(s) => Bounds::from_corners(s.start(), s.end()).contains(p),
        Shape::Circle(s) => p.distance_to(s.start()) <= s.length(),
        Shape::Line(s) => on_segment(s, p),
        Shape::Freehand { points } | Shape::Eraser { points } => {
            Bounds::from_points(points).is_some_and(|b| b.expand(STROKE_TOLERANCE).contains(p))
        }
        Shape::Text { x, y, text } => text_bounds(*x, *y, text).contains(p),
    }
}

/// Bounds used to outline `element` when selected.
#[must_use]
pub fn bounds(element: &Element) -> Bounds {
    match &element.shape {
        Shape::Rectangle(s) | Shape::Line(s) => Bounds::from_corners(s.start(), s.end()),
        Shape::Circle(s) => {
            let r = s.length();
            Bounds::from_corners(s.start(), s.start()).expand(r)
        }
        Shape::Freehand { points } | Shape::Eraser { points } => {
            Bounds::from_points(points).map_or_else(Bounds::default, |b| b.expand(STROKE_TOLERANCE))
        }
        Shape::Text { x, y, text } => text_bounds(*x, *y, text),
    }
}

/// The top-most element under `p`: the newest one whose containment test passes.
#[must_use]
pub fn hit_test(store: &ElementStore, p: Point) -> Option<&Element> {
    store.elements().iter().rev().find(|e| contains(e, p))
}

fn on_segment(s: &Segment, p: Point) -> bool {
    p.distance_to(s.start()) + p.distance_to(s.end()) - s.length() < LINE_EPSILON
}

#[allow(clippy::cast_precision_loss)]
fn text_bounds(x: f64, y: f64, text: &str) -> Bounds {
    let width = text.chars().count() as f64 * TEXT_ADVANCE;
    Bounds { min_x: x, min_y: y - TEXT_HEIGHT, max_x: x + width, max_y: y }
}
