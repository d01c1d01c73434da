#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SCALE, MIN_SCALE};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// This point shifted by `(dx, dy)`.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Pan/zoom transform for the infinite canvas.
///
/// `screen = world * scale + offset`. `offset` is in CSS pixels; `scale` is
/// kept within [`MIN_SCALE`, `MAX_SCALE`] by every zoom operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { scale: 1.0, offset: Point::default() }
    }
}

impl Viewport {
    /// Convert a screen-space point (CSS pixels) to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.offset.x) / self.scale,
            y: (screen.y - self.offset.y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.offset.x,
            y: world.y * self.scale + self.offset.y,
        }
    }

    /// Convert a screen-space distance (pixels) to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// Multiply the scale by `factor`, keeping the world point under `focal`
    /// fixed on screen. Non-finite or non-positive factors are ignored.
    pub fn zoom_by(&mut self, factor: f64, focal: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let world = self.screen_to_world(focal);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        self.offset = Point {
            x: focal.x - world.x * self.scale,
            y: focal.y - world.y * self.scale,
        };
    }

    /// Zoom around the center of a `width` × `height` viewport.
    pub fn zoom_at_center(&mut self, factor: f64, width: f64, height: f64) {
        self.zoom_by(factor, Point::new(width * 0.5, height * 0.5));
    }

    /// Translate the view by a screen-space delta. Scale is untouched.
    /// Deltas that would leave the offset non-finite are ignored.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        let next = self.offset.offset(dx, dy);
        if next.x.is_finite() && next.y.is_finite() {
            self.offset = next;
        }
    }
}
