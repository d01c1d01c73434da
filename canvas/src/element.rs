//! Element model: drawable shapes, their wire form, and the in-memory store.
//!
//! An [`Element`] is one stroke, shape, or text label. Its [`Shape`] fixes
//! the element type at creation; later updates replace geometry and content
//! but never the type or the id.
//!
//! [`ElementStore`] is the single owner of live elements. It keeps them in
//! insertion order, which is both painter's order for the renderer and the
//! stack order for positional undo. Nothing outside the store mutates element
//! fields directly.

#[cfg(test)]
#[path = "element_test.rs"]
mod element_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::viewport::Point;

/// Error returned by element parsing and store updates.
#[derive(Debug, thiserror::Error)]
pub enum ElementError {
    #[error("element not found: {0}")]
    NotFound(ElementId),
    #[error("element {id} is a {existing:?}, update carried a {incoming:?}")]
    KindChanged { id: ElementId, existing: ElementKind, incoming: ElementKind },
    #[error("invalid element id: {0}")]
    InvalidId(String),
    #[error("invalid element payload: {0}")]
    Payload(#[from] serde_json::Error),
}

// =============================================================
// Identity
// =============================================================

/// Globally unique element id: the creating client plus its own counter.
///
/// Travels as the string `"{client}:{seq}"` so it survives JSON and the
/// protobuf codec unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ElementId {
    pub client: String,
    pub seq: u64,
}

impl ElementId {
    #[must_use]
    pub fn new(client: impl Into<String>, seq: u64) -> Self {
        Self { client: client.into(), seq }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.client, self.seq)
    }
}

impl FromStr for ElementId {
    type Err = ElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((client, seq)) = s.rsplit_once(':') else {
            return Err(ElementError::InvalidId(s.to_owned()));
        };
        if client.is_empty() {
            return Err(ElementError::InvalidId(s.to_owned()));
        }
        let seq = seq.parse().map_err(|_| ElementError::InvalidId(s.to_owned()))?;
        Ok(Self::new(client, seq))
    }
}

impl TryFrom<String> for ElementId {
    type Error = ElementError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ElementId> for String {
    fn from(id: ElementId) -> Self {
        id.to_string()
    }
}

/// Hands out ids for elements created by this client.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    client: String,
    next: u64,
}

impl IdAllocator {
    #[must_use]
    pub fn new(client: impl Into<String>) -> Self {
        Self { client: client.into(), next: 1 }
    }

    /// The client half of every id this allocator produces.
    #[must_use]
    pub fn client(&self) -> &str {
        &self.client
    }

    /// Allocate the next id.
    pub fn next_id(&mut self) -> ElementId {
        let id = ElementId::new(self.client.clone(), self.next);
        self.next += 1;
        id
    }
}

// =============================================================
// Shapes
// =============================================================

/// The type of an element, without its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Freehand,
    Eraser,
    Line,
    Rectangle,
    Circle,
    Text,
}

/// Two anchor points. For circles the first anchor is the center and the
/// second lies on the rim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Segment {
    #[must_use]
    pub fn new(a: Point, b: Point) -> Self {
        Self { x1: a.x, y1: a.y, x2: b.x, y2: b.y }
    }

    #[must_use]
    pub fn start(&self) -> Point {
        Point::new(self.x1, self.y1)
    }

    #[must_use]
    pub fn end(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.start().distance_to(self.end())
    }
}

/// Type-specific geometry. Serialized with a `type` tag next to the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Freehand { points: Vec<Point> },
    Eraser { points: Vec<Point> },
    Line(Segment),
    Rectangle(Segment),
    Circle(Segment),
    Text { x: f64, y: f64, text: String },
}

impl Shape {
    #[must_use]
    pub fn kind(&self) -> ElementKind {
        match self {
            Self::Freehand { .. } => ElementKind::Freehand,
            Self::Eraser { .. } => ElementKind::Eraser,
            Self::Line(_) => ElementKind::Line,
            Self::Rectangle(_) => ElementKind::Rectangle,
            Self::Circle(_) => ElementKind::Circle,
            Self::Text { .. } => ElementKind::Text,
        }
    }
}

/// A drawable unit on the canvas, in world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub stroke: String,
    #[serde(flatten)]
    pub shape: Shape,
}

impl Element {
    #[must_use]
    pub fn new(id: ElementId, stroke: impl Into<String>, shape: Shape) -> Self {
        Self { id, stroke: stroke.into(), shape }
    }

    #[must_use]
    pub fn kind(&self) -> ElementKind {
        self.shape.kind()
    }

    /// Parse an element from its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Payload`] for unknown types or missing fields.
    pub fn from_wire(value: serde_json::Value) -> Result<Self, ElementError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Serialize this element to its wire form.
    ///
    /// # Errors
    ///
    /// Returns [`ElementError::Payload`] if serialization fails.
    pub fn to_wire(&self) -> Result<serde_json::Value, ElementError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Move every coordinate by `(dx, dy)`.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        match &mut self.shape {
            Shape::Freehand { points } | Shape::Eraser { points } => {
                for p in points {
                    *p = p.offset(dx, dy);
                }
            }
            Shape::Line(s) | Shape::Rectangle(s) | Shape::Circle(s) => {
                s.x1 += dx;
                s.y1 += dy;
                s.x2 += dx;
                s.y2 += dy;
            }
            Shape::Text { x, y, .. } => {
                *x += dx;
                *y += dy;
            }
        }
    }

    /// Extend an in-progress element toward `world`: strokes gain a point,
    /// two-anchor shapes move their second anchor, text is unchanged.
    pub fn extend_to(&mut self, world: Point) {
        match &mut self.shape {
            Shape::Freehand { points } | Shape::Eraser { points } => points.push(world),
            Shape::Line(s) | Shape::Rectangle(s) | Shape::Circle(s) => {
                s.x2 = world.x;
                s.y2 = world.y;
            }
            Shape::Text { .. } => {}
        }
    }
}

// =============================================================
// Store
// =============================================================

/// Ordered in-memory store of committed elements.
#[derive(Debug, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self { elements: Vec::new() }
    }

    /// Append an element. Returns `false` and leaves the store untouched if
    /// an element with the same id is already present.
    pub fn add(&mut self, element: Element) -> bool {
        if self.position(&element.id).is_some() {
            return false;
        }
        self.elements.push(element);
        true
    }

    /// Replace an existing element in place, keeping its position.
    ///
    /// # Errors
    ///
    /// [`ElementError::NotFound`] if no element has this id, and
    /// [`ElementError::KindChanged`] if the update would change its type.
    pub fn update(&mut self, element: Element) -> Result<(), ElementError> {
        let Some(slot) = self.elements.iter_mut().find(|e| e.id == element.id) else {
            return Err(ElementError::NotFound(element.id));
        };
        let existing = slot.kind();
        let incoming = element.kind();
        if existing != incoming {
            return Err(ElementError::KindChanged { id: element.id, existing, incoming });
        }
        *slot = element;
        Ok(())
    }

    /// Translate an element by `(dx, dy)`. Returns false if it doesn't exist.
    pub fn translate(&mut self, id: &ElementId, dx: f64, dy: f64) -> bool {
        let Some(element) = self.elements.iter_mut().find(|e| e.id == *id) else {
            return false;
        };
        element.translate(dx, dy);
        true
    }

    /// Remove and return the most recently added element.
    pub fn remove_last(&mut self) -> Option<Element> {
        self.elements.pop()
    }

    /// Remove an element by id, returning it if it was present.
    pub fn remove(&mut self, id: &ElementId) -> Option<Element> {
        let idx = self.position(id)?;
        Some(self.elements.remove(idx))
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Return a reference to an element by id.
    #[must_use]
    pub fn get(&self, id: &ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| &e.id == id)
    }

    /// Elements in insertion (painter's) order.
    #[must_use]
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Number of elements currently in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if the store contains no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn position(&self, id: &ElementId) -> Option<usize> {
        self.elements.iter().position(|e| &e.id == id)
    }
}
