use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::{BACKGROUND, ZOOM_FACTOR};
use crate::element::{Element, ElementId, ElementStore, IdAllocator, Segment, Shape};
use crate::history::History;
use crate::hit;
use crate::input::{Button, InputState, Key, Modifiers, Tool, UiState, WheelDelta};
use crate::permission::PermissionGate;
use crate::presence::Presence;
use crate::render::{self, Scene};
use crate::viewport::{Point, Viewport};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

const NOTICE_DRAWING_DISABLED: &str = "Drawing is disabled by the host";
const NOTICE_NOT_HOST: &str = "Only the host can change drawing permission";

/// Actions returned from input handlers for the host to process.
///
/// Mutation actions are forwarded to peers by [`crate::session::Session`];
/// the rest are for the local UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    ElementAdded(Element),
    ElementUpdated(Element),
    /// An element removed by local undo.
    Undone(Element),
    /// An element restored by local redo.
    Redone(Element),
    Cleared,
    /// Pointer moved to this world position.
    CursorMoved(Point),
    /// The host toggled drawing permission.
    PermissionChanged(bool),
    /// Show an inline text input at this position.
    OpenTextInput { world: Point, screen: Point },
    CloseTextInput,
    Notice(String),
    RenderNeeded,
}

/// Core engine state: all logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
pub struct EngineCore {
    pub doc: ElementStore,
    pub viewport: Viewport,
    pub ui: UiState,
    pub input: InputState,
    pub history: History,
    pub permission: PermissionGate,
    pub presence: Presence,
    ids: IdAllocator,
    pub viewport_width: f64,
    pub viewport_height: f64,
    pub dpr: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

impl EngineCore {
    /// Create an engine whose new elements are attributed to `client_id`.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            doc: ElementStore::new(),
            viewport: Viewport::default(),
            ui: UiState::default(),
            input: InputState::default(),
            history: History::new(),
            permission: PermissionGate::default(),
            presence: Presence::new(),
            ids: IdAllocator::new(client_id),
            viewport_width: 0.0,
            viewport_height: 0.0,
            dpr: 1.0,
        }
    }

    /// The client half of ids allocated by this engine.
    #[must_use]
    pub fn client_id(&self) -> &str {
        self.ids.client()
    }

    /// Attribute future elements to `client_id` (e.g. the relay-assigned id).
    pub fn set_client_id(&mut self, client_id: &str) {
        if self.ids.client() != client_id {
            self.ids = IdAllocator::new(client_id);
        }
    }

    pub fn set_host(&mut self, is_host: bool) {
        self.permission.set_host(is_host);
    }

    pub fn set_stroke(&mut self, color: impl Into<String>) {
        self.ui.stroke = color.into();
    }

    /// Forget everything tied to the current room. The viewport survives.
    pub fn reset(&mut self) {
        self.doc.clear();
        self.history.clear();
        self.presence.clear();
        self.permission.reset();
        self.input = InputState::Idle;
        self.ui.selected = None;
    }

    // --- Tools ---

    /// Switch tools. Pending text is committed first; a mutating tool the
    /// permission gate rejects leaves the engine on `Select`.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.commit_text();
        self.input = InputState::Idle;
        if tool.is_mutating() && !self.permission.allows_mutation() {
            actions.extend(self.reject());
            return actions;
        }
        self.ui.tool = tool;
        actions.push(Action::RenderNeeded);
        actions
    }

    fn reject(&mut self) -> Vec<Action> {
        self.ui.tool = Tool::Select;
        vec![Action::Notice(NOTICE_DRAWING_DISABLED.to_owned()), Action::RenderNeeded]
    }

    // --- Pointer input ---

    pub fn on_pointer_down(&mut self, screen: Point, button: Button, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.viewport.screen_to_world(screen);
        if button != Button::Primary || self.ui.tool == Tool::Pan {
            if matches!(self.input, InputState::Idle) {
                self.input = InputState::Panning { last_screen: screen };
            }
            return Vec::new();
        }
        match self.ui.tool {
            Tool::Select | Tool::Pan => self.begin_select(world),
            Tool::Text => self.begin_text(world, screen),
            tool => self.begin_drawing(tool, world),
        }
    }

    fn begin_select(&mut self, world: Point) -> Vec<Action> {
        let hit = hit::hit_test(&self.doc, world).map(|e| e.id.clone());
        self.ui.selected.clone_from(&hit);
        if let Some(id) = hit {
            if self.permission.allows_mutation() {
                self.input = InputState::Moving { id, origin: world, last_world: world, moved: false };
            }
        }
        vec![Action::RenderNeeded]
    }

    fn begin_text(&mut self, world: Point, screen: Point) -> Vec<Action> {
        if matches!(self.input, InputState::Writing { .. }) {
            return self.commit_text();
        }
        if !self.permission.allows_mutation() {
            return self.reject();
        }
        self.input = InputState::Writing { anchor: world, text: String::new() };
        vec![Action::OpenTextInput { world, screen }]
    }

    fn begin_drawing(&mut self, tool: Tool, world: Point) -> Vec<Action> {
        if !self.permission.allows_mutation() {
            return self.reject();
        }
        let anchor = Segment::new(world, world);
        let (shape, stroke) = match tool {
            Tool::Eraser => (Shape::Eraser { points: vec![world] }, BACKGROUND.to_owned()),
            Tool::Line => (Shape::Line(anchor), self.ui.stroke.clone()),
            Tool::Rectangle => (Shape::Rectangle(anchor), self.ui.stroke.clone()),
            Tool::Circle => (Shape::Circle(anchor), self.ui.stroke.clone()),
            _ => (Shape::Freehand { points: vec![world] }, self.ui.stroke.clone()),
        };
        let element = Element::new(self.ids.next_id(), stroke, shape);
        self.ui.selected = None;
        self.input = InputState::Drawing { element };
        vec![Action::RenderNeeded]
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers) -> Vec<Action> {
        let world = self.viewport.screen_to_world(screen);
        let mut actions = vec![Action::CursorMoved(world)];
        match &mut self.input {
            InputState::Panning { last_screen } => {
                self.viewport.pan_by(screen.x - last_screen.x, screen.y - last_screen.y);
                *last_screen = screen;
                actions.push(Action::RenderNeeded);
            }
            InputState::Moving { id, last_world, moved, .. } => {
                if self.doc.translate(id, world.x - last_world.x, world.y - last_world.y) {
                    *last_world = world;
                    *moved = true;
                    actions.push(Action::RenderNeeded);
                }
            }
            InputState::Drawing { element } => {
                element.extend_to(world);
                actions.push(Action::RenderNeeded);
            }
            InputState::Idle | InputState::Writing { .. } => {}
        }
        actions
    }

    pub fn on_pointer_up(&mut self, _screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        match std::mem::take(&mut self.input) {
            InputState::Idle | InputState::Panning { .. } => Vec::new(),
            InputState::Moving { id, moved, .. } => match self.doc.get(&id) {
                Some(element) if moved => vec![Action::ElementUpdated(element.clone()), Action::RenderNeeded],
                _ => Vec::new(),
            },
            InputState::Drawing { element } => self.commit(element),
            writing @ InputState::Writing { .. } => {
                self.input = writing;
                Vec::new()
            }
        }
    }

    fn commit(&mut self, element: Element) -> Vec<Action> {
        if !self.doc.add(element.clone()) {
            log::warn!("dropping commit of duplicate element {}", element.id);
            return vec![Action::RenderNeeded];
        }
        self.history.clear();
        vec![Action::ElementAdded(element), Action::RenderNeeded]
    }

    /// Ctrl/Meta + wheel zooms around the cursor; a plain wheel pans.
    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            if delta.dy == 0.0 {
                return Vec::new();
            }
            let factor = if delta.dy < 0.0 { ZOOM_FACTOR } else { 1.0 / ZOOM_FACTOR };
            self.viewport.zoom_by(factor, screen);
        } else {
            self.viewport.pan_by(-delta.dx, -delta.dy);
        }
        vec![Action::RenderNeeded]
    }

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() && key.is("z") {
            return if modifiers.shift { self.redo() } else { self.undo() };
        }
        if modifiers.command() && key.is("y") {
            return self.redo();
        }
        if key.is("Escape") {
            return self.cancel();
        }
        if key.is("Enter") {
            return self.commit_text();
        }
        Vec::new()
    }

    /// Abandon in-flight drawing, dragging or writing and clear the selection.
    pub fn cancel(&mut self) -> Vec<Action> {
        let was_writing = self.abandon_gesture();
        self.ui.selected = None;
        let mut actions = Vec::new();
        if was_writing {
            actions.push(Action::CloseTextInput);
        }
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Drop the current gesture without committing it. A drag that already
    /// moved its element puts it back at its pointer-down position.
    /// Returns whether a text input was open.
    fn abandon_gesture(&mut self) -> bool {
        match std::mem::take(&mut self.input) {
            InputState::Moving { id, origin, last_world, moved: true } => {
                self.doc.translate(&id, origin.x - last_world.x, origin.y - last_world.y);
                false
            }
            InputState::Writing { .. } => true,
            _ => false,
        }
    }

    // --- Text ---

    /// Mirror the host's text input. Ignored unless writing.
    pub fn set_pending_text(&mut self, value: &str) {
        if let InputState::Writing { text, .. } = &mut self.input {
            value.clone_into(text);
        }
    }

    /// Commit pending text as a new element. Blank text closes the input
    /// without creating anything. A no-op unless writing.
    pub fn commit_text(&mut self) -> Vec<Action> {
        let InputState::Writing { anchor, text } = std::mem::take(&mut self.input) else {
            return Vec::new();
        };
        let mut actions = vec![Action::CloseTextInput];
        if text.trim().is_empty() {
            actions.push(Action::RenderNeeded);
            return actions;
        }
        let element = Element::new(
            self.ids.next_id(),
            self.ui.stroke.clone(),
            Shape::Text { x: anchor.x, y: anchor.y, text },
        );
        actions.extend(self.commit(element));
        actions
    }

    // --- History ---

    /// Remove the newest element and keep it for redo.
    pub fn undo(&mut self) -> Vec<Action> {
        if !self.permission.allows_mutation() {
            return self.reject();
        }
        let Some(element) = self.doc.remove_last() else {
            return Vec::new();
        };
        self.forget(&element.id);
        self.history.push(element.clone());
        vec![Action::Undone(element), Action::RenderNeeded]
    }

    /// Restore the most recently undone element.
    pub fn redo(&mut self) -> Vec<Action> {
        if !self.permission.allows_mutation() {
            return self.reject();
        }
        let Some(element) = self.history.pop() else {
            return Vec::new();
        };
        if !self.doc.add(element.clone()) {
            return vec![Action::RenderNeeded];
        }
        vec![Action::Redone(element), Action::RenderNeeded]
    }

    /// Remove every element for everyone in the room.
    pub fn clear(&mut self) -> Vec<Action> {
        if !self.permission.allows_mutation() {
            return self.reject();
        }
        self.clear_local();
        vec![Action::Cleared, Action::RenderNeeded]
    }

    fn clear_local(&mut self) {
        self.doc.clear();
        self.ui.selected = None;
        if matches!(self.input, InputState::Moving { .. }) {
            self.input = InputState::Idle;
        }
    }

    /// Drop selection and drag state that refer to a removed element.
    fn forget(&mut self, id: &ElementId) {
        if self.ui.selected.as_ref() == Some(id) {
            self.ui.selected = None;
        }
        if matches!(&self.input, InputState::Moving { id: moving, .. } if moving == id) {
            self.input = InputState::Idle;
        }
    }

    // --- Viewport ---

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.viewport.zoom_at_center(ZOOM_FACTOR, self.viewport_width, self.viewport_height);
        vec![Action::RenderNeeded]
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.viewport.zoom_at_center(1.0 / ZOOM_FACTOR, self.viewport_width, self.viewport_height);
        vec![Action::RenderNeeded]
    }

    // --- Permission ---

    /// Host toggle for whether other clients may draw.
    pub fn set_can_draw(&mut self, can_draw: bool) -> Vec<Action> {
        if !self.permission.set_can_draw(can_draw) {
            return vec![Action::Notice(NOTICE_NOT_HOST.to_owned())];
        }
        vec![Action::PermissionChanged(can_draw)]
    }

    // --- Remote events ---

    /// Apply a peer's new element. Returns false for duplicates.
    pub fn apply_remote_add(&mut self, element: Element) -> bool {
        self.doc.add(element)
    }

    /// Apply a peer's edit. Unknown ids and type changes are ignored.
    pub fn apply_remote_update(&mut self, element: Element) -> bool {
        match self.doc.update(element) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("ignoring remote update: {e}");
                false
            }
        }
    }

    /// Apply a peer's undo: by id when given, otherwise pop the newest element.
    pub fn apply_remote_undo(&mut self, id: Option<&ElementId>) -> bool {
        let removed = match id {
            Some(id) => self.doc.remove(id),
            None => self.doc.remove_last(),
        };
        match removed {
            Some(element) => {
                self.forget(&element.id);
                true
            }
            None => false,
        }
    }

    /// Apply a peer's redo by re-adding the restored element.
    pub fn apply_remote_redo(&mut self, element: Element) -> bool {
        self.doc.add(element)
    }

    pub fn apply_remote_clear(&mut self) {
        self.clear_local();
    }

    /// Apply a `permission:update` from the host. Losing permission cancels
    /// in-flight work and falls back to `Select`.
    pub fn apply_remote_permission(&mut self, can_draw: bool) -> Vec<Action> {
        if !self.permission.apply_remote(can_draw) {
            return Vec::new();
        }
        if self.permission.allows_mutation() {
            return vec![Action::RenderNeeded];
        }
        let was_writing = self.abandon_gesture();
        let mut actions = Vec::new();
        if was_writing {
            actions.push(Action::CloseTextInput);
        }
        if self.ui.tool.is_mutating() {
            self.ui.tool = Tool::Select;
        }
        actions.push(Action::Notice(NOTICE_DRAWING_DISABLED.to_owned()));
        actions.push(Action::RenderNeeded);
        actions
    }

    pub fn apply_remote_cursor(&mut self, client_id: &str, display_name: &str, world: Point, now_ms: i64) {
        self.presence.upsert(client_id, display_name, world, now_ms);
    }

    /// A peer left the room.
    pub fn remove_peer(&mut self, client_id: &str) -> bool {
        self.presence.remove(client_id)
    }

    pub fn evict_stale_cursors(&mut self, now_ms: i64) -> usize {
        self.presence.evict_stale(now_ms)
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> Option<&ElementId> {
        self.ui.selected.as_ref()
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    #[must_use]
    pub fn elements(&self) -> &[Element] {
        self.doc.elements()
    }

    #[must_use]
    pub fn is_writing(&self) -> bool {
        matches!(self.input, InputState::Writing { .. })
    }

    /// Read-only view of everything the renderer draws.
    #[must_use]
    pub fn scene(&self) -> Scene<'_> {
        Scene {
            elements: self.doc.elements(),
            in_flight: self.input.in_flight(),
            selected: self.ui.selected.as_ref().and_then(|id| self.doc.get(id)),
            viewport: self.viewport,
            width: self.viewport_width,
            height: self.viewport_height,
            cursors: self.presence.sorted(),
        }
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement, client_id: impl Into<String>) -> Self {
        Self { canvas, core: EngineCore::new(client_id) }
    }

    /// Milliseconds since the epoch from the browser clock.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn now_ms() -> i64 {
        js_sys::Date::now() as i64
    }

    /// Update viewport dimensions and resize the backing store for `dpr`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.viewport_width = width_css;
        self.core.viewport_height = height_css;
        self.core.dpr = dpr;
        self.canvas.set_width((width_css * dpr).round() as u32);
        self.canvas.set_height((height_css * dpr).round() as u32);
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a `Canvas2D` call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let ctx = self
            .canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(JsValue::from)?;
        let cmds = render::display_list(&self.core.scene());
        render::paint(&ctx, &cmds, self.core.dpr)
    }
}
