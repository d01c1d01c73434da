//! Canvas engine for the collaborative sketch room.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! local side of a shared drawing surface: translating raw DOM input into
//! element mutations, maintaining the pan/zoom viewport, hit-testing,
//! undo/redo, the host's drawing permission, and rendering. The host
//! JavaScript layer wires DOM events to [`engine::Engine`] and hands the
//! resulting [`engine::Action`]s to a [`session::Session`], which exchanges
//! them with peers through the relay.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`element`] | Element types, ids, wire form, and the element store |
//! | [`viewport`] | Pan/zoom transform and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Containment, bounds, and top-most hit-testing |
//! | [`history`] | Bounded redo history |
//! | [`permission`] | Host-controlled drawing permission |
//! | [`presence`] | Remote cursors with stale eviction |
//! | [`render`] | Display list construction and Canvas2D painting |
//! | [`session`] | Room membership and frame exchange over a [`session::Transport`] |
//! | [`web`] | Browser `WebSocket` transport |
//! | [`consts`] | Shared numeric constants (zoom limits, tolerances, timings) |

pub mod consts;
pub mod element;
pub mod engine;
pub mod hit;
pub mod history;
pub mod input;
pub mod permission;
pub mod presence;
pub mod render;
pub mod session;
pub mod viewport;
pub mod web;
