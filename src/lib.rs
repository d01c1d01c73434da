//! Room relay for the collaborative sketch canvas.
//!
//! The relay is a dumb fan-out: clients join a room over a websocket and
//! every element, cursor, history and permission event they send is
//! forwarded to the other members of that room. It stores no drawing state.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Environment configuration |
//! | [`state`] | Shared room registry |
//! | [`routes`] | HTTP router and the websocket handler |
//! | [`services`] | Room membership and fan-out |

pub mod config;
pub mod routes;
pub mod services;
pub mod state;
