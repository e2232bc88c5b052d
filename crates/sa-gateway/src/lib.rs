//! The gateway binary's library surface (C9): the HTTP boundary that
//! turns an inbound channel message into a `Runner` invocation and a
//! reply string.
//!
//! `main.rs` owns process startup (config loading, dependency wiring,
//! binding); everything that can be exercised without a live socket
//! lives here.

pub mod api;
pub mod error;
pub mod runtime;
pub mod state;
