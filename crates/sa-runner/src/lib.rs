//! Run orchestration (C8).
//!
//! `Runner` binds an `sa_agent::Agent` to a `Session::Service` and a
//! `Memory::Service`: it resolves the session, drives the Agent, persists
//! every observed event, and exposes the `RunStatus`/`Cancel` query
//! surface a managed deployment needs.

pub mod cancel;
pub mod runner;
pub mod runs;

pub use cancel::{CancelMap, CancelToken};
pub use runner::{InvokeRequest, Runner};
pub use runs::{Run, RunStatus, RunStore};
