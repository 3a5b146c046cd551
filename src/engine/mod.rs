// src/engine/mod.rs

//! Run lifecycle engine.
//!
//! - [`transitions`] holds the pure state machine (`running` →
//!   `completed | errored | stopped`), unit-testable without a store or
//!   processes.
//! - [`lifecycle`] is the async shell: it loads and persists records through
//!   a `RunStore` and reaches the OS through a `ProcessBackend`.
//!
//! There is no exit-code monitoring: a pipeline reports its own completion
//! (through `mark_completed` / `mark_errored`), and the orchestrator only
//! ends runs itself on stop or launch failure.

pub mod lifecycle;
pub mod transitions;

pub use lifecycle::{LaunchSettings, RunManager};
pub use transitions::{RunEnd, Transition};
