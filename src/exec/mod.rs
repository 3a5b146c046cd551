// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`launcher`] spawns the pipeline detached and hands back its pid.
//! - [`naming`] derives the per-run log file name.
//! - [`signal`] terminates processes by pid, treating "already gone" as
//!   success.
//! - [`backend`] provides the `ProcessBackend` trait and the
//!   `RealProcessBackend` the lifecycle manager uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod launcher;
pub mod naming;
pub mod signal;

pub use backend::{ProcessBackend, RealProcessBackend};
pub use launcher::{launch, LaunchRequest};
pub use naming::{log_file_name, sanitize_file_name};
