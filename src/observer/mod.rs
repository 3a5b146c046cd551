// src/observer/mod.rs

//! Observers of live run logs.
//!
//! - [`registry`] maps each observer to the runs it follows and the
//!   cancellable handle of each follower.
//! - [`session`] adapts one transport connection to the tail broker:
//!   `OpenLog` / `CloseLog` / `Disconnect` in, `Clear` / `Tail` out.

pub mod registry;
pub mod session;

pub use registry::{SessionRegistry, TailHandle};
pub use session::{spawn_session, ObserverCommand, ObserverEvent, ObserverSessionHandle};
