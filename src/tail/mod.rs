// src/tail/mod.rs

//! Live log feeds.
//!
//! - [`follower`] runs one `tail -f` process per feed.
//! - [`batch`] turns its lines into count-or-time bounded batches.
//! - [`broker`] ties both to a run id and registers each feed under its
//!   observer so it can be cancelled individually or in bulk.
//!
//! Every feed has its own follower and its own batching task; two observers
//! of the same run share nothing but the log file.

pub mod batch;
pub mod broker;
pub mod follower;

pub use batch::{batch_lines, BatchPolicy, LogLineBatch};
pub use broker::{TailBroker, TailFeed, TailSettings};
