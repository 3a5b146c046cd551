// src/config/mod.rs

//! Configuration loading and validation for pulserun.
//!
//! - `model.rs`: the TOML-backed data model.
//! - `loader.rs`: read a config file from disk and resolve relative paths.
//! - `validate.rs`: `RawConfigFile` → `ConfigFile` with invariant checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, LogsSection, PipelineSection, RawConfigFile, StoreSection, TailSection,
};
