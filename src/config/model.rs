// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration exactly as read from a TOML file.
///
/// ```toml
/// [pipeline]
/// executable = "/opt/crowd-pulse/bin/crowd-pulse"
/// database = "crowd-pulse"
///
/// [logs]
/// path = "logs"
///
/// [store]
/// path = "data"
///
/// [tail]
/// initial_lines = 100
/// batch_max_lines = 20
/// batch_window_ms = 1000
/// ```
///
/// Only `[pipeline].executable` is required. Use `ConfigFile::try_from` to
/// get a validated configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub pipeline: PipelineSection,

    #[serde(default)]
    pub logs: LogsSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub tail: TailSection,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or
/// [`ConfigFile::new_unchecked`] inside the crate), so holders can rely on
/// the invariants checked in `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    pub logs: LogsSection,
    pub store: StoreSection,
    pub tail: TailSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            pipeline: raw.pipeline,
            logs: raw.logs,
            store: raw.store,
            tail: raw.tail,
        }
    }
}

/// `[pipeline]` section: how to start the external pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineSection {
    /// Path to the pipeline executable.
    pub executable: PathBuf,

    /// Database connection string handed to the pipeline as `--db`, so it can
    /// report on its own run record.
    #[serde(default)]
    pub database: Option<String>,
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsSection {
    /// Directory that receives one log file per run. Created on demand.
    #[serde(default = "default_logs_path")]
    pub path: PathBuf,
}

fn default_logs_path() -> PathBuf {
    PathBuf::from("logs")
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            path: default_logs_path(),
        }
    }
}

/// `[store]` section, used by the CLI's JSON document store.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// `[tail]` section: live log feed behaviour.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TailSection {
    /// How many existing lines the follower replays before following.
    #[serde(default = "default_initial_lines")]
    pub initial_lines: usize,

    /// Flush a batch as soon as this many lines are buffered.
    #[serde(default = "default_batch_max_lines")]
    pub batch_max_lines: usize,

    /// Flush whatever is buffered once this many milliseconds have passed
    /// since the previous flush.
    #[serde(default = "default_batch_window_ms")]
    pub batch_window_ms: u64,
}

fn default_initial_lines() -> usize {
    100
}

fn default_batch_max_lines() -> usize {
    20
}

fn default_batch_window_ms() -> u64 {
    1000
}

impl Default for TailSection {
    fn default() -> Self {
        Self {
            initial_lines: default_initial_lines(),
            batch_max_lines: default_batch_max_lines(),
            batch_window_ms: default_batch_window_ms(),
        }
    }
}

impl TailSection {
    pub fn batch_window(&self) -> Duration {
        Duration::from_millis(self.batch_window_ms)
    }
}
