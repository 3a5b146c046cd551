#![allow(dead_code)]

use std::path::{Path, PathBuf};

use pulserun::config::{
    ConfigFile, LogsSection, PipelineSection, RawConfigFile, StoreSection, TailSection,
};

/// Pipeline configuration JSON for a project called `name`.
pub fn project_config(name: &str) -> String {
    serde_json::json!({
        "process": { "name": name, "logs": "crowd-pulse" },
        "source": { "plugin": "twitter-importer", "config": { "query": "#rust" } },
        "sink": { "plugin": "mongodb", "config": { "collection": name } }
    })
    .to_string()
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            config: RawConfigFile {
                pipeline: PipelineSection {
                    executable: executable.into(),
                    database: None,
                },
                logs: LogsSection::default(),
                store: StoreSection::default(),
                tail: TailSection::default(),
            },
        }
    }

    pub fn database(mut self, db: &str) -> Self {
        self.config.pipeline.database = Some(db.to_string());
        self
    }

    pub fn logs(mut self, path: &Path) -> Self {
        self.config.logs.path = path.to_path_buf();
        self
    }

    pub fn store(mut self, path: &Path) -> Self {
        self.config.store.path = path.to_path_buf();
        self
    }

    pub fn tail(
        mut self,
        initial_lines: usize,
        batch_max_lines: usize,
        batch_window_ms: u64,
    ) -> Self {
        self.config.tail = TailSection {
            initial_lines,
            batch_max_lines,
            batch_window_ms,
        };
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
