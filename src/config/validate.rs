// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PulserunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::PulserunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_pipeline(cfg)?;
    validate_paths(cfg)?;
    validate_tail(cfg)?;
    Ok(())
}

fn validate_pipeline(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.executable.as_os_str().is_empty() {
        return Err(PulserunError::ConfigError(
            "[pipeline].executable must not be empty".to_string(),
        ));
    }

    if let Some(db) = &cfg.pipeline.database {
        if db.trim().is_empty() {
            return Err(PulserunError::ConfigError(
                "[pipeline].database must not be blank when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    if cfg.logs.path.as_os_str().is_empty() {
        return Err(PulserunError::ConfigError(
            "[logs].path must not be empty".to_string(),
        ));
    }
    if cfg.store.path.as_os_str().is_empty() {
        return Err(PulserunError::ConfigError(
            "[store].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_tail(cfg: &RawConfigFile) -> Result<()> {
    if cfg.tail.batch_max_lines == 0 {
        return Err(PulserunError::ConfigError(
            "[tail].batch_max_lines must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.tail.batch_window_ms == 0 {
        return Err(PulserunError::ConfigError(
            "[tail].batch_window_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
