// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

/// Command-line arguments for `pulserun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pulserun",
    version,
    about = "Launch analytics pipeline runs and follow their logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Pulserun.toml", global = true)]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PULSERUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage runs.
    #[command(subcommand)]
    Run(RunCommand),

    /// Follow a run's log until Ctrl-C.
    Logs {
        /// Run id.
        run: Uuid,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProjectCommand {
    /// Create a project from a pipeline configuration file (JSON).
    Add {
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Recorded as the project's creation user.
        #[arg(long)]
        user: Option<String>,
    },

    /// List projects.
    List,

    /// Show a project and its runs.
    Show { id: Uuid },

    /// Replace a project's pipeline configuration.
    Update {
        id: Uuid,
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Delete a project that has no running runs.
    Delete { id: Uuid },
}

#[derive(Debug, Clone, Subcommand)]
pub enum RunCommand {
    /// Start a new run of a project.
    Start { project: Uuid },

    /// Stop a run and terminate its process.
    Stop { run: Uuid },

    /// Mark a run as completed.
    Complete { run: Uuid },

    /// Mark a run as errored.
    Fail {
        run: Uuid,
        #[arg(long, default_value = "reported by pipeline")]
        reason: String,
    },

    /// Show a run.
    Show { run: Uuid },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// The level as a filter directive.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
