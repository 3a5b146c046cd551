// tests/cli_surface.rs

use clap::Parser;
use pulserun::cli::{CliArgs, Command, LogLevel, ProjectCommand, RunCommand};
use pulserun::logging::build_filter;
use uuid::Uuid;

#[test]
fn defaults_apply_without_global_flags() {
    let args = CliArgs::try_parse_from(["pulserun", "project", "list"]).unwrap();

    assert_eq!(args.config, "Pulserun.toml");
    assert!(args.log_level.is_none());
    assert!(matches!(args.command, Command::Project(ProjectCommand::List)));
}

#[test]
fn global_flags_may_follow_the_subcommand() {
    let run = Uuid::new_v4();
    let run_arg = run.to_string();
    let args = CliArgs::try_parse_from([
        "pulserun",
        "run",
        "fail",
        run_arg.as_str(),
        "--reason",
        "sink down",
        "--config",
        "deploy/Pulserun.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(args.config, "deploy/Pulserun.toml");
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    match args.command {
        Command::Run(RunCommand::Fail { run: parsed, reason }) => {
            assert_eq!(parsed, run);
            assert_eq!(reason, "sink down");
        }
        other => panic!("Expected run fail, got: {other:?}"),
    }
}

#[test]
fn ids_must_be_uuids() {
    assert!(CliArgs::try_parse_from(["pulserun", "run", "stop", "42"]).is_err());
    assert!(CliArgs::try_parse_from(["pulserun", "logs"]).is_err());
}

#[test]
fn cli_level_overrides_environment() {
    let filter = build_filter(Some(LogLevel::Trace), Some("warn"));
    assert_eq!(filter.to_string(), "trace");
}

#[test]
fn environment_directives_are_used() {
    let filter = build_filter(None, Some("warn,pulserun::tail=trace"));
    let rendered = filter.to_string();
    assert!(rendered.contains("pulserun::tail=trace"), "got {rendered}");
    assert!(rendered.contains("warn"), "got {rendered}");
}

#[test]
fn invalid_or_missing_environment_falls_back_to_info() {
    assert_eq!(build_filter(None, None).to_string(), "info");
    assert_eq!(build_filter(None, Some("   ")).to_string(), "info");
    assert_eq!(build_filter(None, Some("pulserun=loud")).to_string(), "info");
}
