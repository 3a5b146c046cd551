// tests/log_naming.rs

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use pulserun::exec::naming::{compact_timestamp, MAX_FILE_NAME_BYTES};
use pulserun::exec::{log_file_name, sanitize_file_name};

fn start() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2015, 6, 1, 12, 34, 56).unwrap() + chrono::Duration::milliseconds(789)
}

#[test]
fn timestamp_has_no_colons() {
    assert_eq!(compact_timestamp(start()), "2015-06-01T123456.789Z");
}

#[test]
fn log_name_joins_project_and_start() {
    assert_eq!(log_file_name("demo", start()), "demo-2015-06-01T123456.789Z.log");
}

#[test]
fn reserved_characters_are_removed() {
    assert_eq!(
        log_file_name("../sentiment: it/en?", start()),
        "..sentiment iten-2015-06-01T123456.789Z.log"
    );
    assert_eq!(sanitize_file_name("a<b>c*d|e\"f\\g"), "abcdefg");
    assert_eq!(sanitize_file_name("tab\there"), "tabhere");
}

#[test]
fn unusable_names_are_emptied() {
    assert_eq!(sanitize_file_name(".."), "");
    assert_eq!(sanitize_file_name("CON"), "");
    assert_eq!(sanitize_file_name("lpt1.txt"), "");
    assert_eq!(sanitize_file_name("trailing. . "), "trailing");
}

#[test]
fn long_project_names_are_truncated() {
    let name = "x".repeat(400);
    let file_name = log_file_name(&name, start());

    assert_eq!(file_name.len(), MAX_FILE_NAME_BYTES);
    assert!(file_name.ends_with(".log"));
}

#[test]
fn truncation_respects_char_boundaries() {
    let name = "é".repeat(200);
    let sanitized = sanitize_file_name(&name);

    assert!(sanitized.len() <= MAX_FILE_NAME_BYTES);
    assert!(sanitized.chars().all(|c| c == 'é'));
}

proptest! {
    #[test]
    fn log_names_are_always_safe(name in "\\PC{0,300}") {
        let file_name = log_file_name(&name, start());

        prop_assert!(file_name.len() <= MAX_FILE_NAME_BYTES);
        prop_assert!(file_name.ends_with(".log"));
        prop_assert!(file_name.len() > ".log".len());
        for forbidden in ['/', '\\', ':', '*', '?', '"', '<', '>', '|'] {
            prop_assert!(!file_name.contains(forbidden), "{file_name:?} contains {forbidden:?}");
        }
        prop_assert!(!file_name.chars().any(|c| c.is_ascii_control()));
    }

    #[test]
    fn sanitizing_is_idempotent_on_plain_names(name in "[a-zA-Z0-9_-]{1,64}") {
        prop_assert_eq!(sanitize_file_name(&name), name);
    }
}
