// src/exec/naming.rs

//! Log file naming.
//!
//! A run logs to `<sanitized "<project>-<start>">.log`, where `<start>` is the
//! ISO-8601 start time (millisecond precision, `Z` suffix) with its colons
//! removed, e.g. `demo-2015-06-01T123456.789Z.log`.

use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

/// Longest file name most filesystems accept, in bytes.
pub const MAX_FILE_NAME_BYTES: usize = 255;

const LOG_EXTENSION: &str = ".log";

/// Used when sanitisation leaves nothing behind.
const FALLBACK_STEM: &str = "run";

static ILLEGAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\?<>\\:\*\|"]"#).expect("valid regex"));
static CONTROL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x1f\x80-\x9f]").expect("valid regex"));
static RESERVED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.+$").expect("valid regex"));
static WINDOWS_RESERVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(con|prn|aux|nul|com[0-9]|lpt[0-9])(\..*)?$").expect("valid regex")
});
static WINDOWS_TRAILING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\. ]+$").expect("valid regex"));

/// Make `input` safe to use as a single path component.
///
/// Removes path separators and other reserved punctuation, control
/// characters, dot-only names, Windows device names and trailing dots/spaces,
/// then truncates to [`MAX_FILE_NAME_BYTES`] on a character boundary. The
/// result may be empty.
pub fn sanitize_file_name(input: &str) -> String {
    sanitize_with_limit(input, MAX_FILE_NAME_BYTES)
}

fn sanitize_with_limit(input: &str, limit: usize) -> String {
    let cleaned = ILLEGAL.replace_all(input, "");
    let cleaned = CONTROL.replace_all(&cleaned, "");
    let cleaned = RESERVED.replace_all(&cleaned, "");
    let cleaned = WINDOWS_RESERVED.replace_all(&cleaned, "");
    let cleaned = WINDOWS_TRAILING.replace_all(&cleaned, "");
    truncate_to_boundary(&cleaned, limit).to_string()
}

fn truncate_to_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// ISO-8601 timestamp with colons stripped, as used in log file names.
pub fn compact_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(':', "")
}

/// File name (no directory) of the log for a run of `project_name` started
/// at `started_at`.
pub fn log_file_name(project_name: &str, started_at: DateTime<Utc>) -> String {
    let raw = format!("{project_name}-{}", compact_timestamp(started_at));
    let stem = sanitize_with_limit(&raw, MAX_FILE_NAME_BYTES - LOG_EXTENSION.len());
    // Re-check the trailing rule: truncation can expose a dot or space.
    let stem = WINDOWS_TRAILING.replace_all(&stem, "");

    if stem.is_empty() {
        format!("{FALLBACK_STEM}{LOG_EXTENSION}")
    } else {
        format!("{stem}{LOG_EXTENSION}")
    }
}
