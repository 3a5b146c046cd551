//! Throwaway pipeline executables for launcher tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Write an executable `/bin/sh` script called `name` into `dir`.
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod script");
    path
}

/// A pipeline that prints its arguments, echoes its stdin, and exits.
pub fn echo_pipeline(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "echo-pipeline.sh",
        r#"echo "args: $*"
cat
echo
echo "pipeline done"
echo "to stderr" >&2"#,
    )
}

/// A pipeline that reads its stdin, then keeps running until it gets
/// SIGTERM, which it records in its log.
pub fn long_running_pipeline(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "long-pipeline.sh",
        r#"trap 'echo "got TERM"; exit 0' TERM
echo "pipeline started"
cat > /dev/null
while true; do
  sleep 0.05
done"#,
    )
}

/// A pipeline that is slow to start reading, then logs how many bytes of
/// configuration it received.
pub fn byte_counting_pipeline(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "counting-pipeline.sh",
        r#"sleep 0.5
echo "received $(wc -c | tr -d ' ') bytes""#,
    )
}
