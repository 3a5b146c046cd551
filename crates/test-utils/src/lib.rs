pub mod builders;
pub mod fake_backend;
#[cfg(unix)]
pub mod scripts;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::fmt;

static INIT: Once = Once::new();

/// Install a test-friendly subscriber once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests (or with `--nocapture`). The filter honours `PULSERUN_LOG` like
/// the binary does, e.g. `PULSERUN_LOG=pulserun::tail=trace cargo test`,
/// and defaults to `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let directives = std::env::var(pulserun::logging::LOG_ENV_VAR).ok();
        let filter = pulserun::logging::build_filter(None, directives.as_deref());

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Poll `check` every 25ms until it returns `true`, for at most 5 seconds.
///
/// Used for conditions that depend on other processes (log files being
/// written, followers exiting).
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
