// src/exec/signal.rs

//! Best-effort process termination by pid.

use tracing::{debug, warn};

use crate::types::SignalOutcome;

/// Send `SIGTERM` to `pid`.
///
/// A process that no longer exists is reported as
/// [`SignalOutcome::AlreadyExited`]; nothing here returns an error.
#[cfg(unix)]
pub fn terminate(pid: u32) -> SignalOutcome {
    use nix::errno::Errno;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // 0 and values that wrap negative would address a whole process group.
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => {
            warn!(pid, "refusing to signal invalid pid");
            return SignalOutcome::Failed(format!("invalid pid {pid}"));
        }
    };

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => {
            debug!(pid, "sent SIGTERM");
            SignalOutcome::Delivered
        }
        Err(Errno::ESRCH) => {
            debug!(pid, "process already exited");
            SignalOutcome::AlreadyExited
        }
        Err(e) => {
            warn!(pid, error = %e, "could not signal process");
            SignalOutcome::Failed(e.to_string())
        }
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> SignalOutcome {
    warn!(pid, "process signalling is only supported on unix");
    SignalOutcome::Failed("unsupported platform".to_string())
}
