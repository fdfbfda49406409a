//! Termination relay from the launcher to its child.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use ship_common::error::{Result, ShipError};

/// Installs a SIGINT/SIGTERM handler that sends one SIGTERM to `child`.
///
/// Delivery is fire and forget: the launcher keeps waiting and reports
/// whatever status the child ends with. Later signals are ignored.
///
/// # Errors
///
/// Returns an error if a handler is already installed in this process.
pub fn forward_termination(child: Pid) -> Result<()> {
    let forwarded = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&forwarded);
    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(pid = %child, "forwarding SIGTERM to container");
        if let Err(e) = kill(child, Signal::SIGTERM) {
            tracing::warn!(pid = %child, error = %e, "failed to signal container");
        }
    })
    .map_err(|e| ShipError::Config {
        message: format!("failed to install termination handler: {e}"),
    })
}

/// Converts a spawned child's id to a `Pid`.
///
/// # Errors
///
/// Returns an error if the id does not fit a `pid_t`.
pub fn pid_of(child: &std::process::Child) -> Result<Pid> {
    i32::try_from(child.id())
        .map(Pid::from_raw)
        .map_err(|_| ShipError::Config {
            message: format!("child pid {} out of range", child.id()),
        })
}
