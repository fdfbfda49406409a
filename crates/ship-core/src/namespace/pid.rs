//! PID namespace isolation.
//!
//! `unshare(CLONE_NEWPID)` only moves the *children* of the caller into
//! the new namespace. The re-executed child therefore forks once more so
//! that the process mounting `/proc` and running the shell is PID 1 of
//! the namespace. The forked parent stays outside, waits, and relays the
//! exit status.

use nix::sys::signal::Signal;
use nix::sys::wait::{WaitStatus, waitpid};
use nix::unistd::Pid;
use ship_common::error::{Result, ShipError};

/// Which side of the fork the caller ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitRole {
    /// PID 1 of the new namespace; continue the bootstrap.
    Init,
    /// The original process; the init process has already exited.
    Supervisor {
        /// Exit code to report for the whole container.
        exit_code: i32,
    },
}

/// Forks so that the child becomes PID 1 of the pending PID namespace.
///
/// The init process is killed if the supervisor dies, so a forwarded
/// SIGTERM tears the whole namespace down.
///
/// # Errors
///
/// Returns an error if `fork(2)` or waiting for the init process fails.
#[allow(unsafe_code)]
pub fn become_init() -> Result<InitRole> {
    use nix::unistd::{ForkResult, fork};

    // SAFETY: the child bootstrap is single-threaded, so the forked copy
    // cannot inherit a lock held by another thread.
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            if let Err(e) = nix::sys::prctl::set_pdeathsig(Signal::SIGKILL) {
                tracing::warn!(error = %e, "failed to set parent-death signal");
            }
            tracing::debug!(pid = %nix::unistd::getpid(), "running as namespace init");
            Ok(InitRole::Init)
        }
        Ok(ForkResult::Parent { child }) => {
            let exit_code = wait_for_exit(child)?;
            Ok(InitRole::Supervisor { exit_code })
        }
        Err(e) => Err(ShipError::PermissionDenied {
            message: format!("fork into PID namespace failed: {e}"),
        }),
    }
}

/// Blocks until `child` terminates and returns its shell-style exit code.
///
/// # Errors
///
/// Returns an error if `waitpid(2)` fails for a reason other than `EINTR`.
pub fn wait_for_exit(child: Pid) -> Result<i32> {
    loop {
        match waitpid(child, None) {
            Ok(status) => {
                if let Some(code) = exit_code(status) {
                    return Ok(code);
                }
            }
            Err(nix::errno::Errno::EINTR) => {}
            Err(e) => {
                return Err(ShipError::PermissionDenied {
                    message: format!("waitpid({child}) failed: {e}"),
                });
            }
        }
    }
}

/// Maps a terminal wait status to an exit code; signals become `128 + n`.
///
/// Returns `None` for statuses that do not mean the process is gone.
#[must_use]
pub fn exit_code(status: WaitStatus) -> Option<i32> {
    match status {
        WaitStatus::Exited(_, code) => Some(code),
        WaitStatus::Signaled(_, signal, _) => Some(128 + signal as i32),
        _ => None,
    }
}
