//! The re-executed child: enters the rootfs and runs the shell.
//!
//! Runs already inside the namespaces the launcher unshared. Isolation
//! steps that merely degrade the environment are logged and skipped;
//! failing to change root or to start the shell is fatal.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use ship_common::config::ShipConfig;
use ship_common::constants::CONFIG_ENV;
use ship_common::error::{Result, ShipError};
use ship_common::types::Phase;
use ship_core::filesystem::chroot::enter_root;
use ship_core::filesystem::mount::{apply_plan, pseudo_filesystem_plan};
use ship_core::namespace::mount::{make_mounts_private, shares_mount_namespace_with_parent};
use ship_core::namespace::pid::{InitRole, become_init};
use ship_core::namespace::uts::set_hostname;

use crate::process;

/// Runs the child role with the configuration exported by the launcher.
///
/// # Errors
///
/// Returns an error if the exported configuration is invalid, the root
/// cannot be changed, or the shell cannot be started.
pub fn run(rootfs: &Path, args: &[OsString]) -> Result<i32> {
    let config = ShipConfig::from_env()?;
    tracing::debug!(
        phase = %Phase::NamespaceSpawned,
        rootfs = %rootfs.display(),
        args = ?args,
        "child bootstrap starting"
    );

    match shares_mount_namespace_with_parent() {
        Ok(true) => {
            return Err(ShipError::PermissionDenied {
                message: "the child role needs a fresh mount namespace; run ship without `child`"
                    .into(),
            });
        }
        Ok(false) => {
            if let Err(e) = make_mounts_private() {
                tracing::warn!(error = %e, "mounts may propagate to the host");
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot verify mount namespace; leaving propagation unchanged");
        }
    }
    enter_root(rootfs)?;

    if config.namespaces.pid {
        if let InitRole::Supervisor { exit_code } = become_init()? {
            return Ok(exit_code);
        }
    }

    let summary = apply_plan(Path::new("/"), &pseudo_filesystem_plan());
    tracing::debug!(
        phase = %Phase::ChrootedAndMounted,
        mounted = summary.mounted.len(),
        failed = summary.failed.len(),
        device_failures = summary.device_failures,
        "pseudo-filesystems prepared"
    );

    if config.namespaces.uts {
        if let Err(e) = set_hostname(&config.hostname) {
            tracing::warn!(hostname = %config.hostname, error = %e, "failed to set hostname");
        }
    }

    run_shell(&config)
}

/// Runs the configured shell on the inherited streams.
///
/// # Errors
///
/// Returns an error if the shell cannot be started.
pub fn run_shell(config: &ShipConfig) -> Result<i32> {
    tracing::debug!(phase = %Phase::ShellRunning, shell = %config.shell.display(), "starting shell");
    let status = Command::new(&config.shell)
        .env("PATH", &config.path_env)
        .env_remove(CONFIG_ENV)
        .status()
        .map_err(|e| ShipError::io(&config.shell, e))?;
    let code = process::exit_code(status);
    tracing::debug!(phase = %Phase::Exited, code, "shell exited");
    Ok(code)
}
