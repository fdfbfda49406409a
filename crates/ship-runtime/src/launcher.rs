//! The outer process: obtains a rootfs, spawns the child, relays its exit.

use std::ffi::OsString;
use std::path::PathBuf;

use ship_common::config::ShipConfig;
use ship_common::constants::SELF_EXE;
use ship_common::error::{Result, ShipError};
use ship_common::types::Phase;
use ship_rootfs::assembler::RootfsAssembler;

use crate::{process, signal};

/// Runs the launcher role and returns the container's exit code.
///
/// With `rootfs` unset the rootfs is assembled from `config` first.
/// `args` are forwarded to the child unchanged.
///
/// # Errors
///
/// Returns an error if the rootfs cannot be obtained or the child cannot
/// be started or waited for. A non-zero exit of the child is not an error.
pub fn run(config: &ShipConfig, rootfs: Option<PathBuf>, args: &[OsString]) -> Result<i32> {
    tracing::debug!(phase = %Phase::Unstarted, "launcher starting");
    let rootfs = prepare_rootfs(config, rootfs)?;
    tracing::debug!(phase = %Phase::RootfsReady, rootfs = %rootfs.display(), "rootfs ready");

    let cmd = process::child_command(config, &rootfs, args)?;
    let mut child = process::spawn_in_namespaces(cmd, config)?;
    let pid = signal::pid_of(&child)?;
    tracing::debug!(phase = %Phase::NamespaceSpawned, %pid, "child spawned");

    if let Err(e) = signal::forward_termination(pid) {
        tracing::warn!(error = %e, "signals will not be forwarded");
    }

    let status = child.wait().map_err(|e| ShipError::io(SELF_EXE, e))?;
    let code = process::exit_code(status);
    tracing::debug!(phase = %Phase::Exited, code, "child exited");
    if code != 0 {
        tracing::warn!(code, "container exited with non-zero status");
    }
    Ok(code)
}

/// Returns the supplied rootfs, or assembles one.
///
/// # Errors
///
/// Returns [`ShipError::NotFound`] if a supplied rootfs is not a
/// directory, or the assembler's error.
pub fn prepare_rootfs(config: &ShipConfig, rootfs: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = rootfs {
        if !path.is_dir() {
            return Err(ShipError::NotFound {
                kind: "rootfs".into(),
                id: path.display().to_string(),
            });
        }
        tracing::info!(rootfs = %path.display(), "using existing rootfs");
        return Ok(path);
    }
    let report = RootfsAssembler::from_config(config).assemble()?;
    Ok(report.root)
}
