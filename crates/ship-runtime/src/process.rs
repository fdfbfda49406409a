//! Process spawning inside new namespaces.

use std::ffi::OsString;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use nix::sched::unshare;
use ship_common::config::ShipConfig;
use ship_common::constants::{CONFIG_ENV, SELF_EXE};
use ship_common::error::{Result, ShipError};
use ship_common::types::Role;
use ship_core::namespace::clone_flags;

/// Builds the re-execution of the current binary in the child role.
///
/// Standard streams are inherited and the resolved configuration travels
/// in [`CONFIG_ENV`]. Namespaces are not entered yet; see
/// [`spawn_in_namespaces`].
///
/// # Errors
///
/// Returns an error if the configuration cannot be serialized.
pub fn child_command(config: &ShipConfig, rootfs: &Path, args: &[OsString]) -> Result<Command> {
    let mut cmd = Command::new(SELF_EXE);
    let _ = cmd
        .args(Role::child_args(rootfs, args))
        .env(CONFIG_ENV, config.to_env_value()?)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    Ok(cmd)
}

/// Spawns `cmd` after unsharing the namespaces in `config`.
///
/// `unshare(2)` runs in the forked process just before `exec`, so the
/// launcher itself never leaves the host namespaces.
///
/// # Errors
///
/// Returns an error if the process cannot be started, including when the
/// kernel refuses the namespace request.
#[allow(unsafe_code)]
pub fn spawn_in_namespaces(mut cmd: Command, config: &ShipConfig) -> Result<std::process::Child> {
    let flags = clone_flags(&config.namespaces);
    // SAFETY: the closure only calls unshare(2), which is async-signal-safe
    // and touches no memory shared with the parent.
    let _ = unsafe { cmd.pre_exec(move || unshare(flags).map_err(std::io::Error::from)) };
    cmd.spawn().map_err(|e| ShipError::io(SELF_EXE, e))
}

/// Converts an exit status to a shell-style code; signals become `128 + n`.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn child_command_reexecutes_self_with_marker() {
        let config = ShipConfig::default();
        let cmd = child_command(&config, Path::new("/tmp/rootfs"), &["-x".into()]).expect("cmd");
        assert_eq!(cmd.get_program(), OsStr::new(SELF_EXE));
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["child", "/tmp/rootfs", "-x"].map(OsStr::new));
    }

    #[test]
    fn non_utf8_rootfs_reaches_the_child_unchanged() {
        use std::os::unix::ffi::{OsStrExt, OsStringExt};

        let rootfs = PathBuf::from(OsString::from_vec(b"/tmp/pr\xff".to_vec()));
        let cmd = child_command(&ShipConfig::default(), &rootfs, &[]).expect("cmd");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args[1].as_bytes(), b"/tmp/pr\xff");
    }

    #[test]
    fn child_command_exports_config() {
        let config = ShipConfig {
            hostname: "inner".into(),
            rootfs_dir: Some(PathBuf::from("/srv/r")),
            ..ShipConfig::default()
        };
        let cmd = child_command(&config, Path::new("/srv/r"), &[]).expect("cmd");
        let exported = cmd
            .get_envs()
            .find(|(k, _)| *k == OsStr::new(CONFIG_ENV))
            .and_then(|(_, v)| v)
            .expect("config exported");
        let raw = exported.to_str().expect("utf-8 config");
        let back: ShipConfig = serde_json::from_str(raw).expect("exported config parses");
        assert_eq!(back, config);
    }

    #[test]
    fn exit_status_code_is_kept() {
        assert_eq!(exit_code(ExitStatus::from_raw(3 << 8)), 3);
        assert_eq!(exit_code(ExitStatus::from_raw(0)), 0);
    }

    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        assert_eq!(exit_code(ExitStatus::from_raw(15)), 143);
        assert_eq!(exit_code(ExitStatus::from_raw(9)), 137);
    }
}
