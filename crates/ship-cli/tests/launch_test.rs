//! End-to-end runs of the `ship` binary.

#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn ship() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ship"));
    let _ = cmd.env("RUST_LOG", "warn").env_remove("SHIP_CONFIG_FILE");
    cmd
}

#[test]
fn assemble_only_prints_rootfs_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let root = dir.path().join("rootfs");
    let output = ship()
        .arg("--assemble-only")
        .arg("--rootfs")
        .arg(&root)
        .output()
        .expect("run ship");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let printed = String::from_utf8(output.stdout).expect("utf-8");
    assert_eq!(Path::new(printed.trim()), root);
    assert!(root.join("usr/bin").is_dir());
    assert!(std::fs::symlink_metadata(root.join("bin")).expect("lstat").file_type().is_symlink());
}

#[test]
fn missing_rootfs_fails_without_launching() {
    let dir = tempfile::tempdir().expect("tempdir");
    let status = ship()
        .arg("--rootfs")
        .arg(dir.path().join("absent"))
        .stdin(Stdio::null())
        .status()
        .expect("run ship");
    assert!(!status.success());
}

#[test]
fn invalid_config_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ship.json");
    std::fs::write(&path, "{ not json").expect("write");
    let output = ship().arg("--config").arg(&path).arg("--assemble-only").output().expect("run");
    assert!(!output.status.success());
}

#[test]
#[ignore = "requires root privileges"]
fn shell_runs_in_namespaces_and_exits_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut child = ship()
        .arg("--rootfs")
        .arg(dir.path())
        .arg("--assemble-only")
        .stdout(Stdio::null())
        .spawn()
        .expect("assemble");
    assert!(child.wait().expect("wait").success());

    let mut child = ship()
        .arg("--rootfs")
        .arg(dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("launch");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(b"echo $$\nexit 0\n")
        .expect("write script");
    let output = child.wait_with_output().expect("wait");

    assert!(output.status.success());
    // The shell is the first child of the namespace init.
    let pid: u32 = String::from_utf8_lossy(&output.stdout).trim().parse().expect("pid");
    assert!(pid <= 2, "shell pid {pid} is not inside a fresh PID namespace");
}
