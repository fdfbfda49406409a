//! Launch protocol for ship.
//!
//! One binary plays two roles. The launcher assembles (or accepts) a
//! rootfs and re-executes itself inside fresh namespaces; the re-executed
//! child changes root, mounts pseudo-filesystems and runs the shell.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bootstrap;
pub mod launcher;
pub mod process;
pub mod signal;
