//! # ship-core
//!
//! Low-level Linux isolation primitives for the ship launcher.
//!
//! This crate provides safe abstractions over:
//! - **Namespaces**: mount, UTS and PID isolation flags, hostname, and
//!   becoming PID 1 of a fresh PID namespace.
//! - **Filesystem**: `chroot`, pseudo-filesystem mounts with their
//!   fallbacks, and static device nodes.
//!
//! All unsafe system calls are encapsulated in safe wrappers with
//! proper error handling and `// SAFETY:` documentation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod filesystem;
pub mod namespace;
