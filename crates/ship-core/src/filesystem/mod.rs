//! Filesystem management for container isolation.
//!
//! Provides the `chroot` transition, the ordered pseudo-filesystem mount
//! plan, and the static device nodes used when `devtmpfs` is unavailable.

pub mod chroot;
pub mod devices;
pub mod mount;
