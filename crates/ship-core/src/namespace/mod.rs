//! Linux namespace management for container isolation.
//!
//! The launcher never unshares its own namespaces. It computes the flag
//! set here and applies it with `unshare(2)` inside the freshly spawned
//! child, right before that child re-executes the ship binary.

pub mod mount;
pub mod pid;
pub mod uts;

use nix::sched::CloneFlags;
pub use ship_common::types::NamespaceSet;

/// Translates the configured namespaces into `unshare(2)` flags.
#[must_use]
pub fn clone_flags(set: &NamespaceSet) -> CloneFlags {
    let mut flags = CloneFlags::CLONE_NEWNS;
    if set.uts {
        flags |= CloneFlags::CLONE_NEWUTS;
    }
    if set.pid {
        flags |= CloneFlags::CLONE_NEWPID;
    }
    flags
}
