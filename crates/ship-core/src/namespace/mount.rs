//! Mount namespace isolation.
//!
//! A fresh mount namespace still inherits the host's propagation flags.
//! On systemd hosts `/` is shared, so mounts made under the rootfs would
//! show up on the host unless the tree is made private first.

use std::path::PathBuf;

use ship_common::error::{Result, ShipError};

/// Marks every mount in the current namespace as private, recursively.
///
/// # Errors
///
/// Returns an error if the `mount(2)` call fails, typically because the
/// process is not in its own mount namespace or lacks `CAP_SYS_ADMIN`.
pub fn make_mounts_private() -> Result<()> {
    use nix::mount::{MsFlags, mount};

    mount(
        None::<&str>,
        "/",
        None::<&str>,
        MsFlags::MS_REC | MsFlags::MS_PRIVATE,
        None::<&str>,
    )
    .map_err(|e| ShipError::PermissionDenied {
        message: format!("making mounts private failed: {e}"),
    })?;
    tracing::debug!("mount propagation set to private");
    Ok(())
}

/// Returns whether this process is still in its parent's mount namespace.
///
/// Compares the `/proc/<pid>/ns/mnt` links, which name the namespace
/// inode.
///
/// # Errors
///
/// Returns an error if either link cannot be read.
pub fn shares_mount_namespace_with_parent() -> Result<bool> {
    let own = mount_namespace_of("self")?;
    let parent = mount_namespace_of(&nix::unistd::getppid().to_string())?;
    Ok(own == parent)
}

fn mount_namespace_of(pid: &str) -> Result<PathBuf> {
    let link = PathBuf::from(format!("/proc/{pid}/ns/mnt"));
    std::fs::read_link(&link).map_err(|e| ShipError::io(&link, e))
}
