//! Root filesystem switching via `chroot(2)`.
//!
//! Both steps are fatal on failure: without a valid root nothing that
//! follows is safe to run.

use std::path::Path;

use ship_common::error::{Result, ShipError};

/// Changes the process root to `new_root` and moves to `/` inside it.
///
/// # Errors
///
/// Returns [`ShipError::PermissionDenied`] if `chroot(2)` fails and
/// [`ShipError::Io`] if the subsequent `chdir("/")` fails.
pub fn enter_root(new_root: &Path) -> Result<()> {
    nix::unistd::chroot(new_root).map_err(|e| ShipError::PermissionDenied {
        message: format!("chroot into {} failed: {e}", new_root.display()),
    })?;
    std::env::set_current_dir("/").map_err(|e| ShipError::io("/", e))?;
    tracing::info!(new_root = %new_root.display(), "changed root");
    Ok(())
}
