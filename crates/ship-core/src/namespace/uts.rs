//! UTS namespace isolation.
//!
//! Allows the container to have its own hostname.

use ship_common::error::{Result, ShipError};

/// Sets the hostname inside the UTS namespace.
///
/// # Errors
///
/// Returns an error if `sethostname(2)` fails.
pub fn set_hostname(hostname: &str) -> Result<()> {
    nix::unistd::sethostname(hostname).map_err(|e| ShipError::PermissionDenied {
        message: format!("sethostname({hostname}) failed: {e}"),
    })?;
    tracing::debug!(hostname, "container hostname set");
    Ok(())
}
