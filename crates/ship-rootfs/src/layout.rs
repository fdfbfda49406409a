//! On-disk layout of an assembled rootfs.

use std::path::{Component, Path, PathBuf};

use ship_common::constants::ROOTFS_SKELETON;
use ship_common::error::{Result, ShipError};

use crate::copy;

/// Host prefixes that can be mirrored into the rootfs, checked in order.
const LIBRARY_PREFIXES: &[(&str, &str)] = &[("/lib64", "lib64"), ("/lib", "lib"), ("/usr", "usr")];

/// The directory tree a container sees as `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootfsLayout {
    root: PathBuf,
}

impl RootfsLayout {
    /// Wraps a rootfs location without touching the filesystem.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the rootfs root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory program binaries are copied into.
    #[must_use]
    pub fn programs_dir(&self) -> PathBuf {
        self.root.join("usr/bin")
    }

    /// Path of the `bin` compatibility link.
    #[must_use]
    pub fn bin_link(&self) -> PathBuf {
        self.root.join("bin")
    }

    /// Creates every skeleton directory. Existing directories are fine.
    ///
    /// # Errors
    ///
    /// Returns the first directory that could not be created.
    pub fn create_skeleton(&self) -> Result<()> {
        for dir in ROOTFS_SKELETON {
            let path = self.root.join(dir);
            // `bin` is a symlink after the first run; leave it for relink_bin.
            if std::fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink()) {
                continue;
            }
            copy::create_dir_all(&path)?;
        }
        tracing::debug!(root = %self.root.display(), "rootfs skeleton ready");
        Ok(())
    }

    /// Replaces `bin` with a relative symlink to `usr/bin`.
    ///
    /// Relative so the link resolves both inside the chroot and when the
    /// tree is inspected from the host.
    ///
    /// # Errors
    ///
    /// Returns an error if the old entry cannot be removed or the link
    /// cannot be created.
    pub fn relink_bin(&self) -> Result<()> {
        let link = self.bin_link();
        copy::remove_if_present(&link)?;
        std::os::unix::fs::symlink("usr/bin", &link).map_err(|e| ShipError::io(&link, e))
    }

    /// Maps a host library path to its location inside this rootfs.
    #[must_use]
    pub fn library_destination(&self, host_path: &Path) -> Option<PathBuf> {
        library_destination(host_path).map(|rel| self.root.join(rel))
    }
}

/// Maps a host library path to a path relative to the rootfs root.
///
/// `/lib64/...` goes to `lib64/...`, `/lib/...` to `lib/...`, and
/// `/usr/...` to `usr/...`. Anything else, or a bare prefix, is
/// unmappable.
#[must_use]
pub fn library_destination(host_path: &Path) -> Option<PathBuf> {
    if host_path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return None;
    }
    LIBRARY_PREFIXES.iter().find_map(|(prefix, dest)| {
        let suffix = host_path.strip_prefix(prefix).ok()?;
        if suffix.as_os_str().is_empty() {
            return None;
        }
        Some(Path::new(dest).join(suffix))
    })
}
