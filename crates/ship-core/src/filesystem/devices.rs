//! Static device nodes for containers without `devtmpfs`.

use std::path::Path;

use nix::errno::Errno;
use nix::sys::stat::{Mode, SFlag, makedev, mknod};
use ship_common::error::{Result, ShipError};

/// A character device node to create under `/dev`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNodeSpec {
    /// File name under the device directory.
    pub name: &'static str,
    /// Permission bits.
    pub mode: u32,
    /// Device major number.
    pub major: u64,
    /// Device minor number.
    pub minor: u64,
}

/// Minimal device set an interactive shell needs.
pub const FALLBACK_DEVICES: &[DeviceNodeSpec] = &[
    DeviceNodeSpec { name: "null", mode: 0o666, major: 1, minor: 3 },
    DeviceNodeSpec { name: "zero", mode: 0o666, major: 1, minor: 5 },
    DeviceNodeSpec { name: "tty", mode: 0o666, major: 5, minor: 0 },
    DeviceNodeSpec { name: "random", mode: 0o666, major: 1, minor: 8 },
    DeviceNodeSpec { name: "urandom", mode: 0o666, major: 1, minor: 9 },
];

/// Result of a single node creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The node was created.
    Created,
    /// Something already exists at that path; left untouched.
    AlreadyExists,
}

/// Creates one character device node inside `dev_dir`.
///
/// An existing entry at the target path is not an error.
///
/// # Errors
///
/// Returns an error if `mknod(2)` fails for any reason other than `EEXIST`.
pub fn create_device_node(dev_dir: &Path, spec: &DeviceNodeSpec) -> Result<NodeOutcome> {
    let path = dev_dir.join(spec.name);
    match mknod(
        &path,
        SFlag::S_IFCHR,
        Mode::from_bits_truncate(spec.mode),
        makedev(spec.major, spec.minor),
    ) {
        Ok(()) => Ok(NodeOutcome::Created),
        Err(Errno::EEXIST) => Ok(NodeOutcome::AlreadyExists),
        Err(e) => Err(ShipError::io(path, e.into())),
    }
}

/// Creates every node in `specs`, logging failures instead of returning them.
///
/// Returns the number of nodes that could not be created.
pub fn create_device_nodes(dev_dir: &Path, specs: &[DeviceNodeSpec]) -> usize {
    let mut failed = 0;
    for spec in specs {
        match create_device_node(dev_dir, spec) {
            Ok(outcome) => tracing::debug!(node = spec.name, ?outcome, "device node ready"),
            Err(e) => {
                failed += 1;
                tracing::warn!(node = spec.name, error = %e, "failed to create device node");
            }
        }
    }
    failed
}
