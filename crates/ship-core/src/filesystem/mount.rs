//! Pseudo-filesystem mounts for the container root.
//!
//! Mounting is best effort. The plan is an ordered list of steps, each a
//! mount attempt plus what to do if it fails. Failures are logged and
//! recorded in a [`MountSummary`], never returned.

use std::path::{Path, PathBuf};

use nix::mount::{MsFlags, mount};

use super::devices::{self, FALLBACK_DEVICES};

/// Parameters for one `mount(2)` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRequest {
    /// Source device or pseudo-name.
    pub source: String,
    /// Mount point, absolute inside the container.
    pub target: PathBuf,
    /// Filesystem type.
    pub fstype: String,
    /// Mount flags.
    pub flags: MsFlags,
    /// Filesystem-specific options.
    pub data: Option<String>,
}

impl MountRequest {
    /// Creates a flagless request with no options.
    #[must_use]
    pub fn new(source: &str, target: &str, fstype: &str) -> Self {
        Self {
            source: source.to_string(),
            target: PathBuf::from(target),
            fstype: fstype.to_string(),
            flags: MsFlags::empty(),
            data: None,
        }
    }

    /// Returns the mount point resolved under `root`.
    #[must_use]
    pub fn target_under(&self, root: &Path) -> PathBuf {
        root.join(self.target.strip_prefix("/").unwrap_or(&self.target))
    }
}

/// What to do when a mount attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// Log and move on.
    None,
    /// Populate the mount point with [`FALLBACK_DEVICES`].
    DeviceNodes,
}

/// One entry of a mount plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountStep {
    /// The mount to attempt.
    pub request: MountRequest,
    /// Applied only if the attempt fails.
    pub fallback: Fallback,
}

/// Outcome of running a mount plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MountSummary {
    /// Mount points that were mounted.
    pub mounted: Vec<PathBuf>,
    /// Mount points whose mount failed.
    pub failed: Vec<PathBuf>,
    /// Device nodes that could not be created by a fallback.
    pub device_failures: usize,
}

/// The standard plan: `/proc`, `/sys`, then `/dev` with a device-node fallback.
#[must_use]
pub fn pseudo_filesystem_plan() -> Vec<MountStep> {
    vec![
        MountStep {
            request: MountRequest::new("proc", "/proc", "proc"),
            fallback: Fallback::None,
        },
        MountStep {
            request: MountRequest::new("sys", "/sys", "sysfs"),
            fallback: Fallback::None,
        },
        MountStep {
            request: MountRequest::new("devtmpfs", "/dev", "devtmpfs"),
            fallback: Fallback::DeviceNodes,
        },
    ]
}

/// Runs `plan` top to bottom against `root`.
pub fn apply_plan(root: &Path, plan: &[MountStep]) -> MountSummary {
    let mut summary = MountSummary::default();
    for step in plan {
        let target = step.request.target_under(root);
        match mount_one(&step.request, &target) {
            Ok(()) => {
                tracing::debug!(target = %target.display(), fstype = %step.request.fstype, "mounted");
                summary.mounted.push(target);
            }
            Err(e) => {
                tracing::warn!(
                    target = %target.display(),
                    fstype = %step.request.fstype,
                    error = %e,
                    "mount failed"
                );
                if step.fallback == Fallback::DeviceNodes {
                    tracing::info!(dir = %target.display(), "falling back to static device nodes");
                    summary.device_failures += devices::create_device_nodes(&target, FALLBACK_DEVICES);
                }
                summary.failed.push(target);
            }
        }
    }
    summary
}

fn mount_one(request: &MountRequest, target: &Path) -> nix::Result<()> {
    mount(
        Some(request.source.as_str()),
        target,
        Some(request.fstype.as_str()),
        request.flags,
        request.data.as_deref(),
    )
}
