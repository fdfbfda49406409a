//! Domain primitive types used across the ship workspace.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::CHILD_ROLE_MARKER;

/// A required program located on the host search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBinary {
    /// Name the program was requested by.
    pub name: String,
    /// Absolute host path of the executable.
    pub host_path: PathBuf,
}

/// Which namespaces the confined child is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceSet {
    /// Private mount table. Always honored; chroot without it would leak
    /// the pseudo-filesystem mounts onto the host.
    pub mount: bool,
    /// Private hostname.
    pub uts: bool,
    /// Private process ID space.
    pub pid: bool,
}

impl Default for NamespaceSet {
    fn default() -> Self {
        Self {
            mount: true,
            uts: true,
            pid: true,
        }
    }
}

/// Role of the current process, decided from its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    /// Outer supervising process.
    Launcher {
        /// Arguments after the program name.
        args: Vec<OsString>,
    },
    /// Re-executed process running inside the new namespaces.
    Child {
        /// Rootfs to chroot into.
        rootfs: PathBuf,
        /// Forwarded user arguments (informational).
        args: Vec<OsString>,
    },
}

impl Role {
    /// Decides the role from the full argument vector, program name included.
    ///
    /// The child role requires both the marker and a rootfs path; a lone
    /// marker is treated as an ordinary launcher argument. Arguments are
    /// taken as raw OS strings, so non-UTF-8 paths pass through intact.
    #[must_use]
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut rest: Vec<OsString> = args.into_iter().skip(1).map(Into::into).collect();
        if rest.len() >= 2 && rest[0] == CHILD_ROLE_MARKER {
            let tail = rest.split_off(2);
            let rootfs = PathBuf::from(rest.swap_remove(1));
            return Self::Child { rootfs, args: tail };
        }
        Self::Launcher { args: rest }
    }

    /// Builds the argument list the launcher passes when re-executing itself.
    #[must_use]
    pub fn child_args(rootfs: &Path, forwarded: &[OsString]) -> Vec<OsString> {
        let mut out = Vec::with_capacity(forwarded.len() + 2);
        out.push(OsString::from(CHILD_ROLE_MARKER));
        out.push(rootfs.as_os_str().to_os_string());
        out.extend(forwarded.iter().cloned());
        out
    }
}

/// Lifecycle of one invocation across the launcher and its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing has happened yet.
    Unstarted,
    /// The rootfs is assembled or was supplied.
    RootfsReady,
    /// The child runs inside its new namespaces.
    NamespaceSpawned,
    /// The child has changed root and mounted pseudo-filesystems.
    ChrootedAndMounted,
    /// The shell is running.
    ShellRunning,
    /// The process tree has finished.
    Exited,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unstarted => write!(f, "unstarted"),
            Self::RootfsReady => write!(f, "rootfs-ready"),
            Self::NamespaceSpawned => write!(f, "namespace-spawned"),
            Self::ChrootedAndMounted => write!(f, "chrooted-and-mounted"),
            Self::ShellRunning => write!(f, "shell-running"),
            Self::Exited => write!(f, "exited"),
        }
    }
}
