//! System-wide constants and default paths.

/// Application name used in log output.
pub const APP_NAME: &str = "ship";

/// Argument that marks a re-executed process as the confined child.
pub const CHILD_ROLE_MARKER: &str = "child";

/// Path the launcher re-executes to start the child.
pub const SELF_EXE: &str = "/proc/self/exe";

/// Environment variable carrying the serialized configuration to the child.
pub const CONFIG_ENV: &str = "SHIP_CONFIG";

/// Rootfs location relative to the current working directory.
pub const DEFAULT_ROOTFS_RELATIVE: &str = "tmp/rootfs";

/// Programs copied into every assembled rootfs.
pub const DEFAULT_PROGRAMS: &[&str] = &[
    "bash", "cd", "ls", "cat", "echo", "touch", "mv", "cp", "rm", "mkdir", "rmdir", "clear",
];

/// Shell started inside the container.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// `PATH` value set inside the container.
pub const DEFAULT_PATH_ENV: &str = "/usr/bin:/bin:/usr/sbin:/sbin";

/// Hostname set when a UTS namespace is active.
pub const DEFAULT_HOSTNAME: &str = "ship";

/// Host directories searched for terminfo entries, in order.
pub const DEFAULT_TERMINFO_DIRS: &[&str] = &["/usr/share/terminfo", "/lib/terminfo", "/etc/terminfo"];

/// Host tool that reports an executable's shared library dependencies.
pub const LDD_BINARY: &str = "ldd";

/// Directories created in every rootfs before anything is copied.
pub const ROOTFS_SKELETON: &[&str] = &["bin", "usr/bin", "lib", "lib64", "usr", "proc", "sys", "dev"];

/// Mode used for every directory the assembler creates.
pub const DIR_MODE: u32 = 0o755;
