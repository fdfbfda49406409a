//! Unified error types for the ship workspace.
//!
//! Best-effort steps (missing programs, failed mounts, device nodes) never
//! surface as errors; they are logged where they happen. What remains here
//! are the failures that stop a run.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum ShipError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A privileged operation was refused by the kernel.
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Description of the denied operation.
        message: String,
    },

    /// An executable's ELF metadata could not be read.
    #[error("malformed ELF file {path}: {message}")]
    Elf {
        /// Path of the offending executable.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

impl ShipError {
    /// Wraps an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, ShipError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_display_includes_path() {
        let err = ShipError::io(
            "/tmp/rootfs",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/rootfs"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn not_found_display_names_kind() {
        let err = ShipError::NotFound {
            kind: "program",
            id: "bash".into(),
        };
        assert_eq!(err.to_string(), "program not found: bash");
    }
}
