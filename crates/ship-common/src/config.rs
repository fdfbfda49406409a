//! Configuration model for a ship invocation.
//!
//! Every field has a default, so an empty JSON object, a partial file, or
//! no file at all are all valid. The launcher hands its resolved
//! configuration to the child through [`CONFIG_ENV`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONFIG_ENV, DEFAULT_HOSTNAME, DEFAULT_PATH_ENV, DEFAULT_PROGRAMS, DEFAULT_SHELL,
    DEFAULT_TERMINFO_DIRS,
};
use crate::error::{Result, ShipError};
use crate::types::NamespaceSet;

/// Root configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Where to assemble the rootfs. `None` means `<cwd>/tmp/rootfs`.
    pub rootfs_dir: Option<PathBuf>,
    /// Programs copied into the rootfs.
    pub programs: Vec<String>,
    /// Shell started inside the container.
    pub shell: PathBuf,
    /// `PATH` value inside the container.
    pub path_env: String,
    /// Hostname used when a UTS namespace is active.
    pub hostname: String,
    /// Namespaces the child is placed in.
    pub namespaces: NamespaceSet,
    /// Host directories searched for the terminal's terminfo entry.
    pub terminfo_dirs: Vec<PathBuf>,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            rootfs_dir: None,
            programs: DEFAULT_PROGRAMS.iter().map(ToString::to_string).collect(),
            shell: PathBuf::from(DEFAULT_SHELL),
            path_env: DEFAULT_PATH_ENV.to_string(),
            hostname: DEFAULT_HOSTNAME.to_string(),
            namespaces: NamespaceSet::default(),
            terminfo_dirs: DEFAULT_TERMINFO_DIRS.iter().map(PathBuf::from).collect(),
        }
    }
}

impl ShipConfig {
    /// Loads configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ShipError::io(path, e))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Reads the configuration the launcher exported for its child.
    ///
    /// Falls back to defaults when the variable is absent, so a child
    /// started by hand still behaves sensibly.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        match std::env::var(CONFIG_ENV) {
            Ok(raw) => {
                let config: Self = serde_json::from_str(&raw)?;
                config.validate()?;
                Ok(config)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    /// Serializes the configuration for [`CONFIG_ENV`].
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_env_value(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ShipError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if !self.shell.is_absolute() {
            return Err(ShipError::Config {
                message: format!("shell must be an absolute path: {}", self.shell.display()),
            });
        }
        if !self.namespaces.mount {
            return Err(ShipError::Config {
                message: "the mount namespace cannot be disabled".into(),
            });
        }
        if self.namespaces.uts && self.hostname.is_empty() {
            return Err(ShipError::Config {
                message: "hostname must not be empty when a UTS namespace is used".into(),
            });
        }
        Ok(())
    }

    /// Returns where the rootfs should be assembled.
    ///
    /// Relative paths are resolved against the working directory by the
    /// assembler, at the moment assembly starts.
    #[must_use]
    pub fn rootfs_target(&self) -> PathBuf {
        self.rootfs_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::constants::DEFAULT_ROOTFS_RELATIVE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ShipConfig::default().validate().expect("defaults validate");
    }

    #[test]
    fn default_programs_include_shell() {
        let config = ShipConfig::default();
        assert!(config.programs.iter().any(|p| p == "bash"));
        assert_eq!(config.shell, PathBuf::from("/bin/bash"));
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: ShipConfig = serde_json::from_str(r#"{"hostname":"box"}"#).expect("parse");
        assert_eq!(config.hostname, "box");
        assert_eq!(config.path_env, DEFAULT_PATH_ENV);
        assert!(config.namespaces.pid);
    }

    #[test]
    fn relative_shell_is_rejected() {
        let config = ShipConfig {
            shell: PathBuf::from("bash"),
            ..ShipConfig::default()
        };
        assert!(matches!(config.validate(), Err(ShipError::Config { .. })));
    }

    #[test]
    fn disabling_mount_namespace_is_rejected() {
        let mut config = ShipConfig::default();
        config.namespaces.mount = false;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rootfs_target_defaults_to_relative_tmp() {
        let config = ShipConfig::default();
        assert_eq!(config.rootfs_target(), PathBuf::from("tmp/rootfs"));
    }

    #[test]
    fn configured_rootfs_dir_wins() {
        let config = ShipConfig {
            rootfs_dir: Some(PathBuf::from("/srv/rootfs")),
            ..ShipConfig::default()
        };
        assert_eq!(config.rootfs_target(), PathBuf::from("/srv/rootfs"));
    }

    #[test]
    fn from_file_reads_json() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("ship.json");
        std::fs::write(&path, r#"{"programs":["ls"]}"#).expect("write");
        let config = ShipConfig::from_file(&path).expect("load");
        assert_eq!(config.programs, vec!["ls".to_string()]);
    }

    #[test]
    fn env_value_round_trips() {
        let config = ShipConfig {
            hostname: "inner".into(),
            ..ShipConfig::default()
        };
        let raw = config.to_env_value().expect("serialize");
        let back: ShipConfig = serde_json::from_str(&raw).expect("parse");
        assert_eq!(back, config);
    }
}
