//! Command-line options and dispatch for the launcher role.

use std::ffi::OsString;
use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ship_common::config::ShipConfig;
use ship_common::constants::APP_NAME;
use ship_rootfs::assembler::RootfsAssembler;
use ship_runtime::launcher;

/// ship: a shell in its own namespaces over a minimal host-derived rootfs.
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Use an existing rootfs instead of assembling one.
    ///
    /// With `--assemble-only`, the directory to assemble into.
    #[arg(long, value_name = "DIR")]
    pub rootfs: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, value_name = "FILE", env = "SHIP_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Shell to run inside the container.
    #[arg(long, value_name = "PATH")]
    pub shell: Option<PathBuf>,

    /// Hostname inside the UTS namespace.
    #[arg(long, value_name = "NAME")]
    pub hostname: Option<String>,

    /// Keep the host's UTS namespace.
    #[arg(long)]
    pub no_uts: bool,

    /// Keep the host's PID namespace.
    #[arg(long)]
    pub no_pid: bool,

    /// Build the rootfs, print its path, and exit.
    #[arg(long)]
    pub assemble_only: bool,

    /// Arguments forwarded to the container process.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<OsString>,
}

impl Cli {
    /// Loads the configuration file, if any, and applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the result is
    /// invalid.
    pub fn resolve_config(&self) -> anyhow::Result<ShipConfig> {
        let mut config = match &self.config {
            Some(path) => ShipConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ShipConfig::default(),
        };
        if let Some(shell) = &self.shell {
            config.shell.clone_from(shell);
        }
        if let Some(hostname) = &self.hostname {
            config.hostname.clone_from(hostname);
        }
        if self.no_uts {
            config.namespaces.uts = false;
        }
        if self.no_pid {
            config.namespaces.pid = false;
        }
        if self.assemble_only && self.rootfs.is_some() {
            config.rootfs_dir.clone_from(&self.rootfs);
        }
        config.validate()?;
        Ok(config)
    }
}

/// Runs the launcher role and returns the exit code to report.
///
/// # Errors
///
/// Returns an error if configuration, assembly or the launch fails.
pub fn execute(cli: &Cli) -> anyhow::Result<i32> {
    let config = cli.resolve_config()?;
    tracing::debug!(?config, "resolved configuration");

    if cli.assemble_only {
        let report = RootfsAssembler::from_config(&config).assemble()?;
        if !report.missing_programs.is_empty() {
            tracing::warn!(missing = ?report.missing_programs, "some programs were not found");
        }
        writeln!(std::io::stdout().lock(), "{}", report.root.display())?;
        return Ok(0);
    }

    Ok(launcher::run(&config, cli.rootfs.clone(), &cli.args)?)
}
