//! # ship
//!
//! Runs a shell inside fresh Linux namespaces, chrooted into a minimal
//! rootfs assembled from the host's own programs and libraries.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

mod cli;

use std::process::ExitCode;

use clap::Parser;
use ship_common::types::Role;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // The child role is decided before clap so user flags never shadow it.
    let code = match Role::from_args(std::env::args_os()) {
        Role::Child { rootfs, args } => ship_runtime::bootstrap::run(&rootfs, &args)?,
        Role::Launcher { .. } => cli::execute(&Cli::parse())?,
    };
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX)))
}
