//! Parser for the host dynamic-library report (`ldd`).
//!
//! Example report:
//! ```text
//!     linux-vdso.so.1 (0x00007ffc3b5f2000)
//!     libtinfo.so.6 => /lib/x86_64-linux-gnu/libtinfo.so.6 (0x00007f1c2a9e0000)
//!     libc.so.6 => /lib/x86_64-linux-gnu/libc.so.6 (0x00007f1c2a7b8000)
//!     /lib64/ld-linux-x86-64.so.2 (0x00007f1c2aa3a000)
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use ship_common::constants::LDD_BINARY;

/// One meaningful line of an `ldd` report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LddEntry {
    /// The library resolves to this absolute host path.
    Mapped(PathBuf),
    /// Provided by the kernel or otherwise without a file (the vDSO).
    Unmapped,
    /// The loader could not find the named library.
    NotFound(String),
}

/// Parses a single report line.
///
/// Returns `None` for blank lines and for prose such as
/// `statically linked`.
#[must_use]
pub fn parse_ldd_line(line: &str) -> Option<LddEntry> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if let Some((name, rhs)) = line.split_once("=>") {
        let rhs = rhs.trim();
        if rhs.starts_with("not found") {
            return Some(LddEntry::NotFound(name.trim().to_string()));
        }
        let path = strip_load_address(rhs);
        return Some(if path.starts_with('/') {
            LddEntry::Mapped(PathBuf::from(path))
        } else {
            LddEntry::Unmapped
        });
    }

    if line.starts_with('/') {
        return Some(LddEntry::Mapped(PathBuf::from(strip_load_address(line))));
    }
    if line.contains("(0x") {
        return Some(LddEntry::Unmapped);
    }
    None
}

/// Parses a whole report, dropping lines that carry no entry.
#[must_use]
pub fn parse_ldd_output(output: &str) -> Vec<LddEntry> {
    output.lines().filter_map(parse_ldd_line).collect()
}

/// Runs `ldd` on `binary` and parses its report.
///
/// A tool that is missing or refuses the input (static executables,
/// scripts) yields an empty report rather than an error.
#[must_use]
pub fn run_ldd(binary: &Path) -> Vec<LddEntry> {
    let output = match Command::new(LDD_BINARY).arg(binary).output() {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!(binary = %binary.display(), error = %e, "could not run {LDD_BINARY}");
            return Vec::new();
        }
    };
    if !output.status.success() {
        tracing::debug!(
            binary = %binary.display(),
            status = %output.status,
            "no dynamic dependencies reported"
        );
        return Vec::new();
    }
    parse_ldd_output(&String::from_utf8_lossy(&output.stdout))
}

fn strip_load_address(text: &str) -> &str {
    text.split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
}
