//! Shared-library and interpreter resolution for host executables.

use std::path::{Path, PathBuf};

use crate::elf;
use crate::ldd::{self, LddEntry};

/// Everything an executable needs from the host to start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    /// Absolute host paths of shared libraries.
    pub libraries: Vec<PathBuf>,
    /// Dynamic linker named by `PT_INTERP`, if any.
    pub interpreter: Option<PathBuf>,
    /// Libraries the loader reported as missing.
    pub missing: Vec<String>,
}

impl Dependencies {
    /// Iterates over every path that must be copied, interpreter included.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.libraries
            .iter()
            .map(PathBuf::as_path)
            .chain(self.interpreter.as_deref())
    }
}

/// Strategy for discovering an executable's runtime dependencies.
///
/// Resolution never fails as a whole: anything that cannot be determined
/// is logged and left out, since an incomplete rootfs is still useful.
pub trait DependencyResolver {
    /// Resolves the dependencies of the executable at `binary`.
    fn resolve(&self, binary: &Path) -> Dependencies;
}

/// Resolver backed by the host's `ldd` and the executable's ELF headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LddResolver;

impl DependencyResolver for LddResolver {
    fn resolve(&self, binary: &Path) -> Dependencies {
        let mut deps = Dependencies::default();
        for entry in ldd::run_ldd(binary) {
            match entry {
                LddEntry::Mapped(path) => deps.libraries.push(path),
                LddEntry::Unmapped => {
                    tracing::trace!(binary = %binary.display(), "skipping library without a file");
                }
                LddEntry::NotFound(name) => {
                    tracing::warn!(binary = %binary.display(), library = %name, "ldd missing library");
                    deps.missing.push(name);
                }
            }
        }
        deps.interpreter = match elf::read_interpreter(binary) {
            Ok(interp) => interp,
            Err(e) => {
                tracing::warn!(binary = %binary.display(), error = %e, "could not read ELF interpreter");
                None
            }
        };
        tracing::debug!(
            binary = %binary.display(),
            libraries = deps.libraries.len(),
            interpreter = ?deps.interpreter,
            "resolved dependencies"
        );
        deps
    }
}
