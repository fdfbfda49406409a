//! Rootfs assembly: programs, their libraries, and the directory skeleton.
//!
//! Every step is best effort. A missing program, an unresolvable library
//! or a failed copy is logged, recorded in the [`AssemblyReport`], and
//! skipped. A partial environment that can still start a shell is worth
//! more than no container at all.

use std::ffi::OsString;
use std::path::PathBuf;

use ship_common::config::ShipConfig;
use ship_common::error::{Result, ShipError};
use ship_common::types::ResolvedBinary;

use crate::copy;
use crate::layout::RootfsLayout;
use crate::library_set::LibrarySet;
use crate::resolver::{DependencyResolver, LddResolver};

/// Outcome of one assembly run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyReport {
    /// Root of the assembled tree.
    pub root: PathBuf,
    /// Programs found on the host and copied.
    pub programs: Vec<ResolvedBinary>,
    /// Programs not found on the host search path.
    pub missing_programs: Vec<String>,
    /// Host library and interpreter paths that were copied.
    pub libraries: Vec<PathBuf>,
    /// Host paths outside `/lib64`, `/lib` and `/usr`, left out.
    pub unmappable_libraries: Vec<PathBuf>,
    /// Copies that failed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
    /// Terminfo entry copied into the tree, if any.
    pub terminfo: Option<PathBuf>,
}

/// Builds a minimal rootfs from programs installed on the host.
#[derive(Debug, Clone)]
pub struct RootfsAssembler<R = LddResolver> {
    root: PathBuf,
    programs: Vec<String>,
    terminfo_dirs: Vec<PathBuf>,
    term: Option<String>,
    search_path: Option<OsString>,
    resolver: R,
}

impl RootfsAssembler<LddResolver> {
    /// Creates an assembler for `root` copying `programs`.
    ///
    /// A relative `root` is resolved against the working directory when
    /// assembly starts.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, programs: Vec<String>) -> Self {
        Self {
            root: root.into(),
            programs,
            terminfo_dirs: Vec::new(),
            term: None,
            search_path: None,
            resolver: LddResolver,
        }
    }

    /// Creates an assembler from configuration.
    ///
    /// The invoking terminal is taken from `TERM`.
    #[must_use]
    pub fn from_config(config: &ShipConfig) -> Self {
        Self::new(config.rootfs_target(), config.programs.clone())
            .with_terminfo_dirs(config.terminfo_dirs.clone())
            .with_terminal(std::env::var("TERM").ok())
    }
}

impl<R: DependencyResolver> RootfsAssembler<R> {
    /// Replaces the dependency resolver.
    #[must_use]
    pub fn with_resolver<R2: DependencyResolver>(self, resolver: R2) -> RootfsAssembler<R2> {
        RootfsAssembler {
            root: self.root,
            programs: self.programs,
            terminfo_dirs: self.terminfo_dirs,
            term: self.term,
            search_path: self.search_path,
            resolver,
        }
    }

    /// Looks programs up in `path` instead of the process `PATH`.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<OsString>) -> Self {
        self.search_path = Some(path.into());
        self
    }

    /// Sets the terminal name whose terminfo entry should be copied.
    #[must_use]
    pub fn with_terminal(mut self, term: Option<String>) -> Self {
        self.term = term.filter(|t| !t.is_empty());
        self
    }

    /// Sets the host terminfo directories, searched in order.
    #[must_use]
    pub fn with_terminfo_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.terminfo_dirs = dirs;
        self
    }

    /// Assembles the rootfs.
    ///
    /// Safe to run repeatedly against the same root. Per-item problems are
    /// logged and reported in the returned [`AssemblyReport`].
    ///
    /// # Errors
    ///
    /// Returns an error only if the root is relative and the working
    /// directory cannot be determined.
    pub fn assemble(&self) -> Result<AssemblyReport> {
        let root = if self.root.is_absolute() {
            self.root.clone()
        } else {
            let cwd = std::env::current_dir().map_err(|e| ShipError::io(".", e))?;
            cwd.join(&self.root)
        };
        let layout = RootfsLayout::new(&root);
        tracing::info!(root = %root.display(), programs = self.programs.len(), "assembling rootfs");
        let mut report = AssemblyReport {
            root: root.clone(),
            ..AssemblyReport::default()
        };

        if let Err(e) = layout.create_skeleton() {
            tracing::warn!(error = %e, "failed to create rootfs skeleton");
        }

        let mut libraries = LibrarySet::new();
        for name in &self.programs {
            let Some(binary) = self.locate(name) else {
                tracing::warn!(program = %name, "binary {name} not found in PATH");
                report.missing_programs.push(name.clone());
                continue;
            };
            copy_program(&layout, &binary, &mut report);
            let deps = self.resolver.resolve(&binary.host_path);
            for path in deps.paths() {
                libraries.insert_with_links(path);
            }
            report.programs.push(binary);
        }

        tracing::debug!(distinct = libraries.len(), "library set resolved");
        for lib in libraries.iter() {
            let Some(dst) = layout.library_destination(lib) else {
                tracing::debug!(library = %lib.display(), "skipping unmappable library path");
                report.unmappable_libraries.push(lib.to_path_buf());
                continue;
            };
            match copy::copy_file(lib, &dst) {
                Ok(()) => report.libraries.push(lib.to_path_buf()),
                Err(e) => {
                    tracing::warn!(library = %lib.display(), error = %e, "failed to copy library");
                    report.failures.push((lib.to_path_buf(), e.to_string()));
                }
            }
        }

        if let Err(e) = layout.relink_bin() {
            tracing::warn!(error = %e, "failed to link bin -> usr/bin");
            report.failures.push((layout.bin_link(), e.to_string()));
        }

        report.terminfo = self.copy_terminfo(&layout);

        tracing::info!(
            root = %root.display(),
            programs = report.programs.len(),
            missing = report.missing_programs.len(),
            libraries = report.libraries.len(),
            "root filesystem created"
        );
        Ok(report)
    }

    fn locate(&self, name: &str) -> Option<ResolvedBinary> {
        let found = match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                which::which_in(name, Some(paths), cwd)
            }
            None => which::which(name),
        };
        found.ok().map(|host_path| ResolvedBinary {
            name: name.to_string(),
            host_path,
        })
    }

    fn copy_terminfo(&self, layout: &RootfsLayout) -> Option<PathBuf> {
        let term = self.term.as_deref()?;
        if term.contains('/') || term.starts_with('.') {
            tracing::debug!(term, "ignoring suspicious TERM value");
            return None;
        }
        let first = term.chars().next()?;
        let src = self
            .terminfo_dirs
            .iter()
            .map(|dir| dir.join(first.to_string()).join(term))
            .find(|p| p.is_file())?;
        let dst = layout.root().join(src.strip_prefix("/").unwrap_or(&src));
        match copy::copy_file(&src, &dst) {
            Ok(()) => {
                tracing::debug!(term, src = %src.display(), "copied terminfo entry");
                Some(dst)
            }
            Err(e) => {
                tracing::warn!(term, error = %e, "failed to copy terminfo");
                None
            }
        }
    }
}

fn copy_program(layout: &RootfsLayout, binary: &ResolvedBinary, report: &mut AssemblyReport) {
    let Some(file_name) = binary.host_path.file_name() else {
        return;
    };
    let dst = layout.programs_dir().join(file_name);
    tracing::info!(
        src = %binary.host_path.display(),
        dst = %dst.display(),
        "copying binary"
    );
    if let Err(e) = copy::copy_file_resolved(&binary.host_path, &dst) {
        tracing::warn!(program = %binary.name, error = %e, "failed to copy binary");
        report.failures.push((binary.host_path.clone(), e.to_string()));
    }
}
