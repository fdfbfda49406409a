//! Deduplicated accumulation of library and interpreter paths.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Upper bound on symlink hops followed from one path, as the kernel's.
const MAX_LINK_HOPS: usize = 40;

/// Host paths that must exist inside the rootfs, each recorded once.
///
/// Ordered only so that assembly logs are stable between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibrarySet {
    paths: BTreeSet<PathBuf>,
}

impl LibrarySet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single path. Returns `false` if it was already present.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    /// Adds `path`, every symlink hop between it and its final target, and
    /// the canonical path.
    ///
    /// The rootfs must reproduce the host's symlink chain: each link is
    /// copied as a link, so every path it names has to be copied too.
    /// Relative targets are joined onto the link's directory lexically,
    /// without resolving directory symlinks, because that is how the
    /// copied link will be read inside the rootfs.
    pub fn insert_with_links(&mut self, path: &Path) {
        if path.as_os_str().is_empty() {
            return;
        }
        let _ = self.insert(path);

        let mut current = path.to_path_buf();
        for _ in 0..MAX_LINK_HOPS {
            let Ok(target) = std::fs::read_link(&current) else {
                break;
            };
            let next = join_lexically(current.parent().unwrap_or(Path::new("/")), &target);
            tracing::trace!(link = %current.display(), target = %next.display(), "recording symlink hop");
            if !self.insert(next.clone()) {
                break;
            }
            current = next;
        }

        if let Ok(resolved) = std::fs::canonicalize(path) {
            if resolved != path {
                let _ = self.insert(resolved);
            }
        }
    }

    /// Returns whether `path` is recorded.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterates over the recorded paths.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.paths.iter().map(PathBuf::as_path)
    }
}

/// Joins `target` onto `base` and folds `.` and `..` without touching the
/// filesystem. An absolute `target` replaces `base`.
#[must_use]
pub fn join_lexically(base: &Path, target: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.join(target).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let _ = out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_paths_are_kept_once() {
        let mut set = LibrarySet::new();
        assert!(set.insert("/lib/x86_64-linux-gnu/libc.so.6"));
        assert!(!set.insert("/lib/x86_64-linux-gnu/libc.so.6"));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn symlink_adds_link_and_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonicalize");
        let real = root.join("libz.so.1.2.13");
        std::fs::write(&real, b"elf").expect("write");
        let link = root.join("libz.so.1");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        let mut set = LibrarySet::new();
        set.insert_with_links(&link);
        set.insert_with_links(&link);
        set.insert_with_links(&real);

        assert_eq!(set.len(), 2);
        assert!(set.contains(&link));
        assert!(set.contains(&real));
    }

    #[test]
    fn every_hop_of_a_chain_is_recorded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonicalize");
        std::fs::create_dir_all(root.join("lib/arch")).expect("mkdir");
        std::fs::write(root.join("lib/arch/ld-2.36.so"), b"elf").expect("write");
        // ld.so -> arch/ld.so.2 -> ld-2.36.so, one absolute hop, one relative.
        std::os::unix::fs::symlink("ld-2.36.so", root.join("lib/arch/ld.so.2")).expect("symlink");
        std::os::unix::fs::symlink(root.join("lib/arch/ld.so.2"), root.join("lib/ld.so"))
            .expect("symlink");

        let mut set = LibrarySet::new();
        set.insert_with_links(&root.join("lib/ld.so"));

        assert!(set.contains(&root.join("lib/ld.so")));
        assert!(set.contains(&root.join("lib/arch/ld.so.2")));
        assert!(set.contains(&root.join("lib/arch/ld-2.36.so")));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn relative_parent_hops_stay_lexical() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = std::fs::canonicalize(dir.path()).expect("canonicalize");
        std::fs::create_dir_all(root.join("usr/lib")).expect("mkdir");
        std::fs::create_dir_all(root.join("lib")).expect("mkdir");
        std::fs::write(root.join("usr/lib/libtinfo.so.6.4"), b"elf").expect("write");
        std::os::unix::fs::symlink("../usr/lib/libtinfo.so.6.4", root.join("lib/libtinfo.so.6"))
            .expect("symlink");

        let mut set = LibrarySet::new();
        set.insert_with_links(&root.join("lib/libtinfo.so.6"));

        assert!(set.contains(&root.join("usr/lib/libtinfo.so.6.4")));
        assert!(set.iter().all(|p| !p.components().any(|c| c == Component::ParentDir)));
    }

    #[test]
    fn link_cycles_terminate() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = dir.path().join("a.so");
        let b = dir.path().join("b.so");
        std::os::unix::fs::symlink(&b, &a).expect("symlink");
        std::os::unix::fs::symlink(&a, &b).expect("symlink");

        let mut set = LibrarySet::new();
        set.insert_with_links(&a);
        assert!(set.contains(&a));
        assert!(set.contains(&b));
    }

    #[test]
    fn lexical_join_folds_dots() {
        assert_eq!(
            join_lexically(Path::new("/lib/x86_64-linux-gnu"), Path::new("../../usr/./lib/libc.so.6")),
            PathBuf::from("/usr/lib/libc.so.6")
        );
        assert_eq!(
            join_lexically(Path::new("/lib64"), Path::new("/lib/ld.so")),
            PathBuf::from("/lib/ld.so")
        );
    }

    #[test]
    fn unresolvable_path_is_still_recorded() {
        let mut set = LibrarySet::new();
        set.insert_with_links(Path::new("/nonexistent/libghost.so"));
        assert!(set.contains(Path::new("/nonexistent/libghost.so")));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn empty_path_is_ignored() {
        let mut set = LibrarySet::new();
        set.insert_with_links(Path::new(""));
        assert!(set.is_empty());
    }
}
