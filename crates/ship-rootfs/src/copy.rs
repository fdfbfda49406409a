//! Single-file materialization from the host into the rootfs.
//!
//! Symlinks are reproduced as symlinks with the same target, so library
//! aliasing such as `libc.so.6 -> libc-2.31.so` survives the copy. Every
//! write creates or truncates; re-running a copy is always safe.

use std::fs::{self, OpenOptions};
use std::io;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt, symlink};
use std::path::Path;

use ship_common::constants::DIR_MODE;
use ship_common::error::{Result, ShipError};

/// Copies `src` to `dst`, creating parent directories as needed.
///
/// Regular files keep their permission bits and are flushed to disk
/// before returning. Symlinks are recreated, replacing whatever was at
/// `dst`.
///
/// # Errors
///
/// Returns an error if `src` cannot be inspected or read, or if any part
/// of the destination cannot be created or written.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(src).map_err(|e| ShipError::io(src, e))?;
    if let Some(parent) = dst.parent() {
        create_dir_all(parent)?;
    }

    if meta.file_type().is_symlink() {
        let target = fs::read_link(src).map_err(|e| ShipError::io(src, e))?;
        remove_if_present(dst)?;
        symlink(&target, dst).map_err(|e| ShipError::io(dst, e))?;
        tracing::trace!(src = %src.display(), target = %target.display(), "recreated symlink");
        return Ok(());
    }

    copy_contents(src, dst, meta.permissions().mode())
}

/// Copies what `src` points at to `dst` as a regular file.
///
/// Used for program binaries, whose host symlinks may lead through
/// directories (such as `/etc/alternatives`) that the rootfs does not
/// carry.
///
/// # Errors
///
/// Returns an error if `src` does not resolve to a readable file, or if
/// the destination cannot be written.
pub fn copy_file_resolved(src: &Path, dst: &Path) -> Result<()> {
    let meta = fs::metadata(src).map_err(|e| ShipError::io(src, e))?;
    if let Some(parent) = dst.parent() {
        create_dir_all(parent)?;
    }
    copy_contents(src, dst, meta.permissions().mode())
}

fn copy_contents(src: &Path, dst: &Path, mode: u32) -> Result<()> {
    let mut input = fs::File::open(src).map_err(|e| ShipError::io(src, e))?;
    // Replace rather than write through: a previous run may have left a
    // symlink here, or a copy whose mode forbids writing.
    if fs::symlink_metadata(dst).is_ok_and(|m| !m.is_dir()) {
        remove_if_present(dst)?;
    }
    let mut output = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(dst)
        .map_err(|e| ShipError::io(dst, e))?;
    let _ = io::copy(&mut input, &mut output).map_err(|e| ShipError::io(dst, e))?;
    // The open mode is filtered by the umask and ignored for existing files.
    output
        .set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| ShipError::io(dst, e))?;
    output.sync_all().map_err(|e| ShipError::io(dst, e))?;
    Ok(())
}

/// Creates `dir` and its parents with the rootfs directory mode.
///
/// An existing directory is not an error.
///
/// # Errors
///
/// Returns an error if any component cannot be created.
pub fn create_dir_all(dir: &Path) -> Result<()> {
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| ShipError::io(dir, e))
}

/// Removes a file, symlink, or directory tree at `path` if one exists.
///
/// # Errors
///
/// Returns an error if the entry exists but cannot be removed.
pub fn remove_if_present(path: &Path) -> Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|e| ShipError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_contents_and_mode() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("tool");
        fs::write(&src, b"#!/bin/sh\necho hi\n").expect("write");
        fs::set_permissions(&src, fs::Permissions::from_mode(0o750)).expect("chmod");

        let dst = dir.path().join("root/usr/bin/tool");
        copy_file(&src, &dst).expect("copy");

        assert_eq!(fs::read(&dst).expect("read"), b"#!/bin/sh\necho hi\n");
        let mode = fs::metadata(&dst).expect("stat").permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn preserves_symlinks_verbatim() {
        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("libc-2.31.so");
        fs::write(&real, b"elf").expect("write");
        let link = dir.path().join("libc.so.6");
        symlink("libc-2.31.so", &link).expect("symlink");

        let dst = dir.path().join("root/lib/libc.so.6");
        copy_file(&link, &dst).expect("copy");

        let meta = fs::symlink_metadata(&dst).expect("lstat");
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&dst).expect("readlink"), Path::new("libc-2.31.so"));
    }

    #[test]
    fn second_copy_overwrites_instead_of_appending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("a");
        let dst = dir.path().join("out/a");
        fs::write(&src, b"first").expect("write");
        copy_file(&src, &dst).expect("copy 1");
        fs::write(&src, b"2nd").expect("write");
        copy_file(&src, &dst).expect("copy 2");
        assert_eq!(fs::read(&dst).expect("read"), b"2nd");
    }

    #[test]
    fn regular_file_replaces_stale_symlink() {
        let dir = tempfile::tempdir().expect("tempdir");
        let victim = dir.path().join("victim");
        fs::write(&victim, b"keep").expect("write");
        let dst = dir.path().join("dst");
        symlink(&victim, &dst).expect("symlink");

        let src = dir.path().join("src");
        fs::write(&src, b"new").expect("write");
        copy_file(&src, &dst).expect("copy");

        assert_eq!(fs::read(&victim).expect("read"), b"keep");
        assert!(!fs::symlink_metadata(&dst).expect("lstat").file_type().is_symlink());
    }

    #[test]
    fn read_only_copy_can_be_refreshed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let src = dir.path().join("bin");
        fs::write(&src, b"v1").expect("write");
        fs::set_permissions(&src, fs::Permissions::from_mode(0o555)).expect("chmod");
        let dst = dir.path().join("out/bin");
        copy_file(&src, &dst).expect("copy 1");
        copy_file(&src, &dst).expect("copy 2");
        assert_eq!(fs::read(&dst).expect("read"), b"v1");
    }

    #[test]
    fn resolved_copy_materializes_link_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let real = dir.path().join("vim.basic");
        fs::write(&real, b"binary").expect("write");
        fs::set_permissions(&real, fs::Permissions::from_mode(0o755)).expect("chmod");
        let link = dir.path().join("vi");
        symlink(&real, &link).expect("symlink");

        let dst = dir.path().join("root/usr/bin/vi");
        copy_file_resolved(&link, &dst).expect("copy");

        let meta = fs::symlink_metadata(&dst).expect("lstat");
        assert!(meta.file_type().is_file());
        assert_eq!(meta.permissions().mode() & 0o777, 0o755);
        assert_eq!(fs::read(&dst).expect("read"), b"binary");
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = copy_file(&dir.path().join("nope"), &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, ShipError::Io { .. }));
    }

    #[test]
    fn remove_if_present_handles_all_kinds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let d = dir.path().join("d/nested");
        fs::create_dir_all(&d).expect("mkdir");
        remove_if_present(&dir.path().join("d")).expect("remove dir");
        remove_if_present(&dir.path().join("absent")).expect("remove absent");
        assert!(!dir.path().join("d").exists());
    }
}
