//! Dynamic-linker discovery from ELF program headers.
//!
//! `ldd` usually lists the loader, but not always under the path the
//! executable actually requests. The `PT_INTERP` segment is authoritative:
//! without that exact file in the rootfs, `execve` fails with `ENOENT`.

use std::path::{Path, PathBuf};

use object::read::elf::{FileHeader, ProgramHeader};
use object::{Endianness, FileKind, elf};
use ship_common::error::{Result, ShipError};

/// Returns the interpreter requested by the executable at `path`.
///
/// Non-ELF files and statically linked executables yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its ELF headers are
/// malformed.
pub fn read_interpreter(path: &Path) -> Result<Option<PathBuf>> {
    let data = std::fs::read(path).map_err(|e| ShipError::io(path, e))?;
    let interp = match FileKind::parse(&*data) {
        Ok(FileKind::Elf32) => interpreter_of::<elf::FileHeader32<Endianness>>(&data),
        Ok(FileKind::Elf64) => interpreter_of::<elf::FileHeader64<Endianness>>(&data),
        _ => return Ok(None),
    }
    .map_err(|message| ShipError::Elf {
        path: path.to_path_buf(),
        message,
    })?;

    let Some(raw) = interp else {
        return Ok(None);
    };
    let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
    let text = String::from_utf8_lossy(&raw[..end]);
    let text = text.trim_end();
    if text.is_empty() {
        return Ok(None);
    }
    tracing::trace!(binary = %path.display(), interpreter = text, "found PT_INTERP");
    Ok(Some(PathBuf::from(text)))
}

fn interpreter_of<H: FileHeader<Endian = Endianness>>(
    data: &[u8],
) -> std::result::Result<Option<&[u8]>, String> {
    let header = H::parse(data).map_err(|e| e.to_string())?;
    let endian = header.endian().map_err(|e| e.to_string())?;
    let segments = header
        .program_headers(endian, data)
        .map_err(|e| e.to_string())?;
    for segment in segments {
        if segment.p_type(endian) == elf::PT_INTERP {
            let bytes = segment
                .data(endian, data)
                .map_err(|()| "PT_INTERP segment lies outside the file".to_string())?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}
