//! # ship-rootfs
//!
//! Builds the minimal root filesystem a ship container runs in.
//!
//! Instead of unpacking an OS image, the assembler copies a short list of
//! host programs together with the shared libraries and dynamic linker
//! they load, and lays out the directories the child later mounts over.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod assembler;
pub mod copy;
pub mod elf;
pub mod layout;
pub mod ldd;
pub mod library_set;
pub mod resolver;
