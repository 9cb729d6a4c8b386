//! Input handling for raw metadata images.
//!
//! [`File`] owns the bytes of a metadata blob, either memory-mapped from disk
//! or supplied as an in-memory buffer. It is deliberately format-agnostic:
//! PE container parsing is out of scope here, so the input is expected to be
//! the metadata region itself, starting at the BSJB root signature.
//!
//! Submodules provide the primitives the rest of the crate parses with:
//! bounds-checked little-endian I/O ([`io`]) and the cursor-based [`parser::Parser`].

pub mod io;
pub mod parser;

use std::{fs::OpenOptions, path::Path};

use memmap2::Mmap;

use crate::Result;

/// Backing storage for a metadata image.
enum Backing {
    /// Memory-mapped file contents
    Mapped(Mmap),
    /// In-memory buffer
    Owned(Vec<u8>),
}

/// An owned metadata image, loaded from disk or memory.
///
/// Large images from disk are memory-mapped rather than read into a buffer,
/// so the lazy table accessors only fault in the pages they actually touch.
pub struct File {
    data: Backing,
}

impl File {
    /// Memory-map a metadata image from disk.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// mapped, or [`crate::Error::Empty`] if it has no content.
    pub fn from_file(path: &Path) -> Result<File> {
        let file = OpenOptions::new().read(true).open(path)?;

        // Safety: the mapping is read-only and lives as long as this File
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.is_empty() {
            return Err(crate::Error::Empty);
        }

        Ok(File {
            data: Backing::Mapped(mmap),
        })
    }

    /// Take ownership of an in-memory metadata image.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if `data` is empty.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(crate::Error::Empty);
        }

        Ok(File {
            data: Backing::Owned(data),
        })
    }

    /// Access the raw bytes of the image.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        match &self.data {
            Backing::Mapped(mmap) => mmap,
            Backing::Owned(vec) => vec,
        }
    }

    /// Returns the size of the image in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// Returns `true` if the image holds no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }
}
