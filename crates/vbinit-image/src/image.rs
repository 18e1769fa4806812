//! The immutable program image: raw firmware bytes plus their table directory.
//!
//! Every read is bounds-checked and little-endian. Offsets are plain `usize`
//! byte positions from the start of the image; 16-bit pointers stored in the
//! image are widened before use.

use std::path::Path;

use crate::error::ImageError;
use crate::header::{self, ImageFormat};
use crate::tables::{TableDirectory, TableId};

pub(crate) fn read_u8(bytes: &[u8], offset: usize) -> Result<u8, ImageError> {
    bytes.get(offset).copied().ok_or(ImageError::OutOfBounds {
        offset,
        width: 1,
        len: bytes.len(),
    })
}

pub(crate) fn read_u16_le(bytes: &[u8], offset: usize) -> Result<u16, ImageError> {
    let raw = read_array::<2>(bytes, offset)?;
    Ok(u16::from_le_bytes(raw))
}

pub(crate) fn read_u32_le(bytes: &[u8], offset: usize) -> Result<u32, ImageError> {
    let raw = read_array::<4>(bytes, offset)?;
    Ok(u32::from_le_bytes(raw))
}

fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> Result<[u8; N], ImageError> {
    let out_of_bounds = || ImageError::OutOfBounds {
        offset,
        width: N,
        len: bytes.len(),
    };
    let end = offset.checked_add(N).ok_or_else(out_of_bounds)?;
    let slice = bytes.get(offset..end).ok_or_else(out_of_bounds)?;
    let mut raw = [0u8; N];
    raw.copy_from_slice(slice);
    Ok(raw)
}

/// Firmware bytes and the sub-table offsets resolved from their header.
///
/// Created once per device session and never mutated; the interpreter only
/// ever borrows it.
#[derive(Clone, Debug)]
pub struct ProgramImage {
    bytes: Vec<u8>,
    format: ImageFormat,
    tables: TableDirectory,
}

impl ProgramImage {
    /// Locate a BIT or BMP header and resolve the table directory from it.
    ///
    /// BIT wins when both signatures are present.
    pub fn resolve(bytes: Vec<u8>) -> Result<Self, ImageError> {
        let (format, tables) = header::detect(&bytes)?;
        Ok(Self {
            bytes,
            format,
            tables,
        })
    }

    /// Read and resolve an image from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        Self::resolve(bytes)
    }

    /// Wrap bytes with an explicit directory, bypassing header detection.
    pub fn with_tables(bytes: Vec<u8>, tables: TableDirectory) -> Self {
        Self {
            bytes,
            format: ImageFormat::Raw,
            tables,
        }
    }

    /// A bare script with no tables at all.
    pub fn from_script(bytes: Vec<u8>) -> Self {
        Self::with_tables(bytes, TableDirectory::new())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn format(&self) -> &ImageFormat {
        &self.format
    }

    pub fn tables(&self) -> &TableDirectory {
        &self.tables
    }

    /// Pre-BIT images whose BMP major version is 2 or lower.
    ///
    /// Only these carry the memory-init and sequence tables that the
    /// `CONFIGURE_*` opcodes consume.
    pub fn is_legacy(&self) -> bool {
        match &self.format {
            ImageFormat::Bmp(bmp) => bmp.is_legacy(),
            ImageFormat::Bit(_) => false,
            ImageFormat::Raw => self.tables.is_legacy(),
        }
    }

    /// Base offset of a sub-table, or `MissingTable` if the header left it out.
    pub fn table(&self, id: TableId) -> Result<usize, ImageError> {
        self.tables
            .get(id)
            .map(usize::from)
            .ok_or(ImageError::MissingTable(id))
    }

    pub fn read_u8(&self, offset: usize) -> Result<u8, ImageError> {
        read_u8(&self.bytes, offset)
    }

    pub fn read_i8(&self, offset: usize) -> Result<i8, ImageError> {
        read_u8(&self.bytes, offset).map(|b| b as i8)
    }

    pub fn read_u16(&self, offset: usize) -> Result<u16, ImageError> {
        read_u16_le(&self.bytes, offset)
    }

    pub fn read_u32(&self, offset: usize) -> Result<u32, ImageError> {
        read_u32_le(&self.bytes, offset)
    }

    /// Borrow `len` bytes starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> Result<&[u8], ImageError> {
        offset
            .checked_add(len)
            .and_then(|end| self.bytes.get(offset..end))
            .ok_or(ImageError::OutOfBounds {
                offset,
                width: len,
                len: self.bytes.len(),
            })
    }
}
