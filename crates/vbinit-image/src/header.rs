//! BIT and BMP header detection.
//!
//! Both formats are found by scanning the image for a five-byte signature.
//! BIT headers carry a list of typed entries (`'I'` init tables, `'M'` memory,
//! `'C'` clocks); BMP headers store table pointers at fixed positions.

use serde::Serialize;

use crate::error::ImageError;
use crate::image::{read_u8, read_u16_le};
use crate::tables::TableDirectory;

pub const BIT_SIGNATURE: [u8; 5] = [0xff, 0xb8, b'B', b'I', b'T'];
pub const BMP_SIGNATURE: [u8; 5] = [0xff, 0x7f, b'N', b'V', 0x00];

/// BIT entries start right after the fixed part of the header.
const BIT_ENTRIES_OFFSET: usize = 12;
const BIT_ENTRY_MIN_LEN: u8 = 6;

/// Which header the table directory was resolved from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ImageFormat {
    Bit(BitHeader),
    Bmp(BmpHeader),
    /// Directory supplied by the caller, no header in the bytes.
    Raw,
}

impl ImageFormat {
    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Bit(_) => "BIT",
            ImageFormat::Bmp(_) => "BMP",
            ImageFormat::Raw => "raw",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BitHeader {
    pub offset: usize,
    pub version: u16,
    pub header_len: u8,
    pub entry_len: u8,
    pub entries: Vec<BitEntry>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BitEntry {
    pub id: u8,
    pub version: u8,
    pub length: u16,
    pub offset: u16,
}

impl BitHeader {
    pub fn parse(bytes: &[u8], offset: usize) -> Result<Self, ImageError> {
        let version = read_u16_le(bytes, offset + 6)?;
        let header_len = read_u8(bytes, offset + 8)?;
        let entry_len = read_u8(bytes, offset + 9)?;
        let count = read_u8(bytes, offset + 10)?;

        let mut entries = Vec::with_capacity(usize::from(count));
        if entry_len >= BIT_ENTRY_MIN_LEN {
            let mut at = offset + BIT_ENTRIES_OFFSET;
            for _ in 0..count {
                entries.push(BitEntry {
                    id: read_u8(bytes, at)?,
                    version: read_u8(bytes, at + 1)?,
                    length: read_u16_le(bytes, at + 2)?,
                    offset: read_u16_le(bytes, at + 4)?,
                });
                at += usize::from(entry_len);
            }
        }

        Ok(Self {
            offset,
            version,
            header_len,
            entry_len,
            entries,
        })
    }

    /// First entry with the given id.
    pub fn entry(&self, id: u8) -> Option<&BitEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BmpHeader {
    pub offset: usize,
    pub major: u8,
    pub minor: u8,
}

impl BmpHeader {
    pub fn parse(bytes: &[u8], offset: usize) -> Result<Self, ImageError> {
        Ok(Self {
            offset,
            major: read_u8(bytes, offset + 5)?,
            minor: read_u8(bytes, offset + 6)?,
        })
    }

    pub fn is_legacy(&self) -> bool {
        self.major <= 2
    }
}

/// Position of the first occurrence of `signature`.
pub fn find_signature(bytes: &[u8], signature: &[u8]) -> Option<usize> {
    if signature.is_empty() {
        return None;
    }
    bytes.windows(signature.len()).position(|w| w == signature)
}

pub(crate) fn detect(bytes: &[u8]) -> Result<(ImageFormat, TableDirectory), ImageError> {
    if let Some(at) = find_signature(bytes, &BIT_SIGNATURE) {
        let header = BitHeader::parse(bytes, at)?;
        let tables = TableDirectory::from_bit(bytes, &header)?;
        return Ok((ImageFormat::Bit(header), tables));
    }

    if let Some(at) = find_signature(bytes, &BMP_SIGNATURE) {
        let header = BmpHeader::parse(bytes, at)?;
        let tables = TableDirectory::from_bmp(bytes, &header)?;
        return Ok((ImageFormat::Bmp(header), tables));
    }

    Err(ImageError::Format { len: bytes.len() })
}
