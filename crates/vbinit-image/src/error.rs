//! Errors raised while resolving or reading a firmware image.

use crate::tables::TableId;

/// Failure to resolve an image or to read from it.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// Neither a BIT nor a BMP signature was found.
    #[error("no BIT or BMP signature found in {len}-byte image")]
    Format { len: usize },

    #[error("read of {width} byte(s) at {offset:#06x} is past the end of the image ({len} bytes)")]
    OutOfBounds {
        offset: usize,
        width: usize,
        len: usize,
    },

    #[error("image has no {0} table")]
    MissingTable(TableId),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to decode one instruction.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown opcode {id:#04x} at {offset:#06x}")]
    UnknownOpcode { offset: usize, id: u8 },

    #[error(transparent)]
    Image(#[from] ImageError),
}
