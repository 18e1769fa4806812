//! Errors that can occur while running a script.

use vbinit_image::{DecodeError, ImageError};

use crate::hardware::{PllError, TransferError};

/// Failure that ends a top-level run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    /// No handler for the byte at `offset`; the next instruction cannot be found.
    #[error("unknown opcode {id:#04x} at {offset:#06x}")]
    UnknownOpcode { offset: usize, id: u8 },
}

/// Failure of a single opcode.
///
/// Logged by the interpreter; the opcode becomes a no-op and the script
/// continues with the next instruction.
#[derive(Debug, thiserror::Error)]
pub enum OpcodeError {
    #[error("{what} {value} is out of range (limit {limit})")]
    OperandOutOfRange {
        what: &'static str,
        value: u64,
        limit: u64,
    },

    #[error("transfer failed: {0}")]
    Transaction(#[from] TransferError),

    #[error("pll programming failed: {0}")]
    Pll(#[from] PllError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no TMDS register for link {tmds:#04x}")]
    NoTmdsRegister { tmds: u8 },

    #[error("recursion limit of {limit} exceeded")]
    RecursionLimit { limit: u32 },

    #[error("unsupported {0}")]
    Unsupported(String),
}
