#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Firmware image model for the init-script interpreter.
//!
//! A [`ProgramImage`] is the raw firmware bytes plus a [`TableDirectory`]
//! resolved once from either a BIT or a BMP header. On top of it this crate
//! decodes init-script instructions ([`Instruction`]) and renders them for
//! humans ([`dump`]). Nothing here touches hardware.

pub mod dump;
mod error;
mod header;
mod image;
mod instructions;
mod opcode;
mod tables;

#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod header_tests;
#[cfg(test)]
mod instructions_tests;
#[cfg(test)]
mod opcode_tests;
#[cfg(test)]
mod tables_tests;

pub use error::{DecodeError, ImageError};
pub use header::{
    BIT_SIGNATURE, BMP_SIGNATURE, BitEntry, BitHeader, BmpHeader, ImageFormat, find_signature,
};
pub use image::ProgramImage;
pub use instructions::Instruction;
pub use opcode::{MAX_NAME_LEN, Opcode, Tail, TailCount};
pub use tables::{
    CONDITION_ENTRY_SIZE, ConditionEntry, IO_CONDITION_ENTRY_SIZE, IO_FLAG_CONDITION_ENTRY_SIZE,
    IoConditionEntry, IoFlagConditionEntry, MACRO_ENTRY_SIZE, MEM_INIT_ENTRY_SIZE, MacroEntry,
    MemInitEntry, SEQUENCE_END, TableDirectory, TableId,
};
