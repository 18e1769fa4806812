//! Decoded init-script instructions.
//!
//! Decoding is kept apart from execution: [`Instruction::decode`] reads every
//! operand, including variable tails, into an owned value, and
//! [`Instruction::len`] recomputes the instruction size from what was decoded.
//! The interpreter decodes only on the execute path; the skip path uses
//! [`Opcode::encoded_len`].
//!
//! Multi-byte operands are little-endian. I2C addresses are kept as the 8-bit
//! bus address found in the image.

use std::fmt;

use vbinit_core::utils::hex_bytes;

use crate::error::{DecodeError, ImageError};
use crate::image::ProgramImage;
use crate::opcode::Opcode;

/// One decoded instruction with all operands materialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    IoRestrictProg {
        port: u16,
        index: u8,
        mask: u8,
        shift: u8,
        reg: u32,
        values: Vec<u32>,
    },
    Repeat {
        count: u8,
    },
    IoRestrictPll {
        port: u16,
        index: u8,
        mask: u8,
        shift: u8,
        io_flag_condition: u8,
        reg: u32,
        /// Frequencies in units of 10 kHz.
        freqs: Vec<u16>,
    },
    EndRepeat,
    Copy {
        reg: u32,
        shift: u8,
        src_mask: u8,
        port: u16,
        index: u8,
        mask: u8,
    },
    Not,
    IoFlagCondition {
        cond: u8,
    },
    DpCondition {
        cond: u8,
        size: u8,
    },
    IoMaskOr {
        index: u8,
    },
    IoOr {
        index: u8,
    },
    AndnReg {
        reg: u32,
        mask: u32,
    },
    OrReg {
        reg: u32,
        mask: u32,
    },
    IndexAddressLatched {
        ctrl_reg: u32,
        data_reg: u32,
        ctrl_mask: u32,
        ctrl_data: u32,
        /// `(address, data)` pairs.
        pairs: Vec<(u8, u8)>,
    },
    IoRestrictPll2 {
        port: u16,
        index: u8,
        mask: u8,
        shift: u8,
        reg: u32,
        /// Frequencies in kHz.
        freqs: Vec<u32>,
    },
    Pll2 {
        reg: u32,
        khz: u32,
    },
    I2cByte {
        bus: u8,
        addr: u8,
        /// `(register, mask, data)` triples.
        writes: Vec<(u8, u8, u8)>,
    },
    ZmI2cByte {
        bus: u8,
        addr: u8,
        /// `(register, data)` pairs.
        writes: Vec<(u8, u8)>,
    },
    ZmI2c {
        bus: u8,
        addr: u8,
        data: Vec<u8>,
    },
    Tmds {
        tmds: u8,
        addr: u8,
        mask: u8,
        data: u8,
    },
    ZmTmdsGroup {
        tmds: u8,
        writes: Vec<(u8, u8)>,
    },
    CrIndexAddressLatched {
        index1: u8,
        index2: u8,
        base: u8,
        data: Vec<u8>,
    },
    Cr {
        index: u8,
        mask: u8,
        data: u8,
    },
    ZmCr {
        index: u8,
        data: u8,
    },
    ZmCrGroup {
        writes: Vec<(u8, u8)>,
    },
    ConditionTime {
        cond: u8,
        retries: u8,
    },
    Ltime {
        millis: u16,
    },
    ZmRegSequence {
        base: u32,
        values: Vec<u32>,
    },
    ZmRegIndirect {
        reg: u32,
        pointer: u16,
    },
    SubDirect {
        target: u16,
    },
    Jump {
        target: u16,
    },
    I2cIf {
        bus: u8,
        addr: u8,
        reg: u8,
        mask: u8,
        data: u8,
    },
    CopyNvReg {
        src: u32,
        shift: u8,
        src_mask: u32,
        xor: u32,
        dst: u32,
        dst_mask: u32,
    },
    ZmIndexIo {
        port: u16,
        index: u8,
        data: u8,
    },
    ComputeMem,
    Reset {
        reg: u32,
        value1: u32,
        value2: u32,
    },
    ConfigureMem,
    ConfigureClk,
    ConfigurePreinit,
    Io {
        port: u16,
        mask: u8,
        data: u8,
    },
    Sub {
        index: u8,
    },
    RamCondition {
        mask: u8,
        value: u8,
    },
    NvReg {
        reg: u32,
        mask: u32,
        data: u32,
    },
    Macro {
        index: u8,
    },
    Done,
    Resume,
    RamCondition2 {
        mask: u32,
        value: u32,
    },
    Time {
        micros: u16,
    },
    Condition {
        cond: u8,
    },
    IoCondition {
        cond: u8,
    },
    ZmReg16 {
        reg: u32,
        data: u16,
    },
    IndexIo {
        port: u16,
        index: u8,
        mask: u8,
        data: u8,
    },
    Pll {
        reg: u32,
        /// Units of 10 kHz.
        freq: u16,
    },
    ZmReg {
        reg: u32,
        value: u32,
    },
    RamRestrictPll {
        pll: u8,
        /// One frequency in kHz per RAM-restrict group.
        freqs: Vec<u32>,
    },
    Reserved(Opcode),
    Gpio,
    RamRestrictZmRegGroup {
        reg: u32,
        increment: u8,
        count: u8,
        /// `count` rows of one value per RAM-restrict group.
        values: Vec<u32>,
    },
    CopyZmReg {
        src: u32,
        dst: u32,
    },
    ZmRegGroup {
        reg: u32,
        values: Vec<u32>,
    },
    Xlat {
        src: u32,
        shift: u8,
        src_mask: u8,
        index: u8,
        dst: u32,
        dst_mask: u32,
        dst_shift: u8,
    },
    ZmMaskAdd {
        reg: u32,
        mask: u32,
        add: u32,
    },
    Auxch {
        addr: u32,
        /// `(mask, data)` pairs, all applied to `addr`.
        writes: Vec<(u8, u8)>,
    },
    ZmAuxch {
        addr: u32,
        data: Vec<u8>,
    },
    I2cLongIf {
        bus: u8,
        addr: u8,
        reg_lo: u8,
        reg_hi: u8,
        mask: u8,
        data: u8,
    },
    GpioNe {
        functions: Vec<u8>,
    },
}

/// Operand reader anchored at an instruction's opcode byte.
struct Operands<'a> {
    image: &'a ProgramImage,
    base: usize,
}

impl Operands<'_> {
    fn u8(&self, rel: usize) -> Result<u8, ImageError> {
        self.image.read_u8(self.base + rel)
    }

    fn u16(&self, rel: usize) -> Result<u16, ImageError> {
        self.image.read_u16(self.base + rel)
    }

    fn u32(&self, rel: usize) -> Result<u32, ImageError> {
        self.image.read_u32(self.base + rel)
    }

    fn count(&self, rel: usize) -> Result<usize, ImageError> {
        self.u8(rel).map(usize::from)
    }

    fn bytes(&self, rel: usize, n: usize) -> Result<Vec<u8>, ImageError> {
        self.image.slice(self.base + rel, n).map(<[u8]>::to_vec)
    }

    fn pairs(&self, rel: usize, n: usize) -> Result<Vec<(u8, u8)>, ImageError> {
        (0..n)
            .map(|i| -> Result<(u8, u8), ImageError> {
                Ok((self.u8(rel + i * 2)?, self.u8(rel + i * 2 + 1)?))
            })
            .collect()
    }

    fn u16s(&self, rel: usize, n: usize) -> Result<Vec<u16>, ImageError> {
        (0..n).map(|i| self.u16(rel + i * 2)).collect()
    }

    fn u32s(&self, rel: usize, n: usize) -> Result<Vec<u32>, ImageError> {
        (0..n).map(|i| self.u32(rel + i * 4)).collect()
    }
}

impl Instruction {
    /// Decode the instruction whose opcode byte is at `offset`.
    pub fn decode(image: &ProgramImage, offset: usize) -> Result<Self, DecodeError> {
        let id = image.read_u8(offset)?;
        let opcode = Opcode::from_u8(id).ok_or(DecodeError::UnknownOpcode { offset, id })?;
        let op = Operands {
            image,
            base: offset,
        };
        let groups = usize::from(image.tables().ram_restrict_groups());

        let instr = match opcode {
            Opcode::IoRestrictProg => Instruction::IoRestrictProg {
                port: op.u16(1)?,
                index: op.u8(3)?,
                mask: op.u8(4)?,
                shift: op.u8(5)?,
                reg: op.u32(7)?,
                values: op.u32s(11, op.count(6)?)?,
            },
            Opcode::Repeat => Instruction::Repeat { count: op.u8(1)? },
            Opcode::IoRestrictPll => Instruction::IoRestrictPll {
                port: op.u16(1)?,
                index: op.u8(3)?,
                mask: op.u8(4)?,
                shift: op.u8(5)?,
                io_flag_condition: op.u8(6)?,
                reg: op.u32(8)?,
                freqs: op.u16s(12, op.count(7)?)?,
            },
            Opcode::EndRepeat => Instruction::EndRepeat,
            Opcode::Copy => Instruction::Copy {
                reg: op.u32(1)?,
                shift: op.u8(5)?,
                src_mask: op.u8(6)?,
                port: op.u16(7)?,
                index: op.u8(9)?,
                mask: op.u8(10)?,
            },
            Opcode::Not => Instruction::Not,
            Opcode::IoFlagCondition => Instruction::IoFlagCondition { cond: op.u8(1)? },
            Opcode::DpCondition => Instruction::DpCondition {
                cond: op.u8(1)?,
                size: op.u8(2)?,
            },
            Opcode::IoMaskOr => Instruction::IoMaskOr { index: op.u8(1)? },
            Opcode::IoOr => Instruction::IoOr { index: op.u8(1)? },
            Opcode::AndnReg => Instruction::AndnReg {
                reg: op.u32(1)?,
                mask: op.u32(5)?,
            },
            Opcode::OrReg => Instruction::OrReg {
                reg: op.u32(1)?,
                mask: op.u32(5)?,
            },
            Opcode::IndexAddressLatched => Instruction::IndexAddressLatched {
                ctrl_reg: op.u32(1)?,
                data_reg: op.u32(5)?,
                ctrl_mask: op.u32(9)?,
                ctrl_data: op.u32(13)?,
                pairs: op.pairs(18, op.count(17)?)?,
            },
            Opcode::IoRestrictPll2 => Instruction::IoRestrictPll2 {
                port: op.u16(1)?,
                index: op.u8(3)?,
                mask: op.u8(4)?,
                shift: op.u8(5)?,
                reg: op.u32(7)?,
                freqs: op.u32s(11, op.count(6)?)?,
            },
            Opcode::Pll2 => Instruction::Pll2 {
                reg: op.u32(1)?,
                khz: op.u32(5)?,
            },
            Opcode::I2cByte => {
                let n = op.count(3)?;
                let writes = (0..n)
                    .map(|i| -> Result<(u8, u8, u8), ImageError> {
                        let at = 4 + i * 3;
                        Ok((op.u8(at)?, op.u8(at + 1)?, op.u8(at + 2)?))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Instruction::I2cByte {
                    bus: op.u8(1)?,
                    addr: op.u8(2)?,
                    writes,
                }
            }
            Opcode::ZmI2cByte => Instruction::ZmI2cByte {
                bus: op.u8(1)?,
                addr: op.u8(2)?,
                writes: op.pairs(4, op.count(3)?)?,
            },
            Opcode::ZmI2c => Instruction::ZmI2c {
                bus: op.u8(1)?,
                addr: op.u8(2)?,
                data: op.bytes(4, op.count(3)?)?,
            },
            Opcode::Tmds => Instruction::Tmds {
                tmds: op.u8(1)?,
                addr: op.u8(2)?,
                mask: op.u8(3)?,
                data: op.u8(4)?,
            },
            Opcode::ZmTmdsGroup => Instruction::ZmTmdsGroup {
                tmds: op.u8(1)?,
                writes: op.pairs(3, op.count(2)?)?,
            },
            Opcode::CrIndexAddressLatched => Instruction::CrIndexAddressLatched {
                index1: op.u8(1)?,
                index2: op.u8(2)?,
                base: op.u8(3)?,
                data: op.bytes(5, op.count(4)?)?,
            },
            Opcode::Cr => Instruction::Cr {
                index: op.u8(1)?,
                mask: op.u8(2)?,
                data: op.u8(3)?,
            },
            Opcode::ZmCr => Instruction::ZmCr {
                index: op.u8(1)?,
                data: op.u8(2)?,
            },
            Opcode::ZmCrGroup => Instruction::ZmCrGroup {
                writes: op.pairs(2, op.count(1)?)?,
            },
            Opcode::ConditionTime => Instruction::ConditionTime {
                cond: op.u8(1)?,
                retries: op.u8(2)?,
            },
            Opcode::Ltime => Instruction::Ltime { millis: op.u16(1)? },
            Opcode::ZmRegSequence => Instruction::ZmRegSequence {
                base: op.u32(1)?,
                values: op.u32s(6, op.count(5)?)?,
            },
            Opcode::ZmRegIndirect => Instruction::ZmRegIndirect {
                reg: op.u32(1)?,
                pointer: op.u16(5)?,
            },
            Opcode::SubDirect => Instruction::SubDirect { target: op.u16(1)? },
            Opcode::Jump => Instruction::Jump { target: op.u16(1)? },
            Opcode::I2cIf => Instruction::I2cIf {
                bus: op.u8(1)?,
                addr: op.u8(2)?,
                reg: op.u8(3)?,
                mask: op.u8(4)?,
                data: op.u8(5)?,
            },
            Opcode::CopyNvReg => Instruction::CopyNvReg {
                src: op.u32(1)?,
                shift: op.u8(5)?,
                src_mask: op.u32(6)?,
                xor: op.u32(10)?,
                dst: op.u32(14)?,
                dst_mask: op.u32(18)?,
            },
            Opcode::ZmIndexIo => Instruction::ZmIndexIo {
                port: op.u16(1)?,
                index: op.u8(3)?,
                data: op.u8(4)?,
            },
            Opcode::ComputeMem => Instruction::ComputeMem,
            Opcode::Reset => Instruction::Reset {
                reg: op.u32(1)?,
                value1: op.u32(5)?,
                value2: op.u32(9)?,
            },
            Opcode::ConfigureMem => Instruction::ConfigureMem,
            Opcode::ConfigureClk => Instruction::ConfigureClk,
            Opcode::ConfigurePreinit => Instruction::ConfigurePreinit,
            Opcode::Io => Instruction::Io {
                port: op.u16(1)?,
                mask: op.u8(3)?,
                data: op.u8(4)?,
            },
            Opcode::Sub => Instruction::Sub { index: op.u8(1)? },
            Opcode::RamCondition => Instruction::RamCondition {
                mask: op.u8(1)?,
                value: op.u8(2)?,
            },
            Opcode::NvReg => Instruction::NvReg {
                reg: op.u32(1)?,
                mask: op.u32(5)?,
                data: op.u32(9)?,
            },
            Opcode::Macro => Instruction::Macro { index: op.u8(1)? },
            Opcode::Done => Instruction::Done,
            Opcode::Resume => Instruction::Resume,
            Opcode::RamCondition2 => Instruction::RamCondition2 {
                mask: op.u32(1)?,
                value: op.u32(5)?,
            },
            Opcode::Time => Instruction::Time { micros: op.u16(1)? },
            Opcode::Condition => Instruction::Condition { cond: op.u8(1)? },
            Opcode::IoCondition => Instruction::IoCondition { cond: op.u8(1)? },
            Opcode::ZmReg16 => Instruction::ZmReg16 {
                reg: op.u32(1)?,
                data: op.u16(5)?,
            },
            Opcode::IndexIo => Instruction::IndexIo {
                port: op.u16(1)?,
                index: op.u8(3)?,
                mask: op.u8(4)?,
                data: op.u8(5)?,
            },
            Opcode::Pll => Instruction::Pll {
                reg: op.u32(1)?,
                freq: op.u16(5)?,
            },
            Opcode::ZmReg => Instruction::ZmReg {
                reg: op.u32(1)?,
                value: op.u32(5)?,
            },
            Opcode::RamRestrictPll => Instruction::RamRestrictPll {
                pll: op.u8(1)?,
                freqs: op.u32s(2, groups)?,
            },
            Opcode::Reserved8c | Opcode::Reserved8d | Opcode::Reserved92 | Opcode::ReservedAa => {
                Instruction::Reserved(opcode)
            }
            Opcode::Gpio => Instruction::Gpio,
            Opcode::RamRestrictZmRegGroup => {
                let count = op.u8(6)?;
                Instruction::RamRestrictZmRegGroup {
                    reg: op.u32(1)?,
                    increment: op.u8(5)?,
                    count,
                    values: op.u32s(7, usize::from(count) * groups)?,
                }
            }
            Opcode::CopyZmReg => Instruction::CopyZmReg {
                src: op.u32(1)?,
                dst: op.u32(5)?,
            },
            Opcode::ZmRegGroup => Instruction::ZmRegGroup {
                reg: op.u32(1)?,
                values: op.u32s(6, op.count(5)?)?,
            },
            Opcode::Xlat => Instruction::Xlat {
                src: op.u32(1)?,
                shift: op.u8(5)?,
                src_mask: op.u8(6)?,
                index: op.u8(7)?,
                dst: op.u32(8)?,
                dst_mask: op.u32(12)?,
                dst_shift: op.u8(16)?,
            },
            Opcode::ZmMaskAdd => Instruction::ZmMaskAdd {
                reg: op.u32(1)?,
                mask: op.u32(5)?,
                add: op.u32(9)?,
            },
            Opcode::Auxch => Instruction::Auxch {
                addr: op.u32(1)?,
                writes: op.pairs(6, op.count(5)?)?,
            },
            Opcode::ZmAuxch => Instruction::ZmAuxch {
                addr: op.u32(1)?,
                data: op.bytes(6, op.count(5)?)?,
            },
            Opcode::I2cLongIf => Instruction::I2cLongIf {
                bus: op.u8(1)?,
                addr: op.u8(2)?,
                reg_lo: op.u8(3)?,
                reg_hi: op.u8(4)?,
                mask: op.u8(5)?,
                data: op.u8(6)?,
            },
            Opcode::GpioNe => Instruction::GpioNe {
                functions: op.bytes(2, op.count(1)?)?,
            },
        };
        Ok(instr)
    }

    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::IoRestrictProg { .. } => Opcode::IoRestrictProg,
            Instruction::Repeat { .. } => Opcode::Repeat,
            Instruction::IoRestrictPll { .. } => Opcode::IoRestrictPll,
            Instruction::EndRepeat => Opcode::EndRepeat,
            Instruction::Copy { .. } => Opcode::Copy,
            Instruction::Not => Opcode::Not,
            Instruction::IoFlagCondition { .. } => Opcode::IoFlagCondition,
            Instruction::DpCondition { .. } => Opcode::DpCondition,
            Instruction::IoMaskOr { .. } => Opcode::IoMaskOr,
            Instruction::IoOr { .. } => Opcode::IoOr,
            Instruction::AndnReg { .. } => Opcode::AndnReg,
            Instruction::OrReg { .. } => Opcode::OrReg,
            Instruction::IndexAddressLatched { .. } => Opcode::IndexAddressLatched,
            Instruction::IoRestrictPll2 { .. } => Opcode::IoRestrictPll2,
            Instruction::Pll2 { .. } => Opcode::Pll2,
            Instruction::I2cByte { .. } => Opcode::I2cByte,
            Instruction::ZmI2cByte { .. } => Opcode::ZmI2cByte,
            Instruction::ZmI2c { .. } => Opcode::ZmI2c,
            Instruction::Tmds { .. } => Opcode::Tmds,
            Instruction::ZmTmdsGroup { .. } => Opcode::ZmTmdsGroup,
            Instruction::CrIndexAddressLatched { .. } => Opcode::CrIndexAddressLatched,
            Instruction::Cr { .. } => Opcode::Cr,
            Instruction::ZmCr { .. } => Opcode::ZmCr,
            Instruction::ZmCrGroup { .. } => Opcode::ZmCrGroup,
            Instruction::ConditionTime { .. } => Opcode::ConditionTime,
            Instruction::Ltime { .. } => Opcode::Ltime,
            Instruction::ZmRegSequence { .. } => Opcode::ZmRegSequence,
            Instruction::ZmRegIndirect { .. } => Opcode::ZmRegIndirect,
            Instruction::SubDirect { .. } => Opcode::SubDirect,
            Instruction::Jump { .. } => Opcode::Jump,
            Instruction::I2cIf { .. } => Opcode::I2cIf,
            Instruction::CopyNvReg { .. } => Opcode::CopyNvReg,
            Instruction::ZmIndexIo { .. } => Opcode::ZmIndexIo,
            Instruction::ComputeMem => Opcode::ComputeMem,
            Instruction::Reset { .. } => Opcode::Reset,
            Instruction::ConfigureMem => Opcode::ConfigureMem,
            Instruction::ConfigureClk => Opcode::ConfigureClk,
            Instruction::ConfigurePreinit => Opcode::ConfigurePreinit,
            Instruction::Io { .. } => Opcode::Io,
            Instruction::Sub { .. } => Opcode::Sub,
            Instruction::RamCondition { .. } => Opcode::RamCondition,
            Instruction::NvReg { .. } => Opcode::NvReg,
            Instruction::Macro { .. } => Opcode::Macro,
            Instruction::Done => Opcode::Done,
            Instruction::Resume => Opcode::Resume,
            Instruction::RamCondition2 { .. } => Opcode::RamCondition2,
            Instruction::Time { .. } => Opcode::Time,
            Instruction::Condition { .. } => Opcode::Condition,
            Instruction::IoCondition { .. } => Opcode::IoCondition,
            Instruction::ZmReg16 { .. } => Opcode::ZmReg16,
            Instruction::IndexIo { .. } => Opcode::IndexIo,
            Instruction::Pll { .. } => Opcode::Pll,
            Instruction::ZmReg { .. } => Opcode::ZmReg,
            Instruction::RamRestrictPll { .. } => Opcode::RamRestrictPll,
            Instruction::Reserved(opcode) => *opcode,
            Instruction::Gpio => Opcode::Gpio,
            Instruction::RamRestrictZmRegGroup { .. } => Opcode::RamRestrictZmRegGroup,
            Instruction::CopyZmReg { .. } => Opcode::CopyZmReg,
            Instruction::ZmRegGroup { .. } => Opcode::ZmRegGroup,
            Instruction::Xlat { .. } => Opcode::Xlat,
            Instruction::ZmMaskAdd { .. } => Opcode::ZmMaskAdd,
            Instruction::Auxch { .. } => Opcode::Auxch,
            Instruction::ZmAuxch { .. } => Opcode::ZmAuxch,
            Instruction::I2cLongIf { .. } => Opcode::I2cLongIf,
            Instruction::GpioNe { .. } => Opcode::GpioNe,
        }
    }

    /// Instruction size in bytes, computed from the decoded operands.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.opcode().fixed_len() + self.tail_len()
    }

    fn tail_len(&self) -> usize {
        match self {
            Instruction::IoRestrictProg { values, .. } => values.len() * 4,
            Instruction::IoRestrictPll { freqs, .. } => freqs.len() * 2,
            Instruction::IndexAddressLatched { pairs, .. } => pairs.len() * 2,
            Instruction::IoRestrictPll2 { freqs, .. } => freqs.len() * 4,
            Instruction::I2cByte { writes, .. } => writes.len() * 3,
            Instruction::ZmI2cByte { writes, .. }
            | Instruction::ZmTmdsGroup { writes, .. }
            | Instruction::ZmCrGroup { writes }
            | Instruction::Auxch { writes, .. } => writes.len() * 2,
            Instruction::ZmI2c { data, .. }
            | Instruction::CrIndexAddressLatched { data, .. }
            | Instruction::ZmAuxch { data, .. } => data.len(),
            Instruction::ZmRegSequence { values, .. }
            | Instruction::ZmRegGroup { values, .. }
            | Instruction::RamRestrictZmRegGroup { values, .. } => values.len() * 4,
            Instruction::RamRestrictPll { freqs, .. } => freqs.len() * 4,
            Instruction::GpioNe { functions } => functions.len(),
            _ => 0,
        }
    }

    /// Operands rendered as a register-transfer expression.
    ///
    /// Empty for opcodes without operands.
    pub fn operands(&self) -> String {
        match self {
            Instruction::IoRestrictProg {
                port,
                index,
                mask,
                shift,
                reg,
                values,
            } => format!(
                "{} = {}[{}]",
                r(*reg),
                list32(values),
                io_selector(*port, *index, *mask, *shift)
            ),
            Instruction::Repeat { count } => format!("{count}"),
            Instruction::IoRestrictPll {
                port,
                index,
                mask,
                shift,
                io_flag_condition,
                reg,
                freqs,
            } => {
                let khz: Vec<u32> = freqs.iter().map(|&f| u32::from(f) * 10).collect();
                let mut out = format!(
                    "{} = {}[{}] kHz",
                    r(*reg),
                    list_dec(&khz),
                    io_selector(*port, *index, *mask, *shift)
                );
                if *io_flag_condition != 0 {
                    out.push_str(&format!(", x2 if IO_FLAG 0x{io_flag_condition:02x}"));
                }
                out
            }
            Instruction::Copy {
                reg,
                shift,
                src_mask,
                port,
                index,
                mask,
            } => format!(
                "{} = ({} & 0x{mask:02x}) | (({}{}) & 0x{src_mask:02x})",
                io(*port, *index),
                io(*port, *index),
                r(*reg),
                shift_text(*shift)
            ),
            Instruction::IoFlagCondition { cond }
            | Instruction::Condition { cond }
            | Instruction::IoCondition { cond } => format!("0x{cond:02x}"),
            Instruction::DpCondition { cond, size } => format!("0x{cond:02x} 0x{size:02x}"),
            Instruction::IoMaskOr { index } => format!("{} &= ~(1 << OR)", cr(*index)),
            Instruction::IoOr { index } => format!("{} |= (1 << OR)", cr(*index)),
            Instruction::AndnReg { reg, mask } => format!("{} &= ~0x{mask:08x}", r(*reg)),
            Instruction::OrReg { reg, mask } => format!("{} |= 0x{mask:08x}", r(*reg)),
            Instruction::IndexAddressLatched {
                ctrl_reg,
                data_reg,
                ctrl_mask,
                ctrl_data,
                pairs,
            } => format!(
                "{} & 0x{ctrl_mask:08x} |= 0x{ctrl_data:08x}, {} {}",
                r(*ctrl_reg),
                r(*data_reg),
                list_pairs(pairs)
            ),
            Instruction::IoRestrictPll2 {
                port,
                index,
                mask,
                shift,
                reg,
                freqs,
            } => format!(
                "{} = {}[{}] kHz",
                r(*reg),
                list_dec(freqs),
                io_selector(*port, *index, *mask, *shift)
            ),
            Instruction::Pll2 { reg, khz } => format!("{} = {khz} kHz", r(*reg)),
            Instruction::I2cByte { bus, addr, writes } => {
                let items: Vec<String> = writes
                    .iter()
                    .map(|(reg, mask, data)| {
                        format!("[0x{reg:02x}] &= 0x{mask:02x} |= 0x{data:02x}")
                    })
                    .collect();
                format!("{} {{{}}}", i2c(*bus, *addr), items.join(", "))
            }
            Instruction::ZmI2cByte { bus, addr, writes } => {
                format!("{} {}", i2c(*bus, *addr), list_pairs(writes))
            }
            Instruction::ZmI2c { bus, addr, data } => {
                format!("{} = {}", i2c(*bus, *addr), hex_bytes(data))
            }
            Instruction::Tmds {
                tmds,
                addr,
                mask,
                data,
            } => format!("T[0x{tmds:02x}][0x{addr:02x}] &= 0x{mask:02x} |= 0x{data:02x}"),
            Instruction::ZmTmdsGroup { tmds, writes } => {
                format!("T[0x{tmds:02x}] {}", list_pairs(writes))
            }
            Instruction::CrIndexAddressLatched {
                index1,
                index2,
                base,
                data,
            } => format!(
                "{} {} from 0x{base:02x} = {}",
                cr(*index1),
                cr(*index2),
                hex_bytes(data)
            ),
            Instruction::Cr { index, mask, data } => {
                format!("{} &= 0x{mask:02x} |= 0x{data:02x}", cr(*index))
            }
            Instruction::ZmCr { index, data } => format!("{} = 0x{data:02x}", cr(*index)),
            Instruction::ZmCrGroup { writes } => format!("CR {}", list_pairs(writes)),
            Instruction::ConditionTime { cond, retries } => {
                format!("0x{cond:02x} retries {retries}")
            }
            Instruction::Ltime { millis } => format!("{millis} ms"),
            Instruction::ZmRegSequence { base, values } => {
                format!("{}.. = {}", r(*base), list32(values))
            }
            Instruction::ZmRegIndirect { reg, pointer } => {
                format!("{} = ROM32[0x{pointer:04x}]", r(*reg))
            }
            Instruction::SubDirect { target } | Instruction::Jump { target } => {
                format!("0x{target:04x}")
            }
            Instruction::I2cIf {
                bus,
                addr,
                reg,
                mask,
                data,
            } => format!(
                "{}[0x{reg:02x}] & 0x{mask:02x} == 0x{data:02x}",
                i2c(*bus, *addr)
            ),
            Instruction::CopyNvReg {
                src,
                shift,
                src_mask,
                xor,
                dst,
                dst_mask,
            } => format!(
                "{} = ({} & 0x{dst_mask:08x}) | ((({}{}) & 0x{src_mask:08x}) ^ 0x{xor:08x})",
                r(*dst),
                r(*dst),
                r(*src),
                shift_text(*shift)
            ),
            Instruction::ZmIndexIo { port, index, data } => {
                format!("{} = 0x{data:02x}", io(*port, *index))
            }
            Instruction::Reset {
                reg,
                value1,
                value2,
            } => format!("{} = 0x{value1:08x}, 0x{value2:08x}", r(*reg)),
            Instruction::Io { port, mask, data } => {
                format!("IO[0x{port:04x}] &= 0x{mask:02x} |= 0x{data:02x}")
            }
            Instruction::Sub { index } | Instruction::Macro { index } => format!("0x{index:02x}"),
            Instruction::RamCondition { mask, value } => {
                format!("(R[0x100000] & 0x{mask:02x}) == 0x{value:02x}")
            }
            Instruction::NvReg { reg, mask, data } => {
                format!("{} &= 0x{mask:08x} |= 0x{data:08x}", r(*reg))
            }
            Instruction::RamCondition2 { mask, value } => {
                format!("(R[0x101000] & 0x{mask:08x}) == 0x{value:08x}")
            }
            Instruction::Time { micros } => format!("{micros} us"),
            Instruction::ZmReg16 { reg, data } => format!("{} = 0x{data:04x}", r(*reg)),
            Instruction::IndexIo {
                port,
                index,
                mask,
                data,
            } => format!("{} &= 0x{mask:02x} |= 0x{data:02x}", io(*port, *index)),
            Instruction::Pll { reg, freq } => {
                format!("{} = {} kHz", r(*reg), u32::from(*freq) * 10)
            }
            Instruction::ZmReg { reg, value } => format!("{} = 0x{value:08x}", r(*reg)),
            Instruction::RamRestrictPll { pll, freqs } => {
                format!("PLL 0x{pll:02x} = {}[RAMCFG] kHz", list_dec(freqs))
            }
            Instruction::Reserved(opcode) => format!("0x{:02x}", opcode.id()),
            Instruction::RamRestrictZmRegGroup {
                reg,
                increment,
                count,
                values,
            } => format!(
                "{} +0x{increment:02x} x{count} = {}[RAMCFG]",
                r(*reg),
                list32(values)
            ),
            Instruction::CopyZmReg { src, dst } => format!("{} = {}", r(*dst), r(*src)),
            Instruction::ZmRegGroup { reg, values } => format!("{} = {}", r(*reg), list32(values)),
            Instruction::Xlat {
                src,
                shift,
                src_mask,
                index,
                dst,
                dst_mask,
                dst_shift,
            } => format!(
                "{} = ({} & 0x{dst_mask:08x}) | (XLAT[0x{index:02x}][({}{}) & 0x{src_mask:02x}] << {dst_shift})",
                r(*dst),
                r(*dst),
                r(*src),
                shift_text(*shift)
            ),
            Instruction::ZmMaskAdd { reg, mask, add } => {
                format!("{} += 0x{add:08x} & ~0x{mask:08x}", r(*reg))
            }
            Instruction::Auxch { addr, writes } => {
                let items: Vec<String> = writes
                    .iter()
                    .map(|(mask, data)| format!("&= 0x{mask:02x} |= 0x{data:02x}"))
                    .collect();
                format!("AUX[0x{addr:08x}] {{{}}}", items.join(", "))
            }
            Instruction::ZmAuxch { addr, data } => {
                format!("AUX[0x{addr:08x}] = {}", hex_bytes(data))
            }
            Instruction::I2cLongIf {
                bus,
                addr,
                reg_lo,
                reg_hi,
                mask,
                data,
            } => format!(
                "{}[0x{reg_hi:02x}{reg_lo:02x}] & 0x{mask:02x} == 0x{data:02x}",
                i2c(*bus, *addr)
            ),
            Instruction::GpioNe { functions } => format!("except {}", hex_bytes(functions)),
            Instruction::EndRepeat
            | Instruction::Not
            | Instruction::ComputeMem
            | Instruction::ConfigureMem
            | Instruction::ConfigureClk
            | Instruction::ConfigurePreinit
            | Instruction::Done
            | Instruction::Resume
            | Instruction::Gpio => String::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode().name())?;
        let operands = self.operands();
        if !operands.is_empty() {
            write!(f, " {operands}")?;
        }
        Ok(())
    }
}

fn r(reg: u32) -> String {
    format!("R[0x{reg:06x}]")
}

fn io(port: u16, index: u8) -> String {
    format!("IO[0x{port:04x}][0x{index:02x}]")
}

fn cr(index: u8) -> String {
    format!("CR[0x{index:02x}]")
}

fn i2c(bus: u8, addr: u8) -> String {
    format!("I2C[0x{bus:02x}][0x{addr:02x}]")
}

fn io_selector(port: u16, index: u8, mask: u8, shift: u8) -> String {
    format!("({} & 0x{mask:02x}) >> {shift}", io(port, index))
}

/// Signed shift operand: below 0x80 shifts right, otherwise left by `0x100 - shift`.
fn shift_text(shift: u8) -> String {
    if shift < 0x80 {
        format!(" >> {shift}")
    } else {
        format!(" << {}", 0x100 - u16::from(shift))
    }
}

fn list32(values: &[u32]) -> String {
    let items: Vec<String> = values.iter().map(|v| format!("0x{v:08x}")).collect();
    format!("{{{}}}", items.join(", "))
}

fn list_dec(values: &[u32]) -> String {
    let items: Vec<String> = values.iter().map(u32::to_string).collect();
    format!("{{{}}}", items.join(", "))
}

fn list_pairs(pairs: &[(u8, u8)]) -> String {
    let items: Vec<String> = pairs
        .iter()
        .map(|(a, d)| format!("[0x{a:02x}] = 0x{d:02x}"))
        .collect();
    format!("{{{}}}", items.join(", "))
}
