//! Opcode identifiers and the length formula used on the skip path.
//!
//! [`Opcode::encoded_len`] reads only the fixed-offset count field of an
//! instruction, never its tail. The full decoder in `instructions` computes
//! the same length from the materialized operands; the two must agree.

use crate::error::ImageError;
use crate::image::ProgramImage;

macro_rules! opcodes {
    ($($variant:ident = $id:literal => $name:literal,)*) => {
        /// One-byte init-script opcode.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Opcode {
            $($variant = $id,)*
        }

        impl Opcode {
            /// Every known opcode, in id order.
            pub const ALL: &'static [Opcode] = &[$(Opcode::$variant,)*];

            pub fn from_u8(id: u8) -> Option<Self> {
                match id {
                    $($id => Some(Opcode::$variant),)*
                    _ => None,
                }
            }

            /// Upper-case mnemonic used in dumps and traces.
            pub fn name(self) -> &'static str {
                match self {
                    $(Opcode::$variant => $name,)*
                }
            }
        }
    };
}

opcodes! {
    IoRestrictProg = 0x32 => "IO_RESTRICT_PROG",
    Repeat = 0x33 => "REPEAT",
    IoRestrictPll = 0x34 => "IO_RESTRICT_PLL",
    EndRepeat = 0x36 => "END_REPEAT",
    Copy = 0x37 => "COPY",
    Not = 0x38 => "NOT",
    IoFlagCondition = 0x39 => "IO_FLAG_CONDITION",
    DpCondition = 0x3a => "DP_CONDITION",
    IoMaskOr = 0x3b => "IO_MASK_OR",
    IoOr = 0x3c => "IO_OR",
    AndnReg = 0x47 => "ANDN_REG",
    OrReg = 0x48 => "OR_REG",
    IndexAddressLatched = 0x49 => "INDEX_ADDRESS_LATCHED",
    IoRestrictPll2 = 0x4a => "IO_RESTRICT_PLL2",
    Pll2 = 0x4b => "PLL2",
    I2cByte = 0x4c => "I2C_BYTE",
    ZmI2cByte = 0x4d => "ZM_I2C_BYTE",
    ZmI2c = 0x4e => "ZM_I2C",
    Tmds = 0x4f => "TMDS",
    ZmTmdsGroup = 0x50 => "ZM_TMDS_GROUP",
    CrIndexAddressLatched = 0x51 => "CR_INDEX_ADDRESS_LATCHED",
    Cr = 0x52 => "CR",
    ZmCr = 0x53 => "ZM_CR",
    ZmCrGroup = 0x54 => "ZM_CR_GROUP",
    ConditionTime = 0x56 => "CONDITION_TIME",
    Ltime = 0x57 => "LTIME",
    ZmRegSequence = 0x58 => "ZM_REG_SEQUENCE",
    ZmRegIndirect = 0x5a => "ZM_REG_INDIRECT",
    SubDirect = 0x5b => "SUB_DIRECT",
    Jump = 0x5c => "JUMP",
    I2cIf = 0x5e => "I2C_IF",
    CopyNvReg = 0x5f => "COPY_NV_REG",
    ZmIndexIo = 0x62 => "ZM_INDEX_IO",
    ComputeMem = 0x63 => "COMPUTE_MEM",
    Reset = 0x65 => "RESET",
    ConfigureMem = 0x66 => "CONFIGURE_MEM",
    ConfigureClk = 0x67 => "CONFIGURE_CLK",
    ConfigurePreinit = 0x68 => "CONFIGURE_PREINIT",
    Io = 0x69 => "IO",
    Sub = 0x6b => "SUB",
    RamCondition = 0x6d => "RAM_CONDITION",
    NvReg = 0x6e => "NV_REG",
    Macro = 0x6f => "MACRO",
    Done = 0x71 => "DONE",
    Resume = 0x72 => "RESUME",
    RamCondition2 = 0x73 => "RAM_CONDITION2",
    Time = 0x74 => "TIME",
    Condition = 0x75 => "CONDITION",
    IoCondition = 0x76 => "IO_CONDITION",
    ZmReg16 = 0x77 => "ZM_REG16",
    IndexIo = 0x78 => "INDEX_IO",
    Pll = 0x79 => "PLL",
    ZmReg = 0x7a => "ZM_REG",
    RamRestrictPll = 0x87 => "RAM_RESTRICT_PLL",
    Reserved8c = 0x8c => "RESERVED",
    Reserved8d = 0x8d => "RESERVED",
    Gpio = 0x8e => "GPIO",
    RamRestrictZmRegGroup = 0x8f => "RAM_RESTRICT_ZM_REG_GROUP",
    CopyZmReg = 0x90 => "COPY_ZM_REG",
    ZmRegGroup = 0x91 => "ZM_REG_GROUP",
    Reserved92 = 0x92 => "RESERVED",
    Xlat = 0x96 => "XLAT",
    ZmMaskAdd = 0x97 => "ZM_MASK_ADD",
    Auxch = 0x98 => "AUXCH",
    ZmAuxch = 0x99 => "ZM_AUXCH",
    I2cLongIf = 0x9a => "I2C_LONG_IF",
    GpioNe = 0xa9 => "GPIO_NE",
    ReservedAa = 0xaa => "RESERVED",
}

/// Width of the longest mnemonic, for column alignment.
pub const MAX_NAME_LEN: usize = 25;

impl Opcode {
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Opcodes the interpreter must run even while `execute` is false.
    ///
    /// Everything else is skipped by advancing [`Opcode::encoded_len`] bytes
    /// without touching hardware or state.
    pub fn runs_while_skipping(self) -> bool {
        matches!(
            self,
            Opcode::Not | Opcode::Resume | Opcode::EndRepeat | Opcode::Done
        )
    }

    /// Opcodes that only exist on legacy BMP images and terminate the
    /// script anywhere else.
    pub fn legacy_only(self) -> bool {
        matches!(
            self,
            Opcode::ConfigureMem | Opcode::ConfigureClk | Opcode::ConfigurePreinit
        )
    }

    /// Conditional opcodes; these can only ever clear `execute`.
    pub fn is_condition(self) -> bool {
        matches!(
            self,
            Opcode::Condition
                | Opcode::IoCondition
                | Opcode::IoFlagCondition
                | Opcode::DpCondition
                | Opcode::RamCondition
                | Opcode::RamCondition2
                | Opcode::ConditionTime
                | Opcode::I2cIf
                | Opcode::I2cLongIf
        )
    }

    /// Size of the fixed part of the instruction, count operands included.
    pub fn fixed_len(self) -> usize {
        match self {
            Opcode::EndRepeat
            | Opcode::Not
            | Opcode::ComputeMem
            | Opcode::ConfigureMem
            | Opcode::ConfigureClk
            | Opcode::ConfigurePreinit
            | Opcode::Done
            | Opcode::Resume
            | Opcode::Gpio
            | Opcode::Reserved8c
            | Opcode::Reserved8d
            | Opcode::Reserved92
            | Opcode::ReservedAa => 1,

            Opcode::Repeat
            | Opcode::IoFlagCondition
            | Opcode::IoMaskOr
            | Opcode::IoOr
            | Opcode::Sub
            | Opcode::Macro
            | Opcode::Condition
            | Opcode::IoCondition
            | Opcode::ZmCrGroup
            | Opcode::RamRestrictPll
            | Opcode::GpioNe => 2,

            Opcode::DpCondition
            | Opcode::ZmCr
            | Opcode::ConditionTime
            | Opcode::Ltime
            | Opcode::SubDirect
            | Opcode::Jump
            | Opcode::RamCondition
            | Opcode::Time
            | Opcode::ZmTmdsGroup => 3,

            Opcode::Cr | Opcode::I2cByte | Opcode::ZmI2cByte | Opcode::ZmI2c => 4,
            Opcode::Tmds | Opcode::ZmIndexIo | Opcode::Io | Opcode::CrIndexAddressLatched => 5,

            Opcode::I2cIf
            | Opcode::IndexIo
            | Opcode::ZmRegSequence
            | Opcode::ZmRegGroup
            | Opcode::Auxch
            | Opcode::ZmAuxch => 6,

            Opcode::ZmRegIndirect
            | Opcode::ZmReg16
            | Opcode::Pll
            | Opcode::I2cLongIf
            | Opcode::RamRestrictZmRegGroup => 7,

            Opcode::AndnReg
            | Opcode::OrReg
            | Opcode::Pll2
            | Opcode::RamCondition2
            | Opcode::ZmReg
            | Opcode::CopyZmReg => 9,

            Opcode::Copy | Opcode::IoRestrictProg | Opcode::IoRestrictPll2 => 11,
            Opcode::IoRestrictPll => 12,
            Opcode::Reset | Opcode::NvReg | Opcode::ZmMaskAdd => 13,
            Opcode::Xlat => 17,
            Opcode::IndexAddressLatched => 18,
            Opcode::CopyNvReg => 22,
        }
    }

    /// Variable-length tail following the fixed part, if any.
    pub fn tail(self) -> Option<Tail> {
        let (count, element) = match self {
            Opcode::IoRestrictProg | Opcode::IoRestrictPll2 => (TailCount::Operand(6), 4),
            Opcode::IoRestrictPll => (TailCount::Operand(7), 2),
            Opcode::IndexAddressLatched => (TailCount::Operand(17), 2),
            Opcode::I2cByte => (TailCount::Operand(3), 3),
            Opcode::ZmI2cByte => (TailCount::Operand(3), 2),
            Opcode::ZmI2c => (TailCount::Operand(3), 1),
            Opcode::ZmTmdsGroup => (TailCount::Operand(2), 2),
            Opcode::CrIndexAddressLatched => (TailCount::Operand(4), 1),
            Opcode::ZmCrGroup => (TailCount::Operand(1), 2),
            Opcode::ZmRegSequence | Opcode::ZmRegGroup => (TailCount::Operand(5), 4),
            Opcode::RamRestrictPll => (TailCount::RamGroups, 4),
            Opcode::RamRestrictZmRegGroup => (TailCount::OperandByRamGroups(6), 4),
            Opcode::Auxch => (TailCount::Operand(5), 2),
            Opcode::ZmAuxch => (TailCount::Operand(5), 1),
            Opcode::GpioNe => (TailCount::Operand(1), 1),
            _ => return None,
        };
        Some(Tail { count, element })
    }

    /// Total instruction size in bytes, reading only its count operand.
    ///
    /// Fails only when the count operand itself lies past the end of the
    /// image; a tail that overruns the image still yields its nominal length.
    pub fn encoded_len(self, image: &ProgramImage, offset: usize) -> Result<usize, ImageError> {
        let fixed = self.fixed_len();
        let Some(tail) = self.tail() else {
            return Ok(fixed);
        };
        let groups = usize::from(image.tables().ram_restrict_groups());
        let count = match tail.count {
            TailCount::Operand(rel) => usize::from(image.read_u8(offset + rel)?),
            TailCount::RamGroups => groups,
            TailCount::OperandByRamGroups(rel) => usize::from(image.read_u8(offset + rel)?) * groups,
        };
        Ok(fixed + count * tail.element)
    }
}

/// How the element count of a variable tail is found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TailCount {
    /// A one-byte operand at this offset from the opcode byte.
    Operand(usize),
    /// The RAM-restrict group count of the image.
    RamGroups,
    /// A one-byte operand multiplied by the RAM-restrict group count.
    OperandByRamGroups(usize),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tail {
    pub count: TailCount,
    /// Bytes per element.
    pub element: usize,
}
