//! Table directory and typed views over the fixed-size sub-table entries.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::ImageError;
use crate::header::{BitHeader, BmpHeader};
use crate::image::{ProgramImage, read_u8, read_u16_le};

pub const CONDITION_ENTRY_SIZE: usize = 12;
pub const IO_CONDITION_ENTRY_SIZE: usize = 5;
pub const IO_FLAG_CONDITION_ENTRY_SIZE: usize = 9;
pub const MACRO_INDEX_ENTRY_SIZE: usize = 2;
pub const MACRO_ENTRY_SIZE: usize = 8;
pub const MEM_INIT_ENTRY_SIZE: usize = 66;
/// Register data inside a memory-init entry starts after flags and two PLL words.
pub const MEM_INIT_DATA_OFFSET: usize = 6;
pub const SEQUENCE_END: u32 = 0xffff_ffff;

/// Upper bound on script-pointer entries walked before giving up on a terminator.
const MAX_SCRIPT_POINTERS: usize = 256;
/// Upper bound on register-sequence entries.
const MAX_SEQUENCE_LEN: usize = 256;

/// BMP offsets of the legacy memory tables and the shared pointer block.
const BMP_MEM_INIT: usize = 24;
const BMP_SDR_SEQUENCE: usize = 26;
const BMP_DDR_SEQUENCE: usize = 28;
const BMP_SCRIPT_POINTERS: usize = 75;
const BMP_PLL_LIMITS: usize = 142;

/// Size of the six-pointer block shared by BIT `'I'` and BMP headers.
const POINTER_BLOCK_LEN: usize = 12;

/// Named sub-tables an init script can reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TableId {
    InitScripts,
    MacroIndex,
    Macros,
    Conditions,
    IoConditions,
    IoFlagConditions,
    Xlat,
    RamRestrict,
    PllLimits,
    MemInit,
    SdrSequence,
    DdrSequence,
}

impl TableId {
    pub const ALL: [TableId; 12] = [
        TableId::InitScripts,
        TableId::MacroIndex,
        TableId::Macros,
        TableId::Conditions,
        TableId::IoConditions,
        TableId::IoFlagConditions,
        TableId::Xlat,
        TableId::RamRestrict,
        TableId::PllLimits,
        TableId::MemInit,
        TableId::SdrSequence,
        TableId::DdrSequence,
    ];

    /// The six pointers of the init-table block, in storage order.
    const POINTER_BLOCK: [TableId; 6] = [
        TableId::InitScripts,
        TableId::MacroIndex,
        TableId::Macros,
        TableId::Conditions,
        TableId::IoConditions,
        TableId::IoFlagConditions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TableId::InitScripts => "init-scripts",
            TableId::MacroIndex => "macro-index",
            TableId::Macros => "macros",
            TableId::Conditions => "conditions",
            TableId::IoConditions => "io-conditions",
            TableId::IoFlagConditions => "io-flag-conditions",
            TableId::Xlat => "xlat",
            TableId::RamRestrict => "ram-restrict",
            TableId::PllLimits => "pll-limits",
            TableId::MemInit => "mem-init",
            TableId::SdrSequence => "sdr-sequence",
            TableId::DdrSequence => "ddr-sequence",
        }
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base offsets of the sub-tables, resolved once from the image header.
///
/// A stored pointer of zero means the table is absent and is never recorded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableDirectory {
    tables: IndexMap<TableId, u16>,
    ram_restrict_groups: u8,
    legacy: bool,
}

impl TableDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a table. Zero offsets are ignored.
    pub fn with(mut self, id: TableId, offset: u16) -> Self {
        self.insert(id, offset);
        self
    }

    /// Set the number of RAM-restrict columns (`G`).
    pub fn with_ram_restrict_groups(mut self, groups: u8) -> Self {
        self.ram_restrict_groups = groups;
        self
    }

    /// Mark a raw directory as describing a legacy (BMP major ≤ 2) image.
    pub fn with_legacy(mut self, legacy: bool) -> Self {
        self.legacy = legacy;
        self
    }

    fn insert(&mut self, id: TableId, offset: u16) {
        if offset != 0 {
            self.tables.insert(id, offset);
        }
    }

    pub fn get(&self, id: TableId) -> Option<u16> {
        self.tables.get(&id).copied()
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.tables.contains_key(&id)
    }

    /// Tables in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (TableId, u16)> + '_ {
        self.tables.iter().map(|(&id, &offset)| (id, offset))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn ram_restrict_groups(&self) -> u8 {
        self.ram_restrict_groups
    }

    pub fn is_legacy(&self) -> bool {
        self.legacy
    }

    fn read_pointer_block(&mut self, bytes: &[u8], base: usize) -> Result<(), ImageError> {
        for (i, id) in TableId::POINTER_BLOCK.into_iter().enumerate() {
            self.insert(id, read_u16_le(bytes, base + i * 2)?);
        }
        Ok(())
    }

    pub(crate) fn from_bit(bytes: &[u8], header: &BitHeader) -> Result<Self, ImageError> {
        let mut dir = Self::new();

        if let Some(init) = header.entry(b'I')
            && usize::from(init.length) >= POINTER_BLOCK_LEN
        {
            let base = usize::from(init.offset);
            dir.read_pointer_block(bytes, base)?;
            if init.length >= 16 {
                dir.insert(TableId::Xlat, read_u16_le(bytes, base + 14)?);
            }
        }

        if let Some(mem) = header.entry(b'M') {
            let base = usize::from(mem.offset);
            match mem.version {
                1 if mem.length >= 5 => {
                    dir.ram_restrict_groups = read_u8(bytes, base + 2)?;
                    dir.insert(TableId::RamRestrict, read_u16_le(bytes, base + 3)?);
                }
                2 if mem.length >= 3 => {
                    dir.ram_restrict_groups = read_u8(bytes, base)?;
                    dir.insert(TableId::RamRestrict, read_u16_le(bytes, base + 1)?);
                }
                _ => {}
            }
        }

        if let Some(clock) = header.entry(b'C')
            && clock.length >= 10
        {
            let base = usize::from(clock.offset);
            dir.insert(TableId::PllLimits, read_u16_le(bytes, base + 8)?);
        }

        Ok(dir)
    }

    pub(crate) fn from_bmp(bytes: &[u8], header: &BmpHeader) -> Result<Self, ImageError> {
        let mut dir = Self::new().with_legacy(header.is_legacy());
        let base = header.offset;
        let fits = |end: usize| base + end <= bytes.len();

        if header.is_legacy() && fits(BMP_DDR_SEQUENCE + 2) {
            dir.insert(TableId::MemInit, read_u16_le(bytes, base + BMP_MEM_INIT)?);
            dir.insert(TableId::SdrSequence, read_u16_le(bytes, base + BMP_SDR_SEQUENCE)?);
            dir.insert(TableId::DdrSequence, read_u16_le(bytes, base + BMP_DDR_SEQUENCE)?);
        }
        if fits(BMP_SCRIPT_POINTERS + POINTER_BLOCK_LEN) {
            dir.read_pointer_block(bytes, base + BMP_SCRIPT_POINTERS)?;
        }
        if fits(BMP_PLL_LIMITS + 2) {
            dir.insert(TableId::PllLimits, read_u16_le(bytes, base + BMP_PLL_LIMITS)?);
        }

        Ok(dir)
    }
}

// ============================================================================
// Entry views
// ============================================================================

/// `(R[reg] & mask) == value`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConditionEntry {
    pub reg: u32,
    pub mask: u32,
    pub value: u32,
}

/// `(IO[port][index] & mask) == value`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoConditionEntry {
    pub port: u16,
    pub index: u8,
    pub mask: u8,
    pub value: u8,
}

/// `(flags[(IO[port][index] & mask) >> shift] & flag_mask) == value`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoFlagConditionEntry {
    pub port: u16,
    pub index: u8,
    pub mask: u8,
    pub shift: u8,
    pub flag_array: u16,
    pub flag_mask: u8,
    pub value: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacroEntry {
    pub reg: u32,
    pub value: u32,
}

/// One row of the legacy memory-init table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemInitEntry {
    pub offset: usize,
    pub flags: u8,
    pub mpll: u16,
    pub nvpll: u16,
}

impl MemInitEntry {
    /// Start of the register values consumed by `CONFIGURE_MEM`.
    pub fn data_offset(&self) -> usize {
        self.offset + MEM_INIT_DATA_OFFSET
    }

    pub fn is_ddr(&self) -> bool {
        self.flags & 0x01 != 0
    }
}

impl ProgramImage {
    fn entry_offset(&self, id: TableId, index: u8, size: usize) -> Result<usize, ImageError> {
        Ok(self.table(id)? + usize::from(index) * size)
    }

    /// Script offset stored at `index` in the script-pointer table.
    pub fn script_pointer(&self, index: u8) -> Result<u16, ImageError> {
        let at = self.entry_offset(TableId::InitScripts, index, 2)?;
        self.read_u16(at)
    }

    /// All script offsets up to the first zero entry.
    pub fn script_pointers(&self) -> Result<Vec<u16>, ImageError> {
        let base = self.table(TableId::InitScripts)?;
        let mut pointers = Vec::new();
        for i in 0..MAX_SCRIPT_POINTERS {
            let Ok(pointer) = self.read_u16(base + i * 2) else {
                break;
            };
            if pointer == 0 {
                break;
            }
            pointers.push(pointer);
        }
        Ok(pointers)
    }

    pub fn condition(&self, index: u8) -> Result<ConditionEntry, ImageError> {
        let at = self.entry_offset(TableId::Conditions, index, CONDITION_ENTRY_SIZE)?;
        Ok(ConditionEntry {
            reg: self.read_u32(at)?,
            mask: self.read_u32(at + 4)?,
            value: self.read_u32(at + 8)?,
        })
    }

    pub fn io_condition(&self, index: u8) -> Result<IoConditionEntry, ImageError> {
        let at = self.entry_offset(TableId::IoConditions, index, IO_CONDITION_ENTRY_SIZE)?;
        Ok(IoConditionEntry {
            port: self.read_u16(at)?,
            index: self.read_u8(at + 2)?,
            mask: self.read_u8(at + 3)?,
            value: self.read_u8(at + 4)?,
        })
    }

    pub fn io_flag_condition(&self, index: u8) -> Result<IoFlagConditionEntry, ImageError> {
        let at = self.entry_offset(
            TableId::IoFlagConditions,
            index,
            IO_FLAG_CONDITION_ENTRY_SIZE,
        )?;
        Ok(IoFlagConditionEntry {
            port: self.read_u16(at)?,
            index: self.read_u8(at + 2)?,
            mask: self.read_u8(at + 3)?,
            shift: self.read_u8(at + 4)?,
            flag_array: self.read_u16(at + 5)?,
            flag_mask: self.read_u8(at + 7)?,
            value: self.read_u8(at + 8)?,
        })
    }

    /// `(first macro, count)` for a macro-index entry.
    pub fn macro_range(&self, index: u8) -> Result<(u8, u8), ImageError> {
        let at = self.entry_offset(TableId::MacroIndex, index, MACRO_INDEX_ENTRY_SIZE)?;
        Ok((self.read_u8(at)?, self.read_u8(at + 1)?))
    }

    pub fn macro_entry(&self, index: usize) -> Result<MacroEntry, ImageError> {
        let at = self.table(TableId::Macros)? + index * MACRO_ENTRY_SIZE;
        Ok(MacroEntry {
            reg: self.read_u32(at)?,
            value: self.read_u32(at + 4)?,
        })
    }

    /// Byte `offset` of the translation array selected by `index`.
    pub fn xlat(&self, index: u8, offset: u8) -> Result<u8, ImageError> {
        let at = self.entry_offset(TableId::Xlat, index, 2)?;
        let array = usize::from(self.read_u16(at)?);
        self.read_u8(array + usize::from(offset))
    }

    /// Map a raw RAM strap to its RAM-restrict column.
    ///
    /// Images without a strap map use the strap directly.
    pub fn ram_restrict_column(&self, strap: u8) -> Result<u8, ImageError> {
        match self.tables().get(TableId::RamRestrict) {
            Some(map) => self.read_u8(usize::from(map) + usize::from(strap)),
            None => Ok(strap),
        }
    }

    pub fn mem_init_entry(&self, index: u8) -> Result<MemInitEntry, ImageError> {
        let at = self.entry_offset(TableId::MemInit, index, MEM_INIT_ENTRY_SIZE)?;
        Ok(MemInitEntry {
            offset: at,
            flags: self.read_u8(at)?,
            mpll: self.read_u16(at + 2)?,
            nvpll: self.read_u16(at + 4)?,
        })
    }

    /// Register list of the SDR or DDR sequence table, without the terminator.
    pub fn sequence_registers(&self, ddr: bool) -> Result<Vec<u32>, ImageError> {
        let id = if ddr {
            TableId::DdrSequence
        } else {
            TableId::SdrSequence
        };
        let base = self.table(id)?;
        let mut regs = Vec::new();
        for i in 0..MAX_SEQUENCE_LEN {
            let reg = self.read_u32(base + i * 4)?;
            if reg == SEQUENCE_END {
                break;
            }
            regs.push(reg);
        }
        Ok(regs)
    }
}
