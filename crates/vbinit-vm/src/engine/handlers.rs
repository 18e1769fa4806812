//! Opcode handlers.
//!
//! Each arm turns one decoded instruction into facade calls and state
//! changes. Handlers return the [`Step`] the interpreter takes next; an
//! `Err` makes the instruction a no-op of its encoded length.

use tracing::{debug, warn};

use vbinit_image::{Instruction, SEQUENCE_END, TableId};

use super::error::OpcodeError;
use super::interp::{Interpreter, Step};
use super::state::ExecutionState;
use super::trace::Tracer;
use crate::hardware::Hardware;

/// CRT controller index/data port pair.
const CRTC: u16 = 0x3d4;
/// Sequencer index/data port pair.
const SEQ: u16 = 0x3c4;

/// Boot straps; bits 2..5 carry the RAM configuration.
const REG_STRAPS: u32 = 0x101000;
const REG_RAM_STATUS: u32 = 0x100000;

/// Shift operand: below 0x80 shifts right, otherwise left by `0x100 - s`.
fn shifted(value: u32, shift: u8) -> u32 {
    if shift < 0x80 {
        value.checked_shr(u32::from(shift)).unwrap_or(0)
    } else {
        value.checked_shl(0x100 - u32::from(shift)).unwrap_or(0)
    }
}

fn select<T: Copy>(values: &[T], selector: usize, what: &'static str) -> Result<T, OpcodeError> {
    values
        .get(selector)
        .copied()
        .ok_or(OpcodeError::OperandOutOfRange {
            what,
            value: selector as u64,
            limit: values.len() as u64,
        })
}

/// Relative advance from `offset` to an absolute `target`.
fn jump_delta(target: u16, offset: usize) -> Result<i32, OpcodeError> {
    let delta = i64::from(target) - offset as i64;
    i32::try_from(delta).map_err(|_| OpcodeError::OperandOutOfRange {
        what: "jump target",
        value: u64::from(target),
        limit: offset as u64,
    })
}

/// Update `execute` from a condition outcome. Conditions only ever clear it.
fn apply_condition(offset: usize, state: &mut ExecutionState, met: Result<bool, OpcodeError>) {
    match met {
        Ok(true) => debug!("condition at {offset:#06x} met"),
        Ok(false) => {
            debug!("condition at {offset:#06x} not met");
            state.execute = false;
        }
        Err(err) => {
            warn!("condition at {offset:#06x} treated as unmet: {err}");
            state.execute = false;
        }
    }
}

/// Resolve the bus byte 0xff and convert the 8-bit bus address.
fn i2c_target(state: &ExecutionState, bus: u8, addr: u8) -> (u8, u8) {
    let bus = if bus == 0xff { state.output.i2c_bus } else { bus };
    (bus, addr >> 1)
}

impl<H: Hardware> Interpreter<'_, H> {
    pub(super) fn exec<T: Tracer>(
        &mut self,
        instr: &Instruction,
        offset: usize,
        len: usize,
        state: &mut ExecutionState,
        tracer: &mut T,
    ) -> Result<Step, OpcodeError> {
        let next = Step::Advance(len as i32);

        match instr {
            // ---- control flow ----
            Instruction::Repeat { count } => {
                let prev = state.repeat;
                state.repeat = true;
                let mut result = Ok(());
                for _ in 1..*count {
                    result = self.call(offset + len, state, tracer);
                    if result.is_err() {
                        break;
                    }
                }
                state.repeat = prev;
                result?;
            }
            Instruction::EndRepeat => {
                if state.repeat {
                    return Ok(Step::Stop);
                }
            }
            Instruction::Not => state.execute = !state.execute,
            Instruction::Resume => state.execute = true,
            Instruction::Done => return Ok(Step::Stop),
            Instruction::Jump { target } => return Ok(Step::Advance(jump_delta(*target, offset)?)),
            Instruction::Sub { index } => {
                let target = self.image.script_pointer(*index)?;
                self.call(usize::from(target), state, tracer)?;
            }
            Instruction::SubDirect { target } => {
                self.call(usize::from(*target), state, tracer)?;
            }
            Instruction::Reserved(opcode) => {
                debug!("reserved opcode {:#04x} at {offset:#06x}", opcode.id());
            }

            // ---- conditions ----
            Instruction::Condition { cond } => {
                let met = self.condition_met(*cond);
                apply_condition(offset, state, met);
            }
            Instruction::IoCondition { cond } => {
                let met = self.io_condition_met(*cond);
                apply_condition(offset, state, met);
            }
            Instruction::IoFlagCondition { cond } => {
                let met = self.io_flag_condition_met(*cond);
                apply_condition(offset, state, met);
            }
            Instruction::ConditionTime { cond, retries } => {
                let attempts = (*retries).clamp(1, 100);
                let mut met = self.condition_met(*cond);
                for _ in 1..attempts {
                    if !matches!(met, Ok(false)) {
                        break;
                    }
                    self.hw.sleep_millis(20);
                    met = self.condition_met(*cond);
                }
                apply_condition(offset, state, met);
            }
            Instruction::RamCondition { mask, value } => {
                let ram = self.hw.read_reg32(REG_RAM_STATUS);
                let met = (ram & u32::from(*mask)) == u32::from(*value);
                apply_condition(offset, state, Ok(met));
            }
            Instruction::RamCondition2 { mask, value } => {
                let straps = self.hw.read_reg32(REG_STRAPS);
                apply_condition(offset, state, Ok((straps & mask) == *value));
            }
            Instruction::DpCondition { cond, .. } => {
                let met = match cond {
                    0..=2 => Ok((state.output.link_flags & (1u8 << *cond)) != 0),
                    5 | 6 => {
                        let mut buf = [0u8];
                        self.hw
                            .aux_read(state.output.aux_bus, 0x0d, &mut buf)
                            .map(|()| ((buf[0] & 0x01) != 0) == (*cond == 5))
                            .map_err(OpcodeError::from)
                    }
                    _ => return Err(OpcodeError::Unsupported(format!("DP condition {cond:#04x}"))),
                };
                apply_condition(offset, state, met);
            }
            Instruction::I2cIf {
                bus,
                addr,
                reg,
                mask,
                data,
            } => {
                let (bus, addr) = i2c_target(state, *bus, *addr);
                let met = self
                    .hw
                    .i2c_read_byte(bus, addr, *reg)
                    .map(|v| (v & mask) == *data)
                    .map_err(OpcodeError::from);
                apply_condition(offset, state, met);
            }
            Instruction::I2cLongIf {
                bus,
                addr,
                reg_lo,
                reg_hi,
                mask,
                data,
            } => {
                let (bus, addr) = i2c_target(state, *bus, *addr);
                let mut byte = [0u8];
                let met = self
                    .hw
                    .i2c_write_read(bus, addr, &[*reg_hi, *reg_lo], &mut byte)
                    .map(|()| (byte[0] & mask) == *data)
                    .map_err(OpcodeError::from);
                apply_condition(offset, state, met);
            }

            // ---- MMIO registers ----
            Instruction::ZmReg { reg, value } => {
                let value = if *reg == 0x000200 { value | 1 } else { *value };
                self.hw.write_reg32(*reg, value);
            }
            Instruction::ZmReg16 { reg, data } => self.hw.write_reg32(*reg, u32::from(*data)),
            Instruction::NvReg { reg, mask, data } => {
                let v = self.hw.read_reg32(*reg);
                self.hw.write_reg32(*reg, (v & mask) | data);
            }
            Instruction::AndnReg { reg, mask } => {
                let v = self.hw.read_reg32(*reg);
                self.hw.write_reg32(*reg, v & !mask);
            }
            Instruction::OrReg { reg, mask } => {
                let v = self.hw.read_reg32(*reg);
                self.hw.write_reg32(*reg, v | mask);
            }
            Instruction::ZmRegSequence { base, values } => {
                let mut reg = *base;
                for &value in values {
                    self.hw.write_reg32(reg, value);
                    reg = reg.wrapping_add(4);
                }
            }
            Instruction::ZmRegGroup { reg, values } => {
                for &value in values {
                    self.hw.write_reg32(*reg, value);
                }
            }
            Instruction::ZmRegIndirect { reg, pointer } => {
                let value = self.image.read_u32(usize::from(*pointer))?;
                self.hw.write_reg32(*reg, value);
            }
            Instruction::CopyZmReg { src, dst } => {
                let v = self.hw.read_reg32(*src);
                self.hw.write_reg32(*dst, v);
            }
            Instruction::CopyNvReg {
                src,
                shift,
                src_mask,
                xor,
                dst,
                dst_mask,
            } => {
                let data = (shifted(self.hw.read_reg32(*src), *shift) & src_mask) ^ xor;
                let v = self.hw.read_reg32(*dst);
                self.hw.write_reg32(*dst, (v & dst_mask) | data);
            }
            Instruction::ZmMaskAdd { reg, mask, add } => {
                let v = self.hw.read_reg32(*reg);
                self.hw
                    .write_reg32(*reg, (v & mask) | (v.wrapping_add(*add) & !mask));
            }
            Instruction::Xlat {
                src,
                shift,
                src_mask,
                index,
                dst,
                dst_mask,
                dst_shift,
            } => {
                let source = shifted(self.hw.read_reg32(*src), *shift);
                let selector = (source & u32::from(*src_mask)) as u8;
                let data = u32::from(self.image.xlat(*index, selector)?)
                    .checked_shl(u32::from(*dst_shift))
                    .unwrap_or(0);
                let v = self.hw.read_reg32(*dst);
                self.hw.write_reg32(*dst, (v & dst_mask) | data);
            }
            Instruction::IndexAddressLatched {
                ctrl_reg,
                data_reg,
                ctrl_mask,
                ctrl_data,
                pairs,
            } => {
                for &(addr, data) in pairs {
                    self.hw.write_reg32(*data_reg, u32::from(data));
                    let ctrl = self.hw.read_reg32(*ctrl_reg);
                    self.hw.write_reg32(
                        *ctrl_reg,
                        (ctrl & ctrl_mask) | ctrl_data | u32::from(addr),
                    );
                }
            }
            Instruction::Reset {
                reg,
                value1,
                value2,
            } => {
                let saved = self.hw.read_reg32(0x00184c);
                self.hw.write_reg32(0x00184c, saved & !0x0000_0f00);
                self.hw.write_reg32(*reg, *value1);
                self.hw.sleep_micros(10);
                self.hw.write_reg32(*reg, *value2);
                self.hw.write_reg32(0x00184c, saved);
                let v = self.hw.read_reg32(0x001850);
                self.hw.write_reg32(0x001850, v & !0x0000_0001);
            }
            Instruction::Macro { index } => {
                let (first, count) = if self.image.tables().contains(TableId::MacroIndex) {
                    self.image.macro_range(*index)?
                } else {
                    (*index, 1)
                };
                for i in 0..usize::from(count) {
                    let entry = self.image.macro_entry(usize::from(first) + i)?;
                    self.hw.write_reg32(entry.reg, entry.value);
                }
            }

            // ---- legacy I/O ports ----
            Instruction::Io { port, mask, data } => {
                let v = self.hw.read_port(*port);
                self.hw.write_port(*port, (v & mask) | data);
            }
            Instruction::IndexIo {
                port,
                index,
                mask,
                data,
            } => {
                let v = self.hw.read_indexed(*port, *index);
                self.hw.write_indexed(*port, *index, (v & mask) | data);
            }
            Instruction::ZmIndexIo { port, index, data } => {
                self.hw.write_indexed(*port, *index, *data);
            }
            Instruction::Cr { index, mask, data } => {
                let v = self.hw.read_indexed(CRTC, *index);
                self.hw.write_indexed(CRTC, *index, (v & mask) | data);
            }
            Instruction::ZmCr { index, data } => self.hw.write_indexed(CRTC, *index, *data),
            Instruction::ZmCrGroup { writes } => {
                for &(index, data) in writes {
                    self.hw.write_indexed(CRTC, index, data);
                }
            }
            Instruction::CrIndexAddressLatched {
                index1,
                index2,
                base,
                data,
            } => {
                let saved = self.hw.read_indexed(CRTC, *index1);
                let mut at = *base;
                for &byte in data {
                    self.hw.write_indexed(CRTC, *index1, at);
                    self.hw.write_indexed(CRTC, *index2, byte);
                    at = at.wrapping_add(1);
                }
                self.hw.write_indexed(CRTC, *index1, saved);
            }
            Instruction::IoMaskOr { index } => {
                let bit = 1u8.checked_shl(u32::from(state.output.or)).unwrap_or(0);
                let v = self.hw.read_indexed(CRTC, *index);
                self.hw.write_indexed(CRTC, *index, v & !bit);
            }
            Instruction::IoOr { index } => {
                let bit = 1u8.checked_shl(u32::from(state.output.or)).unwrap_or(0);
                let v = self.hw.read_indexed(CRTC, *index);
                self.hw.write_indexed(CRTC, *index, v | bit);
            }
            Instruction::Copy {
                reg,
                shift,
                src_mask,
                port,
                index,
                mask,
            } => {
                let data = (shifted(self.hw.read_reg32(*reg), *shift) & u32::from(*src_mask)) as u8;
                let v = self.hw.read_indexed(*port, *index);
                self.hw.write_indexed(*port, *index, (v & mask) | data);
            }
            Instruction::IoRestrictProg {
                port,
                index,
                mask,
                shift,
                reg,
                values,
            } => {
                let selector = self.io_selector(*port, *index, *mask, *shift);
                let value = select(values, selector, "io restrict index")?;
                self.hw.write_reg32(*reg, value);
            }

            // ---- clocks ----
            Instruction::Pll { reg, freq } => {
                self.hw.program_pll(*reg, u32::from(*freq) * 10)?;
            }
            Instruction::Pll2 { reg, khz } => self.hw.program_pll(*reg, *khz)?,
            Instruction::IoRestrictPll {
                port,
                index,
                mask,
                shift,
                io_flag_condition,
                reg,
                freqs,
            } => {
                let selector = self.io_selector(*port, *index, *mask, *shift);
                let mut khz = u32::from(select(freqs, selector, "io restrict index")?) * 10;
                if *io_flag_condition != 0 && self.io_flag_condition_met(*io_flag_condition)? {
                    khz *= 2;
                }
                self.hw.program_pll(*reg, khz)?;
            }
            Instruction::IoRestrictPll2 {
                port,
                index,
                mask,
                shift,
                reg,
                freqs,
            } => {
                let selector = self.io_selector(*port, *index, *mask, *shift);
                let khz = select(freqs, selector, "io restrict index")?;
                self.hw.program_pll(*reg, khz)?;
            }
            Instruction::RamRestrictPll { pll, freqs } => {
                let strap = self.ram_strap()?;
                let khz = select(freqs, strap, "ram restrict column")?;
                self.hw.program_pll_id(*pll, khz)?;
            }
            Instruction::RamRestrictZmRegGroup {
                reg,
                increment,
                values,
                ..
            } => {
                let strap = self.ram_strap()?;
                let groups = usize::from(self.image.tables().ram_restrict_groups());
                let mut at = *reg;
                for row in values.chunks_exact(groups) {
                    self.hw.write_reg32(at, row[strap]);
                    at = at.wrapping_add(u32::from(*increment));
                }
            }

            // ---- delays ----
            Instruction::Time { micros } => {
                let us = u32::from(*micros);
                if us < 1000 {
                    self.hw.sleep_micros(us);
                } else {
                    self.hw.sleep_millis((us + 900) / 1000);
                }
            }
            Instruction::Ltime { millis } => self.hw.sleep_millis(u32::from(*millis)),

            // ---- I2C, AUX and TMDS ----
            Instruction::I2cByte { bus, addr, writes } => {
                let (bus, addr) = i2c_target(state, *bus, *addr);
                for &(reg, mask, data) in writes {
                    let result = self
                        .hw
                        .i2c_read_byte(bus, addr, reg)
                        .and_then(|v| self.hw.i2c_write_byte(bus, addr, reg, (v & mask) | data));
                    if let Err(err) = result {
                        warn!("I2C_BYTE at {offset:#06x}, register {reg:#04x}: {err}");
                    }
                }
            }
            Instruction::ZmI2cByte { bus, addr, writes } => {
                let (bus, addr) = i2c_target(state, *bus, *addr);
                for &(reg, data) in writes {
                    if let Err(err) = self.hw.i2c_write_byte(bus, addr, reg, data) {
                        warn!("ZM_I2C_BYTE at {offset:#06x}, register {reg:#04x}: {err}");
                    }
                }
            }
            Instruction::ZmI2c { bus, addr, data } => {
                let (bus, addr) = i2c_target(state, *bus, *addr);
                self.hw.i2c_write(bus, addr, data)?;
            }
            Instruction::Auxch { addr, writes } => {
                let bus = state.output.aux_bus;
                for &(mask, data) in writes {
                    let mut byte = [0u8];
                    let result = self
                        .hw
                        .aux_read(bus, *addr, &mut byte)
                        .and_then(|()| self.hw.aux_write(bus, *addr, &[(byte[0] & mask) | data]));
                    if let Err(err) = result {
                        warn!("AUXCH at {offset:#06x}: {err}");
                    }
                }
            }
            Instruction::ZmAuxch { addr, data } => {
                let bus = state.output.aux_bus;
                for &byte in data {
                    if let Err(err) = self.hw.aux_write(bus, *addr, &[byte]) {
                        warn!("ZM_AUXCH at {offset:#06x}: {err}");
                    }
                }
            }
            Instruction::Tmds {
                tmds,
                addr,
                mask,
                data,
            } => {
                let reg = self.tmds_base(*tmds, state)?;
                let addr = u32::from(*addr);
                self.hw.write_reg32(reg, addr | 0x10000);
                let data_reg = reg.wrapping_add(4);
                let v = self.hw.read_reg32(data_reg);
                self.hw
                    .write_reg32(data_reg, (v & u32::from(*mask)) | u32::from(*data));
                self.hw.write_reg32(reg, addr);
            }
            Instruction::ZmTmdsGroup { tmds, writes } => {
                let reg = self.tmds_base(*tmds, state)?;
                for &(addr, data) in writes {
                    self.hw.write_reg32(reg.wrapping_add(4), u32::from(data));
                    self.hw.write_reg32(reg, u32::from(addr));
                }
            }

            // ---- board hooks ----
            Instruction::ComputeMem => self.hw.compute_memory(),
            Instruction::Gpio => self.hw.reset_gpios(&[]),
            Instruction::GpioNe { functions } => self.hw.reset_gpios(functions),

            // ---- legacy memory bring-up ----
            Instruction::ConfigurePreinit => {
                let straps = self.hw.read_reg32(REG_STRAPS);
                let cr = ((straps << 2) & 0xf0) | ((straps & 0x40) >> 6);
                self.hw.write_indexed(CRTC, 0x3c, cr as u8);
            }
            Instruction::ConfigureMem => {
                let index = self.hw.read_indexed(CRTC, 0x3c) >> 4;
                let entry = self.image.mem_init_entry(index)?;
                let seq1 = self.hw.read_indexed(SEQ, 0x01);
                self.hw.write_indexed(SEQ, 0x01, seq1 | 0x20);

                let mut data = entry.data_offset();
                for reg in self.image.sequence_registers(entry.is_ddr())? {
                    let value = match reg {
                        0x10021c | 0x1002d0 | 0x1002d4 => 1,
                        _ => {
                            let value = self.image.read_u32(data)?;
                            data += 4;
                            if value == SEQUENCE_END {
                                continue;
                            }
                            value
                        }
                    };
                    self.hw.write_reg32(reg, value);
                }
            }
            Instruction::ConfigureClk => {
                let index = self.hw.read_indexed(CRTC, 0x3c) >> 4;
                let entry = self.image.mem_init_entry(index)?;
                let mut mpll = u32::from(entry.mpll) * 10;
                if entry.is_ddr() {
                    mpll *= 2;
                }
                let core = self.hw.program_pll(0x680500, u32::from(entry.nvpll) * 10);
                let memory = self.hw.program_pll(0x680504, mpll);
                core?;
                memory?;
            }
        }

        Ok(next)
    }

    /// `(IO[port][index] & mask) >> shift`
    fn io_selector(&mut self, port: u16, index: u8, mask: u8, shift: u8) -> usize {
        let v = self.hw.read_indexed(port, index) & mask;
        v.checked_shr(u32::from(shift)).unwrap_or(0) as usize
    }

    /// RAM-restrict column of this board, cached for the rest of the run.
    fn ram_strap(&mut self) -> Result<usize, OpcodeError> {
        let column = match self.ram_config {
            Some(column) => column,
            None => {
                let strap = ((self.hw.read_reg32(REG_STRAPS) & 0x3c) >> 2) as u8;
                let column = self.image.ram_restrict_column(strap)?;
                self.ram_config = Some(column);
                column
            }
        };
        let groups = self.image.tables().ram_restrict_groups();
        if column >= groups {
            return Err(OpcodeError::OperandOutOfRange {
                what: "ram restrict column",
                value: u64::from(column),
                limit: u64::from(groups),
            });
        }
        Ok(usize::from(column))
    }

    fn tmds_base(&mut self, tmds: u8, state: &ExecutionState) -> Result<u32, OpcodeError> {
        self.hw
            .tmds_register(tmds, &state.output)
            .ok_or(OpcodeError::NoTmdsRegister { tmds })
    }

    fn condition_met(&mut self, cond: u8) -> Result<bool, OpcodeError> {
        let entry = self.image.condition(cond)?;
        Ok((self.hw.read_reg32(entry.reg) & entry.mask) == entry.value)
    }

    fn io_condition_met(&mut self, cond: u8) -> Result<bool, OpcodeError> {
        let entry = self.image.io_condition(cond)?;
        Ok((self.hw.read_indexed(entry.port, entry.index) & entry.mask) == entry.value)
    }

    fn io_flag_condition_met(&mut self, cond: u8) -> Result<bool, OpcodeError> {
        let entry = self.image.io_flag_condition(cond)?;
        let selector = self.io_selector(entry.port, entry.index, entry.mask, entry.shift);
        let flags = self
            .image
            .read_u8(usize::from(entry.flag_array) + selector)?;
        Ok((flags & entry.flag_mask) == entry.value)
    }
}
