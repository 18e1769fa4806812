//! In-memory hardware that records every facade call.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use vbinit_core::utils::hex_bytes;

use super::error::{PllError, TransferError};
use super::Hardware;
use crate::engine::OutputContext;

/// One recorded facade call, in call order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HwCall {
    ReadReg {
        reg: u32,
        value: u32,
    },
    WriteReg {
        reg: u32,
        value: u32,
    },
    ReadIndexed {
        port: u16,
        index: u8,
        value: u8,
    },
    WriteIndexed {
        port: u16,
        index: u8,
        value: u8,
    },
    ReadPort {
        port: u16,
        value: u8,
    },
    WritePort {
        port: u16,
        value: u8,
    },
    I2cWrite {
        bus: u8,
        addr: u8,
        data: Vec<u8>,
        ok: bool,
    },
    I2cWriteRead {
        bus: u8,
        addr: u8,
        write: Vec<u8>,
        read: Vec<u8>,
        ok: bool,
    },
    AuxRead {
        bus: u8,
        addr: u32,
        data: Vec<u8>,
        ok: bool,
    },
    AuxWrite {
        bus: u8,
        addr: u32,
        data: Vec<u8>,
        ok: bool,
    },
    ProgramPll {
        reg: u32,
        khz: u32,
        ok: bool,
    },
    ProgramPllId {
        id: u8,
        khz: u32,
    },
    SleepMicros {
        us: u32,
    },
    SleepMillis {
        ms: u32,
    },
    ComputeMemory,
    ResetGpios {
        excluded: Vec<u8>,
    },
}

impl HwCall {
    /// Calls that change device state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            HwCall::WriteReg { .. }
                | HwCall::WriteIndexed { .. }
                | HwCall::WritePort { .. }
                | HwCall::I2cWrite { .. }
                | HwCall::AuxWrite { .. }
                | HwCall::ProgramPll { .. }
                | HwCall::ProgramPllId { .. }
        )
    }
}

fn failed(ok: bool) -> &'static str {
    if ok { "" } else { " (failed)" }
}

impl fmt::Display for HwCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwCall::ReadReg { reg, value } => write!(f, "R[0x{reg:06x}] -> 0x{value:08x}"),
            HwCall::WriteReg { reg, value } => write!(f, "R[0x{reg:06x}] <- 0x{value:08x}"),
            HwCall::ReadIndexed { port, index, value } => {
                write!(f, "IO[0x{port:04x}][0x{index:02x}] -> 0x{value:02x}")
            }
            HwCall::WriteIndexed { port, index, value } => {
                write!(f, "IO[0x{port:04x}][0x{index:02x}] <- 0x{value:02x}")
            }
            HwCall::ReadPort { port, value } => write!(f, "IO[0x{port:04x}] -> 0x{value:02x}"),
            HwCall::WritePort { port, value } => write!(f, "IO[0x{port:04x}] <- 0x{value:02x}"),
            HwCall::I2cWrite {
                bus,
                addr,
                data,
                ok,
            } => write!(
                f,
                "I2C[{bus}][0x{addr:02x}] write {}{}",
                hex_bytes(data),
                failed(*ok)
            ),
            HwCall::I2cWriteRead {
                bus,
                addr,
                write,
                read,
                ok,
            } => write!(
                f,
                "I2C[{bus}][0x{addr:02x}] write {} read {}{}",
                hex_bytes(write),
                hex_bytes(read),
                failed(*ok)
            ),
            HwCall::AuxRead {
                bus,
                addr,
                data,
                ok,
            } => write!(
                f,
                "AUX[{bus}][0x{addr:05x}] read {}{}",
                hex_bytes(data),
                failed(*ok)
            ),
            HwCall::AuxWrite {
                bus,
                addr,
                data,
                ok,
            } => write!(
                f,
                "AUX[{bus}][0x{addr:05x}] write {}{}",
                hex_bytes(data),
                failed(*ok)
            ),
            HwCall::ProgramPll { reg, khz, ok } => {
                write!(f, "PLL R[0x{reg:06x}] = {khz} kHz{}", failed(*ok))
            }
            HwCall::ProgramPllId { id, khz } => write!(f, "PLL #0x{id:02x} = {khz} kHz"),
            HwCall::SleepMicros { us } => write!(f, "sleep {us} us"),
            HwCall::SleepMillis { ms } => write!(f, "sleep {ms} ms"),
            HwCall::ComputeMemory => f.write_str("compute memory"),
            HwCall::ResetGpios { excluded } if excluded.is_empty() => f.write_str("reset gpios"),
            HwCall::ResetGpios { excluded } => {
                write!(f, "reset gpios except {}", hex_bytes(excluded))
            }
        }
    }
}

/// Byte-addressed register file of one I2C device.
#[derive(Clone, Debug, Default)]
struct I2cDevice {
    registers: IndexMap<u16, u8>,
    nak: bool,
}

/// Simulated device: register maps, bus devices and a call log.
///
/// Unmapped registers and ports read as zero. Transfers to a bus address with
/// no device fail with [`TransferError::NoDevice`]. Sleeps return at once and
/// are only recorded.
#[derive(Clone, Debug, Default)]
pub struct MemoryHardware {
    regs: IndexMap<u32, u32>,
    indexed: IndexMap<(u16, u8), u8>,
    ports: IndexMap<u16, u8>,
    i2c: IndexMap<(u8, u8), I2cDevice>,
    aux: IndexMap<u8, IndexMap<u32, u8>>,
    tmds: IndexMap<u8, u32>,
    head_tmds: IndexMap<(u8, u8), u32>,
    failing_plls: IndexSet<u32>,
    calls: Vec<HwCall>,
}

impl MemoryHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reg(mut self, reg: u32, value: u32) -> Self {
        self.regs.insert(reg, value);
        self
    }

    pub fn with_indexed(mut self, port: u16, index: u8, value: u8) -> Self {
        self.indexed.insert((port, index), value);
        self
    }

    pub fn with_port(mut self, port: u16, value: u8) -> Self {
        self.ports.insert(port, value);
        self
    }

    /// Attach an I2C device at the 7-bit address `addr`.
    pub fn with_i2c_device(mut self, bus: u8, addr: u8) -> Self {
        self.i2c.entry((bus, addr)).or_default();
        self
    }

    /// Set a register of an I2C device, attaching the device if needed.
    pub fn with_i2c_register(mut self, bus: u8, addr: u8, reg: u16, value: u8) -> Self {
        self.i2c
            .entry((bus, addr))
            .or_default()
            .registers
            .insert(reg, value);
        self
    }

    /// Attach an I2C device that never acknowledges.
    pub fn with_nak_device(mut self, bus: u8, addr: u8) -> Self {
        self.i2c.entry((bus, addr)).or_default().nak = true;
        self
    }

    /// Attach an AUX device on `bus`.
    pub fn with_aux_device(mut self, bus: u8) -> Self {
        self.aux.entry(bus).or_default();
        self
    }

    /// Set an AUX register, attaching the device if needed.
    pub fn with_aux_byte(mut self, bus: u8, addr: u32, value: u8) -> Self {
        self.aux.entry(bus).or_default().insert(addr, value);
        self
    }

    /// Base register of TMDS link `tmds`, for every output.
    pub fn with_tmds(mut self, tmds: u8, reg: u32) -> Self {
        self.tmds.insert(tmds, reg);
        self
    }

    /// Base register of TMDS link `tmds` while `head` is active. Takes
    /// precedence over [`with_tmds`](Self::with_tmds).
    pub fn with_head_tmds(mut self, head: u8, tmds: u8, reg: u32) -> Self {
        self.head_tmds.insert((head, tmds), reg);
        self
    }

    /// Make programming the PLL at `reg` fail.
    pub fn with_failing_pll(mut self, reg: u32) -> Self {
        self.failing_plls.insert(reg);
        self
    }

    /// Current register value, without recording a call.
    pub fn reg(&self, reg: u32) -> u32 {
        self.regs.get(&reg).copied().unwrap_or(0)
    }

    pub fn indexed(&self, port: u16, index: u8) -> u8 {
        self.indexed.get(&(port, index)).copied().unwrap_or(0)
    }

    pub fn port(&self, port: u16) -> u8 {
        self.ports.get(&port).copied().unwrap_or(0)
    }

    pub fn i2c_register(&self, bus: u8, addr: u8, reg: u16) -> Option<u8> {
        self.i2c.get(&(bus, addr))?.registers.get(&reg).copied()
    }

    pub fn aux_byte(&self, bus: u8, addr: u32) -> Option<u8> {
        self.aux.get(&bus)?.get(&addr).copied()
    }

    pub fn calls(&self) -> &[HwCall] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<HwCall> {
        std::mem::take(&mut self.calls)
    }

    fn i2c_device(&mut self, bus: u8, addr: u8) -> Result<&mut I2cDevice, TransferError> {
        let dev = self
            .i2c
            .get_mut(&(bus, addr))
            .ok_or(TransferError::NoDevice {
                bus,
                addr: u32::from(addr),
            })?;
        if dev.nak {
            return Err(TransferError::Nak {
                bus,
                addr: u32::from(addr),
            });
        }
        Ok(dev)
    }

    fn i2c_write_inner(&mut self, bus: u8, addr: u8, data: &[u8]) -> Result<(), TransferError> {
        let dev = self.i2c_device(bus, addr)?;
        if let Some((&pointer, values)) = data.split_first() {
            let mut reg = u16::from(pointer);
            for &v in values {
                dev.registers.insert(reg, v);
                reg = reg.wrapping_add(1);
            }
        }
        Ok(())
    }

    fn i2c_write_read_inner(
        &mut self,
        bus: u8,
        addr: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), TransferError> {
        let dev = self.i2c_device(bus, addr)?;
        let mut reg = write
            .iter()
            .fold(0u16, |acc, &b| (acc << 8) | u16::from(b));
        for byte in read.iter_mut() {
            *byte = dev.registers.get(&reg).copied().unwrap_or(0);
            reg = reg.wrapping_add(1);
        }
        Ok(())
    }

    fn aux_device(&mut self, bus: u8, addr: u32) -> Result<&mut IndexMap<u32, u8>, TransferError> {
        self.aux
            .get_mut(&bus)
            .ok_or(TransferError::NoDevice { bus, addr })
    }
}

impl Hardware for MemoryHardware {
    fn read_reg32(&mut self, reg: u32) -> u32 {
        let value = self.reg(reg);
        self.calls.push(HwCall::ReadReg { reg, value });
        value
    }

    fn write_reg32(&mut self, reg: u32, value: u32) {
        self.regs.insert(reg, value);
        self.calls.push(HwCall::WriteReg { reg, value });
    }

    fn read_indexed(&mut self, port: u16, index: u8) -> u8 {
        let value = self.indexed(port, index);
        self.calls.push(HwCall::ReadIndexed { port, index, value });
        value
    }

    fn write_indexed(&mut self, port: u16, index: u8, value: u8) {
        self.indexed.insert((port, index), value);
        self.calls.push(HwCall::WriteIndexed { port, index, value });
    }

    fn read_port(&mut self, port: u16) -> u8 {
        let value = self.port(port);
        self.calls.push(HwCall::ReadPort { port, value });
        value
    }

    fn write_port(&mut self, port: u16, value: u8) {
        self.ports.insert(port, value);
        self.calls.push(HwCall::WritePort { port, value });
    }

    fn i2c_write(&mut self, bus: u8, addr: u8, data: &[u8]) -> Result<(), TransferError> {
        let result = self.i2c_write_inner(bus, addr, data);
        self.calls.push(HwCall::I2cWrite {
            bus,
            addr,
            data: data.to_vec(),
            ok: result.is_ok(),
        });
        result
    }

    fn i2c_write_read(
        &mut self,
        bus: u8,
        addr: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), TransferError> {
        let result = self.i2c_write_read_inner(bus, addr, write, read);
        self.calls.push(HwCall::I2cWriteRead {
            bus,
            addr,
            write: write.to_vec(),
            read: read.to_vec(),
            ok: result.is_ok(),
        });
        result
    }

    fn aux_read(&mut self, bus: u8, addr: u32, buf: &mut [u8]) -> Result<(), TransferError> {
        let result = self.aux_device(bus, addr).map(|dev| {
            for (i, byte) in buf.iter_mut().enumerate() {
                let at = addr.wrapping_add(i as u32);
                *byte = dev.get(&at).copied().unwrap_or(0);
            }
        });
        self.calls.push(HwCall::AuxRead {
            bus,
            addr,
            data: buf.to_vec(),
            ok: result.is_ok(),
        });
        result
    }

    fn aux_write(&mut self, bus: u8, addr: u32, data: &[u8]) -> Result<(), TransferError> {
        let result = self.aux_device(bus, addr).map(|dev| {
            for (i, &byte) in data.iter().enumerate() {
                dev.insert(addr.wrapping_add(i as u32), byte);
            }
        });
        self.calls.push(HwCall::AuxWrite {
            bus,
            addr,
            data: data.to_vec(),
            ok: result.is_ok(),
        });
        result
    }

    fn program_pll(&mut self, reg: u32, khz: u32) -> Result<(), PllError> {
        let ok = !self.failing_plls.contains(&reg);
        self.calls.push(HwCall::ProgramPll { reg, khz, ok });
        if ok {
            Ok(())
        } else {
            Err(PllError::OutOfRange { reg, khz })
        }
    }

    fn program_pll_id(&mut self, id: u8, khz: u32) -> Result<(), PllError> {
        self.calls.push(HwCall::ProgramPllId { id, khz });
        Ok(())
    }

    fn sleep_micros(&mut self, us: u32) {
        self.calls.push(HwCall::SleepMicros { us });
    }

    fn sleep_millis(&mut self, ms: u32) {
        self.calls.push(HwCall::SleepMillis { ms });
    }

    fn compute_memory(&mut self) {
        self.calls.push(HwCall::ComputeMemory);
    }

    fn reset_gpios(&mut self, excluded: &[u8]) {
        self.calls.push(HwCall::ResetGpios {
            excluded: excluded.to_vec(),
        });
    }

    fn tmds_register(&mut self, tmds: u8, output: &OutputContext) -> Option<u32> {
        self.head_tmds
            .get(&(output.head, tmds))
            .or_else(|| self.tmds.get(&tmds))
            .copied()
    }
}
