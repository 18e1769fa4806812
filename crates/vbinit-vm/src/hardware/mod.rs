//! The hardware-access facade consumed by the interpreter.
//!
//! The interpreter never touches hardware directly. Every register, port,
//! bus and delay operation goes through [`Hardware`], which a driver
//! implements over the real device and [`MemoryHardware`] implements over
//! plain maps.
//!
//! Register and port accesses cannot fail. Bus transfers and PLL programming
//! report errors, and the interpreter decides per opcode whether a failure
//! is a no-op or clears the execute flag.

mod error;
mod fixture;
mod memory;

#[cfg(test)]
mod fixture_tests;

pub use error::{PllError, TransferError};
pub use fixture::{AuxFixture, FixtureError, HardwareFixture, I2cFixture, Num};
pub use memory::{HwCall, MemoryHardware};

use crate::engine::OutputContext;

/// Device access used by init scripts.
///
/// The interpreter holds `&mut` to the facade for a whole run, so one run
/// is serialized against every other user of the same facade.
pub trait Hardware {
    /// 32-bit MMIO register read.
    fn read_reg32(&mut self, reg: u32) -> u32;

    /// 32-bit MMIO register write.
    fn write_reg32(&mut self, reg: u32, value: u32);

    /// Indexed port read: select `index` on `port`, read `port + 1`.
    fn read_indexed(&mut self, port: u16, index: u8) -> u8;

    /// Indexed port write: select `index` on `port`, write `port + 1`.
    fn write_indexed(&mut self, port: u16, index: u8, value: u8);

    fn read_port(&mut self, port: u16) -> u8;

    fn write_port(&mut self, port: u16, value: u8);

    /// Plain I2C write of `data` to the 7-bit address `addr`.
    fn i2c_write(&mut self, bus: u8, addr: u8, data: &[u8]) -> Result<(), TransferError>;

    /// I2C write followed by a repeated-start read into `read`.
    fn i2c_write_read(
        &mut self,
        bus: u8,
        addr: u8,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), TransferError>;

    /// Read one byte-wide device register.
    fn i2c_read_byte(&mut self, bus: u8, addr: u8, reg: u8) -> Result<u8, TransferError> {
        let mut byte = [0u8];
        self.i2c_write_read(bus, addr, &[reg], &mut byte)?;
        Ok(byte[0])
    }

    /// Write one byte-wide device register.
    fn i2c_write_byte(&mut self, bus: u8, addr: u8, reg: u8, value: u8) -> Result<(), TransferError> {
        self.i2c_write(bus, addr, &[reg, value])
    }

    /// Native AUX read of `buf.len()` bytes starting at `addr`.
    fn aux_read(&mut self, bus: u8, addr: u32, buf: &mut [u8]) -> Result<(), TransferError>;

    /// Native AUX write of `data` starting at `addr`.
    fn aux_write(&mut self, bus: u8, addr: u32, data: &[u8]) -> Result<(), TransferError>;

    /// Program the PLL controlled by `reg` to `khz`.
    ///
    /// Divider selection against the device's VCO limits is the facade's job.
    fn program_pll(&mut self, reg: u32, khz: u32) -> Result<(), PllError>;

    /// Program a PLL identified by its PLL-table type id instead of a register.
    fn program_pll_id(&mut self, id: u8, khz: u32) -> Result<(), PllError>;

    fn sleep_micros(&mut self, us: u32);

    fn sleep_millis(&mut self, ms: u32);

    /// Chipset-specific memory geometry probe.
    fn compute_memory(&mut self) {}

    /// Reset every GPIO function to its default state, except `excluded`.
    fn reset_gpios(&mut self, _excluded: &[u8]) {}

    /// Base register of TMDS link `tmds` for the active output, if any.
    fn tmds_register(&mut self, _tmds: u8, _output: &OutputContext) -> Option<u32> {
        None
    }
}
