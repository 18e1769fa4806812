//! JSON description of simulated hardware.
//!
//! ```json
//! {
//!   "registers": { "0x101000": "0x3c" },
//!   "indexed": { "0x3d4": { "0x3c": "0x10" } },
//!   "ports": { "0x3c2": 1 },
//!   "i2c": [{ "bus": 0, "addr": "0x50", "registers": { "0x10": 1 } }],
//!   "aux": [{ "bus": 0, "registers": { "0x0d": 1 } }],
//!   "tmds": { "0": "0x6100b0" },
//!   "failing_plls": ["0x680504"]
//! }
//! ```
//!
//! Every number may be a JSON integer or a string in any form
//! [`vbinit_core::parse_number`] accepts. I2C addresses are 7-bit.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use vbinit_core::{ParseNumberError, parse_number};

use super::memory::MemoryHardware;

#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("invalid fixture: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read fixture: {0}")]
    Io(#[from] std::io::Error),

    #[error("{what} {value:#x} is out of range")]
    OutOfRange { what: &'static str, value: u64 },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(u64),
    Text(String),
}

/// A number written either as a JSON integer or as a string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "RawNumber")]
pub struct Num(u64);

impl TryFrom<RawNumber> for Num {
    type Error = ParseNumberError;

    fn try_from(raw: RawNumber) -> Result<Self, Self::Error> {
        match raw {
            RawNumber::Int(n) => Ok(Num(n)),
            RawNumber::Text(s) => parse_number(&s).map(Num),
        }
    }
}

impl Num {
    fn narrow<T: TryFrom<u64>>(self, what: &'static str) -> Result<T, FixtureError> {
        T::try_from(self.0).map_err(|_| FixtureError::OutOfRange {
            what,
            value: self.0,
        })
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct I2cFixture {
    pub bus: Num,
    pub addr: Num,
    #[serde(default)]
    pub registers: IndexMap<Num, Num>,
    #[serde(default)]
    pub nak: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuxFixture {
    pub bus: Num,
    #[serde(default)]
    pub registers: IndexMap<Num, Num>,
}

/// Initial state of a [`MemoryHardware`].
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareFixture {
    pub registers: IndexMap<Num, Num>,
    pub indexed: IndexMap<Num, IndexMap<Num, Num>>,
    pub ports: IndexMap<Num, Num>,
    pub i2c: Vec<I2cFixture>,
    pub aux: Vec<AuxFixture>,
    pub tmds: IndexMap<Num, Num>,
    /// Per-head TMDS links: head -> link -> base register.
    pub head_tmds: IndexMap<Num, IndexMap<Num, Num>>,
    pub failing_plls: Vec<Num>,
}

impl HardwareFixture {
    pub fn from_json(text: &str) -> Result<Self, FixtureError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Build the simulated hardware, checking every value fits its width.
    pub fn build(&self) -> Result<MemoryHardware, FixtureError> {
        let mut hw = MemoryHardware::new();

        for (reg, value) in &self.registers {
            hw = hw.with_reg(reg.narrow("register")?, value.narrow("register value")?);
        }
        for (port, regs) in &self.indexed {
            let port: u16 = port.narrow("port")?;
            for (index, value) in regs {
                hw = hw.with_indexed(
                    port,
                    index.narrow("port index")?,
                    value.narrow("port value")?,
                );
            }
        }
        for (port, value) in &self.ports {
            hw = hw.with_port(port.narrow("port")?, value.narrow("port value")?);
        }
        for dev in &self.i2c {
            let bus: u8 = dev.bus.narrow("i2c bus")?;
            let addr: u8 = dev.addr.narrow("i2c address")?;
            if addr > 0x7f {
                return Err(FixtureError::OutOfRange {
                    what: "i2c address",
                    value: u64::from(addr),
                });
            }
            hw = if dev.nak {
                hw.with_nak_device(bus, addr)
            } else {
                hw.with_i2c_device(bus, addr)
            };
            for (reg, value) in &dev.registers {
                hw = hw.with_i2c_register(
                    bus,
                    addr,
                    reg.narrow("i2c register")?,
                    value.narrow("i2c value")?,
                );
            }
        }
        for dev in &self.aux {
            let bus: u8 = dev.bus.narrow("aux bus")?;
            hw = hw.with_aux_device(bus);
            for (addr, value) in &dev.registers {
                hw = hw.with_aux_byte(
                    bus,
                    addr.narrow("aux address")?,
                    value.narrow("aux value")?,
                );
            }
        }
        for (link, reg) in &self.tmds {
            hw = hw.with_tmds(link.narrow("tmds link")?, reg.narrow("tmds register")?);
        }
        for (head, links) in &self.head_tmds {
            let head: u8 = head.narrow("head")?;
            for (link, reg) in links {
                hw = hw.with_head_tmds(
                    head,
                    link.narrow("tmds link")?,
                    reg.narrow("tmds register")?,
                );
            }
        }
        for reg in &self.failing_plls {
            hw = hw.with_failing_pll(reg.narrow("pll register")?);
        }

        Ok(hw)
    }
}

impl MemoryHardware {
    pub fn from_fixture(fixture: &HardwareFixture) -> Result<Self, FixtureError> {
        fixture.build()
    }
}
