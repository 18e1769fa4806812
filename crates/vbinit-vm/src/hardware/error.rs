//! Failures reported by the hardware facade.

/// I2C or AUX transfer failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("no device at bus {bus} address {addr:#x}")]
    NoDevice { bus: u8, addr: u32 },

    #[error("device at bus {bus} address {addr:#x} did not acknowledge")]
    Nak { bus: u8, addr: u32 },
}

/// PLL programming failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PllError {
    #[error("no PLL limits for register {reg:#08x}")]
    NoLimits { reg: u32 },

    #[error("{khz} kHz is out of range for PLL {reg:#08x}")]
    OutOfRange { reg: u32, khz: u32 },
}
