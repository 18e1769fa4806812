//! Execution state shared by a script and every sub-script it calls.

use serde::{Deserialize, Serialize};

/// The output the script is programming.
///
/// Selects per-head register banks and the buses used by I2C, AUX and TMDS
/// opcodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputContext {
    /// Display head being programmed. The hardware facade uses it to pick
    /// per-head register banks, e.g. in `Hardware::tmds_register`.
    pub head: u8,
    /// Output resource index, the bit toggled by `IO_MASK_OR` and `IO_OR`.
    pub or: u8,
    /// Bus used when an I2C opcode names bus 0xff.
    pub i2c_bus: u8,
    pub aux_bus: u8,
    /// Link state bits tested by `DP_CONDITION` 0 to 2.
    pub link_flags: u8,
}

/// The VM's two bits of branch state plus the active output.
///
/// Passed by `&mut` through every recursive call so that a condition inside a
/// sub-script stays in effect for the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionState {
    pub execute: bool,
    pub repeat: bool,
    pub output: OutputContext,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            execute: true,
            repeat: false,
            output: OutputContext::default(),
        }
    }
}

impl ExecutionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(output: OutputContext) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }
}
