#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Interpreter for firmware init-table scripts.
//!
//! This crate runs the byte-coded init scripts of a [`vbinit_image::ProgramImage`]
//! against a [`Hardware`] facade. [`MemoryHardware`] is an in-memory facade
//! that records every access, used by the CLI and the tests.

pub mod engine;
pub mod hardware;

// Re-export commonly used items at crate root
pub use engine::{
    Dispatcher, ExecutionState, InitRun, Interpreter, InterpreterBuilder, MAX_OPS, NoopTracer,
    OpcodeDescriptor, OpcodeError, OutputContext, PrintTracer, RunReport, RuntimeError,
    ScriptExit, ScriptLimits, Step, Tracer, Verbosity,
};
pub use hardware::{
    FixtureError, Hardware, HardwareFixture, HwCall, MemoryHardware, PllError, TransferError,
};
