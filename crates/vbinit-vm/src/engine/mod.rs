//! Runtime engine for executing init scripts.
//!
//! The interpreter walks one script at a time, dispatching each opcode to
//! its handler. Control-flow opcodes (SUB, SUB_DIRECT, REPEAT) recurse into
//! the interpreter with the same [`ExecutionState`].

mod dispatch;
mod error;
mod handlers;
mod interp;
mod state;
mod trace;

#[cfg(test)]
mod dispatch_tests;
#[cfg(test)]
mod trace_tests;

pub use dispatch::{Dispatcher, OpcodeDescriptor};
pub use error::{OpcodeError, RuntimeError};
pub use interp::{
    InitRun, Interpreter, InterpreterBuilder, MAX_OPS, RunReport, ScriptExit, ScriptLimits, Step,
};
pub use state::{ExecutionState, OutputContext};
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
