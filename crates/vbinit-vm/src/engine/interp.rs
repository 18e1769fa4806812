//! The script interpreter.

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use vbinit_image::{ImageError, Instruction, ProgramImage};

use super::dispatch::Dispatcher;
use super::error::{OpcodeError, RuntimeError};
use super::state::{ExecutionState, OutputContext};
use super::trace::{NoopTracer, Tracer};
use crate::hardware::Hardware;

/// Dispatched instructions after which a single run is abandoned.
pub const MAX_OPS: u32 = 1000;

/// Runtime limits for script execution.
#[derive(Clone, Copy, Debug)]
pub struct ScriptLimits {
    /// Maximum instructions per run (default: 1,000).
    pub(crate) max_ops: u32,
    /// Maximum SUB/SUB_DIRECT/REPEAT nesting (default: 32).
    pub(crate) recursion_limit: u32,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_ops: MAX_OPS,
            recursion_limit: 32,
        }
    }
}

impl ScriptLimits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_ops(mut self, ops: u32) -> Self {
        self.max_ops = ops;
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn get_max_ops(&self) -> u32 {
        self.max_ops
    }
    pub fn get_recursion_limit(&self) -> u32 {
        self.recursion_limit
    }
}

/// What the interpreter does after one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Move the cursor by this many bytes. Zero or negative only for JUMP.
    Advance(i32),
    /// End the run after this instruction.
    Stop,
    /// The instruction's operands lie past the end of the image.
    Truncated,
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptExit {
    /// DONE, a repeating END_REPEAT, or a legacy-only opcode on a modern image.
    Done,
    /// The script offset was 0.
    NoScript,
    /// The cursor left the image.
    Truncated,
    /// The op guard fired.
    Runaway,
}

/// Summary of one run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub start: usize,
    /// Offset after the terminating instruction, or where the loop gave up.
    pub cursor: usize,
    pub ops: u32,
    pub exit: ScriptExit,
}

/// One entry of [`Interpreter::run_init_tables`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitRun {
    pub index: usize,
    pub offset: u16,
    pub outcome: Result<RunReport, RuntimeError>,
}

/// Executes init scripts of one image against one hardware facade.
pub struct Interpreter<'a, H: Hardware> {
    pub(super) image: &'a ProgramImage,
    pub(super) hw: &'a mut H,
    pub(super) dispatcher: &'static Dispatcher,
    pub(super) limits: ScriptLimits,
    pub(super) output: OutputContext,
    /// Current SUB/SUB_DIRECT/REPEAT nesting.
    pub(super) depth: u32,
    /// RAM-restrict column, read on first use in a top-level run.
    pub(super) ram_config: Option<u8>,
}

/// Builder for [`Interpreter`] instances.
pub struct InterpreterBuilder<'a, H: Hardware> {
    image: &'a ProgramImage,
    hw: &'a mut H,
    limits: ScriptLimits,
    output: OutputContext,
}

impl<'a, H: Hardware> InterpreterBuilder<'a, H> {
    pub fn new(image: &'a ProgramImage, hw: &'a mut H) -> Self {
        Self {
            image,
            hw,
            limits: ScriptLimits::default(),
            output: OutputContext::default(),
        }
    }

    pub fn limits(mut self, limits: ScriptLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn max_ops(mut self, ops: u32) -> Self {
        self.limits = self.limits.max_ops(ops);
        self
    }

    pub fn recursion_limit(mut self, limit: u32) -> Self {
        self.limits = self.limits.recursion_limit(limit);
        self
    }

    /// Output context given to every run started by `run_init_tables`.
    pub fn output(mut self, output: OutputContext) -> Self {
        self.output = output;
        self
    }

    pub fn build(self) -> Interpreter<'a, H> {
        Interpreter {
            image: self.image,
            hw: self.hw,
            dispatcher: Dispatcher::shared(),
            limits: self.limits,
            output: self.output,
            depth: 0,
            ram_config: None,
        }
    }
}

impl<'a, H: Hardware> Interpreter<'a, H> {
    pub fn builder(image: &'a ProgramImage, hw: &'a mut H) -> InterpreterBuilder<'a, H> {
        InterpreterBuilder::new(image, hw)
    }

    pub fn image(&self) -> &'a ProgramImage {
        self.image
    }

    pub fn limits(&self) -> ScriptLimits {
        self.limits
    }

    /// Run the script at `start` without tracing.
    pub fn execute_script(
        &mut self,
        start: usize,
        state: &mut ExecutionState,
    ) -> Result<RunReport, RuntimeError> {
        self.execute_script_with(start, state, &mut NoopTracer)
    }

    /// Run the script at `start`, reporting every step to `tracer`.
    ///
    /// Only an unknown opcode in this script is an error. Every other failure
    /// is logged and shows up in the report's exit reason or not at all.
    pub fn execute_script_with<T: Tracer>(
        &mut self,
        start: usize,
        state: &mut ExecutionState,
        tracer: &mut T,
    ) -> Result<RunReport, RuntimeError> {
        self.ram_config = None;
        self.depth = 0;
        tracer.trace_script(start);
        self.run(start, state, tracer)
    }

    /// Run every script in the script-pointer table, each with fresh state.
    pub fn run_init_tables(&mut self) -> Result<Vec<InitRun>, ImageError> {
        self.run_init_tables_with(&mut NoopTracer)
    }

    pub fn run_init_tables_with<T: Tracer>(
        &mut self,
        tracer: &mut T,
    ) -> Result<Vec<InitRun>, ImageError> {
        let pointers = self.image.script_pointers()?;
        let mut runs = Vec::with_capacity(pointers.len());
        for (index, &offset) in pointers.iter().enumerate() {
            let mut state = ExecutionState::with_output(self.output);
            info!("running init script {index} at {offset:#06x}");
            let outcome = self.execute_script_with(usize::from(offset), &mut state, tracer);
            runs.push(InitRun {
                index,
                offset,
                outcome,
            });
        }
        Ok(runs)
    }

    fn run<T: Tracer>(
        &mut self,
        start: usize,
        state: &mut ExecutionState,
        tracer: &mut T,
    ) -> Result<RunReport, RuntimeError> {
        let report = |cursor, ops, exit| RunReport {
            start,
            cursor,
            ops,
            exit,
        };
        if start == 0 {
            return Ok(report(0, 0, ScriptExit::NoScript));
        }

        let mut offset = start;
        let mut ops = 0;
        loop {
            if offset >= self.image.len() {
                warn!("script at {start:#06x} ran past the end of the image at {offset:#06x}");
                return Ok(report(offset, ops, ScriptExit::Truncated));
            }
            if ops >= self.limits.max_ops {
                warn!("script at {start:#06x} exceeded {ops} ops, abandoned at {offset:#06x}");
                return Ok(report(offset, ops, ScriptExit::Runaway));
            }

            let step = self.step(offset, state, tracer)?;
            ops += 1;
            match step {
                Step::Advance(delta) => match offset.checked_add_signed(delta as isize) {
                    Some(next) => offset = next,
                    None => {
                        warn!("jump at {offset:#06x} lands before the image start");
                        return Ok(report(offset, ops, ScriptExit::Truncated));
                    }
                },
                Step::Stop => return Ok(report(offset + 1, ops, ScriptExit::Done)),
                Step::Truncated => {
                    warn!("instruction at {offset:#06x} is truncated");
                    return Ok(report(offset, ops, ScriptExit::Truncated));
                }
            }
        }
    }

    /// Dispatch the instruction at `offset`.
    ///
    /// Opcode failures are logged and turn the instruction into a no-op of
    /// its encoded length.
    pub fn step<T: Tracer>(
        &mut self,
        offset: usize,
        state: &mut ExecutionState,
        tracer: &mut T,
    ) -> Result<Step, RuntimeError> {
        let Ok(id) = self.image.read_u8(offset) else {
            return Ok(Step::Truncated);
        };
        let Some(desc) = self.dispatcher.lookup(id) else {
            error!("unknown opcode {id:#04x} at {offset:#06x}");
            return Err(RuntimeError::UnknownOpcode { offset, id });
        };
        let opcode = desc.opcode;

        if opcode.legacy_only() && !self.image.is_legacy() {
            warn!(
                "{} at {offset:#06x} needs a legacy image, stopping",
                desc.name
            );
            return Ok(Step::Stop);
        }

        let Ok(len) = opcode.encoded_len(self.image, offset) else {
            return Ok(Step::Truncated);
        };
        let advance = Step::Advance(len as i32);

        if !state.execute && !opcode.runs_while_skipping() {
            tracer.trace_skip(offset, opcode);
            return Ok(advance);
        }

        let instr = match Instruction::decode(self.image, offset) {
            Ok(instr) => instr,
            Err(err) => {
                let err = OpcodeError::from(err);
                warn!("{} at {offset:#06x}: {err}", desc.name);
                tracer.trace_failure(offset, &err);
                return Ok(advance);
            }
        };

        trace!("{offset:#06x} {id:#04x} {instr}");
        tracer.trace_instruction(offset, &instr);

        let was_executing = state.execute;
        let step = match self.exec(&instr, offset, len, state, tracer) {
            Ok(step) => step,
            Err(err) => {
                warn!("{} at {offset:#06x}: {err}", desc.name);
                tracer.trace_failure(offset, &err);
                advance
            }
        };
        if state.execute != was_executing || opcode.is_condition() {
            tracer.trace_execute(state.execute);
        }
        Ok(step)
    }

    /// Run a nested script with the caller's state.
    ///
    /// The nested run's own failures end it without affecting the caller.
    pub(super) fn call<T: Tracer>(
        &mut self,
        target: usize,
        state: &mut ExecutionState,
        tracer: &mut T,
    ) -> Result<(), OpcodeError> {
        if self.depth >= self.limits.recursion_limit {
            return Err(OpcodeError::RecursionLimit {
                limit: self.limits.recursion_limit,
            });
        }

        self.depth += 1;
        debug!("call {target:#06x} at depth {}", self.depth);
        tracer.trace_call(target);
        let result = self.run(target, state, tracer);
        tracer.trace_return();
        self.depth -= 1;

        if let Err(err) = result {
            error!("sub-script at {target:#06x} aborted: {err}");
        }
        Ok(())
    }
}
