//! Tracing infrastructure for following script execution.
//!
//! # Design: Zero-Cost Abstraction
//!
//! The interpreter is generic over [`Tracer`]. With [`NoopTracer`] every
//! method is an `#[inline(always)]` empty function and the calls disappear,
//! so the untraced interpreter carries no tracing state.
//!
//! This is separate from the `tracing` log. The log records what went wrong
//! and is filtered by level; a tracer builds a complete human-readable
//! listing of one run for the `trace` command.

use vbinit_core::Colors;
use vbinit_core::utils::{hex_bytes, hex_width_for_len};
use vbinit_image::{Instruction, MAX_NAME_LEN, Opcode, ProgramImage};

use super::error::OpcodeError;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Executed instructions, execute-flag changes, calls and failures.
    #[default]
    Default,
    /// Verbose (-v): also instructions skipped while `execute` is false.
    Verbose,
    /// Very verbose (-vv): also the raw bytes of every executed instruction.
    VeryVerbose,
}

/// Tracer trait for interpreter instrumentation.
///
/// Each method is called at a specific point during execution:
/// - `trace_script` - when a top-level run starts
/// - `trace_instruction` - before executing a decoded instruction
/// - `trace_skip` - when an instruction is stepped over because `execute` is false
/// - `trace_execute` - after a condition, or any instruction that changed the execute flag
/// - `trace_failure` - after an opcode failed and became a no-op
/// - `trace_call` / `trace_return` - around a nested run (SUB, SUB_DIRECT, REPEAT)
pub trait Tracer {
    fn trace_script(&mut self, start: usize);

    fn trace_instruction(&mut self, offset: usize, instr: &Instruction);

    fn trace_skip(&mut self, offset: usize, opcode: Opcode);

    fn trace_execute(&mut self, execute: bool);

    fn trace_failure(&mut self, offset: usize, err: &OpcodeError);

    fn trace_call(&mut self, target: usize);

    fn trace_return(&mut self);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_script(&mut self, _start: usize) {}

    #[inline(always)]
    fn trace_instruction(&mut self, _offset: usize, _instr: &Instruction) {}

    #[inline(always)]
    fn trace_skip(&mut self, _offset: usize, _opcode: Opcode) {}

    #[inline(always)]
    fn trace_execute(&mut self, _execute: bool) {}

    #[inline(always)]
    fn trace_failure(&mut self, _offset: usize, _err: &OpcodeError) {}

    #[inline(always)]
    fn trace_call(&mut self, _target: usize) {}

    #[inline(always)]
    fn trace_return(&mut self) {}
}

/// Tracer that collects an indented execution listing.
pub struct PrintTracer<'i> {
    image: &'i ProgramImage,
    verbosity: Verbosity,
    colors: Colors,
    lines: Vec<String>,
    /// Nesting depth of SUB/REPEAT calls.
    depth: usize,
    /// Hex width of offsets.
    width: usize,
}

impl<'i> PrintTracer<'i> {
    pub fn new(image: &'i ProgramImage, verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            image,
            verbosity,
            colors,
            lines: Vec::new(),
            depth: 0,
            width: hex_width_for_len(image.len()),
        }
    }

    /// Collected lines, without trailing newlines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    fn indent(&self) -> String {
        "  ".repeat(self.depth)
    }

    fn offset(&self, offset: usize) -> String {
        format!("{:0w$x}", offset, w = self.width)
    }

    /// Sub-lines sit under the mnemonic column.
    fn add_subline(&mut self, content: &str) {
        let pad = " ".repeat(self.width + 2);
        self.lines.push(format!("{}{pad}{content}", self.indent()));
    }
}

impl Tracer for PrintTracer<'_> {
    fn trace_script(&mut self, start: usize) {
        let c = self.colors;
        if !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.depth = 0;
        self.lines.push(format!(
            "{}[script 0x{}]{}",
            c.blue,
            self.offset(start),
            c.reset
        ));
    }

    fn trace_instruction(&mut self, offset: usize, instr: &Instruction) {
        let c = self.colors;
        let name = instr.opcode().name();
        let operands = instr.operands();
        let head = format!("{}{}{}{}  ", self.indent(), c.dim, self.offset(offset), c.reset);
        let line = if operands.is_empty() {
            format!("{head}{}{name}{}", c.blue, c.reset)
        } else {
            format!("{head}{}{name:<MAX_NAME_LEN$}{} {operands}", c.blue, c.reset)
        };
        self.lines.push(line);

        if self.verbosity == Verbosity::VeryVerbose
            && let Ok(bytes) = self.image.slice(offset, instr.len())
        {
            let content = format!("{}{}{}", c.dim, hex_bytes(bytes), c.reset);
            self.add_subline(&content);
        }
    }

    fn trace_skip(&mut self, offset: usize, opcode: Opcode) {
        if self.verbosity == Verbosity::Default {
            return;
        }
        let c = self.colors;
        let line = format!(
            "{}{}{}  {} (skipped){}",
            self.indent(),
            c.dim,
            self.offset(offset),
            opcode.name(),
            c.reset
        );
        self.lines.push(line);
    }

    fn trace_execute(&mut self, execute: bool) {
        let c = self.colors;
        let content = format!("{}execute = {execute}{}", c.yellow, c.reset);
        self.add_subline(&content);
    }

    fn trace_failure(&mut self, _offset: usize, err: &OpcodeError) {
        let c = self.colors;
        let content = format!("{}! {err}{}", c.yellow, c.reset);
        self.add_subline(&content);
    }

    fn trace_call(&mut self, target: usize) {
        let c = self.colors;
        let content = format!("{}-> 0x{}{}", c.dim, self.offset(target), c.reset);
        self.add_subline(&content);
        self.depth += 1;
    }

    fn trace_return(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
