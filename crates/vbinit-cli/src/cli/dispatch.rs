//! Dispatch logic: extract params from ArgMatches and convert to command args.
//!
//! This module contains:
//! - `*Params` structs that mirror command `*Args` but are populated from clap
//! - `from_matches()` extractors that pull relevant fields (ignoring hidden ones)
//! - `Into<*Args>` impls to bridge dispatch to command handlers

use std::path::PathBuf;

use clap::ArgMatches;

use vbinit_vm::{OutputContext, ScriptLimits, Verbosity};

use super::ColorChoice;
use crate::commands::dump::DumpArgs;
use crate::commands::exec::ExecArgs;
use crate::commands::run_common::{OutputFormat, RunOptions, ScriptSelection};
use crate::commands::tables::TablesArgs;
use crate::commands::trace::TraceArgs;

pub struct TablesParams {
    pub rom_path: PathBuf,
    pub color: ColorChoice,
}

impl TablesParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            rom_path: rom_path(m),
            color: parse_color(m),
        }
    }
}

impl From<TablesParams> for TablesArgs {
    fn from(p: TablesParams) -> Self {
        Self {
            rom_path: p.rom_path,
            color: p.color.should_colorize(),
        }
    }
}

pub struct DumpParams {
    pub rom_path: PathBuf,
    pub selection: ScriptSelection,
    pub color: ColorChoice,
    // Note: run flags are parsed but not extracted (unified flags)
}

impl DumpParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            rom_path: rom_path(m),
            selection: parse_selection(m),
            color: parse_color(m),
        }
    }
}

impl From<DumpParams> for DumpArgs {
    fn from(p: DumpParams) -> Self {
        Self {
            rom_path: p.rom_path,
            selection: p.selection,
            color: p.color.should_colorize(),
        }
    }
}

/// Flags shared by exec and trace.
pub struct RunParams {
    pub rom_path: PathBuf,
    pub selection: ScriptSelection,
    pub fixture: Option<PathBuf>,
    pub max_ops: u32,
    pub recursion_limit: u32,
    pub output: OutputContext,
    pub format: OutputFormat,
    pub color: ColorChoice,
}

impl RunParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        let defaults = ScriptLimits::default();
        let byte = |id: &str| m.get_one::<u8>(id).copied().unwrap_or(0);

        Self {
            rom_path: rom_path(m),
            selection: parse_selection(m),
            fixture: m.get_one::<PathBuf>("fixture").cloned(),

            // Limits
            max_ops: m
                .get_one::<u32>("max_ops")
                .copied()
                .unwrap_or(defaults.get_max_ops()),
            recursion_limit: m
                .get_one::<u32>("recursion_limit")
                .copied()
                .unwrap_or(defaults.get_recursion_limit()),

            // Active output
            output: OutputContext {
                head: byte("head"),
                or: byte("or"),
                i2c_bus: byte("i2c_bus"),
                aux_bus: byte("aux_bus"),
                link_flags: byte("link_flags"),
            },

            format: match m.get_one::<String>("format").map(|s| s.as_str()) {
                Some("json") => OutputFormat::Json,
                _ => OutputFormat::Text,
            },
            color: parse_color(m),
        }
    }

    fn into_options(self) -> (RunOptions, bool) {
        let options = RunOptions {
            rom_path: self.rom_path,
            selection: self.selection,
            fixture: self.fixture,
            limits: ScriptLimits::new()
                .max_ops(self.max_ops)
                .recursion_limit(self.recursion_limit),
            output: self.output,
            format: self.format,
        };
        (options, self.color.should_colorize())
    }
}

pub struct ExecParams {
    pub run: RunParams,
    // Note: verbose only raises the log level for exec
}

impl ExecParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            run: RunParams::from_matches(m),
        }
    }
}

impl From<ExecParams> for ExecArgs {
    fn from(p: ExecParams) -> Self {
        let (run, color) = p.run.into_options();
        Self { run, color }
    }
}

pub struct TraceParams {
    pub run: RunParams,
    pub verbose: u8,
}

impl TraceParams {
    pub fn from_matches(m: &ArgMatches) -> Self {
        Self {
            run: RunParams::from_matches(m),
            verbose: m.get_count("verbose"),
        }
    }
}

impl From<TraceParams> for TraceArgs {
    fn from(p: TraceParams) -> Self {
        let verbosity = match p.verbose {
            0 => Verbosity::Default,
            1 => Verbosity::Verbose,
            _ => Verbosity::VeryVerbose,
        };
        let (run, color) = p.run.into_options();

        Self {
            run,
            verbosity,
            color,
        }
    }
}

/// The required ROM positional. Clap rejects the command without it.
fn rom_path(m: &ArgMatches) -> PathBuf {
    m.get_one::<PathBuf>("rom_path").cloned().unwrap_or_default()
}

/// Parse --script/--offset/--all into a selection. Clap enforces exclusivity.
fn parse_selection(m: &ArgMatches) -> ScriptSelection {
    if let Some(&index) = m.get_one::<u8>("script") {
        ScriptSelection::Index(index)
    } else if let Some(&offset) = m.get_one::<u32>("offset") {
        ScriptSelection::Offset(offset)
    } else {
        ScriptSelection::All
    }
}

/// Parse --color flag into ColorChoice.
fn parse_color(m: &ArgMatches) -> ColorChoice {
    match m.get_one::<String>("color").map(|s| s.as_str()) {
        Some("always") => ColorChoice::Always,
        Some("never") => ColorChoice::Never,
        _ => ColorChoice::Auto,
    }
}
