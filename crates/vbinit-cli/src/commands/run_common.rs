//! Shared logic for the commands that load an image and run scripts.

use std::fmt::Display;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use vbinit_core::Colors;
use vbinit_image::{ImageError, ProgramImage};
use vbinit_vm::{
    ExecutionState, FixtureError, HardwareFixture, HwCall, Interpreter, MemoryHardware,
    OutputContext, RunReport, RuntimeError, ScriptExit, ScriptLimits, Tracer,
};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load '{path}': {source}")]
    Image { path: PathBuf, source: ImageError },

    #[error("failed to load fixture '{path}': {source}")]
    Fixture { path: PathBuf, source: FixtureError },
}

/// Which scripts a command works on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScriptSelection {
    /// Every entry of the init script-pointer table.
    #[default]
    All,
    /// One entry of the init script-pointer table.
    Index(u8),
    /// A script at an absolute image offset.
    Offset(u32),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Everything exec and trace need besides presentation.
pub struct RunOptions {
    pub rom_path: PathBuf,
    pub selection: ScriptSelection,
    pub fixture: Option<PathBuf>,
    pub limits: ScriptLimits,
    pub output: OutputContext,
    pub format: OutputFormat,
}

/// One top-level run and the facade calls it made.
#[derive(Debug)]
pub struct ScriptRun {
    /// Script-pointer table index, if the script came from the table.
    pub index: Option<usize>,
    pub start: usize,
    pub outcome: Result<RunReport, RuntimeError>,
    pub calls: Vec<HwCall>,
}

/// Print `error: {msg}` and exit with status 1.
pub fn fail(msg: impl Display) -> ! {
    eprintln!("error: {msg}");
    std::process::exit(1)
}

pub fn load_image(path: &Path) -> Result<ProgramImage, LoadError> {
    ProgramImage::from_path(path).map_err(|source| LoadError::Image {
        path: path.to_owned(),
        source,
    })
}

/// Simulated hardware from `--fixture`, or a blank device.
pub fn load_hardware(fixture: Option<&Path>) -> Result<MemoryHardware, LoadError> {
    let Some(path) = fixture else {
        return Ok(MemoryHardware::new());
    };
    HardwareFixture::from_path(path)
        .and_then(|f| f.build())
        .map_err(|source| LoadError::Fixture {
            path: path.to_owned(),
            source,
        })
}

/// Resolve a selection into `(table index, offset)` pairs.
pub fn select_scripts(
    image: &ProgramImage,
    selection: ScriptSelection,
) -> Result<Vec<(Option<usize>, usize)>, ImageError> {
    Ok(match selection {
        ScriptSelection::All => image
            .script_pointers()?
            .into_iter()
            .enumerate()
            .map(|(i, p)| (Some(i), usize::from(p)))
            .collect(),
        ScriptSelection::Index(i) => {
            vec![(Some(usize::from(i)), usize::from(image.script_pointer(i)?))]
        }
        ScriptSelection::Offset(off) => vec![(None, off as usize)],
    })
}

/// Run every selected script in order against the same hardware.
///
/// Each run starts from fresh execution state. The call log is drained
/// after every run so calls can be attributed to the script that made them.
pub fn run_scripts<T: Tracer>(
    image: &ProgramImage,
    hw: &mut MemoryHardware,
    options: &RunOptions,
    tracer: &mut T,
) -> Result<Vec<ScriptRun>, ImageError> {
    let targets = select_scripts(image, options.selection)?;
    let mut runs = Vec::with_capacity(targets.len());

    for (index, start) in targets {
        info!("running script at {start:#06x}");
        let mut state = ExecutionState::with_output(options.output);
        let outcome = Interpreter::builder(image, hw)
            .limits(options.limits)
            .build()
            .execute_script_with(start, &mut state, tracer);
        runs.push(ScriptRun {
            index,
            start,
            outcome,
            calls: hw.take_calls(),
        });
    }

    Ok(runs)
}

fn exit_name(exit: ScriptExit) -> &'static str {
    match exit {
        ScriptExit::Done => "done",
        ScriptExit::NoScript => "no script",
        ScriptExit::Truncated => "truncated",
        ScriptExit::Runaway => "runaway",
    }
}

/// Human-readable call log, one block per run.
pub fn format_runs_text(runs: &[ScriptRun], colors: Colors) -> String {
    let c = &colors;
    let mut out = String::new();

    for (i, run) in runs.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let label = match run.index {
            Some(index) => format!("script {index} @ 0x{:04x}", run.start),
            None => format!("script @ 0x{:04x}", run.start),
        };
        let summary = match &run.outcome {
            Ok(report) => format!("{}, {} ops", exit_name(report.exit), report.ops),
            Err(err) => format!("{}error: {err}{}", c.yellow, c.reset),
        };
        writeln!(out, "{}[{label}]{} {summary}", c.blue, c.reset).unwrap();

        for call in &run.calls {
            if call.is_write() {
                writeln!(out, "  {call}").unwrap();
            } else {
                writeln!(out, "  {}{call}{}", c.dim, c.reset).unwrap();
            }
        }
    }

    out
}

#[derive(Serialize)]
struct JsonRun<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    index: Option<usize>,
    start: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a RunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    calls: &'a [HwCall],
}

/// Machine-readable call log: a JSON array with one object per run.
pub fn format_runs_json(runs: &[ScriptRun]) -> Result<String, serde_json::Error> {
    let runs: Vec<JsonRun<'_>> = runs
        .iter()
        .map(|run| JsonRun {
            index: run.index,
            start: run.start,
            report: run.outcome.as_ref().ok(),
            error: run.outcome.as_ref().err().map(ToString::to_string),
            calls: &run.calls,
        })
        .collect();
    serde_json::to_string_pretty(&runs)
}

/// Print the call log and exit with status 2 if any top-level run failed.
pub fn finish(runs: &[ScriptRun], format: OutputFormat, colors: Colors) {
    match format {
        OutputFormat::Text => print!("{}", format_runs_text(runs, colors)),
        OutputFormat::Json => match format_runs_json(runs) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(format_args!("JSON serialization failed: {e}")),
        },
    }

    if runs.iter().any(|run| run.outcome.is_err()) {
        std::process::exit(2);
    }
}
