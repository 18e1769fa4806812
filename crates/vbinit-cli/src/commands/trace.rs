//! Trace init script execution for debugging.

use vbinit_core::Colors;
use vbinit_vm::{PrintTracer, Verbosity};

use super::run_common::{self, OutputFormat, RunOptions, fail};

pub struct TraceArgs {
    pub run: RunOptions,
    pub verbosity: Verbosity,
    pub color: bool,
}

pub fn run(args: TraceArgs) {
    let image = run_common::load_image(&args.run.rom_path).unwrap_or_else(|e| fail(e));
    let mut hw =
        run_common::load_hardware(args.run.fixture.as_deref()).unwrap_or_else(|e| fail(e));
    let colors = Colors::new(args.color);

    let mut tracer = PrintTracer::new(&image, args.verbosity, colors);
    let result = run_common::run_scripts(&image, &mut hw, &args.run, &mut tracer);
    tracer.print();
    let runs = result.unwrap_or_else(|e| fail(e));

    if args.run.format == OutputFormat::Text {
        println!("{}---{}", colors.dim, colors.reset);
    }
    run_common::finish(&runs, args.run.format, colors);
}
