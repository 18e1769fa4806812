//! Run init scripts against simulated hardware.

use vbinit_core::Colors;
use vbinit_vm::NoopTracer;

use super::run_common::{self, RunOptions, fail};

pub struct ExecArgs {
    pub run: RunOptions,
    pub color: bool,
}

pub fn run(args: ExecArgs) {
    let image = run_common::load_image(&args.run.rom_path).unwrap_or_else(|e| fail(e));
    let mut hw =
        run_common::load_hardware(args.run.fixture.as_deref()).unwrap_or_else(|e| fail(e));

    let runs = run_common::run_scripts(&image, &mut hw, &args.run, &mut NoopTracer)
        .unwrap_or_else(|e| fail(e));

    run_common::finish(&runs, args.run.format, Colors::new(args.color));
}
