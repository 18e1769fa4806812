use std::path::PathBuf;

use vbinit_core::Colors;
use vbinit_image::dump::dump_tables;

use super::run_common::{fail, load_image};

pub struct TablesArgs {
    pub rom_path: PathBuf,
    pub color: bool,
}

pub fn run(args: TablesArgs) {
    let image = load_image(&args.rom_path).unwrap_or_else(|e| fail(e));
    print!("{}", dump_tables(&image, Colors::new(args.color)));
}
