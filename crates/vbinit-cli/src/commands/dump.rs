use std::path::PathBuf;

use vbinit_core::Colors;
use vbinit_image::dump::{dump, dump_script};

use super::run_common::{ScriptSelection, fail, load_image};

pub struct DumpArgs {
    pub rom_path: PathBuf,
    pub selection: ScriptSelection,
    pub color: bool,
}

pub fn run(args: DumpArgs) {
    let image = load_image(&args.rom_path).unwrap_or_else(|e| fail(e));
    let colors = Colors::new(args.color);

    let start = match args.selection {
        ScriptSelection::All => {
            print!("{}", dump(&image, colors));
            return;
        }
        ScriptSelection::Index(i) => match image.script_pointer(i) {
            Ok(p) => usize::from(p),
            Err(e) => fail(format_args!("no script {i}: {e}")),
        },
        ScriptSelection::Offset(off) => off as usize,
    };
    print!("{}", dump_script(&image, start, colors));
}
