//! Human-readable image dump: header, table directory and linear disassembly.
//!
//! Disassembly is linear. It does not follow JUMP or SUB targets and stops at
//! the first DONE, unknown opcode, truncated instruction or the end of the
//! image.

use std::fmt::Write as _;

use vbinit_core::Colors;
use vbinit_core::utils::hex_width_for_len;

use crate::header::ImageFormat;
use crate::image::ProgramImage;
use crate::instructions::Instruction;
use crate::opcode::{MAX_NAME_LEN, Opcode};

/// Upper bound on disassembled lines per script.
pub const MAX_DUMP_LINES: usize = 1000;

/// Header, table directory and script-pointer list.
pub fn dump_tables(image: &ProgramImage, colors: Colors) -> String {
    let mut out = String::new();
    let c = &colors;
    let w = hex_width_for_len(image.len());

    writeln!(out, "{}[header]{}", c.blue, c.reset).unwrap();
    writeln!(out, "format   {}", image.format().name()).unwrap();
    writeln!(out, "size     {}", image.len()).unwrap();
    match image.format() {
        ImageFormat::Bit(bit) => {
            writeln!(out, "offset   0x{:0w$x}", bit.offset).unwrap();
            writeln!(out, "version  0x{:04x}", bit.version).unwrap();
            for e in &bit.entries {
                let id = char::from(e.id);
                let id = if id.is_ascii_graphic() { id } else { '?' };
                writeln!(
                    out,
                    "{}entry{}    {id} v{} len {} @ 0x{:04x}",
                    c.dim, c.reset, e.version, e.length, e.offset
                )
                .unwrap();
            }
        }
        ImageFormat::Bmp(bmp) => {
            writeln!(out, "offset   0x{:0w$x}", bmp.offset).unwrap();
            writeln!(out, "version  {}.{}", bmp.major, bmp.minor).unwrap();
        }
        ImageFormat::Raw => {}
    }

    out.push('\n');
    writeln!(out, "{}[tables]{}", c.blue, c.reset).unwrap();
    let tables = image.tables();
    if tables.is_empty() {
        writeln!(out, "{}(none){}", c.dim, c.reset).unwrap();
    }
    for (id, offset) in tables.iter() {
        writeln!(out, "{:<20}0x{offset:04x}", id.name()).unwrap();
    }
    if tables.ram_restrict_groups() > 0 {
        writeln!(out, "{:<20}{}", "ram-restrict-groups", tables.ram_restrict_groups()).unwrap();
    }

    if let Ok(pointers) = image.script_pointers() {
        out.push('\n');
        writeln!(out, "{}[scripts]{}", c.blue, c.reset).unwrap();
        for (i, p) in pointers.iter().enumerate() {
            writeln!(out, "{i:<4}0x{p:04x}").unwrap();
        }
    }

    out
}

/// Disassemble one script starting at `start`.
pub fn dump_script(image: &ProgramImage, start: usize, colors: Colors) -> String {
    let mut out = String::new();
    let c = &colors;
    let w = hex_width_for_len(image.len());

    writeln!(out, "{}[script 0x{start:0w$x}]{}", c.blue, c.reset).unwrap();
    if start == 0 {
        writeln!(out, "{}(no script){}", c.dim, c.reset).unwrap();
        return out;
    }

    let mut offset = start;
    for _ in 0..MAX_DUMP_LINES {
        if offset >= image.len() {
            writeln!(out, "{}{offset:0w$x}  (end of image){}", c.dim, c.reset).unwrap();
            return out;
        }

        let prefix = format!("{}{offset:0w$x}{}  ", c.dim, c.reset);
        let id = image.bytes()[offset];
        let Some(opcode) = Opcode::from_u8(id) else {
            writeln!(out, "{prefix}{}?? 0x{id:02x}{}", c.yellow, c.reset).unwrap();
            return out;
        };
        let instr = match Instruction::decode(image, offset) {
            Ok(instr) => instr,
            Err(_) => {
                writeln!(
                    out,
                    "{prefix}{}{}{} {}(truncated){}",
                    c.blue,
                    opcode.name(),
                    c.reset,
                    c.yellow,
                    c.reset
                )
                .unwrap();
                return out;
            }
        };

        let operands = instr.operands();
        if operands.is_empty() {
            writeln!(out, "{prefix}{}{}{}", c.blue, opcode.name(), c.reset).unwrap();
        } else {
            writeln!(
                out,
                "{prefix}{}{:<MAX_NAME_LEN$}{} {operands}",
                c.blue,
                opcode.name(),
                c.reset
            )
            .unwrap();
        }

        if opcode == Opcode::Done {
            return out;
        }
        offset += instr.len();
    }

    writeln!(out, "{}(stopped after {MAX_DUMP_LINES} instructions){}", c.dim, c.reset).unwrap();
    out
}

/// Tables plus every script listed in the script-pointer table.
pub fn dump(image: &ProgramImage, colors: Colors) -> String {
    let mut out = dump_tables(image, colors);
    if let Ok(pointers) = image.script_pointers() {
        for p in pointers {
            out.push('\n');
            out.push_str(&dump_script(image, usize::from(p), colors));
        }
    }
    out
}
