//! Shared argument builders for CLI commands.
//!
//! Each function returns a `clap::Arg` that can be composed into commands.
//! The same arg definition is reused across commands with different
//! visibility settings (via `.hide(true)`).

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

use vbinit_core::parse_number;

/// Parse a number written in decimal, `0x` hex or `0b` binary.
fn number<T: TryFrom<u64>>(text: &str) -> Result<T, String> {
    let n = parse_number(text).map_err(|e| e.to_string())?;
    T::try_from(n).map_err(|_| format!("{text} is out of range"))
}

/// Firmware image (positional).
pub fn rom_path_arg() -> Arg {
    Arg::new("rom_path")
        .value_name("ROM")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Firmware image file")
}

/// Script-pointer table index (--script).
pub fn script_arg() -> Arg {
    Arg::new("script")
        .long("script")
        .value_name("N")
        .value_parser(number::<u8>)
        .conflicts_with_all(["offset", "all"])
        .help("Index into the init script-pointer table")
}

/// Absolute script offset (--offset).
pub fn offset_arg() -> Arg {
    Arg::new("offset")
        .long("offset")
        .value_name("OFF")
        .value_parser(number::<u32>)
        .conflicts_with("all")
        .help("Script offset in the image")
}

/// Every script in the pointer table (--all).
pub fn all_arg() -> Arg {
    Arg::new("all")
        .long("all")
        .action(ArgAction::SetTrue)
        .help("Run every script in the init script-pointer table (default)")
}

/// Simulated hardware description (--fixture).
pub fn fixture_arg() -> Arg {
    Arg::new("fixture")
        .long("fixture")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("JSON description of the simulated hardware")
}

/// Op guard (--max-ops).
pub fn max_ops_arg() -> Arg {
    Arg::new("max_ops")
        .long("max-ops")
        .value_name("N")
        .default_value("1000")
        .value_parser(number::<u32>)
        .help("Instructions per run before the script is abandoned")
}

/// Nested call limit (--recursion-limit).
pub fn recursion_limit_arg() -> Arg {
    Arg::new("recursion_limit")
        .long("recursion-limit")
        .value_name("N")
        .default_value("32")
        .value_parser(number::<u32>)
        .help("Maximum SUB/SUB_DIRECT/REPEAT nesting")
}

/// Active head (--head).
pub fn head_arg() -> Arg {
    Arg::new("head")
        .long("head")
        .value_name("N")
        .value_parser(number::<u8>)
        .help("Active head")
}

/// Output resource index (--or).
pub fn or_arg() -> Arg {
    Arg::new("or")
        .long("or")
        .value_name("N")
        .value_parser(number::<u8>)
        .help("Output resource index")
}

/// Default I2C bus (--i2c-bus).
pub fn i2c_bus_arg() -> Arg {
    Arg::new("i2c_bus")
        .long("i2c-bus")
        .value_name("N")
        .value_parser(number::<u8>)
        .help("I2C bus used when a script names bus 0xff")
}

/// AUX channel (--aux-bus).
pub fn aux_bus_arg() -> Arg {
    Arg::new("aux_bus")
        .long("aux-bus")
        .value_name("N")
        .value_parser(number::<u8>)
        .help("AUX channel of the active output")
}

/// Link state bits (--link-flags).
pub fn link_flags_arg() -> Arg {
    Arg::new("link_flags")
        .long("link-flags")
        .value_name("BITS")
        .value_parser(number::<u8>)
        .help("Link state bits tested by DP_CONDITION")
}

/// Output format (--format).
pub fn format_arg() -> Arg {
    Arg::new("format")
        .long("format")
        .value_name("FORMAT")
        .default_value("text")
        .value_parser(["text", "json"])
        .help("Call log format")
}

/// Color output control (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize output")
}

/// Verbosity level (-v, -vv).
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .action(ArgAction::Count)
        .help("Verbosity level (-v for verbose, -vv for very verbose)")
}
