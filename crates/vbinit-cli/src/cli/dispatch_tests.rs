//! Tests for CLI dispatch logic.
//!
//! These tests verify:
//! 1. Unified flags: every command accepts the run flags without error
//! 2. Help visibility: hidden flags don't appear in --help
//! 3. Params extraction: correct fields are extracted from ArgMatches

use std::path::PathBuf;

use vbinit_vm::{OutputContext, Verbosity};

use super::*;
use crate::cli::commands::{dump_command, exec_command, tables_command, trace_command};
use crate::commands::exec::ExecArgs;
use crate::commands::run_common::{OutputFormat, ScriptSelection};
use crate::commands::trace::TraceArgs;

#[test]
fn cli_is_well_formed() {
    build_cli().debug_assert();
}

#[test]
fn tables_accepts_run_flags() {
    let result = tables_command().try_get_matches_from([
        "tables",
        "vbios.rom",
        "--script",
        "1",
        "--fixture",
        "board.json",
        "--max-ops",
        "50",
    ]);
    assert!(
        result.is_ok(),
        "tables should accept run flags: {:?}",
        result.err()
    );

    let params = TablesParams::from_matches(&result.unwrap());
    assert_eq!(params.rom_path, PathBuf::from("vbios.rom"));
}

#[test]
fn rom_is_required() {
    let result = dump_command().try_get_matches_from(["dump"]);

    assert!(result.is_err());
}

#[test]
fn dump_defaults_to_every_script() {
    let m = dump_command()
        .try_get_matches_from(["dump", "vbios.rom"])
        .unwrap();

    let params = DumpParams::from_matches(&m);

    assert_eq!(params.selection, ScriptSelection::All);
    assert_eq!(params.color, ColorChoice::Auto);
}

#[test]
fn dump_accepts_exec_flags() {
    let result = dump_command().try_get_matches_from([
        "dump",
        "vbios.rom",
        "--offset",
        "0x5a1c",
        "--format",
        "json",
        "--head",
        "1",
        "--color",
        "never",
    ]);
    assert!(
        result.is_ok(),
        "dump should accept exec flags: {:?}",
        result.err()
    );

    let params = DumpParams::from_matches(&result.unwrap());
    assert_eq!(params.selection, ScriptSelection::Offset(0x5a1c));
    assert_eq!(params.color, ColorChoice::Never);
}

#[test]
fn script_index_accepts_hex() {
    let m = dump_command()
        .try_get_matches_from(["dump", "vbios.rom", "--script", "0x0a"])
        .unwrap();

    assert_eq!(
        DumpParams::from_matches(&m).selection,
        ScriptSelection::Index(10)
    );
}

#[test]
fn script_index_out_of_range() {
    let result = dump_command().try_get_matches_from(["dump", "vbios.rom", "--script", "256"]);

    assert!(result.is_err());
}

#[test]
fn selections_conflict() {
    for flags in [
        ["--script", "1", "--offset", "0x10"],
        ["--script", "1", "--all", ""],
        ["--offset", "0x10", "--all", ""],
    ] {
        let args = ["exec", "vbios.rom"]
            .into_iter()
            .chain(flags.into_iter().filter(|f| !f.is_empty()));
        let result = exec_command().try_get_matches_from(args);
        assert!(result.is_err(), "{flags:?} should conflict");
    }
}

#[test]
fn exec_params_defaults() {
    let m = exec_command()
        .try_get_matches_from(["exec", "vbios.rom"])
        .unwrap();

    let args: ExecArgs = ExecParams::from_matches(&m).into();

    assert_eq!(args.run.selection, ScriptSelection::All);
    assert_eq!(args.run.fixture, None);
    assert_eq!(args.run.limits.get_max_ops(), 1000);
    assert_eq!(args.run.limits.get_recursion_limit(), 32);
    assert_eq!(args.run.output, OutputContext::default());
    assert_eq!(args.run.format, OutputFormat::Text);
}

#[test]
fn exec_params_extraction() {
    let m = exec_command()
        .try_get_matches_from([
            "exec",
            "vbios.rom",
            "--script",
            "2",
            "--fixture",
            "board.json",
            "--max-ops",
            "500",
            "--recursion-limit",
            "4",
            "--head",
            "1",
            "--or",
            "3",
            "--i2c-bus",
            "2",
            "--aux-bus",
            "0x1",
            "--link-flags",
            "0b101",
            "--format",
            "json",
        ])
        .unwrap();

    let args: ExecArgs = ExecParams::from_matches(&m).into();

    assert_eq!(args.run.rom_path, PathBuf::from("vbios.rom"));
    assert_eq!(args.run.selection, ScriptSelection::Index(2));
    assert_eq!(args.run.fixture, Some(PathBuf::from("board.json")));
    assert_eq!(args.run.limits.get_max_ops(), 500);
    assert_eq!(args.run.limits.get_recursion_limit(), 4);
    assert_eq!(
        args.run.output,
        OutputContext {
            head: 1,
            or: 3,
            i2c_bus: 2,
            aux_bus: 1,
            link_flags: 0b101,
        }
    );
    assert_eq!(args.run.format, OutputFormat::Json);
}

#[test]
fn exec_rejects_unknown_format() {
    let result = exec_command().try_get_matches_from(["exec", "vbios.rom", "--format", "yaml"]);

    assert!(result.is_err());
}

#[test]
fn trace_verbosity_levels() {
    for (flags, expected) in [
        (&[][..], Verbosity::Default),
        (&["-v"][..], Verbosity::Verbose),
        (&["-vv"][..], Verbosity::VeryVerbose),
        (&["-vvv"][..], Verbosity::VeryVerbose),
    ] {
        let args = ["trace", "vbios.rom"].iter().chain(flags);
        let m = trace_command().try_get_matches_from(args).unwrap();

        let args: TraceArgs = TraceParams::from_matches(&m).into();

        assert_eq!(args.verbosity, expected, "{flags:?}");
    }
}

#[test]
fn trace_accepts_color() {
    let m = trace_command()
        .try_get_matches_from(["trace", "vbios.rom", "--color", "always", "--offset", "7"])
        .unwrap();

    let args: TraceArgs = TraceParams::from_matches(&m).into();

    assert!(args.color);
    assert_eq!(args.run.selection, ScriptSelection::Offset(7));
}

#[test]
fn tables_help_hides_run_flags() {
    let help = tables_command().render_help().to_string();

    assert!(help.contains("<ROM>"));
    assert!(!help.contains("--fixture"));
    assert!(!help.contains("--script"));
}

#[test]
fn dump_help_hides_run_flags() {
    let help = dump_command().render_help().to_string();

    assert!(help.contains("--script"));
    assert!(help.contains("--offset"));
    assert!(!help.contains("--all"));
    assert!(!help.contains("--fixture"));
    assert!(!help.contains("--max-ops"));
}

#[test]
fn exec_help_shows_run_flags() {
    let help = exec_command().render_help().to_string();

    for flag in ["--fixture", "--max-ops", "--head", "--link-flags", "--format"] {
        assert!(help.contains(flag), "missing {flag}");
    }
}
