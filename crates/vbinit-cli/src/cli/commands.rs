//! Command builders for the CLI.
//!
//! Each command is built using the shared arg builders from `args.rs`.
//! Every command accepts every flag, with irrelevant ones hidden from
//! `--help`, so switching between `dump`, `exec` and `trace` only means
//! changing the subcommand.

use clap::Command;

use super::args::*;

/// Add hidden script selection args (for commands that don't pick a script).
fn with_hidden_selection_args(cmd: Command) -> Command {
    cmd.arg(script_arg().hide(true))
        .arg(offset_arg().hide(true))
        .arg(all_arg().hide(true))
}

/// Add hidden run args (for commands that don't execute).
fn with_hidden_run_args(cmd: Command) -> Command {
    cmd.arg(fixture_arg().hide(true))
        .arg(max_ops_arg().hide(true))
        .arg(recursion_limit_arg().hide(true))
        .arg(head_arg().hide(true))
        .arg(or_arg().hide(true))
        .arg(i2c_bus_arg().hide(true))
        .arg(aux_bus_arg().hide(true))
        .arg(link_flags_arg().hide(true))
        .arg(format_arg().hide(true))
}

/// Add the args shared by exec and trace.
fn with_run_args(cmd: Command) -> Command {
    cmd.arg(rom_path_arg())
        .arg(script_arg())
        .arg(offset_arg())
        .arg(all_arg())
        .arg(fixture_arg())
        .arg(max_ops_arg())
        .arg(recursion_limit_arg())
        .arg(head_arg())
        .arg(or_arg())
        .arg(i2c_bus_arg())
        .arg(aux_bus_arg())
        .arg(link_flags_arg())
        .arg(format_arg())
        .arg(color_arg())
        .arg(verbose_arg())
}

/// Build the complete CLI with all subcommands.
pub fn build_cli() -> Command {
    Command::new("vbinit")
        .about("Inspect and run firmware init-table scripts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(tables_command())
        .subcommand(dump_command())
        .subcommand(exec_command())
        .subcommand(trace_command())
}

/// Show the image header and table directory.
pub fn tables_command() -> Command {
    let cmd = Command::new("tables")
        .about("Show the image header and table directory")
        .override_usage("  vbinit tables <ROM>")
        .arg(rom_path_arg())
        .arg(color_arg())
        .arg(verbose_arg());

    with_hidden_run_args(with_hidden_selection_args(cmd))
}

/// Disassemble init scripts.
///
/// Accepts every run flag, but only uses the script selection.
pub fn dump_command() -> Command {
    let cmd = Command::new("dump")
        .about("Disassemble init scripts")
        .override_usage(
            "\
  vbinit dump <ROM>
  vbinit dump <ROM> --script <N>
  vbinit dump <ROM> --offset <OFF>",
        )
        .after_help(
            r#"EXAMPLES:
  vbinit dump vbios.rom               # tables and every listed script
  vbinit dump vbios.rom --script 2    # third script of the pointer table
  vbinit dump vbios.rom --offset 0x5a1c"#,
        )
        .arg(rom_path_arg())
        .arg(script_arg())
        .arg(offset_arg())
        .arg(all_arg().hide(true))
        .arg(color_arg())
        .arg(verbose_arg());

    with_hidden_run_args(cmd)
}

/// Run init scripts against simulated hardware.
pub fn exec_command() -> Command {
    let cmd = Command::new("exec")
        .about("Run init scripts against simulated hardware and print the call log")
        .override_usage(
            "\
  vbinit exec <ROM> [--all]
  vbinit exec <ROM> --script <N> [--fixture <FILE>]
  vbinit exec <ROM> --offset <OFF> [--format json]",
        )
        .after_help(
            r#"EXAMPLES:
  vbinit exec vbios.rom                        # every init script
  vbinit exec vbios.rom --script 0 --fixture board.json
  vbinit exec vbios.rom --offset 0x5a1c --format json"#,
        );

    with_run_args(cmd)
}

/// Trace init script execution.
pub fn trace_command() -> Command {
    let cmd = Command::new("trace")
        .about("Trace init script execution, then print the call log")
        .override_usage(
            "\
  vbinit trace <ROM> [--all]
  vbinit trace <ROM> --script <N> [-v | -vv]
  vbinit trace <ROM> --offset <OFF>",
        )
        .after_help(
            r#"EXAMPLES:
  vbinit trace vbios.rom --script 0            # executed instructions
  vbinit trace vbios.rom --script 0 -v         # also skipped instructions
  vbinit trace vbios.rom --script 0 -vv        # also raw instruction bytes"#,
        );

    with_run_args(cmd)
}
