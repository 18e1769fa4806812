mod cli;
mod commands;

use tracing_subscriber::EnvFilter;

use cli::{DumpParams, ExecParams, TablesParams, TraceParams, build_cli};

/// Diagnostics go to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let matches = build_cli().get_matches();

    let Some((name, m)) = matches.subcommand() else {
        unreachable!("clap should have caught this")
    };
    init_logging(m.get_count("verbose"));

    match name {
        "tables" => {
            let params = TablesParams::from_matches(m);
            commands::tables::run(params.into());
        }
        "dump" => {
            let params = DumpParams::from_matches(m);
            commands::dump::run(params.into());
        }
        "exec" => {
            let params = ExecParams::from_matches(m);
            commands::exec::run(params.into());
        }
        "trace" => {
            let params = TraceParams::from_matches(m);
            commands::trace::run(params.into());
        }
        _ => unreachable!("clap should have caught this"),
    }
}
