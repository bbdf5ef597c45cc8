use std::ffi::OsString;

use clap::Parser;
use ows_api::OwsError;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod commands;
mod error_map;
mod host;
mod source_loader;

pub(crate) use cli_args::{CheckArgs, Cli, Mode, RunArgs};
pub(crate) use error_map::{
    emit_error, map_cli_actors_invalid, map_cli_actors_read, map_cli_output_json,
    map_cli_source_path, map_cli_source_read, map_cli_source_scan,
};
pub(crate) use host::{host_registry, parse_bindings, resolve_actor};
pub(crate) use source_loader::{load_directory, load_sources_by_scripts_dir};

/// Logs go to stderr so stdout carries only the line protocol. `RUST_LOG`
/// overrides the default `warn` level.
pub fn install_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, OwsError> {
    match cli.command {
        Mode::Check(args) => commands::run_check(args),
        Mode::Run(args) => commands::run_script(args),
    }
}
