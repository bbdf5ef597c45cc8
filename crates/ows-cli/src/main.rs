fn main() {
    ows_cli::install_tracing();
    let exit_code = ows_cli::run_cli_from_args(std::env::args_os());
    std::process::exit(exit_code);
}
