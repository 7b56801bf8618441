use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use transmark::cli::{Arguments, ExitStatus};

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "transmark=debug"
    } else {
        "transmark=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    init_tracing(args.verbose());

    match transmark::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitStatus::Error.into()
        }
    }
}
