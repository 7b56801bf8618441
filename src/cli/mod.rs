use std::future::Future;
use std::process::ExitCode;

use anyhow::Result;

pub mod args;
mod commands;
pub mod exit_status;
mod report;

pub use args::{Arguments, Command};
pub use exit_status::ExitStatus;

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let Some(command) = args.with_command_or_help().and_then(|args| args.command) else {
        return Ok(ExitStatus::Success.into());
    };

    let status = match command {
        Command::Init(cmd) => commands::init::init(cmd)?,
        Command::Build(cmd) => block_on(commands::build::build(cmd))?,
        Command::Sync(cmd) => block_on(commands::sync::sync(cmd))?,
        Command::Watch(cmd) => block_on(commands::watch::watch(cmd))?,
    };
    Ok(status.into())
}

/// Drive an async command on a single-threaded runtime.
fn block_on<F>(future: F) -> Result<ExitStatus>
where
    F: Future<Output = Result<ExitStatus>>,
{
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
