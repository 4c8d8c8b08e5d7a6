//! The `flotilla` command-line driver.
//!
//! Each invocation spawns a backend instance bound to the configured
//! container engine, subscribes to its events, starts it and runs exactly
//! one command. Progress lines and backend events go to an [`EventSink`];
//! command output goes to standard output.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

mod cli;
mod config;
mod errors;
mod session;
mod sink;

use cli::Cli;
use config::split_config_arguments;

pub use cli::Command;
pub use config::{ConfigLoader, OrthoConfigLoader};
pub use errors::{AppError, SessionError};
pub use session::{BackendResolver, Session, SystemBackendResolver};
pub use sink::{EventSink, RecordingSink, SinkEvent, StderrSink};

/// Runs the CLI with the production collaborators.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    run_with(
        args,
        stdout,
        stderr,
        &OrthoConfigLoader,
        &SystemBackendResolver,
        Arc::new(StderrSink),
    )
}

/// Runs the CLI with injected collaborators.
///
/// Usage errors are detected before any backend is spawned.
#[must_use]
pub fn run_with<I, W, E>(
    args: I,
    stdout: &mut W,
    stderr: &mut E,
    loader: &dyn ConfigLoader,
    resolver: &dyn BackendResolver,
    sink: Arc<dyn EventSink>,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let args: Vec<OsString> = args.into_iter().collect();
    match execute(&args, stdout, loader, resolver, sink) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "{error}");
            ExitCode::FAILURE
        }
    }
}

fn execute<W: Write>(
    args: &[OsString],
    stdout: &mut W,
    loader: &dyn ConfigLoader,
    resolver: &dyn BackendResolver,
    sink: Arc<dyn EventSink>,
) -> Result<(), AppError> {
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
    let command = Command::try_from(cli)?;
    let config = loader.load(&split.config_arguments)?;
    let factory = resolver.resolve(&config)?;
    Session::new(factory, sink).run(command, &config.engine_host(), stdout)?;
    Ok(())
}

#[cfg(test)]
mod tests;
