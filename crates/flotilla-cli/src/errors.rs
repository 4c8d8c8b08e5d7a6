//! Error types for the CLI runtime.

use std::io;
use std::sync::Arc;

use flotilla_backends::BackendKindParseError;
use flotilla_beam::ObjectError;
use thiserror::Error;

/// Failures that end a CLI invocation with a non-zero exit.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    /// Arguments did not parse.
    #[error("{0}")]
    CliUsage(clap::Error),
    /// No command was given.
    #[error("no command supplied")]
    MissingCommand,
    /// The command is not recognised.
    #[error("unrecognised command: {0}")]
    UnknownCommand(String),
    /// A known command received bad arguments.
    #[error("usage: {0}")]
    CommandUsage(&'static str),
    /// The configured backend is not recognised.
    #[error(transparent)]
    Backend(#[from] BackendKindParseError),
    /// A step of the session failed.
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Failures raised while driving the backend instance.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The factory could not spawn an instance.
    #[error("spawn: {}", cause(.0))]
    Spawn(#[source] ObjectError),
    /// The instance's event stream could not be opened.
    #[error("attach: {}", cause(.0))]
    Attach(#[source] ObjectError),
    /// The instance failed to start.
    #[error("start: {}", cause(.0))]
    Start(#[source] ObjectError),
    /// The user command failed.
    #[error("{0}")]
    Command(#[source] ObjectError),
    /// Command output could not be written.
    #[error("failed to write command output: {0}")]
    Output(#[source] io::Error),
}

/// The backend's own message when it sent one, else the local failure.
fn cause(error: &ObjectError) -> String {
    error
        .reply_message()
        .map_or_else(|| error.to_string(), str::to_owned)
}
