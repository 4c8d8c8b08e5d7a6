use std::io;

use flotilla_beam::HandlerError;
use flotilla_config::EngineAddressError;
use thiserror::Error;

/// Failures raised by a container engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine socket could not be reached.
    #[error("failed to connect to engine at {address}: {source}")]
    Connect {
        /// Engine address that was dialled.
        address: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The engine answered with a non-success status.
    #[error("{message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Engine-supplied message, or a generic description.
        message: String,
    },
    /// The HTTP exchange with the engine failed or was not valid HTTP.
    #[error("engine request failed: {0}")]
    Http(#[from] ureq::Error),
    /// A JSON document could not be parsed or produced.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// The creation spec was not a JSON object.
    #[error("creation spec must be a JSON object")]
    InvalidSpec,
    /// No container has the given name or id.
    #[error("no such container: {0}")]
    NoSuchContainer(String),
    /// Another container already uses the name.
    #[error("container name already in use: {0}")]
    NameConflict(String),
    /// Start was requested for a running container.
    #[error("container {0} is already running")]
    AlreadyRunning(String),
    /// Stop was requested for a container that is not running.
    #[error("container {0} is not running")]
    NotRunning(String),
    /// The instance address could not be parsed.
    #[error(transparent)]
    Address(#[from] EngineAddressError),
}

impl EngineError {
    /// Builds a status error, preferring the engine's own message.
    #[must_use]
    pub fn status(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| format!("engine returned status {status}"));
        Self::Status { status, message }
    }
}

impl From<EngineError> for HandlerError {
    fn from(error: EngineError) -> Self {
        Self::new(error.to_string())
    }
}
