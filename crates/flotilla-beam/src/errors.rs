//! Error types shared by every object and endpoint.

use std::time::Duration;

use thiserror::Error;

use crate::verb::Verb;

/// Violations of the message protocol itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Text did not name any verb.
    #[error("unknown verb: {0}")]
    UnknownVerb(String),
    /// The receiving object registered no handler for the verb.
    #[error("no such verb: {0}")]
    NoHandler(Verb),
    /// A successful reply omitted the payload the verb requires.
    #[error("{0} reply carried no payload")]
    MissingPayload(Verb),
}

/// Failure to hand a message to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Every receiver for the endpoint has been dropped.
    #[error("endpoint closed before {verb} could be delivered")]
    Closed {
        /// Verb of the undelivered message.
        verb: Verb,
    },
}

/// Failure reported by a handler; becomes the text of an `Error` reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Wraps a human-readable failure message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a failed operation on an [`Object`](crate::Object).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectError {
    /// `Spawn` was answered with an error.
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    /// `Attach` was answered with an error.
    #[error("attach failed: {0}")]
    AttachFailed(String),
    /// `Start` was answered with an error.
    #[error("start failed: {0}")]
    StartFailed(String),
    /// `Stop` was answered with an error.
    #[error("stop failed: {0}")]
    StopFailed(String),
    /// `Ls` was answered with an error.
    #[error("ls failed: {0}")]
    LsFailed(String),
    /// `Get` was answered with an error.
    #[error("get failed: {0}")]
    GetFailed(String),
    /// A non-request verb was answered with an error.
    #[error("{verb} rejected: {message}")]
    Rejected {
        /// Verb that was rejected.
        verb: Verb,
        /// Message carried by the error reply.
        message: String,
    },
    /// No terminal reply arrived before the deadline.
    #[error("{verb} timed out after {timeout:?}")]
    Timeout {
        /// Verb that was waiting.
        verb: Verb,
        /// Deadline that elapsed.
        timeout: Duration,
    },
    /// The endpoint or the return-channel closed before a terminal reply.
    #[error("endpoint closed during {verb}")]
    Closed {
        /// Verb that was in flight.
        verb: Verb,
    },
    /// The reply violated the protocol.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ObjectError {
    /// Maps an `Error` reply to the failure kind of the request verb.
    #[must_use]
    pub fn failed(verb: Verb, message: impl Into<String>) -> Self {
        let message = message.into();
        match verb {
            Verb::Spawn => Self::SpawnFailed(message),
            Verb::Attach => Self::AttachFailed(message),
            Verb::Start => Self::StartFailed(message),
            Verb::Stop => Self::StopFailed(message),
            Verb::Ls => Self::LsFailed(message),
            Verb::Get => Self::GetFailed(message),
            Verb::Ack | Verb::Error | Verb::Log => Self::Rejected { verb, message },
        }
    }

    /// Message carried by the remote `Error` reply, when there was one.
    #[must_use]
    pub fn reply_message(&self) -> Option<&str> {
        match self {
            Self::SpawnFailed(message)
            | Self::AttachFailed(message)
            | Self::StartFailed(message)
            | Self::StopFailed(message)
            | Self::LsFailed(message)
            | Self::GetFailed(message)
            | Self::Rejected { message, .. } => Some(message),
            Self::Timeout { .. } | Self::Closed { .. } | Self::Protocol(_) => None,
        }
    }
}

impl From<TransportError> for ObjectError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Closed { verb } => Self::Closed { verb },
        }
    }
}
