//! The unit of communication between objects.

use crate::pipe::Sender;
use crate::verb::Verb;

/// A verb, its arguments, and an optional endpoint.
///
/// On requests `ret` is the return-channel that receives the terminal reply.
/// On an `Ack` to `Spawn` or `Attach` it carries the endpoint of the new
/// object instead.
#[derive(Debug)]
pub struct Message {
    /// Operation name.
    pub verb: Verb,
    /// Ordered string arguments.
    pub args: Vec<String>,
    /// Return-channel on requests, object endpoint on spawn/attach acks.
    pub ret: Option<Sender>,
}

impl Message {
    /// Builds a message with no arguments and no endpoint.
    #[must_use]
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            args: Vec::new(),
            ret: None,
        }
    }

    /// Replaces the arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Attaches an endpoint.
    #[must_use]
    pub fn with_ret(mut self, ret: Sender) -> Self {
        self.ret = Some(ret);
        self
    }

    /// An empty successful reply.
    #[must_use]
    pub fn ack() -> Self {
        Self::new(Verb::Ack)
    }

    /// A failed reply or fatal event carrying a human-readable message.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Verb::Error).with_args([message.into()])
    }

    /// A diagnostic event.
    #[must_use]
    pub fn log(line: impl Into<String>) -> Self {
        Self::new(Verb::Log).with_args([line.into()])
    }

    /// First argument, when present.
    #[must_use]
    pub fn first_arg(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}
