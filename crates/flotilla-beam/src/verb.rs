//! The closed vocabulary of operations every object understands.

use strum::{Display, EnumString};

use crate::errors::ProtocolError;

/// Operation name carried by a [`Message`](crate::Message).
///
/// The text form is the lowercase variant name and parses
/// case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Verb {
    /// Instantiate a child object from a creation argument.
    Spawn,
    /// Open a session with a named child, or with the object itself when the
    /// name is empty.
    Attach,
    /// Bring the object up.
    Start,
    /// Bring the object down.
    Stop,
    /// Enumerate child resource names.
    Ls,
    /// Describe the object.
    Get,
    /// Successful terminal reply.
    Ack,
    /// Failed terminal reply, or a fatal event on a session stream.
    Error,
    /// Diagnostic event on a session stream.
    Log,
}

impl Verb {
    /// Every verb, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Spawn,
        Self::Attach,
        Self::Start,
        Self::Stop,
        Self::Ls,
        Self::Get,
        Self::Ack,
        Self::Error,
        Self::Log,
    ];

    /// Parses the text form of a verb.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnknownVerb`] when the text names no verb.
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        value
            .trim()
            .parse()
            .map_err(|_| ProtocolError::UnknownVerb(value.to_owned()))
    }

    /// Whether the verb expects exactly one terminal reply.
    #[must_use]
    pub const fn is_request(self) -> bool {
        matches!(
            self,
            Self::Spawn | Self::Attach | Self::Start | Self::Stop | Self::Ls | Self::Get
        )
    }

    /// Whether a message with this verb ends a request exchange.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ack | Self::Error)
    }
}
