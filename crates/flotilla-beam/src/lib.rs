//! Message-passing substrate for flotilla objects.
//!
//! Every component, from a backend to a single container, is an object
//! reachable through an endpoint. Objects exchange [`Message`]s made of a
//! [`Verb`], string arguments and an optional endpoint. Requests carry a
//! return-channel and are answered with exactly one terminal `Ack` or
//! `Error`; `Log` and `Error` also travel as events on attach sessions.
//!
//! Objects implement their behaviour by registering [`Handler`]s on a
//! [`Dispatcher`] and serving it. Callers drive objects through the blocking
//! [`Object`] handle.

mod dispatcher;
mod errors;
mod message;
mod object;
mod pipe;
mod verb;

pub use dispatcher::{Dispatcher, Handler, HandlerResult, Reply};
pub use errors::{HandlerError, ObjectError, ProtocolError, TransportError};
pub use message::Message;
pub use object::Object;
pub use pipe::{Receiver, RecvError, Sender, pipe};
pub use verb::Verb;
