//! Verb routing for objects.
//!
//! A [`Dispatcher`] maps each verb to at most one [`Handler`]. Dispatching a
//! request always produces exactly one terminal reply on its return-channel:
//! the handler's [`Reply`] becomes an `Ack`, its [`HandlerError`] becomes an
//! `Error`, and a verb with no handler is answered with `no such verb`.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::errors::{HandlerError, ProtocolError};
use crate::message::Message;
use crate::pipe::{Receiver, Sender, pipe};
use crate::verb::Verb;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Successful outcome of a handler.
#[derive(Debug)]
pub enum Reply {
    /// Plain `Ack`.
    Empty,
    /// `Ack` carrying an object endpoint, for `Spawn` and `Attach`.
    Object(Sender),
    /// `Ack` whose arguments are a list of names, for `Ls`.
    Names(Vec<String>),
    /// `Ack` with a single text argument, for `Get`.
    Text(String),
}

impl Reply {
    fn into_message(self) -> Message {
        match self {
            Self::Empty => Message::ack(),
            Self::Object(endpoint) => Message::ack().with_ret(endpoint),
            Self::Names(names) => Message::ack().with_args(names),
            Self::Text(text) => Message::ack().with_args([text]),
        }
    }
}

/// Outcome of a [`Handler`].
pub type HandlerResult = Result<Reply, HandlerError>;

/// Behaviour bound to a verb.
pub trait Handler: Send + Sync {
    /// Handles one message.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] whose message is relayed to the requester.
    fn handle(&self, message: &Message) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&Message) -> HandlerResult + Send + Sync,
{
    fn handle(&self, message: &Message) -> HandlerResult {
        self(message)
    }
}

/// Verb-to-handler table.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<Verb, Arc<dyn Handler>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut verbs: Vec<String> = self.handlers.keys().map(ToString::to_string).collect();
        verbs.sort();
        formatter
            .debug_struct("Dispatcher")
            .field("verbs", &verbs)
            .finish()
    }
}

impl Dispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `verb`, returning the handler it replaced.
    pub fn on<H>(&mut self, verb: Verb, handler: H) -> Option<Arc<dyn Handler>>
    where
        H: Handler + 'static,
    {
        self.handlers.insert(verb, Arc::new(handler))
    }

    /// Builder form of [`Dispatcher::on`].
    #[must_use]
    pub fn with<H>(mut self, verb: Verb, handler: H) -> Self
    where
        H: Handler + 'static,
    {
        self.on(verb, handler);
        self
    }

    /// Routes one message and answers its return-channel.
    ///
    /// Without a return-channel the outcome is only logged.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::NoHandler`] when no handler is registered for
    /// the verb. The requester has already been answered in that case.
    pub fn dispatch(&self, message: Message) -> Result<(), ProtocolError> {
        let verb = message.verb;
        if verb.is_request() && message.ret.is_none() {
            debug!(
                target: DISPATCH_TARGET,
                verb = %verb,
                "request has no return-channel; its reply will be dropped"
            );
        }
        let Some(handler) = self.handlers.get(&verb) else {
            let error = ProtocolError::NoHandler(verb);
            match message.ret.as_ref() {
                Some(ret) => deliver(ret, verb, Message::error(error.to_string())),
                None => warn!(
                    target: DISPATCH_TARGET,
                    verb = %verb,
                    "dropping message with no handler"
                ),
            }
            return Err(error);
        };

        debug!(
            target: DISPATCH_TARGET,
            verb = %verb,
            args = message.args.len(),
            "dispatching"
        );
        let reply = match handler.handle(&message) {
            Ok(reply) => reply.into_message(),
            Err(error) => {
                debug!(target: DISPATCH_TARGET, verb = %verb, error = %error, "handler failed");
                Message::error(error.message())
            }
        };

        match message.ret.as_ref() {
            Some(ret) => deliver(ret, verb, reply),
            None if reply.verb == Verb::Error => warn!(
                target: DISPATCH_TARGET,
                verb = %verb,
                error = reply.first_arg().unwrap_or_default(),
                "unanswerable request failed"
            ),
            None => {}
        }
        Ok(())
    }

    /// Dispatches every message from `receiver`, in arrival order, until all
    /// of its senders are gone. Returns the number of messages handled.
    pub fn relay(&self, receiver: Receiver) -> usize {
        receiver
            .map(|message| {
                if let Err(error) = self.dispatch(message) {
                    debug!(target: DISPATCH_TARGET, error = %error, "relay dropped message");
                }
            })
            .count()
    }

    /// Serves the dispatcher on a background thread and returns its endpoint.
    ///
    /// Each inbound message is handled on its own thread, so a slow handler
    /// never blocks other requests to the same object.
    #[must_use]
    pub fn serve(self) -> Sender {
        let (receiver, sender) = pipe();
        let _worker = Arc::new(self).serve_on(receiver);
        sender
    }

    /// Serves a shared dispatcher from an existing receive end.
    pub fn serve_on(self: Arc<Self>, mut receiver: Receiver) -> JoinHandle<()> {
        thread::spawn(move || {
            while let Some(message) = receiver.recv() {
                let dispatcher = Arc::clone(&self);
                thread::spawn(move || {
                    if let Err(error) = dispatcher.dispatch(message) {
                        debug!(target: DISPATCH_TARGET, error = %error, "message not handled");
                    }
                });
            }
            debug!(target: DISPATCH_TARGET, "endpoint closed; dispatcher exiting");
        })
    }
}

fn deliver(ret: &Sender, verb: Verb, reply: Message) {
    if let Err(error) = ret.send(reply) {
        debug!(
            target: DISPATCH_TARGET,
            verb = %verb,
            error = %error,
            "requester hung up before the reply"
        );
    }
}
