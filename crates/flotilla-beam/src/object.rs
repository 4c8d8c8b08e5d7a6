//! Client-side handle for talking to an object.

use std::time::Duration;

use tracing::debug;

use crate::dispatcher::DISPATCH_TARGET;
use crate::errors::{ObjectError, ProtocolError};
use crate::message::Message;
use crate::pipe::{Receiver, RecvError, Sender, pipe};
use crate::verb::Verb;

/// Handle wrapping an object's endpoint.
///
/// Every request creates a fresh return-channel, sends the request, and
/// blocks until the terminal reply arrives or the timeout elapses. Handles
/// are cheap to clone and independent clones may be used concurrently.
#[derive(Debug, Clone)]
pub struct Object {
    endpoint: Sender,
    timeout: Option<Duration>,
}

impl Object {
    /// Wraps an endpoint with no timeout.
    #[must_use]
    pub fn new(endpoint: Sender) -> Self {
        Self {
            endpoint,
            timeout: None,
        }
    }

    /// Sets the per-request timeout; `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The wrapped endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Sender {
        &self.endpoint
    }

    /// Creates a child object. The child inherits this handle's timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::SpawnFailed`] with the backend's message, or a
    /// transport, timeout or protocol failure.
    pub fn spawn(&self, argument: &str) -> Result<Self, ObjectError> {
        let (reply, _) = self.request(Verb::Spawn, [argument])?;
        let endpoint = reply
            .ret
            .ok_or(ProtocolError::MissingPayload(Verb::Spawn))?;
        Ok(Self::new(endpoint).with_timeout(self.timeout))
    }

    /// Opens a session with the child `name`, or with this object itself
    /// when `name` is empty.
    ///
    /// Returns the session's event stream and its send end. Events emitted
    /// before the attach was acknowledged are already queued on the stream.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::AttachFailed`] when the name is unknown, or a
    /// transport, timeout or protocol failure.
    pub fn attach(&self, name: &str) -> Result<(Receiver, Sender), ObjectError> {
        let (reply, stream) = self.request(Verb::Attach, [name])?;
        let session = reply
            .ret
            .ok_or(ProtocolError::MissingPayload(Verb::Attach))?;
        Ok((stream, session))
    }

    /// Attaches to the child `name` and returns a handle to it.
    ///
    /// # Errors
    ///
    /// As [`Object::attach`].
    pub fn child(&self, name: &str) -> Result<Self, ObjectError> {
        let (_, session) = self.attach(name)?;
        Ok(Self::new(session).with_timeout(self.timeout))
    }

    /// Brings the object up.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::StartFailed`] with the backend's message, or a
    /// transport, timeout or protocol failure.
    pub fn start(&self) -> Result<(), ObjectError> {
        self.request(Verb::Start, None::<&str>).map(drop)
    }

    /// Brings the object down.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::StopFailed`] with the backend's message, or a
    /// transport, timeout or protocol failure.
    pub fn stop(&self) -> Result<(), ObjectError> {
        self.request(Verb::Stop, None::<&str>).map(drop)
    }

    /// Lists child names in the order the object reported them.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::LsFailed`] with the backend's message, or a
    /// transport, timeout or protocol failure.
    pub fn ls(&self) -> Result<Vec<String>, ObjectError> {
        let (reply, _) = self.request(Verb::Ls, None::<&str>)?;
        Ok(reply.args)
    }

    /// Fetches the object's description.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::GetFailed`] with the backend's message,
    /// [`ProtocolError::MissingPayload`] when the reply is empty, or a
    /// transport or timeout failure.
    pub fn get(&self) -> Result<String, ObjectError> {
        let (reply, _) = self.request(Verb::Get, None::<&str>)?;
        reply
            .args
            .into_iter()
            .next()
            .ok_or_else(|| ProtocolError::MissingPayload(Verb::Get).into())
    }

    /// Emits a diagnostic event without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Closed`] when the endpoint is gone.
    pub fn log(&self, line: &str) -> Result<(), ObjectError> {
        Ok(self.endpoint.send(Message::log(line))?)
    }

    /// Emits a fatal event without waiting for a reply.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectError::Closed`] when the endpoint is gone.
    pub fn error(&self, message: &str) -> Result<(), ObjectError> {
        Ok(self.endpoint.send(Message::error(message))?)
    }

    fn request<I, S>(&self, verb: Verb, args: I) -> Result<(Message, Receiver), ObjectError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let (mut receiver, ret) = pipe();
        self.endpoint
            .send(Message::new(verb).with_args(args).with_ret(ret))?;

        let reply = receiver
            .recv_terminal(self.timeout)
            .map_err(|error| match error {
                RecvError::Timeout => ObjectError::Timeout {
                    verb,
                    timeout: self.timeout.unwrap_or_default(),
                },
                RecvError::Closed => ObjectError::Closed { verb },
            })?;

        if reply.verb == Verb::Error {
            let message = reply.first_arg().unwrap_or("unspecified error");
            debug!(target: DISPATCH_TARGET, verb = %verb, error = message, "request failed");
            return Err(ObjectError::failed(verb, message));
        }
        Ok((reply, receiver))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::{Dispatcher, HandlerResult, Reply};
    use crate::errors::HandlerError;
    use rstest::{fixture, rstest};
    use std::thread;

    fn child() -> Sender {
        Dispatcher::new()
            .with(Verb::Get, |_: &Message| -> HandlerResult { Ok(Reply::Text("child".into())) })
            .serve()
    }

    #[fixture]
    fn parent() -> Object {
        let endpoint = Dispatcher::new()
            .with(Verb::Spawn, |message: &Message| -> HandlerResult {
                match message.first_arg() {
                    Some("bad") => Err(HandlerError::new("cannot spawn bad")),
                    _ => Ok(Reply::Object(child())),
                }
            })
            .with(Verb::Attach, |message: &Message| -> HandlerResult {
                match (message.first_arg(), message.ret.as_ref()) {
                    (Some(""), Some(ret)) => {
                        ret.send(Message::log("before ack"))
                            .map_err(|error| HandlerError::new(error.to_string()))?;
                        Ok(Reply::Object(child()))
                    }
                    (Some("web"), _) => Ok(Reply::Object(child())),
                    (name, _) => Err(HandlerError::new(format!(
                        "no such container: {}",
                        name.unwrap_or_default()
                    ))),
                }
            })
            .with(Verb::Ls, |_: &Message| -> HandlerResult {
                Ok(Reply::Names(vec!["x".into(), "y".into()]))
            })
            .with(Verb::Start, |_: &Message| -> HandlerResult { Ok(Reply::Empty) })
            .with(Verb::Get, |_: &Message| -> HandlerResult { Ok(Reply::Empty) })
            .with(Verb::Stop, |_: &Message| -> HandlerResult {
                thread::sleep(Duration::from_millis(500));
                Ok(Reply::Empty)
            })
            .serve();
        Object::new(endpoint).with_timeout(Some(Duration::from_millis(200)))
    }

    #[rstest]
    fn spawn_returns_usable_child(parent: Object) {
        let child = parent.spawn("unix:///var/run/docker.sock").expect("spawn");
        assert_eq!(child.timeout(), parent.timeout());
        assert_eq!(child.get().expect("get"), "child");
    }

    #[rstest]
    fn spawn_failure_carries_message(parent: Object) {
        assert_eq!(
            parent.spawn("bad").map(|_| ()),
            Err(ObjectError::SpawnFailed("cannot spawn bad".into()))
        );
    }

    #[rstest]
    fn self_attach_keeps_early_events(parent: Object) {
        let (mut events, _session) = parent.attach("").expect("attach");
        let early = events
            .recv_timeout(Duration::from_millis(100))
            .expect("early event");
        assert_eq!(early.verb, Verb::Log);
        assert_eq!(early.first_arg(), Some("before ack"));
    }

    #[rstest]
    fn attach_to_named_child(parent: Object) {
        let web = parent.child("web").expect("child");
        assert_eq!(web.get().expect("get"), "child");
    }

    #[rstest]
    fn attach_to_unknown_child_fails(parent: Object) {
        let error = parent.attach("ghost").map(|_| ()).expect_err("must fail");
        assert_eq!(error, ObjectError::AttachFailed("no such container: ghost".into()));
        assert_eq!(error.reply_message(), Some("no such container: ghost"));
    }

    #[rstest]
    fn ls_preserves_order(parent: Object) {
        assert_eq!(parent.ls().expect("ls"), ["x", "y"]);
    }

    #[rstest]
    fn start_acknowledges(parent: Object) {
        parent.start().expect("start");
    }

    #[rstest]
    fn empty_get_is_a_protocol_error(parent: Object) {
        assert_eq!(
            parent.get(),
            Err(ObjectError::Protocol(ProtocolError::MissingPayload(Verb::Get)))
        );
    }

    #[rstest]
    fn slow_handler_times_out(parent: Object) {
        assert_eq!(
            parent.stop(),
            Err(ObjectError::Timeout {
                verb: Verb::Stop,
                timeout: Duration::from_millis(200),
            })
        );
    }

    #[test]
    fn unknown_verb_surfaces_as_failure() {
        let object = Object::new(Dispatcher::new().serve());
        assert_eq!(
            object.ls(),
            Err(ObjectError::LsFailed("no such verb: ls".into()))
        );
    }

    #[test]
    fn closed_endpoint_is_reported() {
        let (receiver, sender) = pipe();
        drop(receiver);
        let object = Object::new(sender);
        assert_eq!(object.start(), Err(ObjectError::Closed { verb: Verb::Start }));
    }
}
