//! Drives one backend instance through a single user command.
//!
//! The session spawns an instance from the factory, relays the instance's
//! event stream into an [`EventSink`] on a background thread, starts the
//! instance and then runs the command.

use std::io::Write;
use std::sync::Arc;
use std::thread;

use flotilla_backends::{BackendKind, BackendKindParseError, serve_factory};
use flotilla_beam::{Dispatcher, HandlerResult, Message, Object, Receiver, Reply, Verb};
use flotilla_config::Config;

use crate::cli::Command;
use crate::errors::SessionError;
use crate::sink::EventSink;

/// Chooses the factory object a session spawns from.
pub trait BackendResolver {
    /// Returns the factory for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns [`BackendKindParseError`] for an unknown backend name.
    fn resolve(&self, config: &Config) -> Result<Object, BackendKindParseError>;
}

/// Serves the configured backend's factory in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackendResolver;

impl BackendResolver for SystemBackendResolver {
    fn resolve(&self, config: &Config) -> Result<Object, BackendKindParseError> {
        let kind: BackendKind = config.backend().parse()?;
        Ok(Object::new(serve_factory(kind)).with_timeout(config.operation_timeout()))
    }
}

/// Dispatcher turning backend events into sink calls.
pub(crate) fn event_dispatcher(sink: Arc<dyn EventSink>) -> Dispatcher {
    let fatal = Arc::clone(&sink);
    Dispatcher::new()
        .with(Verb::Log, move |message: &Message| -> HandlerResult {
            sink.log(&message.args.join(" "));
            Ok(Reply::Empty)
        })
        .with(Verb::Error, move |message: &Message| -> HandlerResult {
            fatal.fatal(message.first_arg().unwrap_or_default());
            Ok(Reply::Empty)
        })
}

/// A single-command session against one backend factory.
pub struct Session {
    factory: Object,
    sink: Arc<dyn EventSink>,
}

impl Session {
    /// Builds a session spawning from `factory` and reporting to `sink`.
    #[must_use]
    pub fn new(factory: Object, sink: Arc<dyn EventSink>) -> Self {
        Self { factory, sink }
    }

    /// Spawns an instance bound to `engine_host`, attaches, starts it and
    /// runs `command`, writing command output to `stdout`.
    ///
    /// # Errors
    ///
    /// Returns the [`SessionError`] of the first step that failed.
    pub fn run<W: Write>(
        &self,
        command: Command,
        engine_host: &str,
        stdout: &mut W,
    ) -> Result<(), SessionError> {
        self.sink.log("---> Spawning");
        let instance = self
            .factory
            .spawn(engine_host)
            .map_err(SessionError::Spawn)?;

        self.sink.log("---> Attaching");
        let (events, _session) = instance.attach("").map_err(SessionError::Attach)?;
        self.relay(events);

        self.sink.log("---> Starting");
        instance.start().map_err(SessionError::Start)?;

        self.sink.log(&format!("---> {command}"));
        match command {
            Command::Ps => {
                let names = instance.ls().map_err(SessionError::Command)?;
                writeln!(stdout, "{}", names.join("\n")).map_err(SessionError::Output)?;
                stdout.flush().map_err(SessionError::Output)
            }
        }
    }

    fn relay(&self, events: Receiver) {
        let dispatcher = event_dispatcher(Arc::clone(&self.sink));
        thread::spawn(move || dispatcher.relay(events));
    }
}
