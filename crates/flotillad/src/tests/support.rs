//! Shared collaborators for the daemon test suites.

use std::cell::RefCell;
use std::ffi::OsString;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use flotilla_backends::BackendKind;
use flotilla_beam::{Dispatcher, HandlerError, HandlerResult, Message, Object, Reply, Sender, Verb};
use flotilla_config::{Config, ErrorPolicy};
use ortho_config::{OrthoConfig, OrthoError};

use crate::bootstrap::{
    BackendStartupError, BackendStep, BootstrapError, ConfigLoader, Daemon, StaticConfigLoader,
    bootstrap_with,
};
use crate::gateway::{Gateway, GatewayRequest, GatewayResponse};
use crate::health::HealthReporter;

/// Configuration running the in-memory backend on an ephemeral port.
pub fn debug_config() -> Config {
    Config {
        backend: BackendKind::Debug.to_string(),
        listen_address: "127.0.0.1:0".to_owned(),
        ..Config::default()
    }
}

/// Loader that rejects a malformed timeout flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(vec![
            OsString::from("flotillad"),
            OsString::from("--operation-timeout-secs"),
            OsString::from("soon"),
        ])
    }
}

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    BackendStep(BackendStep),
    BackendReady(BackendKind),
    BackendFailed(BackendStep),
    ListenerReady,
    ShutdownRequested,
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn backend_step(&self, _kind: BackendKind, step: BackendStep) {
        self.record(HealthEvent::BackendStep(step));
    }

    fn backend_ready(&self, kind: BackendKind, _engine_host: &str) {
        self.record(HealthEvent::BackendReady(kind));
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        self.record(HealthEvent::BackendFailed(error.step));
    }

    fn listener_ready(&self, _address: SocketAddr) {
        self.record(HealthEvent::ListenerReady);
    }

    fn shutdown_requested(&self) {
        self.record(HealthEvent::ShutdownRequested);
    }
}

/// Scenario world for the bootstrap suite.
pub struct BootstrapWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    error: Option<BootstrapError>,
}

impl BootstrapWorld {
    pub fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(debug_config())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            error: None,
        }
    }

    pub fn use_config(&mut self, config: Config) {
        self.loader = Box::new(StaticConfigLoader::new(config));
    }

    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    pub fn bootstrap(&mut self) {
        match bootstrap_with(self.loader.as_ref(), self.reporter.clone()) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.error = Some(error),
        }
    }

    pub fn daemon(&self) -> Option<&Daemon> {
        self.daemon.as_ref()
    }

    pub fn error(&self) -> Option<&BootstrapError> {
        self.error.as_ref()
    }
}

/// Builds a fresh bootstrap world.
pub fn bootstrap_world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

/// Serves a container object answering `Get` with `description`.
fn serve_container(description: &'static str) -> Sender {
    Dispatcher::new()
        .with(Verb::Get, move |_: &Message| -> HandlerResult {
            Ok(Reply::Text(description.to_owned()))
        })
        .with(Verb::Start, |_: &Message| -> HandlerResult { Ok(Reply::Empty) })
        .with(Verb::Stop, |_: &Message| -> HandlerResult { Ok(Reply::Empty) })
        .serve()
}

/// A canned instance: two containers, `web` attachable, creation always
/// yields `abc123`.
pub fn stub_instance() -> Object {
    let endpoint = Dispatcher::new()
        .with(Verb::Ls, |_: &Message| -> HandlerResult {
            Ok(Reply::Names(vec!["a".to_owned(), "b".to_owned()]))
        })
        .with(Verb::Spawn, |_: &Message| -> HandlerResult {
            Ok(Reply::Object(serve_container(r#"{"Id":"abc123"}"#)))
        })
        .with(Verb::Attach, |message: &Message| -> HandlerResult {
            match message.first_arg() {
                Some("web") => Ok(Reply::Object(serve_container(r#"{"Id":"web"}"#))),
                Some(name) => Err(HandlerError::new(format!("no such container: {name}"))),
                None => Err(HandlerError::new("no such container")),
            }
        })
        .serve();
    Object::new(endpoint)
}

/// Scenario world for the gateway suite.
pub struct GatewayWorld {
    policy: ErrorPolicy,
    body: Vec<u8>,
    response: Option<GatewayResponse>,
}

impl GatewayWorld {
    pub fn new() -> Self {
        Self {
            policy: ErrorPolicy::Report,
            body: Vec::new(),
            response: None,
        }
    }

    pub fn set_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    pub fn set_body(&mut self, body: &str) {
        self.body = body.as_bytes().to_vec();
    }

    pub fn send(&mut self, method: &str, target: &str) {
        let gateway = Gateway::new(stub_instance(), self.policy);
        let request = GatewayRequest::new(method, target).with_body(self.body.clone());
        self.response = Some(gateway.handle(&request));
    }

    pub fn response(&self) -> &GatewayResponse {
        self.response.as_ref().expect("no request was sent")
    }
}

/// Builds a fresh gateway world.
pub fn gateway_world() -> RefCell<GatewayWorld> {
    RefCell::new(GatewayWorld::new())
}
