//! Harness types for the CLI suites: canned configuration, a stub backend
//! factory and captured output.

use std::cell::RefCell;
use std::ffi::OsString;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use flotilla_backends::BackendKindParseError;
use flotilla_beam::{Dispatcher, HandlerError, HandlerResult, Message, Object, Reply, Verb};
use flotilla_config::Config;

use crate::session::BackendResolver;
use crate::sink::RecordingSink;
use crate::{AppError, ConfigLoader, run_with};

pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _args: &[OsString]) -> Result<Config, AppError> {
        Ok(self.config.clone())
    }
}

/// How the stub instance behaves.
#[derive(Debug, Clone, Default)]
pub(super) struct StubBehaviour {
    pub names: Vec<String>,
    pub spawn_error: Option<String>,
    pub start_error: Option<String>,
}

fn answer(error: Option<&String>, reply: Reply) -> HandlerResult {
    match error {
        Some(message) => Err(HandlerError::new(message.clone())),
        None => Ok(reply),
    }
}

fn serve_instance(behaviour: StubBehaviour) -> Object {
    let names = behaviour.names.clone();
    let start_error = behaviour.start_error;
    let endpoint = Dispatcher::new()
        .with(Verb::Attach, |message: &Message| -> HandlerResult {
            if let Some(ret) = message.ret.as_ref() {
                let _ = ret.send(Message::log("instance attached"));
            }
            Ok(Reply::Object(Dispatcher::new().serve()))
        })
        .with(Verb::Start, move |_: &Message| -> HandlerResult {
            answer(start_error.as_ref(), Reply::Empty)
        })
        .with(Verb::Ls, move |_: &Message| -> HandlerResult {
            Ok(Reply::Names(names.clone()))
        })
        .serve();
    Object::new(endpoint)
}

/// Resolver handing out a factory that spawns [`StubBehaviour`] instances.
#[derive(Debug, Default)]
pub(super) struct StubResolver {
    pub behaviour: StubBehaviour,
    resolutions: AtomicUsize,
}

impl StubResolver {
    pub(super) fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl BackendResolver for StubResolver {
    fn resolve(&self, _config: &Config) -> Result<Object, BackendKindParseError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        let behaviour = self.behaviour.clone();
        let endpoint = Dispatcher::new()
            .with(Verb::Spawn, move |_: &Message| -> HandlerResult {
                answer(
                    behaviour.spawn_error.as_ref(),
                    Reply::Object(serve_instance(behaviour.clone()).endpoint().clone()),
                )
            })
            .serve();
        Ok(Object::new(endpoint))
    }
}

/// Scenario world shared by the CLI steps.
#[derive(Default)]
pub(super) struct TestWorld {
    pub resolver: StubResolver,
    pub sink: Arc<RecordingSink>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
}

impl TestWorld {
    pub fn run(&mut self, command_line: &str) {
        self.stdout.clear();
        self.stderr.clear();
        let args: Vec<OsString> = std::iter::once("flotilla")
            .chain(command_line.split_whitespace())
            .map(OsString::from)
            .collect();
        let loader = StaticConfigLoader::new(Config::default());
        let exit = run_with(
            args,
            &mut self.stdout,
            &mut self.stderr,
            &loader,
            &self.resolver,
            self.sink.clone(),
        );
        self.exit_code = Some(exit);
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code.expect("the CLI has not run")
    }
}

/// Default world fixture.
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}
