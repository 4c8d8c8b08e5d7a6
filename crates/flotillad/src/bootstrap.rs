//! Daemon bootstrap: configuration, telemetry and the backend instance.

use std::fmt;
use std::sync::Arc;
use std::thread;

use flotilla_backends::{BackendKind, BackendKindParseError, serve_factory};
use flotilla_beam::{Dispatcher, HandlerResult, Message, Object, ObjectError, Receiver, Reply, Verb};
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::{error, info};

use flotilla_config::Config;

use crate::health::HealthReporter;
use crate::telemetry::{self, TelemetryError};

const EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// Source of the daemon configuration.
pub trait ConfigLoader: Send + Sync {
    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns the loader's error when any layer fails to parse.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loads configuration from defaults, file, environment and arguments.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Hands out a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Steps taken to bring the backend instance up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStep {
    /// Spawning the instance from the factory.
    Spawn,
    /// Subscribing to the instance's events.
    Attach,
    /// Starting the instance.
    Start,
}

impl fmt::Display for BackendStep {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Spawn => "spawn",
            Self::Attach => "attach",
            Self::Start => "start",
        })
    }
}

/// A backend startup step failed.
#[derive(Debug, Error)]
#[error("backend {kind} failed to {step}: {source}")]
pub struct BackendStartupError {
    /// Backend being started.
    pub kind: BackendKind,
    /// Step that failed.
    pub step: BackendStep,
    /// Failure reported by the object.
    #[source]
    pub source: ObjectError,
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry could not be installed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The configured backend name is not recognised.
    #[error(transparent)]
    BackendKind(#[from] BackendKindParseError),
    /// The backend instance failed to come up.
    #[error(transparent)]
    Backend(#[from] BackendStartupError),
}

/// A bootstrapped daemon holding the running backend instance.
pub struct Daemon {
    config: Config,
    kind: BackendKind,
    instance: Object,
    reporter: Arc<dyn HealthReporter>,
}

impl fmt::Debug for Daemon {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Daemon")
            .field("config", &self.config)
            .field("kind", &self.kind)
            .field("instance", &self.instance)
            .finish_non_exhaustive()
    }
}

impl Daemon {
    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Backend the instance was spawned from.
    #[must_use]
    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Handle to the started backend instance.
    #[must_use]
    pub fn instance(&self) -> &Object {
        &self.instance
    }

    /// Stops the backend instance.
    ///
    /// # Errors
    ///
    /// Returns the instance's stop failure.
    pub fn shutdown(self) -> Result<(), ObjectError> {
        self.reporter.shutdown_requested();
        self.instance.stop()
    }
}

/// Bootstraps the daemon with the supplied collaborators.
///
/// # Errors
///
/// Returns [`BootstrapError`] when configuration, telemetry or any backend
/// startup step fails. The failure is also reported to `reporter`.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();
    match bootstrap_inner(loader, &reporter) {
        Ok(daemon) => {
            reporter.bootstrap_succeeded(&daemon.config);
            Ok(daemon)
        }
        Err(error) => {
            reporter.bootstrap_failed(&error);
            Err(error)
        }
    }
}

fn bootstrap_inner(
    loader: &dyn ConfigLoader,
    reporter: &Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;
    let kind: BackendKind = config.backend().parse()?;

    let instance = start_backend(&config, kind, reporter.as_ref()).map_err(|error| {
        reporter.backend_failed(&error);
        error
    })?;

    Ok(Daemon {
        config,
        kind,
        instance,
        reporter: Arc::clone(reporter),
    })
}

fn start_backend(
    config: &Config,
    kind: BackendKind,
    reporter: &dyn HealthReporter,
) -> Result<Object, BackendStartupError> {
    let engine_host = config.engine_host();
    let factory = Object::new(serve_factory(kind)).with_timeout(config.operation_timeout());

    reporter.backend_step(kind, BackendStep::Spawn);
    let instance = factory
        .spawn(&engine_host)
        .map_err(failed(kind, BackendStep::Spawn))?;

    reporter.backend_step(kind, BackendStep::Attach);
    let (events, _session) = instance
        .attach("")
        .map_err(failed(kind, BackendStep::Attach))?;
    relay_events(events);

    reporter.backend_step(kind, BackendStep::Start);
    instance.start().map_err(failed(kind, BackendStep::Start))?;

    reporter.backend_ready(kind, &engine_host);
    Ok(instance)
}

fn failed(kind: BackendKind, step: BackendStep) -> impl FnOnce(ObjectError) -> BackendStartupError {
    move |source| BackendStartupError { kind, step, source }
}

/// Re-emits backend `Log` and `Error` events through `tracing` until the
/// instance closes its event stream.
fn relay_events(events: Receiver) {
    let sink = Dispatcher::new()
        .with(Verb::Log, |message: &Message| -> HandlerResult {
            info!(target: EVENTS_TARGET, "{}", message.first_arg().unwrap_or_default());
            Ok(Reply::Empty)
        })
        .with(Verb::Error, |message: &Message| -> HandlerResult {
            error!(target: EVENTS_TARGET, "{}", message.first_arg().unwrap_or_default());
            Ok(Reply::Empty)
        });
    thread::spawn(move || sink.relay(events));
}
