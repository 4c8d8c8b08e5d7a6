//! The flotilla daemon.
//!
//! `flotillad` spawns one backend instance at startup and exposes it through
//! a REST surface compatible with version `0.11.0` of the container-engine
//! API. Each HTTP request runs on its own thread against the shared instance
//! [`flotilla_beam::Object`]; the gateway translates routes into object
//! operations and maps failures according to the configured
//! [`flotilla_config::ErrorPolicy`].
//!
//! Startup is observable through [`HealthReporter`]; backend `Log` and
//! `Error` events are re-emitted through `tracing`.

mod bootstrap;
pub mod gateway;
mod health;
mod launch;
mod listener;
mod shutdown;
mod telemetry;

pub use bootstrap::{
    BackendStartupError, BackendStep, BootstrapError, ConfigLoader, Daemon, StaticConfigLoader,
    SystemConfigLoader, bootstrap_with,
};
pub use gateway::{Gateway, GatewayError, GatewayRequest, GatewayResponse};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use launch::{LaunchError, run_daemon, run_daemon_with};
pub use listener::{HttpListener, ListenerError, ListenerHandle, RequestHandler};
pub use shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
pub use telemetry::TelemetryError;

#[cfg(test)]
mod tests;
