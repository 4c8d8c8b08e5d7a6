//! Lifecycle observers for daemon startup and shutdown.

use std::net::SocketAddr;

use flotilla_backends::BackendKind;
use flotilla_config::Config;

use crate::bootstrap::{BackendStartupError, BackendStep, BootstrapError};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Receives lifecycle events as the daemon comes up and goes down.
pub trait HealthReporter: Send + Sync {
    /// Configuration is about to load.
    fn bootstrap_starting(&self);

    /// Bootstrap finished and the backend is running.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Bootstrap failed.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// A backend startup step is about to run.
    fn backend_step(&self, kind: BackendKind, step: BackendStep);

    /// Every backend startup step succeeded.
    fn backend_ready(&self, kind: BackendKind, engine_host: &str);

    /// A backend startup step failed.
    fn backend_failed(&self, error: &BackendStartupError);

    /// The REST listener is accepting connections.
    fn listener_ready(&self, address: SocketAddr);

    /// Shutdown was requested.
    fn shutdown_requested(&self);
}

/// Reporter that emits each lifecycle event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(target: HEALTH_TARGET, event = "bootstrap_starting", "bootstrapping flotillad");
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            backend = %config.backend(),
            listen_address = %config.listen_address(),
            error_policy = %config.error_policy(),
            log_format = %config.log_format(),
            "flotillad bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "flotillad bootstrap failed"
        );
    }

    fn backend_step(&self, kind: BackendKind, step: BackendStep) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "backend_step",
            backend = %kind,
            step = %step,
            "backend {step}"
        );
    }

    fn backend_ready(&self, kind: BackendKind, engine_host: &str) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "backend_ready",
            backend = %kind,
            engine_host,
            "backend ready"
        );
    }

    fn backend_failed(&self, error: &BackendStartupError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "backend_failed",
            backend = %error.kind,
            step = %error.step,
            error = %error.source,
            "backend failed to start"
        );
    }

    fn listener_ready(&self, address: SocketAddr) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "listener_ready",
            address = %address,
            "listening for engine API requests"
        );
    }

    fn shutdown_requested(&self) {
        tracing::info!(target: HEALTH_TARGET, event = "shutdown_requested", "shutting down");
    }
}
