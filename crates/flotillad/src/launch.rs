//! Daemon launch sequence: bootstrap, serve, wait, stop.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::bootstrap::{
    BootstrapError, ConfigLoader, Daemon, SystemConfigLoader, bootstrap_with,
};
use crate::gateway::Gateway;
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::listener::{HttpListener, ListenerError};
use crate::shutdown::{ShutdownError, ShutdownSignal, SystemShutdownSignal};

pub(crate) const LAUNCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::launch");

/// Errors that end the daemon.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Bootstrap failed.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// The HTTP listener failed.
    #[error(transparent)]
    Listener(#[from] ListenerError),
    /// Waiting for shutdown failed.
    #[error(transparent)]
    Shutdown(#[from] ShutdownError),
}

/// Runs the daemon with the production collaborators until a termination
/// signal arrives.
///
/// # Errors
///
/// Returns [`LaunchError`] when startup fails or the listener dies.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(
        &SystemConfigLoader,
        Arc::new(StructuredHealthReporter::new()),
        &SystemShutdownSignal::new(),
    )
}

/// Runs the daemon with injected collaborators.
///
/// The backend instance is stopped whenever bootstrap succeeded, including
/// when the listener cannot bind. A failure to stop it is logged but does not
/// fail the run.
///
/// # Errors
///
/// Returns [`LaunchError`] when startup fails or the listener dies.
pub fn run_daemon_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
    shutdown: &dyn ShutdownSignal,
) -> Result<(), LaunchError> {
    let daemon = bootstrap_with(loader, Arc::clone(&reporter))?;
    let policy = daemon.config().error_policy();

    let listener = match HttpListener::bind(daemon.config().listen_address()) {
        Ok(listener) => listener,
        Err(error) => {
            stop_backend(daemon);
            return Err(error.into());
        }
    };
    if let Some(address) = listener.local_addr() {
        reporter.listener_ready(address);
    }
    let gateway = Gateway::new(daemon.instance().clone(), policy);
    let handle = listener.start(Arc::new(gateway));

    let waited = shutdown.wait();
    handle.shutdown();
    let joined = handle.join();

    stop_backend(daemon);
    waited?;
    joined?;
    info!(target: LAUNCH_TARGET, "shutdown complete");
    Ok(())
}

fn stop_backend(daemon: Daemon) {
    let kind = daemon.kind();
    match daemon.shutdown() {
        Ok(()) => info!(target: LAUNCH_TARGET, backend = %kind, "backend instance stopped"),
        Err(error) => warn!(
            target: LAUNCH_TARGET,
            backend = %kind,
            error = %error,
            "backend instance failed to stop"
        ),
    }
}
