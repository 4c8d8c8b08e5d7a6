//! Waiting for the process to be asked to stop.

use std::io;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use crate::launch::LAUNCH_TARGET;

const STOP_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Something the launcher parks on while the gateway serves.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the daemon should wind down.
    ///
    /// # Errors
    ///
    /// Fails when the wait itself cannot be arranged.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// The shutdown wait could not be arranged.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// `signal_hook` refused the handler registration.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Error from the registration call.
        #[source]
        source: io::Error,
    },
}

/// Parks on the first of SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Handlers are only registered once [`ShutdownSignal::wait`] runs.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(STOP_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let received = signals.forever().next();
        info!(target: LAUNCH_TARGET, signal = ?received, "stopping on signal");
        Ok(())
    }
}
