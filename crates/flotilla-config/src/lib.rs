//! Shared configuration for the flotilla daemon and CLI.
//!
//! Both binaries resolve the same [`Config`] through `ortho_config`, layering
//! defaults, an optional TOML file (`--config-path`), `FLOTILLA_*`
//! environment variables and command-line flags, in increasing order of
//! precedence. The container-engine address additionally falls back to the
//! conventional `DOCKER_HOST` variable so existing engine setups work
//! unchanged.

use std::env;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod engine;
mod logging;
mod policy;

pub use defaults::{
    DEFAULT_BACKEND, DEFAULT_ENGINE_HOST, DEFAULT_LISTEN_ADDRESS, DEFAULT_LOG_FILTER,
    DEFAULT_OPERATION_TIMEOUT_SECS, ENGINE_HOST_ENV_VAR, default_backend_string,
    default_listen_address_string, default_log_filter, default_log_filter_string,
    default_log_format, default_operation_timeout_secs,
};
pub use engine::{DEFAULT_ENGINE_PORT, EngineAddress, EngineAddressError};
pub use logging::{LogFormat, LogFormatParseError};
pub use policy::{ErrorPolicy, ErrorPolicyParseError};

/// Resolved configuration shared by `flotillad` and `flotilla`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "FLOTILLA")]
pub struct Config {
    /// Backend instantiated at startup (`forward` or `debug`).
    #[serde(default = "default_backend_string")]
    pub backend: String,
    /// Container-engine address handed to the backend on spawn.
    #[serde(default)]
    pub engine_host: Option<String>,
    /// Address the REST gateway binds.
    #[serde(default = "default_listen_address_string")]
    pub listen_address: String,
    /// Per-operation timeout in seconds; `0` waits indefinitely.
    #[serde(default = "default_operation_timeout_secs")]
    pub operation_timeout_secs: u64,
    /// How the gateway reports failed backend operations.
    #[serde(default)]
    pub error_policy: ErrorPolicy,
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend_string(),
            engine_host: None,
            listen_address: default_listen_address_string(),
            operation_timeout_secs: default_operation_timeout_secs(),
            error_policy: ErrorPolicy::default(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Name of the backend to instantiate.
    #[must_use]
    pub fn backend(&self) -> &str {
        self.backend.as_str()
    }

    /// Engine address: the configured value, then `DOCKER_HOST`, then the
    /// local engine socket.
    #[must_use]
    pub fn engine_host(&self) -> String {
        self.engine_host_with(|key| env::var(key).ok())
    }

    /// Resolves the engine address with a caller-supplied environment lookup.
    #[must_use]
    pub fn engine_host_with<F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<String>,
    {
        non_blank(self.engine_host.clone())
            .or_else(|| non_blank(lookup(ENGINE_HOST_ENV_VAR)))
            .unwrap_or_else(|| DEFAULT_ENGINE_HOST.to_owned())
    }

    /// Address the REST gateway binds.
    #[must_use]
    pub fn listen_address(&self) -> &str {
        self.listen_address.as_str()
    }

    /// Per-operation timeout, `None` when round-trips may block forever.
    #[must_use]
    pub fn operation_timeout(&self) -> Option<Duration> {
        (self.operation_timeout_secs > 0).then(|| Duration::from_secs(self.operation_timeout_secs))
    }

    /// Gateway failure reporting policy.
    #[must_use]
    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// `tracing` filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|candidate| !candidate.trim().is_empty())
}
