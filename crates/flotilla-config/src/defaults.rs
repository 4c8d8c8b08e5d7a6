use crate::logging::LogFormat;

/// Backend selected when the configuration does not name one.
pub const DEFAULT_BACKEND: &str = "forward";

/// Container-engine address used when neither the configuration nor
/// [`ENGINE_HOST_ENV_VAR`] provide one.
pub const DEFAULT_ENGINE_HOST: &str = "unix:///var/run/docker.sock";

/// Environment variable consulted for the engine address when the
/// configuration leaves it unset.
pub const ENGINE_HOST_ENV_VAR: &str = "DOCKER_HOST";

/// Address the REST gateway listens on.
pub const DEFAULT_LISTEN_ADDRESS: &str = "0.0.0.0:4243";

/// Per-operation timeout applied to object round-trips, in seconds.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression used by the binaries.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Owned backend name used by serde when the field is absent.
pub fn default_backend_string() -> String {
    DEFAULT_BACKEND.to_string()
}

/// Owned listen address used by serde when the field is absent.
pub fn default_listen_address_string() -> String {
    DEFAULT_LISTEN_ADDRESS.to_string()
}

/// Operation timeout used by serde when the field is absent.
pub fn default_operation_timeout_secs() -> u64 {
    DEFAULT_OPERATION_TIMEOUT_SECS
}
