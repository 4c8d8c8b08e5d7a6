//! Failures raised while serving a gateway route.

use flotilla_beam::ObjectError;
use thiserror::Error;

/// Errors raised by gateway route handlers.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A path parameter the route needs was absent.
    #[error("missing path parameter '{0}'")]
    MissingParameter(&'static str),
    /// A backend operation failed.
    #[error(transparent)]
    Object(#[from] ObjectError),
    /// The backend described a container without a usable `Id`.
    #[error("malformed container description: {0}")]
    MalformedDescription(String),
    /// A response body failed to serialise.
    #[error("failed to serialise response: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GatewayError {
    /// HTTP status reported for this error when failures are not silenced.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingParameter(_) => 400,
            Self::Object(ObjectError::AttachFailed(_)) => 404,
            Self::Object(_) | Self::MalformedDescription(_) | Self::Serialize(_) => 500,
        }
    }
}
