//! The engine seam shared by every backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::EngineError;

/// Description of one container, rendered as the reply to `Get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerDescription {
    /// Engine identifier.
    pub id: String,
    /// Name without the engine's leading slash.
    pub name: String,
    /// Image the container was created from.
    pub image: String,
    /// Lifecycle state, e.g. `created`, `running` or `exited`.
    pub state: String,
}

/// Operations a backend needs from a container engine.
#[cfg_attr(test, mockall::automock)]
pub trait ContainerEngine: Send + Sync {
    /// Checks the engine is reachable.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the engine does not answer.
    fn ping(&self) -> Result<(), EngineError>;

    /// Lists every container name, in engine order.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the engine rejects the request.
    fn list(&self) -> Result<Vec<String>, EngineError>;

    /// Creates a container from a JSON creation spec and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidSpec`] for a spec that is not a JSON
    /// object, or the engine's failure.
    fn create(&self, spec: &str) -> Result<String, EngineError>;

    /// Resolves a container name or id to its id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the lookup itself fails; an unknown
    /// name is `Ok(None)`.
    fn resolve(&self, name: &str) -> Result<Option<String>, EngineError>;

    /// Describes the container with the given id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the container is unknown.
    fn inspect(&self, id: &str) -> Result<ContainerDescription, EngineError>;

    /// Starts the container with the given id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the engine refuses.
    fn start(&self, id: &str) -> Result<(), EngineError>;

    /// Stops the container with the given id.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the engine refuses.
    fn stop(&self, id: &str) -> Result<(), EngineError>;
}

/// Fields of a creation spec the backends interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CreationSpec {
    pub(crate) name: Option<String>,
    pub(crate) image: String,
}

impl CreationSpec {
    pub(crate) fn parse(spec: &str) -> Result<Self, EngineError> {
        let value: Value = serde_json::from_str(spec)?;
        let Value::Object(fields) = value else {
            return Err(EngineError::InvalidSpec);
        };
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_owned)
        };
        Ok(Self {
            name: text("Name").map(|name| name.trim_start_matches('/').to_owned()),
            image: text("Image").unwrap_or_default(),
        })
    }
}
