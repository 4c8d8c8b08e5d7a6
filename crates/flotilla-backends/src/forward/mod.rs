//! Container engine reached over the engine's HTTP API.

mod http;
mod transport;

use serde::Deserialize;
use url::form_urlencoded;

use flotilla_config::EngineAddress;

use self::http::{EngineClient, EngineResponse};
use crate::engine::{ContainerDescription, ContainerEngine, CreationSpec};
use crate::errors::EngineError;

const NOT_MODIFIED: u16 = 304;
const NOT_FOUND: u16 = 404;

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListedContainer {
    id: String,
    #[serde(default)]
    names: Vec<String>,
}

impl ListedContainer {
    fn display_name(self) -> String {
        self.names
            .into_iter()
            .next()
            .map(|name| name.trim_start_matches('/').to_owned())
            .unwrap_or(self.id)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreatedContainer {
    id: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct InspectConfig {
    #[serde(default)]
    image: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
struct InspectState {
    #[serde(default)]
    status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InspectedContainer {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    config: InspectConfig,
    #[serde(default)]
    state: InspectState,
}

impl From<InspectedContainer> for ContainerDescription {
    fn from(container: InspectedContainer) -> Self {
        Self {
            id: container.id,
            name: container.name.trim_start_matches('/').to_owned(),
            image: container.config.image,
            state: container.state.status,
        }
    }
}

/// Engine that proxies every operation to a container engine socket.
#[derive(Debug, Clone)]
pub struct ForwardEngine {
    client: EngineClient,
}

impl ForwardEngine {
    /// Targets the engine at `address`.
    #[must_use]
    pub fn new(address: EngineAddress) -> Self {
        Self {
            client: EngineClient::new(address),
        }
    }

    /// Parses `address` and targets that engine.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Address`] when the address is not a supported
    /// `unix://`, `tcp://` or `http://` URL.
    pub fn connect(address: &str) -> Result<Self, EngineError> {
        Ok(Self::new(address.parse()?))
    }

    /// Engine address this backend talks to.
    #[must_use]
    pub fn address(&self) -> &EngineAddress {
        self.client.address()
    }

    fn lifecycle(&self, id: &str, action: &str) -> Result<EngineResponse, EngineError> {
        if !is_container_reference(id) {
            return Err(EngineError::NoSuchContainer(id.to_owned()));
        }
        self.client.post(&format!("/containers/{id}/{action}"), "")
    }
}

impl ContainerEngine for ForwardEngine {
    fn ping(&self) -> Result<(), EngineError> {
        self.client.get("/_ping")?.success().map(drop)
    }

    fn list(&self) -> Result<Vec<String>, EngineError> {
        let listed: Vec<ListedContainer> =
            self.client.get("/containers/json?all=1")?.success()?.json()?;
        Ok(listed.into_iter().map(ListedContainer::display_name).collect())
    }

    fn create(&self, spec: &str) -> Result<String, EngineError> {
        let parsed = CreationSpec::parse(spec)?;
        let path = match parsed.name {
            Some(name) => {
                let encoded: String = form_urlencoded::byte_serialize(name.as_bytes()).collect();
                format!("/containers/create?name={encoded}")
            }
            None => "/containers/create".to_owned(),
        };
        let created: CreatedContainer = self.client.post(&path, spec)?.success()?.json()?;
        Ok(created.id)
    }

    fn resolve(&self, name: &str) -> Result<Option<String>, EngineError> {
        if !is_container_reference(name) {
            return Ok(None);
        }
        let response = self.client.get(&format!("/containers/{name}/json"))?;
        if response.status == NOT_FOUND {
            return Ok(None);
        }
        let inspected: InspectedContainer = response.success()?.json()?;
        Ok(Some(inspected.id))
    }

    fn inspect(&self, id: &str) -> Result<ContainerDescription, EngineError> {
        if !is_container_reference(id) {
            return Err(EngineError::NoSuchContainer(id.to_owned()));
        }
        let inspected: InspectedContainer = self
            .client
            .get(&format!("/containers/{id}/json"))?
            .success()?
            .json()?;
        Ok(inspected.into())
    }

    fn start(&self, id: &str) -> Result<(), EngineError> {
        let response = self.lifecycle(id, "start")?;
        if response.status == NOT_MODIFIED {
            return Err(EngineError::AlreadyRunning(id.to_owned()));
        }
        response.success().map(drop)
    }

    fn stop(&self, id: &str) -> Result<(), EngineError> {
        let response = self.lifecycle(id, "stop")?;
        if response.status == NOT_MODIFIED {
            return Err(EngineError::NotRunning(id.to_owned()));
        }
        response.success().map(drop)
    }
}

/// Names and ids travel as a single path segment.
fn is_container_reference(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("web", true)]
    #[case("4f2a9c1d0b3e", true)]
    #[case("my_app.v2-1", true)]
    #[case("", false)]
    #[case("../etc", false)]
    #[case("a b", false)]
    fn container_references_are_single_segments(#[case] value: &str, #[case] valid: bool) {
        assert_eq!(is_container_reference(value), valid);
    }

    #[test]
    fn listed_names_drop_leading_slash() {
        let listed: Vec<ListedContainer> = serde_json::from_str(
            r#"[{"Id":"1","Names":["/web","/alias"]},{"Id":"2","Names":[]}]"#,
        )
        .expect("parse");
        let names: Vec<String> = listed.into_iter().map(ListedContainer::display_name).collect();
        assert_eq!(names, ["web", "2"]);
    }

    #[test]
    fn inspection_maps_to_description() {
        let inspected: InspectedContainer = serde_json::from_str(
            r#"{"Id":"abc","Name":"/web","Config":{"Image":"nginx"},"State":{"Status":"running"}}"#,
        )
        .expect("parse");
        let description = ContainerDescription::from(inspected);
        assert_eq!(description.name, "web");
        assert_eq!(description.image, "nginx");
        assert_eq!(description.state, "running");
    }

    #[test]
    fn rejects_unsupported_addresses() {
        assert!(matches!(
            ForwardEngine::connect("ftp://engine:21"),
            Err(EngineError::Address(_))
        ));
    }
}
