//! Route handlers translating REST calls into object operations.

use flotilla_beam::Object;
use serde::{Deserialize, Serialize};

use super::{GatewayError, GatewayResponse};

#[derive(Debug, Deserialize, Serialize)]
struct ContainerId {
    #[serde(rename = "Id")]
    id: String,
}

/// `GET /_ping`: answers without touching the backend.
pub(super) fn ping() -> GatewayResponse {
    GatewayResponse::text(200, "OK")
}

/// `GET /containers/json`: the instance's child names as a JSON array.
pub(super) fn list_containers(instance: &Object) -> Result<GatewayResponse, GatewayError> {
    let names = instance.ls()?;
    GatewayResponse::json(200, &names)
}

/// `POST /containers/create`: spawns a container from the creation spec
/// in the body and answers with its id.
///
/// Invalid UTF-8 is replaced rather than rejected; the backend decides
/// whether the resulting spec is usable.
pub(super) fn create_container(
    instance: &Object,
    body: &[u8],
) -> Result<GatewayResponse, GatewayError> {
    let spec = String::from_utf8_lossy(body);
    let container = instance.spawn(&spec)?;
    let description = container.get()?;
    let ContainerId { id } = serde_json::from_str(&description)
        .map_err(|_| GatewayError::MalformedDescription(description.clone()))?;
    GatewayResponse::json(201, &ContainerId { id })
}

/// `POST /containers/{name}/start`.
pub(super) fn start_container(
    instance: &Object,
    name: Option<&str>,
) -> Result<GatewayResponse, GatewayError> {
    let name = name.ok_or(GatewayError::MissingParameter("name"))?;
    instance.child(name)?.start()?;
    Ok(GatewayResponse::empty(204))
}

/// `POST /containers/{name}/stop`.
pub(super) fn stop_container(
    instance: &Object,
    name: Option<&str>,
) -> Result<GatewayResponse, GatewayError> {
    let name = name.ok_or(GatewayError::MissingParameter("name"))?;
    instance.child(name)?.stop()?;
    Ok(GatewayResponse::empty(204))
}
