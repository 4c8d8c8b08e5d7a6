//! REST gateway reproducing the container-engine API surface.
//!
//! [`Gateway::handle`] resolves a request against the [`RouteTable`], runs
//! the matching handler against the shared instance [`Object`] and turns
//! failures into responses according to the configured [`ErrorPolicy`].

mod errors;
mod handlers;
mod router;

use flotilla_beam::Object;
use flotilla_config::ErrorPolicy;
use serde::Serialize;
use tracing::{info, warn};

pub use self::errors::GatewayError;
pub use self::router::{
    API_VERSION, HttpMethod, Resolution, Route, RouteEntry, RouteMatch, RouteTable,
};

const GATEWAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::gateway");

/// Content type attached to JSON bodies.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type attached to plain-text bodies.
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// An inbound HTTP request reduced to what the gateway routes on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    /// Request method as received.
    pub method: String,
    /// Request target, possibly with a query string.
    pub target: String,
    /// Raw request body.
    pub body: Vec<u8>,
}

impl GatewayRequest {
    /// Builds a request without a body.
    #[must_use]
    pub fn new(method: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            target: target.into(),
            body: Vec::new(),
        }
    }

    /// Attaches a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// The response the listener writes back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
    /// `Content-Type` header, absent for empty bodies.
    pub content_type: Option<&'static str>,
}

impl GatewayResponse {
    /// A response with no body.
    #[must_use]
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            body: Vec::new(),
            content_type: None,
        }
    }

    /// A plain-text response.
    #[must_use]
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into().into_bytes(),
            content_type: Some(TEXT_CONTENT_TYPE),
        }
    }

    /// A JSON response.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Serialize`] when `value` cannot be encoded.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> Result<Self, GatewayError> {
        Ok(Self {
            status,
            body: serde_json::to_vec(value)?,
            content_type: Some(JSON_CONTENT_TYPE),
        })
    }

    /// A JSON `{"message": ..}` body.
    #[must_use]
    pub fn message(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "message": message }).to_string().into_bytes(),
            content_type: Some(JSON_CONTENT_TYPE),
        }
    }

    /// Body as UTF-8 text, lossily.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Routes REST requests onto a backend instance.
#[derive(Debug, Clone)]
pub struct Gateway {
    instance: Object,
    policy: ErrorPolicy,
    routes: RouteTable,
}

impl Gateway {
    /// Builds a gateway serving `instance`.
    #[must_use]
    pub fn new(instance: Object, policy: ErrorPolicy) -> Self {
        Self {
            instance,
            policy,
            routes: RouteTable::new(),
        }
    }

    /// Serves one request.
    #[must_use]
    pub fn handle(&self, request: &GatewayRequest) -> GatewayResponse {
        let matched = match self.routes.resolve(&request.method, &request.target) {
            Resolution::Matched(matched) => matched,
            Resolution::MethodNotAllowed => {
                return GatewayResponse::message(405, "method not allowed");
            }
            Resolution::NotFound => return GatewayResponse::message(404, "page not found"),
        };

        let route = matched.entry().pattern();
        info!(
            target: GATEWAY_TARGET,
            method = %request.method,
            route,
            version = matched.version().unwrap_or(API_VERSION),
            "Calling {} {}",
            request.method,
            route
        );

        match self.run(matched, &request.body) {
            Ok(response) => response,
            Err(error) => self.failure(&request.method, route, &error),
        }
    }

    fn run(&self, matched: RouteMatch<'_>, body: &[u8]) -> Result<GatewayResponse, GatewayError> {
        match matched.route() {
            Route::Ping => Ok(handlers::ping()),
            Route::ListContainers => handlers::list_containers(&self.instance),
            Route::CreateContainer => handlers::create_container(&self.instance, body),
            Route::StartContainer => handlers::start_container(&self.instance, matched.name()),
            Route::StopContainer => handlers::stop_container(&self.instance, matched.name()),
        }
    }

    fn failure(&self, method: &str, route: &str, error: &GatewayError) -> GatewayResponse {
        warn!(
            target: GATEWAY_TARGET,
            method,
            route,
            status = error.status_code(),
            error = %error,
            "request failed"
        );
        if self.policy.hides_failures() {
            GatewayResponse::empty(200)
        } else {
            GatewayResponse::message(error.status_code(), &error.to_string())
        }
    }
}
