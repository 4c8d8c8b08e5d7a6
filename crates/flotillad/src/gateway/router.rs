//! Route table for the container-engine compatible REST surface.
//!
//! Every route is registered twice: once under a `/v{version}` prefix and
//! once bare. The version segment must look like a dotted number but does
//! not otherwise change behaviour.

use std::fmt;

/// Engine API version this gateway reproduces.
pub const API_VERSION: &str = "0.11.0";

const VERSION_PARAM: &str = "version";
const NAME_PARAM: &str = "name";

/// HTTP methods served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
}

impl HttpMethod {
    /// Parses a request method, case-sensitively as HTTP requires.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    /// Canonical method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Operations reachable through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    /// Liveness probe.
    Ping,
    /// List container names.
    ListContainers,
    /// Create a container from the request body.
    CreateContainer,
    /// Start the named container.
    StartContainer,
    /// Stop the named container.
    StopContainer,
}

const ROUTES: [(HttpMethod, &str, Route); 5] = [
    (HttpMethod::Get, "/_ping", Route::Ping),
    (HttpMethod::Get, "/containers/json", Route::ListContainers),
    (HttpMethod::Post, "/containers/create", Route::CreateContainer),
    (HttpMethod::Post, "/containers/{name}/start", Route::StartContainer),
    (HttpMethod::Post, "/containers/{name}/stop", Route::StopContainer),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { prefix: String, name: String },
}

impl Segment {
    fn parse(text: &str) -> Self {
        match text.split_once('{') {
            Some((prefix, rest)) if rest.ends_with('}') => Self::Param {
                prefix: prefix.to_owned(),
                name: rest.trim_end_matches('}').to_owned(),
            },
            _ => Self::Literal(text.to_owned()),
        }
    }

    fn capture<'a>(&self, text: &'a str) -> Option<Option<(&str, &'a str)>> {
        match self {
            Self::Literal(literal) => (literal == text).then_some(None),
            Self::Param { prefix, name } => {
                let value = text.strip_prefix(prefix.as_str())?;
                let valid = match name.as_str() {
                    VERSION_PARAM => is_version(value),
                    _ => !value.is_empty(),
                };
                valid.then_some(Some((name.as_str(), value)))
            }
        }
    }
}

fn is_version(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit() || ch == '.')
}

/// One registered `(method, pattern, route)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    method: HttpMethod,
    pattern: String,
    route: Route,
    segments: Vec<Segment>,
}

impl RouteEntry {
    fn new(method: HttpMethod, pattern: String, route: Route) -> Self {
        let segments = split_path(&pattern)
            .into_iter()
            .flatten()
            .map(Segment::parse)
            .collect();
        Self {
            method,
            pattern,
            route,
            segments,
        }
    }

    /// Method this entry answers.
    #[must_use]
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path pattern, e.g. `/v{version}/containers/{name}/start`.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Operation the entry routes to.
    #[must_use]
    pub fn route(&self) -> Route {
        self.route
    }

    fn matches<'a>(&'a self, path: &[&'a str]) -> Option<RouteMatch<'a>> {
        if path.len() != self.segments.len() {
            return None;
        }
        let mut matched = RouteMatch {
            entry: self,
            version: None,
            name: None,
        };
        for (segment, text) in self.segments.iter().zip(path.iter().copied()) {
            match segment.capture(text)? {
                Some((VERSION_PARAM, value)) => matched.version = Some(value),
                Some((NAME_PARAM, value)) => matched.name = Some(value),
                Some(_) | None => {}
            }
        }
        Some(matched)
    }
}

/// A resolved request: the entry plus its captured parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    entry: &'a RouteEntry,
    version: Option<&'a str>,
    name: Option<&'a str>,
}

impl<'a> RouteMatch<'a> {
    /// The matched entry.
    #[must_use]
    pub fn entry(&self) -> &'a RouteEntry {
        self.entry
    }

    /// Operation to run.
    #[must_use]
    pub fn route(&self) -> Route {
        self.entry.route
    }

    /// Requested API version, when the path was version-prefixed.
    #[must_use]
    pub fn version(&self) -> Option<&'a str> {
        self.version
    }

    /// The `{name}` path parameter.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.name
    }
}

/// Outcome of resolving a request against the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// A route answers the method and path.
    Matched(RouteMatch<'a>),
    /// The path exists but not for this method.
    MethodNotAllowed,
    /// No route has this path.
    NotFound,
}

/// The gateway's full route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTable {
    /// Builds the table with a versioned and a bare entry per route.
    #[must_use]
    pub fn new() -> Self {
        let entries = ROUTES
            .iter()
            .flat_map(|&(method, path, route)| {
                [
                    RouteEntry::new(method, format!("/v{{{VERSION_PARAM}}}{path}"), route),
                    RouteEntry::new(method, path.to_owned(), route),
                ]
            })
            .collect();
        Self { entries }
    }

    /// Registered entries, versioned before bare for each route.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Resolves a request line. Any query string is ignored.
    ///
    /// A path with an empty segment, such as a trailing slash or `//`,
    /// matches nothing.
    #[must_use]
    pub fn resolve<'a>(&'a self, method: &str, target: &'a str) -> Resolution<'a> {
        let path = target.split_once('?').map_or(target, |(path, _)| path);
        let Some(segments) = split_path(path) else {
            return Resolution::NotFound;
        };
        let method = HttpMethod::parse(method);

        let mut path_known = false;
        for entry in &self.entries {
            if let Some(matched) = entry.matches(&segments) {
                if Some(entry.method) == method {
                    return Resolution::Matched(matched);
                }
                path_known = true;
            }
        }
        if path_known {
            Resolution::MethodNotAllowed
        } else {
            Resolution::NotFound
        }
    }
}

fn split_path(path: &str) -> Option<Vec<&str>> {
    let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
    segments
        .iter()
        .all(|segment| !segment.is_empty())
        .then_some(segments)
}
