use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use thiserror::Error;
use url::Url;

/// Port assumed when a `tcp://` engine address names none.
pub const DEFAULT_ENGINE_PORT: u16 = 2375;

/// Where a container engine accepts HTTP connections.
///
/// Parsed from the `unix://`, `tcp://` and `http://` forms that `DOCKER_HOST`
/// accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineAddress {
    /// Filesystem path of a Unix domain socket.
    Unix {
        /// Absolute socket path.
        path: Utf8PathBuf,
    },
    /// Host name or IP literal plus port.
    Tcp {
        /// Host component, unbracketed for IPv6 literals.
        host: String,
        /// TCP port.
        port: u16,
    },
}

impl EngineAddress {
    /// Unix socket engine at `path`.
    #[must_use]
    pub fn unix(path: impl Into<Utf8PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }

    /// TCP engine at `host:port`.
    #[must_use]
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    /// `Host` header value for requests sent to this engine.
    ///
    /// Unix sockets have no authority, so engines expect `localhost`.
    #[must_use]
    pub fn host_header(&self) -> String {
        match self {
            Self::Unix { .. } => String::from("localhost"),
            Self::Tcp { host, port } if host.contains(':') => format!("[{host}]:{port}"),
            Self::Tcp { host, port } => format!("{host}:{port}"),
        }
    }
}

impl fmt::Display for EngineAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix { path } => write!(f, "unix://{path}"),
            Self::Tcp { host, port } if host.contains(':') => write!(f, "tcp://[{host}]:{port}"),
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
        }
    }
}

impl FromStr for EngineAddress {
    type Err = EngineAddressError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(raw.trim())?;
        let incomplete = |part| EngineAddressError::Incomplete {
            address: raw.to_owned(),
            part,
        };
        match url.scheme() {
            "unix" => match url.path() {
                "" | "/" => Err(incomplete("socket path")),
                path => Ok(Self::unix(path)),
            },
            "tcp" => {
                let host = url.host_str().ok_or_else(|| incomplete("host"))?;
                Ok(Self::tcp(
                    host.trim_matches(['[', ']']),
                    url.port().unwrap_or(DEFAULT_ENGINE_PORT),
                ))
            }
            "http" => {
                let host = url.host_str().ok_or_else(|| incomplete("host"))?;
                let port = url.port_or_known_default().ok_or_else(|| incomplete("port"))?;
                Ok(Self::tcp(host.trim_matches(['[', ']']), port))
            }
            scheme => Err(EngineAddressError::UnsupportedScheme(scheme.to_owned())),
        }
    }
}

/// Reasons an engine address string is rejected.
#[derive(Debug, Error)]
pub enum EngineAddressError {
    /// The scheme is not one the forward backend can dial.
    #[error("unsupported engine scheme '{0}'")]
    UnsupportedScheme(String),
    /// A component the scheme requires is absent.
    #[error("engine address '{address}' has no {part}")]
    Incomplete {
        /// Address as supplied.
        address: String,
        /// Missing component.
        part: &'static str,
    },
    /// The text is not a URL at all.
    #[error(transparent)]
    Url(#[from] url::ParseError),
}
