//! HTTP exchange with the engine, framed by `ureq`.
//!
//! Every request dials a fresh socket through [`super::transport`] and hands
//! it to a one-shot `ureq` connector, so TCP and Unix engines share one code
//! path and connections are never pooled.

use std::io::{self, Read, Write};
use std::sync::Mutex;

use flotilla_config::EngineAddress;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use socket2::Socket;
use tracing::debug;
use ureq::Agent;
use ureq::unversioned::resolver::DefaultResolver;
use ureq::unversioned::transport::{
    Buffers, ConnectionDetails, Connector, LazyBuffers, NextTimeout, Transport,
};

use super::transport::connect;
use crate::errors::EngineError;

const ENGINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::forward");
const BUFFER_SIZE: usize = 128 * 1024;

/// Response status and body, with framing already removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct EngineResponse {
    pub(super) status: u16,
    pub(super) body: Vec<u8>,
}

#[derive(Deserialize)]
struct EngineMessage {
    message: Option<String>,
}

impl EngineResponse {
    pub(super) fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-success reply into [`EngineError::Status`].
    pub(super) fn success(self) -> Result<Self, EngineError> {
        if self.is_success() {
            return Ok(self);
        }
        let message = serde_json::from_slice::<EngineMessage>(&self.body)
            .ok()
            .and_then(|reply| reply.message)
            .or_else(|| {
                let text = String::from_utf8_lossy(&self.body).trim().to_owned();
                (!text.is_empty()).then_some(text)
            });
        Err(EngineError::status(self.status, message))
    }

    pub(super) fn json<T: DeserializeOwned>(&self) -> Result<T, EngineError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Hands an already dialled socket to `ureq` exactly once.
#[derive(Debug)]
struct HandoffConnector {
    socket: Mutex<Option<Socket>>,
}

impl HandoffConnector {
    const fn new(socket: Socket) -> Self {
        Self {
            socket: Mutex::new(Some(socket)),
        }
    }
}

impl Connector for HandoffConnector {
    type Out = EngineTransport;

    fn connect(
        &self,
        _details: &ConnectionDetails,
        _chained: Option<()>,
    ) -> Result<Option<Self::Out>, ureq::Error> {
        let socket = self
            .socket
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotConnected, "engine socket already used")
            })?;
        Ok(Some(EngineTransport {
            socket,
            buffers: LazyBuffers::new(BUFFER_SIZE, BUFFER_SIZE),
        }))
    }
}

/// Blocking socket plus the buffers `ureq` frames requests into.
///
/// Deadlines come from the socket options set when dialling.
#[derive(Debug)]
struct EngineTransport {
    socket: Socket,
    buffers: LazyBuffers,
}

impl Transport for EngineTransport {
    fn buffers(&mut self) -> &mut dyn Buffers {
        &mut self.buffers
    }

    fn transmit_output(&mut self, amount: usize, _timeout: NextTimeout) -> Result<(), ureq::Error> {
        let output = self.buffers.output().get(..amount).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "output exceeds buffer")
        })?;
        self.socket.write_all(output)?;
        self.socket.flush()?;
        Ok(())
    }

    fn await_input(&mut self, _timeout: NextTimeout) -> Result<bool, ureq::Error> {
        let read = self.socket.read(self.buffers.input_append_buf())?;
        self.buffers.input_appended(read);
        Ok(read > 0)
    }

    fn is_open(&mut self) -> bool {
        false
    }
}

/// Issues one request per connection against an engine address.
#[derive(Debug, Clone)]
pub(super) struct EngineClient {
    address: EngineAddress,
}

impl EngineClient {
    pub(super) const fn new(address: EngineAddress) -> Self {
        Self { address }
    }

    pub(super) const fn address(&self) -> &EngineAddress {
        &self.address
    }

    pub(super) fn get(&self, path: &str) -> Result<EngineResponse, EngineError> {
        self.send("GET", path, None)
    }

    pub(super) fn post(&self, path: &str, body: &str) -> Result<EngineResponse, EngineError> {
        self.send("POST", path, Some(body))
    }

    fn agent(&self) -> Result<Agent, EngineError> {
        let socket = connect(&self.address)?;
        let config = Agent::config_builder()
            .proxy(None)
            .http_status_as_error(false)
            .max_redirects(0)
            .build();
        Ok(Agent::with_parts(
            config,
            HandoffConnector::new(socket),
            DefaultResolver::default(),
        ))
    }

    fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<&str>,
    ) -> Result<EngineResponse, EngineError> {
        let url = format!("http://{}{path}", self.address.host_header());
        let agent = self.agent()?;
        let mut response = match body {
            None => agent.get(&url).header("Connection", "close").call()?,
            Some("") => agent.post(&url).header("Connection", "close").send_empty()?,
            Some(json) => agent
                .post(&url)
                .header("Connection", "close")
                .content_type("application/json")
                .send(json)?,
        };
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec()?;
        debug!(
            target: ENGINE_TARGET,
            method,
            path,
            status,
            "engine replied"
        );
        Ok(EngineResponse { status, body })
    }
}
