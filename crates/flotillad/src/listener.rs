//! HTTP listener feeding requests to the gateway.
//!
//! The accept loop polls the server with a short timeout so a shutdown
//! request is noticed promptly. Each request is served on its own thread.

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tiny_http::{Header, Request, Response, Server, StatusCode};
use tracing::{debug, info, warn};

use crate::gateway::{Gateway, GatewayRequest, GatewayResponse};

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::listener");
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Serves one decoded HTTP request.
pub trait RequestHandler: Send + Sync {
    /// Produces the response for `request`.
    fn handle(&self, request: &GatewayRequest) -> GatewayResponse;
}

impl RequestHandler for Gateway {
    fn handle(&self, request: &GatewayRequest) -> GatewayResponse {
        Gateway::handle(self, request)
    }
}

/// Errors raised by the HTTP listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The listen address could not be bound.
    #[error("failed to bind '{address}': {source}")]
    Bind {
        /// Address as configured.
        address: String,
        /// Server error.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    /// The accept loop panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}

/// A bound but not yet serving HTTP listener.
pub struct HttpListener {
    address: String,
    server: Server,
}

impl std::fmt::Debug for HttpListener {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpListener")
            .field("address", &self.address)
            .field("local_addr", &self.local_addr())
            .finish()
    }
}

impl HttpListener {
    /// Binds `address`, e.g. `0.0.0.0:4243`.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bind`] when the socket cannot be bound.
    pub fn bind(address: &str) -> Result<Self, ListenerError> {
        let server = Server::http(address).map_err(|source| ListenerError::Bind {
            address: address.to_owned(),
            source,
        })?;
        Ok(Self {
            address: address.to_owned(),
            server,
        })
    }

    /// Socket address actually bound, useful when the port was `0`.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Starts the accept loop on a background thread.
    #[must_use]
    pub fn start(self, handler: Arc<dyn RequestHandler>) -> ListenerHandle {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::spawn(move || self.accept_loop(&flag, &handler));
        ListenerHandle {
            shutdown,
            handle: Some(handle),
        }
    }

    fn accept_loop(self, shutdown: &AtomicBool, handler: &Arc<dyn RequestHandler>) {
        info!(target: LISTENER_TARGET, address = %self.address, "HTTP listener active");
        while !shutdown.load(Ordering::SeqCst) {
            match self.server.recv_timeout(POLL_INTERVAL) {
                Ok(Some(request)) => {
                    let handler = Arc::clone(handler);
                    thread::spawn(move || serve(request, handler.as_ref()));
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(target: LISTENER_TARGET, error = %error, "failed to receive request");
                }
            }
        }
        info!(target: LISTENER_TARGET, address = %self.address, "HTTP listener stopped");
    }
}

/// Controls a running listener.
#[derive(Debug)]
pub struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop after its current poll.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept loop to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::ThreadPanic`] when the loop panicked.
    pub fn join(mut self) -> Result<(), ListenerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ListenerError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn serve(mut request: Request, handler: &dyn RequestHandler) {
    let method = request.method().to_string();
    let target = request.url().to_owned();
    let mut body = Vec::new();

    let response = match request.as_reader().read_to_end(&mut body) {
        Ok(_) => handler.handle(&GatewayRequest::new(method, target).with_body(body)),
        Err(error) => {
            debug!(target: LISTENER_TARGET, error = %error, "failed to read request body");
            GatewayResponse::message(400, "failed to read request body")
        }
    };

    if let Err(error) = request.respond(into_http(response)) {
        debug!(target: LISTENER_TARGET, error = %error, "client went away before the response");
    }
}

fn into_http(response: GatewayResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut http = Response::from_data(response.body).with_status_code(StatusCode(response.status));
    if let Some(content_type) = response.content_type {
        if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
            http = http.with_header(header);
        }
    }
    http
}
