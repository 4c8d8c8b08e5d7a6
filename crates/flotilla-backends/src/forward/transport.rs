//! Stream sockets to the engine.
//!
//! Both transports go through `socket2` so connect and I/O deadlines are set
//! the same way whether the engine listens on TCP or a Unix socket.

use std::io;
use std::net::ToSocketAddrs;
use std::time::Duration;

use socket2::{Domain, SockAddr, Socket, Type};

use flotilla_config::EngineAddress;

use crate::errors::EngineError;

const DIAL_DEADLINE: Duration = Duration::from_secs(5);
const EXCHANGE_DEADLINE: Duration = Duration::from_secs(60);

/// Opens a blocking stream to `address` with deadlines applied.
///
/// The returned socket implements `Read` and `Write`.
pub(super) fn connect(address: &EngineAddress) -> Result<Socket, EngineError> {
    dial(address).map_err(|source| EngineError::Connect {
        address: address.to_string(),
        source,
    })
}

fn dial(address: &EngineAddress) -> io::Result<Socket> {
    let (domain, target) = socket_target(address)?;
    let socket = Socket::new(domain, Type::STREAM, None)?;
    socket.connect_timeout(&target, DIAL_DEADLINE)?;
    socket.set_read_timeout(Some(EXCHANGE_DEADLINE))?;
    socket.set_write_timeout(Some(EXCHANGE_DEADLINE))?;
    if matches!(address, EngineAddress::Tcp { .. }) {
        socket.set_nodelay(true)?;
    }
    Ok(socket)
}

fn socket_target(address: &EngineAddress) -> io::Result<(Domain, SockAddr)> {
    match address {
        EngineAddress::Tcp { host, port } => {
            let resolved = (host.as_str(), *port)
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::AddrNotAvailable,
                        format!("{host} did not resolve to any address"),
                    )
                })?;
            Ok((Domain::for_address(resolved), SockAddr::from(resolved)))
        }
        EngineAddress::Unix { path } => Ok((unix_domain()?, SockAddr::unix(path.as_str())?)),
    }
}

#[cfg(unix)]
fn unix_domain() -> io::Result<Domain> {
    Ok(Domain::UNIX)
}

#[cfg(not(unix))]
fn unix_domain() -> io::Result<Domain> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are unavailable on this platform",
    ))
}
