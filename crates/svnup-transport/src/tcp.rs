//! Plain TCP transport.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{Socket, TcpKeepalive};

use crate::config::{AddressFamily, Endpoint};
use crate::error::TransportError;
use crate::traits::Transport;

/// 32 KiB send/recv buffers, matching §4.1.
const SOCKET_BUFFER_SIZE: usize = 32 * 1024;

/// A raw, unencrypted TCP connection.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn connect(endpoint: &Endpoint) -> Result<Self, TransportError> {
        let stream = connect_stream(endpoint)?;
        tune_socket(&stream)?;
        Ok(Self { stream })
    }

    /// Used by [`crate::tls::TlsTransport`] to obtain the raw stream
    /// it then wraps in a TLS session.
    pub(crate) fn into_inner(self) -> TcpStream {
        self.stream
    }
}

/// Resolves `endpoint.address` honoring the family preference, and
/// connects to the first candidate that accepts.
fn connect_stream(endpoint: &Endpoint) -> Result<TcpStream, TransportError> {
    let candidates = (endpoint.address.as_str(), endpoint.port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            host: endpoint.address.clone(),
            source,
        })?
        .filter(|addr| family_matches(endpoint.family, addr))
        .collect::<Vec<_>>();

    if candidates.is_empty() {
        return Err(TransportError::NoAddress {
            host: endpoint.address.clone(),
        });
    }

    let mut last_err = None;
    for addr in candidates {
        log::debug!("connecting to {addr}");
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(err),
        }
    }

    Err(TransportError::Connect(last_err.expect(
        "candidates non-empty implies at least one connect attempt",
    )))
}

fn family_matches(family: AddressFamily, addr: &SocketAddr) -> bool {
    match family {
        AddressFamily::Unspecified => true,
        AddressFamily::V4 => addr.is_ipv4(),
        AddressFamily::V6 => addr.is_ipv6(),
    }
}

fn tune_socket(stream: &TcpStream) -> Result<(), TransportError> {
    let socket = Socket::from(stream.try_clone().map_err(TransportError::SockOpt)?);
    socket
        .set_keepalive(true)
        .map_err(TransportError::SockOpt)?;
    socket
        .set_tcp_keepalive(&TcpKeepalive::new().with_time(Duration::from_secs(60)))
        .map_err(TransportError::SockOpt)?;
    socket
        .set_send_buffer_size(SOCKET_BUFFER_SIZE)
        .map_err(TransportError::SockOpt)?;
    socket
        .set_recv_buffer_size(SOCKET_BUFFER_SIZE)
        .map_err(TransportError::SockOpt)?;
    // `socket` wraps a dup'd fd from `try_clone`; dropping it here
    // closes only the dup, leaving `stream`'s fd open.
    Ok(())
}

impl Transport for TcpTransport {
    fn send(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        write_all_retrying(&mut self.stream, buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        read_retrying(&mut self.stream, buf)
    }

    fn close(&mut self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

/// Writes `buf` in full, retrying on `EINTR` the way `svnup.c`'s
/// `send_command` loops on `errno == EINTR`.
pub(crate) fn write_all_retrying<W: Write>(w: &mut W, buf: &[u8]) -> Result<(), TransportError> {
    let mut written = 0;
    while written < buf.len() {
        match w.write(&buf[written..]) {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Write(e)),
        }
    }
    Ok(())
}

pub(crate) fn read_retrying<R: Read>(r: &mut R, buf: &mut [u8]) -> Result<usize, TransportError> {
    loop {
        match r.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(TransportError::Read(e)),
        }
    }
}
