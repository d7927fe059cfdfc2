//! TLS transport (used for `https://` branches), layered over a
//! [`crate::tcp::TcpTransport`].
//!
//! Any TLS >= 1.0 is acceptable per §4.1; in practice `rustls` only
//! speaks TLS 1.2/1.3, which is a strict superset of what any SVN
//! server still in service requires.

use std::sync::{Arc, OnceLock};

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};

use crate::error::TransportError;
use crate::tcp::{read_retrying, write_all_retrying, TcpTransport};
use crate::traits::Transport;

fn client_config() -> Arc<ClientConfig> {
    static CONFIG: OnceLock<Arc<ClientConfig>> = OnceLock::new();
    CONFIG
        .get_or_init(|| {
            let mut roots = RootCertStore::empty();
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            let config = ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            Arc::new(config)
        })
        .clone()
}

/// A TLS-wrapped TCP connection.
pub struct TlsTransport {
    stream: StreamOwned<ClientConnection, std::net::TcpStream>,
}

impl TlsTransport {
    pub fn wrap(tcp: TcpTransport, server_name: &str) -> Result<Self, TransportError> {
        let name = ServerName::try_from(server_name.to_string())
            .map_err(|_| TransportError::InvalidServerName(server_name.to_string()))?;
        let conn = ClientConnection::new(client_config(), name).map_err(TransportError::Tls)?;
        let stream = StreamOwned::new(conn, tcp.into_inner());
        Ok(Self { stream })
    }
}

impl Transport for TlsTransport {
    fn send(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        write_all_retrying(&mut self.stream, buf)
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        read_retrying(&mut self.stream, buf)
    }

    fn close(&mut self) {
        let _ = self.stream.sock.shutdown(std::net::Shutdown::Both);
    }
}
