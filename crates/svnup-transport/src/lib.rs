#![forbid(unsafe_code)]
//! Byte-stream transport for svnup.
//!
//! Opens one TCP connection, optionally layering TLS over it, and
//! exposes a small [`Transport`] trait that the protocol layer drives.
//! There is no event loop here: reads and writes are blocking, and
//! reconnect-on-failure is the caller's responsibility (the response
//! assembler owns that policy, see `svnup-protocol`).

pub mod config;
pub mod error;
pub mod tcp;
pub mod tls;
pub mod traits;

pub use config::{AddressFamily, Endpoint, Scheme};
pub use error::TransportError;
pub use traits::Transport;

/// Opens a transport for `endpoint` honoring `scheme` (plain TCP for
/// [`Scheme::Svn`]/[`Scheme::Http`], TLS for [`Scheme::Https`]).
pub fn connect(
    endpoint: &Endpoint,
    scheme: Scheme,
) -> Result<Box<dyn Transport>, TransportError> {
    let stream = tcp::TcpTransport::connect(endpoint)?;
    match scheme {
        Scheme::Svn | Scheme::Http => Ok(Box::new(stream)),
        Scheme::Https => Ok(Box::new(tls::TlsTransport::wrap(stream, &endpoint.address)?)),
    }
}
