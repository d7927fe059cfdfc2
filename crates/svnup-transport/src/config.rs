//! Connection addressing: host/port/family, and which of the three
//! wire schemes (§GLOSSARY) to speak over the opened socket.

/// Address family preference, honored when resolving `address`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressFamily {
    #[default]
    Unspecified,
    V4,
    V6,
}

/// A remote endpoint: host, port, and the caller's family preference.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
    pub family: AddressFamily,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16, family: AddressFamily) -> Self {
        Self {
            address: address.into(),
            port,
            family,
        }
    }
}

/// The three wire schemes a `svn://`/`http://`/`https://` URL can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Svn,
    Http,
    Https,
}
