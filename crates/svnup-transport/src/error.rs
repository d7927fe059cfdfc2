//! Transport-layer error type.

use std::io;

/// Errors raised while opening or using a [`crate::Transport`].
///
/// These are all transient by nature (§7 "Transport errors"): the
/// caller decides whether to retry, not this crate.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("dns resolution failed for {host}: {source}")]
    Resolve { host: String, source: io::Error },

    #[error("no addresses found for {host} (family preference excluded all candidates)")]
    NoAddress { host: String },

    #[error("connect failed: {0}")]
    Connect(#[source] io::Error),

    #[error("socket option failed: {0}")]
    SockOpt(#[source] io::Error),

    #[error("tls handshake failed: {0}")]
    Tls(#[source] rustls::Error),

    #[error("invalid server name {0:?} for tls")]
    InvalidServerName(String),

    #[error("read failed: {0}")]
    Read(#[source] io::Error),

    #[error("write failed: {0}")]
    Write(#[source] io::Error),

    #[error("connection closed by peer")]
    Closed,
}
