//! Protocol-layer error type.

use svnup_transport::TransportError;

/// Errors raised while framing or decoding a wire response.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("server returned status {status}: {detail}")]
    HttpStatus { status: u16, detail: String },

    #[error("malformed chunked transfer-encoding: {0}")]
    MalformedChunk(String),

    #[error("malformed s-expression response: {0}")]
    MalformedSexpr(String),

    #[error("exhausted {0} reconnect attempts")]
    RetriesExhausted(u32),
}
