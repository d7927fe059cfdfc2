//! Crate-wide error type (§7).

use std::path::PathBuf;

use svnup_protocol::ProtocolError;
use svnup_transport::TransportError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("server reported failure for {branch:?} at r{revision}: {detail}")]
    ServerFailure {
        branch: String,
        revision: u64,
        detail: String,
    },

    #[error("{branch:?} is not a directory at r{revision}")]
    NotADirectory { branch: String, revision: u64 },

    #[error("MD5 checksum mismatch for {path}: should be {expected}, calculated {actual}")]
    ChecksumMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("corrupt manifest line in {path}: {line:?}")]
    CorruptManifest { path: PathBuf, line: String },

    #[error("no revision info at {0}")]
    NoRevisionInfo(PathBuf),

    #[error("unsupported URL scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid URL {0:?}")]
    InvalidUrl(String),

    #[error("checkout requires a URL")]
    MissingUrl,
}

pub type Result<T> = std::result::Result<T, Error>;
