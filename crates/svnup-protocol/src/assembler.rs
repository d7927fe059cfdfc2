//! Response assembler: reads bytes off a [`svnup_transport::Transport`]
//! until a complete response — one or more "response groups" — has
//! arrived, reconnecting and retransmitting on transient transport
//! failure (§4.2).

use svnup_transport::{Endpoint, Scheme, Transport};

use crate::error::ProtocolError;
use crate::http::{self, HttpResponse};

/// Which wire format the assembler is framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Svn,
    Http,
    Https,
}

impl Protocol {
    fn scheme(self) -> Scheme {
        match self {
            Protocol::Svn => Scheme::Svn,
            Protocol::Http => Scheme::Http,
            Protocol::Https => Scheme::Https,
        }
    }
}

/// Maximum reconnect-and-retransmit attempts before a command is
/// treated as fatal (§4.1/§4.2/§7).
pub const MAX_RETRIES: u32 = 5;

const READ_CHUNK: usize = 4096;

/// Owns the transport and the elastic response buffer, and implements
/// the framing rules for both wire formats.
pub struct Assembler {
    transport: Box<dyn Transport>,
    endpoint: Endpoint,
    protocol: Protocol,
    /// Scratch receive buffer, reused across calls. Indices into it
    /// are plain `usize` offsets recomputed after every growth, which
    /// is the Rust-safe equivalent of the "store offsets, not live
    /// pointers" rule in the original design (§9): a `Vec<u8>` never
    /// exposes a dangling reference across a `resize`/`extend`, but we
    /// still never hold a borrowed slice of `buf` across a mutation.
    buf: Vec<u8>,
    /// Set once an HTTP `OPTIONS` response advertises the
    /// `inline-props` DAV capability (§4.2).
    pub inline_props: bool,
}

impl Assembler {
    pub fn new(transport: Box<dyn Transport>, endpoint: Endpoint, protocol: Protocol) -> Self {
        Self {
            transport,
            endpoint,
            protocol,
            buf: Vec::with_capacity(READ_CHUNK),
            inline_props: false,
        }
    }

    fn reconnect(&mut self) -> Result<(), ProtocolError> {
        self.transport.close();
        self.transport = svnup_transport::connect(&self.endpoint, self.protocol.scheme())?;
        Ok(())
    }

    /// Sends `command` and reads until `response_groups` SVN
    /// s-expression groups have arrived, or (if `expected_bytes > 0`)
    /// until that many bytes have been read — used when the body size
    /// of a batch of file fetches is already known (§4.2).
    pub fn command_svn(
        &mut self,
        command: &[u8],
        response_groups: u32,
        expected_bytes: usize,
    ) -> Result<Vec<u8>, ProtocolError> {
        debug_assert_eq!(self.protocol, Protocol::Svn);
        let mut attempt = 0;
        loop {
            match self.try_command_svn(command, response_groups, expected_bytes) {
                Ok(buf) => return Ok(buf),
                Err(ProtocolError::Transport(e)) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(ProtocolError::RetriesExhausted(MAX_RETRIES));
                    }
                    log::warn!("svn stream error ({e}), retry #{attempt}");
                    self.reconnect()?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_command_svn(
        &mut self,
        command: &[u8],
        response_groups: u32,
        expected_bytes: usize,
    ) -> Result<Vec<u8>, ProtocolError> {
        self.transport.send(command)?;
        self.buf.clear();
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            let n = self.transport.recv(&mut chunk)?;
            if n == 0 {
                return Err(ProtocolError::Transport(
                    svnup_transport::TransportError::Closed,
                ));
            }
            self.buf.extend_from_slice(&chunk[..n]);
            log::trace!("<< {} bytes", n);

            if expected_bytes > 0 {
                if self.buf.len() >= expected_bytes {
                    return Ok(std::mem::take(&mut self.buf));
                }
                continue;
            }

            if scan_groups(&self.buf)? >= response_groups as usize {
                return Ok(std::mem::take(&mut self.buf));
            }
        }
    }

    /// Sends one HTTP request and reads exactly one response,
    /// dechunking the body in place if needed.
    pub fn command_http(&mut self, request: &[u8]) -> Result<HttpResponse, ProtocolError> {
        let responses = self.command_http_batch(request, 1)?;
        Ok(responses.into_iter().next().expect("count == 1"))
    }

    /// Sends a single wire buffer containing `count` pipelined HTTP
    /// requests and reads back `count` responses in order (§4.7).
    pub fn command_http_batch(
        &mut self,
        requests: &[u8],
        count: usize,
    ) -> Result<Vec<HttpResponse>, ProtocolError> {
        debug_assert!(matches!(self.protocol, Protocol::Http | Protocol::Https));
        let mut attempt = 0;
        loop {
            match self.try_command_http_batch(requests, count) {
                Ok(v) => return Ok(v),
                Err(ProtocolError::Transport(e)) => {
                    attempt += 1;
                    if attempt > MAX_RETRIES {
                        return Err(ProtocolError::RetriesExhausted(MAX_RETRIES));
                    }
                    log::warn!("http stream error ({e}), retry #{attempt}");
                    self.reconnect()?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn try_command_http_batch(
        &mut self,
        requests: &[u8],
        count: usize,
    ) -> Result<Vec<HttpResponse>, ProtocolError> {
        self.transport.send(requests)?;
        self.buf.clear();
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let response = http::read_one_response(&mut *self.transport, &mut self.buf)?;
            if http::has_inline_props(&response.headers) {
                self.inline_props = true;
            }
            out.push(response);
        }
        Ok(out)
    }
}

/// Scans `buf` from the start, counting complete top-level
/// parenthesized groups. A `(` immediately followed by `<digits>:`
/// (after at most one space) introduces an opaque, size-prefixed
/// literal whose bytes are skipped verbatim — they may contain
/// unbalanced `(`/`)` (a commit message is the classic case) and must
/// not perturb the depth count (§4.2).
///
/// If a literal's length prefix is seen but its payload is not yet
/// fully buffered, scanning stops and returns the groups found so
/// far; the caller re-scans the same buffer (now including more
/// bytes) from scratch on the next read.
pub fn scan_groups(buf: &[u8]) -> Result<usize, ProtocolError> {
    let len = buf.len();
    let mut i = 0;
    let mut depth: i64 = 0;
    let mut groups = 0usize;

    while i < len {
        match buf[i] {
            b'(' => {
                depth += 1;
                i += 1;

                let mut j = i;
                if j < len && buf[j] == b' ' {
                    j += 1;
                }
                let digits_start = j;
                let mut k = j;
                while k < len && buf[k].is_ascii_digit() {
                    k += 1;
                }
                if k > digits_start && k < len && buf[k] == b':' {
                    let n: usize = std::str::from_utf8(&buf[digits_start..k])
                        .ok()
                        .and_then(|s| s.parse().ok())
                        .ok_or_else(|| {
                            ProtocolError::MalformedSexpr("bad opaque length prefix".into())
                        })?;
                    let data_start = k + 1;
                    let data_end = data_start + n;
                    if data_end > len {
                        // Literal not fully buffered yet; stop here.
                        return Ok(groups);
                    }
                    i = data_end;
                }
            }
            b')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ProtocolError::MalformedSexpr("unbalanced parens".into()));
                }
                i += 1;
                if depth == 0 {
                    groups += 1;
                }
            }
            _ => i += 1,
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_simple_groups() {
        let buf = b"( success ( 0: ) ) ( success ( dir ) )";
        assert_eq!(scan_groups(buf).unwrap(), 2);
    }

    #[test]
    fn skips_opaque_literal_with_unbalanced_parens() {
        // A commit message containing stray parens must not desync the count.
        let buf = b"( success ( 10:(((((((((( 1 ) )";
        assert_eq!(scan_groups(buf).unwrap(), 1);
    }

    #[test]
    fn partial_literal_defers_group_count() {
        let buf = b"( success ( 100:short";
        assert_eq!(scan_groups(buf).unwrap(), 0);
    }

    #[test]
    fn rejects_unbalanced_close() {
        let buf = b")";
        assert!(scan_groups(buf).is_err());
    }
}
