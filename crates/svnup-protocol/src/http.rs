//! SVN-over-WebDAV request builders and response framing (§4.2/§4.3).

use svnup_transport::Transport;

use crate::error::ProtocolError;

const READ_CHUNK: usize = 4096;
/// Buffer growth factor for HTTP framing (§4.2).
const GROWTH_FACTOR: f64 = 1.5;

/// One complete HTTP response: status code, headers in wire order,
/// and a fully assembled (dechunked, if applicable) body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// `true` once a server's `DAV:` header lists the `inline-props`
/// capability (§4.2), which removes the need for a PROPFIND pass.
pub fn has_inline_props(headers: &[(String, String)]) -> bool {
    headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("DAV")
            && v.contains("http://subversion.tigris.org/xmlns/dav/svn/inline-props")
    })
}

/// Reads and parses exactly one HTTP response off `transport`,
/// growing `buf` (by ×1.5) as needed and leaving any bytes belonging
/// to a subsequent pipelined response in `buf` for the next call.
pub fn read_one_response(
    transport: &mut dyn Transport,
    buf: &mut Vec<u8>,
) -> Result<HttpResponse, ProtocolError> {
    let header_end = find_header_end(buf, transport)?;
    let (status, headers) = parse_status_and_headers(&buf[..header_end])?;

    let body_start = header_end;
    let transfer_encoding = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("Transfer-Encoding"))
        .map(|(_, v)| v.to_ascii_lowercase());

    let (body, consumed_to) = if transfer_encoding.as_deref() == Some("chunked") {
        dechunk(buf, body_start, transport)?
    } else {
        let content_length: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
            .and_then(|(_, v)| v.trim().parse().ok())
            .unwrap_or(0);
        ensure_buffered(buf, body_start + content_length, transport)?;
        (
            buf[body_start..body_start + content_length].to_vec(),
            body_start + content_length,
        )
    };

    buf.drain(..consumed_to);

    Ok(HttpResponse {
        status,
        headers,
        body,
    })
}

/// Grows `buf` by reading from `transport` until it holds at least
/// `target` bytes.
fn ensure_buffered(
    buf: &mut Vec<u8>,
    target: usize,
    transport: &mut dyn Transport,
) -> Result<(), ProtocolError> {
    while buf.len() < target {
        let want = ((buf.len() as f64 * GROWTH_FACTOR) as usize)
            .max(buf.len() + READ_CHUNK)
            .max(target);
        let mut chunk = vec![0u8; (want - buf.len()).min(READ_CHUNK).max(1)];
        let n = transport.recv(&mut chunk)?;
        if n == 0 {
            return Err(ProtocolError::Transport(
                svnup_transport::TransportError::Closed,
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    Ok(())
}

fn find_header_end(
    buf: &mut Vec<u8>,
    transport: &mut dyn Transport,
) -> Result<usize, ProtocolError> {
    loop {
        if let Some(pos) = find_subslice(buf, b"\r\n\r\n") {
            return Ok(pos + 4);
        }
        let mut chunk = [0u8; READ_CHUNK];
        let n = transport.recv(&mut chunk)?;
        if n == 0 {
            return Err(ProtocolError::Transport(
                svnup_transport::TransportError::Closed,
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn parse_status_and_headers(
    head: &[u8],
) -> Result<(u16, Vec<(String, String)>), ProtocolError> {
    let text = std::str::from_utf8(head)
        .map_err(|_| ProtocolError::HttpStatus {
            status: 0,
            detail: "non-utf8 response head".into(),
        })?;
    let mut lines = text.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| ProtocolError::HttpStatus {
            status: 0,
            detail: "empty response".into(),
        })?;

    if !status_line.starts_with("HTTP/1.1 ") && !status_line.starts_with("HTTP/1.0 ") {
        return Err(ProtocolError::HttpStatus {
            status: 0,
            detail: format!("not an HTTP status line: {status_line:?}"),
        });
    }
    let status: u16 = status_line
        .get(9..12)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| ProtocolError::HttpStatus {
            status: 0,
            detail: format!("unparsable status line: {status_line:?}"),
        })?;

    let mut headers = Vec::new();
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    Ok((status, headers))
}

/// Reads and removes chunked transfer-encoding framing starting at
/// `start`, returning the concatenated chunk payloads and the offset
/// one past the terminating `0\r\n\r\n` (§4.2).
fn dechunk(
    buf: &mut Vec<u8>,
    start: usize,
    transport: &mut dyn Transport,
) -> Result<(Vec<u8>, usize), ProtocolError> {
    let mut body = Vec::new();
    let mut pos = start;
    loop {
        let line_end = loop {
            if let Some(p) = find_subslice(&buf[pos..], b"\r\n") {
                break pos + p;
            }
            ensure_buffered(buf, buf.len() + 1, transport)?;
        };
        let size_line = std::str::from_utf8(&buf[pos..line_end])
            .map_err(|_| ProtocolError::MalformedChunk("non-utf8 chunk size line".into()))?;
        let size_hex = size_line.split(';').next().unwrap_or("").trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| ProtocolError::MalformedChunk(format!("bad chunk size {size_hex:?}")))?;

        let data_start = line_end + 2;
        if size == 0 {
            // Trailing headers (if any) end with a blank line.
            let term = loop {
                if let Some(p) = find_subslice(&buf[data_start..], b"\r\n\r\n") {
                    break data_start + p + 4;
                }
                ensure_buffered(buf, buf.len() + 1, transport)?;
            };
            return Ok((body, term));
        }

        let data_end = data_start + size;
        ensure_buffered(buf, data_end + 2, transport)?;
        body.extend_from_slice(&buf[data_start..data_end]);
        pos = data_end + 2; // skip the trailing CRLF after chunk data
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Restricted percent-decoder: only valid `%XX` hex escapes are
/// decoded; anything else (a bare `%`, or `%` followed by non-hex) is
/// left untouched rather than rejected (§9).
pub fn percent_decode_hex_only(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = &s[i + 1..i + 3];
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Builds a chunked-body HTTP/1.1 request frame with the fixed header
/// set svnup always sends (§4.3).
pub fn build_request(method: &str, path: &str, host: &str, body: &str) -> Vec<u8> {
    let mut req = format!(
        "{method} {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         User-Agent: svnup-1.0\r\n\
         Content-Type: text/xml\r\n\
         Connection: Keep-Alive\r\n\
         DAV: http://subversion.tigris.org/xmlns/dav/1\r\n\
         DAV: http://subversion.tigris.org/xmlns/dav/svn/depth\r\n\
         DAV: http://subversion.tigris.org/xmlns/dav/svn/mergeinfo\r\n"
    );
    if body.is_empty() {
        req.push_str("Content-Length: 0\r\n\r\n");
    } else {
        req.push_str("Transfer-Encoding: chunked\r\n\r\n");
        req.push_str(&format!("{:x}\r\n{body}\r\n0\r\n\r\n", body.len()));
    }
    req.into_bytes()
}

pub fn build_options(host: &str, branch: &str) -> Vec<u8> {
    build_request("OPTIONS", &format!("/{branch}"), host, "")
}

pub fn build_propfind(host: &str, href: &str) -> Vec<u8> {
    let body = r#"<?xml version="1.0" encoding="utf-8"?>
<propfind xmlns="DAV:"><prop>
  <getcontentlength xmlns="DAV:"/>
  <executable xmlns="http://subversion.tigris.org/xmlns/svn/"/>
  <special xmlns="http://subversion.tigris.org/xmlns/svn/"/>
</prop></propfind>"#;
    let mut req = format!(
        "PROPFIND {href} HTTP/1.1\r\nHost: {host}\r\nDepth: 1\r\nContent-Type: text/xml\r\nTransfer-Encoding: chunked\r\n\r\n"
    );
    req.push_str(&format!("{:x}\r\n{body}\r\n0\r\n\r\n", body.len()));
    req.into_bytes()
}

pub fn build_get(host: &str, href: &str) -> Vec<u8> {
    format!("GET {href} HTTP/1.1\r\nHost: {host}\r\nConnection: Keep-Alive\r\n\r\n").into_bytes()
}

pub fn build_update_report(host: &str, root: &str, revision: u64, include_props: bool) -> Vec<u8> {
    let include = if include_props {
        "<S:include-props>yes</S:include-props>"
    } else {
        ""
    };
    let body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<S:update-report xmlns:S="svn:" send-all="true">
  <S:src-path>/{root}</S:src-path>
  <S:target-revision>{revision}</S:target-revision>
  <S:depth>infinity</S:depth>
  <S:recursive>yes</S:recursive>
  {include}
  <S:entry rev="0"/>
</S:update-report>"#
    );
    build_request("REPORT", &format!("/{root}/!svn/me"), host, &body)
}

pub fn build_log_report(host: &str, rev_root_stub: &str, revision: u64) -> Vec<u8> {
    let body = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<S:log-report xmlns:S="svn:">
  <S:start-revision>{revision}</S:start-revision>
  <S:end-revision>{revision}</S:end-revision>
  <S:discover-changed-paths>no</S:discover-changed-paths>
  <S:revprop>svn:author</S:revprop>
  <S:revprop>svn:date</S:revprop>
  <S:revprop>svn:log</S:revprop>
</S:log-report>"#
    );
    build_request("REPORT", &format!("{rev_root_stub}/{revision}"), host, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_only_valid_hex_escapes() {
        assert_eq!(percent_decode_hex_only("foo%20bar"), "foo bar");
        assert_eq!(percent_decode_hex_only("100%"), "100%");
        assert_eq!(percent_decode_hex_only("a%2gz"), "a%2gz");
    }

    #[test]
    fn parses_status_and_headers() {
        let head = b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nDAV: http://subversion.tigris.org/xmlns/dav/svn/inline-props\r\n\r\n";
        let (status, headers) = parse_status_and_headers(head).unwrap();
        assert_eq!(status, 200);
        assert!(has_inline_props(&headers));
    }
}
