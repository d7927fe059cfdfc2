//! Exercises the HTTP response framing against captured-shape wire
//! fixtures using an in-memory transport, with no real socket.

use std::collections::VecDeque;

use svnup_transport::{Transport, TransportError};

struct ScriptedTransport {
    reads: VecDeque<Vec<u8>>,
    sent: Vec<u8>,
}

impl ScriptedTransport {
    fn new(chunks: Vec<&[u8]>) -> Self {
        Self {
            reads: chunks.into_iter().map(|c| c.to_vec()).collect(),
            sent: Vec::new(),
        }
    }
}

impl Transport for ScriptedTransport {
    fn send(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        self.sent.extend_from_slice(buf);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let Some(chunk) = self.reads.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        Ok(n)
    }

    fn close(&mut self) {}
}

#[test]
fn reads_a_content_length_response_delivered_in_pieces() {
    let mut transport = ScriptedTransport::new(vec![
        b"HTTP/1.1 200 OK\r\nContent-Le",
        b"ngth: 5\r\n\r\nhel",
        b"lo",
    ]);
    let mut buf = Vec::new();
    let response = svnup_protocol::http::read_one_response(&mut transport, &mut buf).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"hello");
    assert!(buf.is_empty());
}

#[test]
fn dechunks_a_transfer_encoded_body() {
    let mut transport = ScriptedTransport::new(vec![
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n\
          5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n",
    ]);
    let mut buf = Vec::new();
    let response = svnup_protocol::http::read_one_response(&mut transport, &mut buf).unwrap();
    assert_eq!(response.body, b"hello world");
}

#[test]
fn leaves_a_pipelined_second_response_for_the_next_call() {
    let mut transport = ScriptedTransport::new(vec![
        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nokHTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nhi",
    ]);
    let mut buf = Vec::new();
    let first = svnup_protocol::http::read_one_response(&mut transport, &mut buf).unwrap();
    assert_eq!(first.body, b"ok");
    let second = svnup_protocol::http::read_one_response(&mut transport, &mut buf).unwrap();
    assert_eq!(second.body, b"hi");
}

#[test]
fn svn_assembler_drives_a_full_command_round_trip() {
    let transport = ScriptedTransport::new(vec![b"( success ( 42 ) )"]);
    let mut assembler =
        svnup_protocol::Assembler::new(Box::new(transport), test_endpoint(), svnup_protocol::Protocol::Svn);
    let buf = assembler.command_svn(b"( get-latest-rev ( ) )", 1, 0).unwrap();
    assert_eq!(buf, b"( success ( 42 ) )");
}

fn test_endpoint() -> svnup_transport::Endpoint {
    svnup_transport::Endpoint::new("example.org", 3690, svnup_transport::AddressFamily::Unspecified)
}
