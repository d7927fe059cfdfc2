//! SVN's native s-expression value format.
//!
//! An item is one of an atom (bare word), a signed number, an opaque
//! size-prefixed byte string (`N:<N bytes>`, which may contain raw
//! `(`/`)`), or a parenthesized list of items. This is the decoder
//! half; the encoder half (building the handful of commands svnup
//! issues) lives in [`crate::svn`] next to the commands themselves,
//! since those are simple enough to format directly as the original
//! implementation does.

use crate::error::ProtocolError;

/// A parsed s-expression value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Atom(String),
    Number(i64),
    Opaque(Vec<u8>),
    List(Vec<Item>),
}

impl Item {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            Item::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&[u8]> {
        match self {
            Item::Opaque(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_opaque_str(&self) -> Option<&str> {
        self.as_opaque().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_list(&self) -> Option<&[Item]> {
        match self {
            Item::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A cursor over a byte slice that parses one or more top-level items.
pub struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    fn skip_ws(&mut self) {
        while self.pos < self.buf.len() && self.buf[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    /// Parses exactly one item, which may itself be a list.
    pub fn parse_item(&mut self) -> Result<Item, ProtocolError> {
        self.skip_ws();
        match self.peek() {
            Some(b'(') => self.parse_list(),
            Some(c) if c.is_ascii_digit() => self.parse_number_or_opaque(),
            Some(_) => self.parse_atom(),
            None => Err(ProtocolError::MalformedSexpr("unexpected end of input".into())),
        }
    }

    fn parse_list(&mut self) -> Result<Item, ProtocolError> {
        debug_assert_eq!(self.peek(), Some(b'('));
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    return Ok(Item::List(items));
                }
                Some(_) => items.push(self.parse_item()?),
                None => {
                    return Err(ProtocolError::MalformedSexpr(
                        "unterminated list".into(),
                    ))
                }
            }
        }
    }

    /// A leading digit run is either a plain number (`42`) or the
    /// length prefix of an opaque literal (`4:spam`). Disambiguate by
    /// looking for a trailing `:` directly after the digits.
    fn parse_number_or_opaque(&mut self) -> Result<Item, ProtocolError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }
        let digits = &self.buf[start..self.pos];

        if self.peek() == Some(b':') {
            self.pos += 1;
            let len: usize = std::str::from_utf8(digits)
                .ok()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| ProtocolError::MalformedSexpr("bad opaque length".into()))?;
            let end = self.pos + len;
            if end > self.buf.len() {
                return Err(ProtocolError::MalformedSexpr(
                    "opaque literal runs past end of buffer".into(),
                ));
            }
            let bytes = self.buf[self.pos..end].to_vec();
            self.pos = end;
            Ok(Item::Opaque(bytes))
        } else {
            let text = std::str::from_utf8(digits)
                .map_err(|_| ProtocolError::MalformedSexpr("non-utf8 number".into()))?;
            text.parse::<i64>()
                .map(Item::Number)
                .map_err(|_| ProtocolError::MalformedSexpr(format!("bad number {text:?}")))
        }
    }

    fn parse_atom(&mut self) -> Result<Item, ProtocolError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() || c == b'(' || c == b')' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(ProtocolError::MalformedSexpr(format!(
                "unexpected byte {:?} at offset {start}",
                self.peek().map(|c| c as char)
            )));
        }
        let text = std::str::from_utf8(&self.buf[start..self.pos])
            .map_err(|_| ProtocolError::MalformedSexpr("non-utf8 atom".into()))?
            .to_string();
        Ok(Item::Atom(text))
    }
}

/// Parses a single top-level item out of `buf`, ignoring any trailing bytes.
pub fn parse_one(buf: &[u8]) -> Result<Item, ProtocolError> {
    Parser::new(buf).parse_item()
}

/// Byte length of the first item in `buf`, for callers walking a
/// buffer holding several concatenated top-level items back to back
/// (a batched response).
pub fn item_byte_len(buf: &[u8]) -> usize {
    let mut parser = Parser::new(buf);
    let _ = parser.parse_item();
    parser.position()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_atoms_numbers_and_lists() {
        let item = parse_one(b"( success ( 12345 ) )").unwrap();
        let list = item.as_list().unwrap();
        assert_eq!(list[0].as_atom(), Some("success"));
        let inner = list[1].as_list().unwrap();
        assert_eq!(inner[0], Item::Number(12345));
    }

    #[test]
    fn parses_opaque_literal_with_embedded_parens() {
        let body = b"5:(()) ";
        let item = parse_one(body).unwrap();
        assert_eq!(item.as_opaque(), Some(&b"(())"[..]));
    }

    #[test]
    fn parses_nested_dir_listing() {
        let src = b"( success ( ( 4:name kind 0: ) ) )";
        let item = parse_one(src).unwrap();
        let list = item.as_list().unwrap();
        assert_eq!(list[0].as_atom(), Some("success"));
    }
}
