//! Minimal, non-validating XML scanning for SVN-over-WebDAV responses.
//!
//! The `update-report`/`log-report`/`PROPFIND` bodies svnup consumes use
//! a small, fixed vocabulary of elements, so a full XML parser is more
//! machinery than the job needs; these helpers scan byte-for-byte for
//! the handful of tags svnup cares about (§4.3).

/// One scanned element: its tag name, its attributes in source order,
/// and (for non-self-closing tags) the raw text between the open and
/// close tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element<'a> {
    pub tag: &'a str,
    pub attrs: Vec<(&'a str, String)>,
    pub text: &'a str,
}

impl<'a> Element<'a> {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Returns the text between the first `<tag ...>` and matching
/// `</tag>` in `haystack`, ignoring any namespace prefix on the tag
/// (`S:log-report` matches a search for `log-report`).
pub fn extract_tag_text<'a>(haystack: &'a str, tag: &str) -> Option<&'a str> {
    let open_pos = find_open_tag(haystack, tag, 0)?;
    let gt = haystack[open_pos..].find('>')? + open_pos;
    if haystack.as_bytes()[gt - 1] == b'/' {
        return Some("");
    }
    let body_start = gt + 1;
    let close = format!("</{tag}>");
    let close_pos = find_with_optional_prefix(&haystack[body_start..], &close)?;
    Some(&haystack[body_start..body_start + close_pos])
}

/// Scans forward from `start`, returning the next element named `tag`
/// (ignoring its namespace prefix) along with the byte offset just
/// past it, or `None` if no further occurrence exists. Self-closing
/// tags (`<S:add-file .../>`) yield an empty `text`.
pub fn next_element<'a>(haystack: &'a str, tag: &'a str, start: usize) -> Option<(Element<'a>, usize)> {
    let open_pos = find_open_tag(haystack, tag, start)?;
    let gt = haystack[open_pos..].find('>')? + open_pos;
    let tag_src = &haystack[open_pos + 1..gt];
    let self_closing = tag_src.trim_end().ends_with('/');
    let attr_src = if self_closing {
        tag_src[..tag_src.rfind('/').unwrap()].trim()
    } else {
        tag_src
    };
    let attrs = parse_attrs(attr_src);

    if self_closing {
        return Some((
            Element { tag, attrs, text: "" },
            gt + 1,
        ));
    }

    let body_start = gt + 1;
    let close = format!("</{tag}>");
    let close_rel = find_with_optional_prefix(&haystack[body_start..], &close)?;
    let body_end = body_start + close_rel;
    let after = body_start + close_rel + close_len(&haystack[body_start + close_rel..]);
    Some((
        Element {
            tag,
            attrs,
            text: &haystack[body_start..body_end],
        },
        after,
    ))
}

/// Extracts `m:human-readable` text from an HTTP error response body,
/// used to surface the server's explanation for a non-2xx status (§7).
pub fn extract_human_readable(body: &str) -> Option<&str> {
    extract_tag_text(body, "human-readable")
}

fn find_open_tag(haystack: &str, tag: &str, start: usize) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let needle_bare = format!("<{tag}");
    let mut i = start;
    while let Some(rel) = haystack[i..].find(&needle_bare) {
        let pos = i + rel;
        let after = pos + needle_bare.len();
        // Require a tag boundary (whitespace, '>', or '/') right after
        // the match so `<S:add-file` isn't matched when searching for
        // `file`... but also accept a namespace-prefixed match where
        // `tag` itself is the full local name following ':'.
        if after <= bytes.len() {
            let boundary_ok = bytes
                .get(after)
                .map(|&b| b == b' ' || b == b'>' || b == b'/' || b == b'\t' || b == b'\n')
                .unwrap_or(false);
            let prefix_ok = pos == 0
                || !matches!(bytes[pos - 1], b':' | b'a'..=b'z' | b'A'..=b'Z');
            if boundary_ok && prefix_ok {
                return Some(pos);
            }
        }
        i = pos + 1;
    }
    // Retry allowing a namespace prefix directly before `tag`, e.g. `S:tag`.
    let needle_prefixed = format!(":{tag}");
    let mut i = start;
    while let Some(rel) = haystack[i..].find(&needle_prefixed) {
        let pos = i + rel;
        if pos > 0 && haystack.as_bytes()[pos - 1] == b'<' {
            i = pos + 1;
            continue;
        }
        let lt = haystack[..pos].rfind('<')?;
        let after = pos + needle_prefixed.len();
        let boundary_ok = bytes
            .get(after)
            .map(|&b| b == b' ' || b == b'>' || b == b'/' || b == b'\t' || b == b'\n')
            .unwrap_or(false);
        if boundary_ok {
            return Some(lt);
        }
        i = pos + 1;
    }
    None
}

fn find_with_optional_prefix(haystack: &str, close_bare: &str) -> Option<usize> {
    if let Some(pos) = haystack.find(close_bare) {
        return Some(pos);
    }
    // `close_bare` is `</tag>`; also look for `</S:tag>`.
    let tag = &close_bare[2..close_bare.len() - 1];
    let mut i = 0;
    while let Some(rel) = haystack[i..].find(&format!(":{tag}>")) {
        let pos = i + rel;
        if let Some(lt) = haystack[..pos].rfind("</") {
            if lt + 2 <= pos {
                return Some(lt);
            }
        }
        i = pos + 1;
    }
    None
}

fn close_len(s: &str) -> usize {
    s.find('>').map(|p| p + 1).unwrap_or(0)
}

fn parse_attrs(src: &str) -> Vec<(&str, String)> {
    let mut attrs = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i == name_start {
            break;
        }
        let name = &src[name_start..i];
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || bytes[i] != b'=' {
            continue;
        }
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() || (bytes[i] != b'"' && bytes[i] != b'\'') {
            continue;
        }
        let quote = bytes[i];
        i += 1;
        let val_start = i;
        while i < bytes.len() && bytes[i] != quote {
            i += 1;
        }
        let value = unescape_entities(&src[val_start..i]);
        attrs.push((name, value));
        i += 1;
    }
    attrs
}

fn unescape_entities(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_tag_text_with_namespace_prefix() {
        let xml = "<S:log-report><S:author>alice</S:author></S:log-report>";
        assert_eq!(extract_tag_text(xml, "author"), Some("alice"));
    }

    #[test]
    fn scans_repeated_flat_elements() {
        let xml = r#"<S:add-directory name="sub"/><S:add-file name="sub/file.c" rev="4"/>"#;
        let (dir, next) = next_element(xml, "add-directory", 0).unwrap();
        assert_eq!(dir.attr("name"), Some("sub"));
        assert_eq!(dir.text, "");

        let (file, _) = next_element(xml, "add-file", next).unwrap();
        assert_eq!(file.attr("name"), Some("sub/file.c"));
        assert_eq!(file.attr("rev"), Some("4"));
    }

    #[test]
    fn unescapes_attribute_entities() {
        let xml = r#"<S:add-file name="a &amp; b"/>"#;
        let (el, _) = next_element(xml, "add-file", 0).unwrap();
        assert_eq!(el.attr("name"), Some("a & b"));
    }

    #[test]
    fn extract_human_readable_error_message() {
        let body = r#"<D:error><m:human-readable errcode="160013">File not found</m:human-readable></D:error>"#;
        assert_eq!(extract_human_readable(body), Some("File not found"));
    }
}
