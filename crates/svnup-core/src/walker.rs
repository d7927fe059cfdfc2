//! Report walkers: populate a flat [`FileEntry`] vector for a
//! revision, creating local directories as they're discovered (§4.5).

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use svnup_protocol::sexpr::{item_byte_len, parse_one, Item};
use svnup_protocol::{http, svn, xml};

use crate::catalog::Catalog;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::model::FileEntry;

/// SVN command batches are packed up to this many serialized bytes
/// before being flushed as one send (§4.5).
const SVN_BATCH_BYTES: usize = 32 * 1024;

/// Recursive `get-dir` walk starting at the connection's trunk.
pub fn walk_svn(
    conn: &mut ConnectionState,
    revision: u64,
    path_target: &Path,
    catalog: &mut Catalog,
) -> Result<Vec<FileEntry>> {
    let mut entries = Vec::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(conn.trunk.clone());
    fs::create_dir_all(path_target)?;

    while !queue.is_empty() {
        let mut batch_paths = Vec::new();
        let mut batch_cmds = Vec::new();
        let mut batch_size = 0usize;
        while let Some(path) = queue.pop_front() {
            let cmd = svn::get_dir(&path, revision, !conn.inline_props());
            batch_size += cmd.len() + 1;
            batch_paths.push(path);
            batch_cmds.push(cmd);
            if batch_size >= SVN_BATCH_BYTES {
                break;
            }
        }

        let wire = svn::batch(&batch_cmds);
        // Each get-dir produces a success-preamble group plus the
        // listing group itself.
        let buf = conn
            .assembler
            .command_svn(&wire, (batch_paths.len() * 2) as u32, 0)?;
        let listings = split_listing_groups(&buf, batch_paths.len())?;

        for (dir_path, listing) in batch_paths.into_iter().zip(listings) {
            for (name, kind, size) in listing {
                let rel = if dir_path.is_empty() {
                    name.clone()
                } else {
                    format!("{dir_path}/{name}")
                };
                if kind == "dir" {
                    fs::create_dir_all(path_target.join(&rel))?;
                    catalog.local_directories.remove(&rel);
                    queue.push_back(rel);
                } else {
                    let mut entry = FileEntry::new(rel);
                    entry.size = size;
                    entries.push(entry);
                }
            }
        }
    }

    Ok(entries)
}

/// Splits the concatenated response for a batch of `count` `get-dir`
/// calls into per-directory `(name, kind, size)` listings.
fn split_listing_groups(
    buf: &[u8],
    count: usize,
) -> Result<Vec<Vec<(String, String, i64)>>> {
    let mut pos = 0usize;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        // Skip the success-preamble group.
        pos += item_byte_len(&buf[pos..]);
        let item = parse_one(&buf[pos..]).map_err(Error::Protocol)?;
        pos += item_byte_len(&buf[pos..]);
        out.push(parse_listing(&item)?);
    }
    Ok(out)
}

fn parse_listing(item: &Item) -> Result<Vec<(String, String, i64)>> {
    let mut out = Vec::new();
    if let Some(entries) = find_entry_list(item) {
        for entry in entries {
            if let Some(fields) = entry.as_list() {
                if let (Some(name), Some(kind)) = (
                    fields.first().and_then(Item::as_opaque_str),
                    fields.get(1).and_then(Item::as_atom),
                ) {
                    let size = fields
                        .get(2)
                        .and_then(|f| match f {
                            Item::Number(n) => Some(*n),
                            _ => None,
                        })
                        .unwrap_or(-1);
                    out.push((name.to_string(), kind.to_string(), size));
                }
            }
        }
    }
    Ok(out)
}

fn find_entry_list(item: &Item) -> Option<&[Item]> {
    match item {
        Item::List(items) => {
            if items
                .first()
                .and_then(Item::as_list)
                .map(|l| l.iter().all(|e| e.as_list().is_some()))
                .unwrap_or(false)
            {
                items.first().and_then(Item::as_list)
            } else {
                items.iter().find_map(find_entry_list)
            }
        }
        _ => None,
    }
}

/// Single `update-report` walk over HTTP/HTTPS.
pub fn walk_http(
    conn: &mut ConnectionState,
    revision: u64,
    path_target: &Path,
    catalog: &mut Catalog,
) -> Result<Vec<FileEntry>> {
    fs::create_dir_all(path_target)?;
    let host = conn.host_header();
    let request = http::build_update_report(&host, &conn.root, revision, !conn.inline_props());
    let response = conn.assembler.command_http(&request)?;
    if !response.is_success() {
        return Err(Error::ServerFailure {
            branch: conn.url.branch.clone(),
            revision,
            detail: format!("update-report failed with status {}", response.status),
        });
    }
    let body = String::from_utf8_lossy(&response.body).into_owned();

    let mut entries = Vec::new();
    let mut pos = 0;
    while let Some((el, next)) = next_any(&body, pos) {
        pos = next;
        match el.tag {
            "add-directory" => {
                if let Some(name) = el.attr("name") {
                    fs::create_dir_all(path_target.join(name))?;
                    catalog.local_directories.remove(name);
                }
            }
            "add-file" => {
                let Some(name) = el.attr("name") else {
                    continue;
                };
                let path = http::percent_decode_hex_only(name);
                let mut entry = FileEntry::new(path);
                entry.href = el.attr("href").map(str::to_string);
                if let Some(md5) = el.attr("md5-checksum") {
                    entry.md5 = md5.to_string();
                }
                if conn.inline_props() {
                    entry.executable = el.attr("executable").is_some();
                    entry.special = el.attr("special").is_some();
                    if let Some(size) = el.attr("size").and_then(|s| s.parse().ok()) {
                        entry.size = size;
                    }
                }
                entries.push(entry);
            }
            _ => {}
        }
    }
    Ok(entries)
}

fn next_any<'a>(haystack: &'a str, start: usize) -> Option<(xml::Element<'a>, usize)> {
    let dir = xml::next_element(haystack, "add-directory", start);
    let file = xml::next_element(haystack, "add-file", start);
    match (dir, file) {
        (Some((d, dn)), Some((f, fn_))) => {
            if dn <= fn_ {
                Some((d, dn))
            } else {
                Some((f, fn_))
            }
        }
        (Some(d), None) => Some(d),
        (None, Some(f)) => Some(f),
        (None, None) => None,
    }
}
