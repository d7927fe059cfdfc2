//! Batched attribute/body fetch passes and file materialization (§4.7).

use std::fs;
use std::io::Write;
use std::os::unix::fs::{symlink, PermissionsExt};
use std::path::Path;

use md5::{Digest, Md5};
use svnup_protocol::sexpr::{item_byte_len, parse_one, Item};
use svnup_protocol::{http, svn};

use crate::catalog::Catalog;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::model::FileEntry;
use crate::reconcile::reconcile;

const SVN_BATCH_BYTES: usize = 32 * 1024;
const HTTP_BATCH_MAX: usize = 95;

const MODE_EXECUTABLE: u32 = 0o755;
const MODE_REGULAR: u32 = 0o644;

/// Fills in MD5/executable/special/size for entries still
/// `download=true` when the server hasn't inlined that data in the
/// report, then re-runs the reconciler now that MD5 is known.
pub fn fetch_attributes(
    conn: &mut ConnectionState,
    revision: u64,
    entries: &mut [FileEntry],
    catalog: &Catalog,
) -> Result<()> {
    if conn.inline_props() {
        return Ok(());
    }

    match conn.protocol {
        svnup_protocol::Protocol::Svn => fetch_attributes_svn(conn, revision, entries)?,
        svnup_protocol::Protocol::Http | svnup_protocol::Protocol::Https => {
            fetch_attributes_http(conn, entries)?
        }
    }
    reconcile(entries, catalog);
    Ok(())
}

fn fetch_attributes_svn(
    conn: &mut ConnectionState,
    revision: u64,
    entries: &mut [FileEntry],
) -> Result<()> {
    let indices: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.download)
        .map(|(i, _)| i)
        .collect();

    for chunk in batch_indices(entries, &indices, SVN_BATCH_BYTES, |e| {
        svn::get_file(&e.path, revision, true, false)
    }) {
        let cmds: Vec<Vec<u8>> = chunk
            .iter()
            .map(|&i| svn::get_file(&entries[i].path, revision, true, false))
            .collect();
        let wire = svn::batch(&cmds);
        let buf = conn
            .assembler
            .command_svn(&wire, chunk.len() as u32, 0)?;
        let mut pos = 0;
        for &i in &chunk {
            let item = parse_one(&buf[pos..]).map_err(Error::Protocol)?;
            pos += item_byte_len(&buf[pos..]);
            apply_attributes(&mut entries[i], &item);
        }
    }
    Ok(())
}

fn fetch_attributes_http(conn: &mut ConnectionState, entries: &mut [FileEntry]) -> Result<()> {
    let indices: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.download)
        .map(|(i, _)| i)
        .collect();
    let host = conn.host_header();

    for chunk in indices.chunks(HTTP_BATCH_MAX) {
        let mut wire = Vec::new();
        for &i in chunk {
            let href = entries[i].href.clone().unwrap_or_default();
            wire.extend_from_slice(&http::build_propfind(&host, &href));
        }
        let responses = conn
            .assembler
            .command_http_batch(&wire, chunk.len())?;
        for (&i, response) in chunk.iter().zip(responses) {
            let entry = &mut entries[i];
            let body = String::from_utf8_lossy(&response.body);
            entry.executable = svnup_protocol::xml::extract_tag_text(&body, "executable")
                .map(|s| !s.is_empty())
                .unwrap_or(false);
            entry.special = svnup_protocol::xml::extract_tag_text(&body, "special").is_some();
            if let Some(len) = svnup_protocol::xml::extract_tag_text(&body, "getcontentlength") {
                entry.size = len.trim().parse().unwrap_or(-1);
            }
        }
    }
    Ok(())
}

fn apply_attributes(entry: &mut FileEntry, item: &Item) {
    if let Some(md5) = find_md5(item) {
        entry.md5 = md5;
    }
}

/// md5 values arrive as length-prefixed opaque literals (`32:<hex>`),
/// nested arbitrarily deep inside the success/proplist wrapper lists.
fn find_md5(item: &Item) -> Option<String> {
    match item {
        Item::Opaque(_) => item.as_opaque_str().and_then(|s| {
            (s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit())).then(|| s.to_string())
        }),
        Item::List(items) => items.iter().find_map(find_md5),
        _ => None,
    }
}

/// Downloads every `download=true` entry's body, verifies its MD5,
/// and writes it to disk with the right mode/symlink semantics.
pub fn fetch_bodies(
    conn: &mut ConnectionState,
    revision: u64,
    entries: &[FileEntry],
    path_target: &Path,
) -> Result<()> {
    let indices: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.download)
        .map(|(i, _)| i)
        .collect();

    match conn.protocol {
        svnup_protocol::Protocol::Svn => {
            for chunk in batch_indices(entries, &indices, SVN_BATCH_BYTES, |e| {
                svn::get_file(&e.path, revision, false, true)
            }) {
                let cmds: Vec<Vec<u8>> = chunk
                    .iter()
                    .map(|&i| svn::get_file(&entries[i].path, revision, false, true))
                    .collect();
                let wire = svn::batch(&cmds);
                let buf = conn
                    .assembler
                    .command_svn(&wire, chunk.len() as u32, 0)?;
                let mut pos = 0;
                for &i in &chunk {
                    let item = parse_one(&buf[pos..]).map_err(Error::Protocol)?;
                    pos += item_byte_len(&buf[pos..]);
                    let body = extract_body(&item);
                    write_entry(&entries[i], &body, path_target)?;
                }
            }
        }
        svnup_protocol::Protocol::Http | svnup_protocol::Protocol::Https => {
            let host = conn.host_header();
            for chunk in indices.chunks(HTTP_BATCH_MAX) {
                let mut wire = Vec::new();
                for &i in chunk {
                    let href = entries[i].href.clone().unwrap_or_default();
                    wire.extend_from_slice(&http::build_get(&host, &href));
                }
                let responses = conn.assembler.command_http_batch(&wire, chunk.len())?;
                for (&i, response) in chunk.iter().zip(responses) {
                    write_entry(&entries[i], &response.body, path_target)?;
                }
            }
        }
    }
    Ok(())
}

fn extract_body(item: &Item) -> Vec<u8> {
    match item {
        Item::Opaque(bytes) => bytes.clone(),
        Item::List(items) => items.iter().map(extract_body).max_by_key(Vec::len).unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn write_entry(entry: &FileEntry, body: &[u8], path_target: &Path) -> Result<()> {
    let digest = format!("{:x}", Md5::digest(body));
    if !entry.md5.is_empty() && digest != entry.md5 {
        return Err(Error::ChecksumMismatch {
            path: entry.path.clone(),
            expected: entry.md5.clone(),
            actual: digest,
        });
    }

    let full = path_target.join(&entry.path);
    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent)?;
    }
    if full.is_symlink() || full.exists() {
        fs::remove_file(&full)?;
    }

    if entry.special && body.starts_with(b"link ") {
        let target = String::from_utf8_lossy(&body[5..]).into_owned();
        symlink(target, &full)?;
        return Ok(());
    }

    let mut f = fs::File::create(&full)?;
    f.write_all(body)?;
    let mode = if entry.executable {
        MODE_EXECUTABLE
    } else {
        MODE_REGULAR
    };
    fs::set_permissions(&full, fs::Permissions::from_mode(mode))?;
    Ok(())
}

/// Groups `indices` into batches whose serialized command size (per
/// `encode`) stays under `max_bytes`.
fn batch_indices<'a>(
    entries: &'a [FileEntry],
    indices: &'a [usize],
    max_bytes: usize,
    encode: impl Fn(&FileEntry) -> Vec<u8>,
) -> Vec<Vec<usize>> {
    let mut batches = Vec::new();
    let mut current = Vec::new();
    let mut size = 0usize;
    for &i in indices {
        let len = encode(&entries[i]).len() + 1;
        if !current.is_empty() && size + len > max_bytes {
            batches.push(std::mem::take(&mut current));
            size = 0;
        }
        current.push(i);
        size += len;
    }
    if !current.is_empty() {
        batches.push(current);
    }
    batches
}
