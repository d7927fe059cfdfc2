//! Top-level `checkout` orchestration (§2 control flow).

use svnup_protocol::sexpr::{parse_one, Item};
use svnup_protocol::{svn, Protocol};

use crate::catalog::{work_dir, Catalog};
use crate::config::CheckoutConfig;
use crate::connection::ConnectionState;
use crate::error::{Error, Result};
use crate::model::{RevisionInfo, SvnUrl};
use crate::{fetch, persist, reconcile, walker};

/// Runs a full checkout: handshake, walk, reconcile, fetch, persist,
/// prune. `progress` is called once per file entry as its download
/// decision is finalized, so a caller can drive a progress bar.
pub fn checkout(
    url: &str,
    config: &CheckoutConfig,
    mut progress: impl FnMut(&str, bool),
) -> Result<RevisionInfo> {
    let parsed = SvnUrl::parse(url)?;
    let mut conn = ConnectionState::open(parsed, config.family)?;

    let revision = match config.revision {
        Some(r) => r,
        None => conn.latest_revision()?,
    };
    conn.check_path(revision)?;

    let path_work = work_dir(&config.path_target);
    let mut catalog = Catalog::new(&config.path_target, &path_work)?;

    let mut entries = match conn.protocol {
        Protocol::Svn => walker::walk_svn(&mut conn, revision, &config.path_target, &mut catalog)?,
        Protocol::Http | Protocol::Https => {
            walker::walk_http(&mut conn, revision, &config.path_target, &mut catalog)?
        }
    };

    reconcile::reconcile(&mut entries, &catalog);
    fetch::fetch_attributes(&mut conn, revision, &mut entries, &catalog)?;
    fetch::fetch_bodies(&mut conn, revision, &entries, &config.path_target)?;

    for entry in &entries {
        progress(&entry.path, entry.download);
    }

    persist::write_manifest(&path_work, &entries, &mut catalog)?;

    let mut info = fetch_revision_info(&mut conn, revision)?;
    info.url = url.to_string();
    persist::write_revision_file(&path_work, &info)?;

    persist::prune(&config.path_target, &catalog, config.trim_tree)?;

    if config.extra_files {
        for path in &catalog.local_files {
            log::warn!("untracked local file: {path}");
        }
    }

    Ok(info)
}

/// Fetches commit metadata for `revision` (§4.3's `log`/`log-report`).
pub fn fetch_revision_info(conn: &mut ConnectionState, revision: u64) -> Result<RevisionInfo> {
    let mut info = RevisionInfo {
        revision,
        ..Default::default()
    };

    match conn.protocol {
        Protocol::Svn => {
            let buf = conn.assembler.command_svn(&svn::log(revision), 2, 0)?;
            let item = parse_one(&buf).map_err(Error::Protocol)?;
            apply_log_fields(&mut info, &item);
        }
        Protocol::Http | Protocol::Https => {
            let Some(stub) = conn.rev_root_stub.clone() else {
                log::warn!("server did not advertise a rev-root-stub; skipping log fetch");
                return Ok(info);
            };
            let host = conn.host_header();
            let request = svnup_protocol::http::build_log_report(&host, &stub, revision);
            let response = conn.assembler.command_http(&request)?;
            if response.is_success() {
                let body = String::from_utf8_lossy(&response.body);
                info.author =
                    svnup_protocol::xml::extract_tag_text(&body, "author").map(str::to_string);
                info.date =
                    svnup_protocol::xml::extract_tag_text(&body, "date").map(str::to_string);
                info.log = svnup_protocol::xml::extract_tag_text(&body, "log")
                    .map(|s| s.trim().to_string());
            }
        }
    }
    Ok(info)
}

fn apply_log_fields(info: &mut RevisionInfo, item: &Item) {
    let mut atoms = Vec::new();
    collect_atoms(item, &mut atoms);
    // Best-effort: the three revprops requested, in order.
    let mut it = atoms.into_iter();
    info.author = it.next();
    info.date = it.next();
    info.log = it.next();
}

fn collect_atoms(item: &Item, out: &mut Vec<String>) {
    match item {
        Item::Atom(s) if s != "success" => out.push(s.clone()),
        Item::Opaque(bytes) => {
            if let Ok(s) = std::str::from_utf8(bytes) {
                out.push(s.to_string());
            }
        }
        Item::List(items) => {
            for i in items {
                collect_atoms(i, out);
            }
        }
        _ => {}
    }
}
