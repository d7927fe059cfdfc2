//! `info`/`log` entry points: either a live query against a server
//! URL, or a read of a local working copy's revision file (§6).

use std::path::Path;

use svnup_transport::AddressFamily;

use crate::catalog::work_dir;
use crate::checkout::fetch_revision_info;
use crate::connection::ConnectionState;
use crate::error::Result;
use crate::model::{RevisionInfo, SvnUrl};
use crate::persist::read_revision_file;

/// `target` is either a `<scheme>://…` URL (queried live) or a path
/// to an existing local working copy (read from `<target>/.svnup/revision`).
pub fn resolve(target: &str, revision: Option<u64>, family: AddressFamily) -> Result<RevisionInfo> {
    if let Ok(url) = SvnUrl::parse(target) {
        let mut conn = ConnectionState::open(url, family)?;
        let rev = match revision {
            Some(r) => r,
            None => conn.latest_revision()?,
        };
        return fetch_revision_info(&mut conn, rev);
    }

    let path_work = work_dir(Path::new(target));
    let info = read_revision_file(&path_work)?;
    if let Some(requested) = revision {
        if requested != info.revision {
            log::warn!(
                "local working copy is at r{}, not the requested r{requested}",
                info.revision
            );
        }
    }
    Ok(info)
}
