//! Manifest/revision persistence and orphan pruning (§4.8).

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::catalog::{Catalog, MANIFEST_FILE, MANIFEST_TMP_FILE, REVISION_FILE};
use crate::error::Result;
use crate::model::{FileEntry, RevisionInfo};

/// Writes `known_files.new` with one line per successfully handled
/// entry, draining matching paths out of `catalog.known_files` and
/// `catalog.local_files` as it goes, then renames it over the old
/// manifest.
pub fn write_manifest(path_work: &Path, entries: &[FileEntry], catalog: &mut Catalog) -> Result<()> {
    fs::create_dir_all(path_work)?;
    let tmp_path = path_work.join(MANIFEST_TMP_FILE);
    let mut f = fs::File::create(&tmp_path)?;
    for entry in entries {
        writeln!(f, "{}\t{}", entry.md5, entry.path)?;
        catalog.known_files.remove(&entry.path);
        catalog.local_files.remove(&entry.path);
    }
    f.flush()?;
    fs::rename(&tmp_path, path_work.join(MANIFEST_FILE))?;
    Ok(())
}

/// Writes the `revision` key=value file; `log` (if present) is always
/// the last line since it may itself span multiple lines.
pub fn write_revision_file(path_work: &Path, info: &RevisionInfo) -> Result<()> {
    fs::create_dir_all(path_work)?;
    let mut f = fs::File::create(path_work.join(REVISION_FILE))?;
    writeln!(f, "rev={}", info.revision)?;
    writeln!(f, "url={}", info.url)?;
    if let Some(date) = &info.date {
        writeln!(f, "date={date}")?;
    }
    if let Some(author) = &info.author {
        writeln!(f, "author={author}")?;
    }
    if let Some(log) = &info.log {
        writeln!(f, "log={log}")?;
    }
    Ok(())
}

pub fn read_revision_file(path_work: &Path) -> Result<RevisionInfo> {
    let path = path_work.join(REVISION_FILE);
    let contents = fs::read_to_string(&path)
        .map_err(|_| crate::error::Error::NoRevisionInfo(path.clone()))?;

    let mut info = RevisionInfo::default();
    let mut log_lines: Vec<&str> = Vec::new();
    let mut in_log = false;
    for line in contents.lines() {
        if in_log {
            log_lines.push(line);
            continue;
        }
        if let Some(rev) = line.strip_prefix("rev=") {
            info.revision = rev
                .parse()
                .map_err(|_| crate::error::Error::NoRevisionInfo(path.clone()))?;
        } else if let Some(url) = line.strip_prefix("url=") {
            info.url = url.to_string();
        } else if let Some(date) = line.strip_prefix("date=") {
            info.date = Some(date.to_string());
        } else if let Some(author) = line.strip_prefix("author=") {
            info.author = Some(author.to_string());
        } else if let Some(log) = line.strip_prefix("log=") {
            log_lines.push(log);
            in_log = true;
        }
    }
    if !log_lines.is_empty() {
        info.log = Some(log_lines.join("\n"));
    }
    Ok(info)
}

/// Deletes manifest entries that no longer exist server-side and
/// their now-empty parent directories; when `trim_tree` is set, also
/// removes untracked local files/dirs (excluding the `.svnup` working
/// area and any `.git` tree) (§4.8).
pub fn prune(path_target: &Path, catalog: &Catalog, trim_tree: bool) -> Result<()> {
    for path in catalog.known_files.keys() {
        let full = path_target.join(path);
        if full.exists() || full.is_symlink() {
            let _ = fs::remove_file(&full);
        }
        if let Some(parent) = full.parent() {
            let _ = fs::remove_dir(parent);
        }
    }

    if trim_tree {
        for path in &catalog.local_files {
            if is_excluded(path) {
                continue;
            }
            let full = path_target.join(path);
            let _ = fs::remove_file(&full);
        }
    }

    let mut dirs: Vec<&String> = catalog
        .local_directories
        .iter()
        .filter(|p| !is_excluded(p))
        .collect();
    dirs.sort_by(|a, b| b.cmp(a));
    for dir in dirs {
        let _ = fs::remove_dir(path_target.join(dir));
    }

    Ok(())
}

fn is_excluded(path: &str) -> bool {
    path == ".svnup" || path.starts_with(".svnup/") || path == ".git" || path.starts_with(".git/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    #[test]
    fn write_and_read_revision_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let info = RevisionInfo {
            revision: 7,
            url: "svn://example.org/repo/trunk".into(),
            date: Some("2020-11-10 09:23:51".into()),
            author: Some("alice".into()),
            log: Some("line one\nline two".into()),
        };
        write_revision_file(dir.path(), &info).unwrap();
        let read = read_revision_file(dir.path()).unwrap();
        assert_eq!(read.revision, 7);
        assert_eq!(read.author.as_deref(), Some("alice"));
        assert_eq!(read.log.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn missing_revision_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_revision_file(dir.path()).is_err());
    }

    #[test]
    fn write_manifest_drains_catalog_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut catalog = Catalog {
            known_files: BTreeMap::from([("a.c".to_string(), "deadbeef".repeat(4))]),
            local_files: BTreeSet::from(["a.c".to_string()]),
            local_directories: BTreeSet::new(),
        };
        let entries = vec![FileEntry {
            md5: "cafef00d".repeat(4),
            ..FileEntry::new("a.c")
        }];
        write_manifest(dir.path(), &entries, &mut catalog).unwrap();
        assert!(catalog.known_files.is_empty());
        assert!(catalog.local_files.is_empty());
        assert!(dir.path().join(MANIFEST_FILE).exists());
    }
}
