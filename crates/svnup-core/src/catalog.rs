//! The three ordered maps that drive reconciliation and pruning (§4.4).

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "known_files";
pub const MANIFEST_TMP_FILE: &str = "known_files.new";
pub const REVISION_FILE: &str = "revision";
pub const WORK_DIR: &str = ".svnup";

/// Baseline (`known_files`) plus a filesystem scan (`local_files`,
/// `local_directories`), all keyed by path relative to the checkout
/// target.
#[derive(Debug, Default)]
pub struct Catalog {
    pub known_files: BTreeMap<String, String>,
    pub local_files: BTreeSet<String>,
    pub local_directories: BTreeSet<String>,
}

impl Catalog {
    /// Loads `known_files` from `<path_work>/known_files`, or returns
    /// an empty map if the file doesn't exist yet (first checkout).
    pub fn load_known_files(path_work: &Path) -> Result<BTreeMap<String, String>> {
        let manifest_path = path_work.join(MANIFEST_FILE);
        let contents = match fs::read_to_string(&manifest_path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };

        let mut known = BTreeMap::new();
        for line in contents.lines() {
            if line.is_empty() {
                continue;
            }
            let (md5, path) = line.split_once('\t').ok_or_else(|| Error::CorruptManifest {
                path: manifest_path.clone(),
                line: line.to_string(),
            })?;
            if md5.len() != 32 || !md5.bytes().all(|b| b.is_ascii_hexdigit()) {
                return Err(Error::CorruptManifest {
                    path: manifest_path.clone(),
                    line: line.to_string(),
                });
            }
            known.insert(path.to_string(), md5.to_string());
        }
        Ok(known)
    }

    /// Recursively scans `path_target`, populating `local_files` and
    /// `local_directories` with paths relative to `path_target`.
    /// Symlinks are recorded as files ("does-not-follow" stat), never
    /// descended into.
    pub fn scan_filesystem(path_target: &Path) -> Result<(BTreeSet<String>, BTreeSet<String>)> {
        let mut files = BTreeSet::new();
        let mut dirs = BTreeSet::new();
        if path_target.is_dir() {
            scan_dir(path_target, path_target, &mut files, &mut dirs)?;
        }
        Ok((files, dirs))
    }

    pub fn new(path_target: &Path, path_work: &Path) -> Result<Self> {
        let known_files = Self::load_known_files(path_work)?;
        let (local_files, local_directories) = Self::scan_filesystem(path_target)?;
        Ok(Self {
            known_files,
            local_files,
            local_directories,
        })
    }
}

fn scan_dir(
    root: &Path,
    dir: &Path,
    files: &mut BTreeSet<String>,
    dirs: &mut BTreeSet<String>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let full = entry.path();
        let rel = full
            .strip_prefix(root)
            .expect("entry is under root")
            .to_string_lossy()
            .replace(std::path::MAIN_SEPARATOR, "/");

        if rel == WORK_DIR || rel.starts_with(&format!("{WORK_DIR}/")) {
            continue;
        }

        if file_type.is_symlink() || file_type.is_file() {
            files.insert(rel);
        } else if file_type.is_dir() {
            dirs.insert(rel.clone());
            scan_dir(root, &full, files, dirs)?;
        }
    }
    Ok(())
}

pub fn work_dir(path_target: &Path) -> PathBuf {
    path_target.join(WORK_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_well_formed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join(MANIFEST_FILE)).unwrap();
        writeln!(f, "{}\tsrc/main.c", "a".repeat(32)).unwrap();
        let known = Catalog::load_known_files(dir.path()).unwrap();
        assert_eq!(known.get("src/main.c"), Some(&"a".repeat(32)));
    }

    #[test]
    fn rejects_manifest_with_bad_md5_length() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fs::File::create(dir.path().join(MANIFEST_FILE)).unwrap();
        writeln!(f, "short\tsrc/main.c").unwrap();
        assert!(Catalog::load_known_files(dir.path()).is_err());
    }

    #[test]
    fn missing_manifest_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let known = Catalog::load_known_files(dir.path()).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn scan_excludes_work_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(WORK_DIR)).unwrap();
        fs::write(dir.path().join(WORK_DIR).join(MANIFEST_FILE), "").unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.c"), "x").unwrap();

        let (files, dirs) = Catalog::scan_filesystem(dir.path()).unwrap();
        assert_eq!(files, BTreeSet::from(["src/main.c".to_string()]));
        assert_eq!(dirs, BTreeSet::from(["src".to_string()]));
    }
}
