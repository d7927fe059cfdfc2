//! Per-file download/skip decision using manifest ∩ remote ∩ local
//! state (§4.6).

use crate::catalog::Catalog;
use crate::model::FileEntry;

/// Evaluates every entry whose MD5 is known and not yet checked,
/// consuming matching paths out of `known_files` as it goes. Returns
/// the remaining manifest entries, which callers of a later pass can
/// feed back in as the baseline shrinks.
pub fn reconcile(entries: &mut [FileEntry], catalog: &Catalog) {
    for entry in entries.iter_mut() {
        if entry.md5_checked || entry.md5.is_empty() {
            continue;
        }
        entry.download = match catalog.known_files.get(&entry.path) {
            Some(known_md5) => known_md5 != &entry.md5,
            None => true,
        };
        entry.md5_checked = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet};

    fn catalog_with(known: &[(&str, &str)]) -> Catalog {
        Catalog {
            known_files: known
                .iter()
                .map(|(p, m)| (p.to_string(), m.to_string()))
                .collect::<BTreeMap<_, _>>(),
            local_files: BTreeSet::new(),
            local_directories: BTreeSet::new(),
        }
    }

    #[test]
    fn matching_md5_skips_download() {
        let catalog = catalog_with(&[("src/a.c", "deadbeef")]);
        let mut entries = vec![FileEntry {
            path: "src/a.c".into(),
            md5: "deadbeef".into(),
            ..FileEntry::new("src/a.c")
        }];
        reconcile(&mut entries, &catalog);
        assert!(!entries[0].download);
        assert!(entries[0].md5_checked);
    }

    #[test]
    fn mismatched_md5_forces_download() {
        let catalog = catalog_with(&[("src/a.c", "deadbeef")]);
        let mut entries = vec![FileEntry {
            path: "src/a.c".into(),
            md5: "cafef00d".into(),
            ..FileEntry::new("src/a.c")
        }];
        reconcile(&mut entries, &catalog);
        assert!(entries[0].download);
    }

    #[test]
    fn path_absent_from_manifest_forces_download() {
        let catalog = catalog_with(&[]);
        let mut entries = vec![FileEntry {
            path: "new/file.c".into(),
            md5: "deadbeef".into(),
            ..FileEntry::new("new/file.c")
        }];
        reconcile(&mut entries, &catalog);
        assert!(entries[0].download);
    }

    #[test]
    fn unknown_md5_is_left_unchecked() {
        let catalog = catalog_with(&[("src/a.c", "deadbeef")]);
        let mut entries = vec![FileEntry::new("src/a.c")];
        reconcile(&mut entries, &catalog);
        assert!(!entries[0].md5_checked);
    }
}
