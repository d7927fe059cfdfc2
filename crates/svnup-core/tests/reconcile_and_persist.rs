//! End-to-end exercise of catalog load, reconciliation, and manifest
//! persistence against a real temporary directory, without any
//! network I/O.

use std::fs;

use md5::Digest as _;
use svnup_core::catalog::{work_dir, Catalog, MANIFEST_FILE};
use svnup_core::model::FileEntry;
use svnup_core::persist::{read_revision_file, write_manifest, write_revision_file};
use svnup_core::reconcile::reconcile;
use svnup_core::RevisionInfo;

#[test]
fn second_run_with_unchanged_server_state_downloads_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let target = tmp.path();
    let work = work_dir(target);
    fs::create_dir_all(&work).unwrap();
    fs::write(target.join("src.c"), "int main() {}").unwrap();

    let md5 = format!("{:x}", md5::Md5::digest(b"int main() {}"));
    fs::write(work.join(MANIFEST_FILE), format!("{md5}\tsrc.c\n")).unwrap();

    let catalog = Catalog::new(target, &work).unwrap();
    let mut entries = vec![FileEntry {
        md5: md5.clone(),
        md5_checked: false,
        ..FileEntry::new("src.c")
    }];
    reconcile(&mut entries, &catalog);

    assert!(!entries[0].download);
}

#[test]
fn manifest_and_revision_file_round_trip_through_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let work = work_dir(tmp.path());
    fs::create_dir_all(&work).unwrap();

    let mut catalog = Catalog::default();
    let entries = vec![FileEntry {
        md5: "a".repeat(32),
        ..FileEntry::new("docs/readme.txt")
    }];
    write_manifest(&work, &entries, &mut catalog).unwrap();

    let reloaded = Catalog::load_known_files(&work).unwrap();
    assert_eq!(reloaded.get("docs/readme.txt"), Some(&"a".repeat(32)));

    let info = RevisionInfo {
        revision: 99,
        url: "https://example.org/repo/trunk".into(),
        author: Some("bob".into()),
        date: Some("2024-01-02 03:04:05".into()),
        log: None,
    };
    write_revision_file(&work, &info).unwrap();
    let read_back = read_revision_file(&work).unwrap();
    assert_eq!(read_back.revision, 99);
    assert_eq!(read_back.author.as_deref(), Some("bob"));
}
