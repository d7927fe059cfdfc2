//! Encoders for the handful of native-protocol commands svnup issues
//! (§4.1/§4.2). These are simple enough to build directly as strings
//! rather than through a generic s-expression writer.

/// Client greeting sent immediately after connecting, advertising
/// protocol version 2 and no capabilities beyond the baseline set.
pub fn greeting() -> Vec<u8> {
    b"( 2 ( edit-pipeline svndiff1 absent-entries depth mergeinfo ) )".to_vec()
}

/// `ANONYMOUS` auth response with an empty token, sent after the
/// server's auth-request advertises the mechanism (§4.1).
pub fn auth_anonymous() -> Vec<u8> {
    b"( ANONYMOUS ( 0: ) )".to_vec()
}

/// Opens the session against `url` (the repository root as seen by
/// the server) with an empty capability list beyond what the greeting
/// already sent.
pub fn reparent_or_open(url: &str) -> Vec<u8> {
    format!("( {}:{url} ( edit-pipeline svndiff1 absent-entries depth mergeinfo ) 0: ( ) )", url.len())
        .into_bytes()
}

/// `get-latest-rev` command.
pub fn get_latest_rev() -> Vec<u8> {
    b"( get-latest-rev ( ) )".to_vec()
}

/// `get-dir` command requesting a directory listing (and, inline, the
/// properties of each entry) at `path` and `revision`.
pub fn get_dir(path: &str, revision: u64, want_props: bool) -> Vec<u8> {
    format!(
        "( get-dir ( {plen}:{path} ( {revision} ) false true {want_props} ( ) ) )",
        plen = path.len(),
    )
    .into_bytes()
}

/// `get-file` command requesting the full contents (and optionally
/// properties) of `path` at `revision`.
pub fn get_file(path: &str, revision: u64, want_props: bool, want_contents: bool) -> Vec<u8> {
    format!(
        "( get-file ( {plen}:{path} ( {revision} ) {want_props} {want_contents} ) )",
        plen = path.len(),
    )
    .into_bytes()
}

/// `log` command requesting author/date/log-message revprops for a
/// single revision.
pub fn log(revision: u64) -> Vec<u8> {
    format!(
        "( log ( ( 0: ) ( {revision} ) ( {revision} ) false false 0 false revprops \
         ( 10:svn:author 8:svn:date 7:svn:log ) ) )"
    )
    .into_bytes()
}

/// Batches several already-encoded commands back to back, as the
/// wire protocol has no framing between successive commands (§4.2);
/// the caller limits the total size to the 32 KiB batch ceiling.
pub fn batch(commands: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    for cmd in commands {
        out.extend_from_slice(cmd);
        out.push(b' ');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_dir_encodes_path_length_prefix() {
        let cmd = get_dir("trunk/src", 42, true);
        let text = String::from_utf8(cmd).unwrap();
        assert!(text.starts_with("( get-dir ( 9:trunk/src"));
    }

    #[test]
    fn batch_concatenates_with_separators() {
        let out = batch(&[get_latest_rev(), get_latest_rev()]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "( get-latest-rev ( ) ) ( get-latest-rev ( ) ) "
        );
    }
}
