//! Core data model (§3).

/// One file discovered by a report walker.
#[derive(Debug, Clone, Default)]
pub struct FileEntry {
    /// Server-relative path, stripped of any rev-root-stub/revision prefix.
    pub path: String,
    /// HTTP only: the opaque href the server handed back for this file.
    pub href: Option<String>,
    /// 32 lowercase hex chars once known; empty until attributes arrive.
    pub md5: String,
    /// One-shot guard so the reconciler only evaluates each entry once
    /// per pass.
    pub md5_checked: bool,
    pub download: bool,
    pub executable: bool,
    pub special: bool,
    /// -1 means "unknown, discover from `Content-Length`" (HTTP) or
    /// from the SVN listing's `size` field once read.
    pub size: i64,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: -1,
            download: true,
            ..Default::default()
        }
    }
}

/// A manifest entry: `known_files` maps path -> md5; this is the
/// value type used when iterating those entries as a flat sequence
/// (e.g. while writing the new manifest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub path: String,
    pub md5: String,
}

/// Commit metadata for a single revision, as returned by a log
/// request or read back from a local revision file.
#[derive(Debug, Clone, Default)]
pub struct RevisionInfo {
    pub revision: u64,
    pub url: String,
    pub date: Option<String>,
    pub author: Option<String>,
    pub log: Option<String>,
}

/// The three wire schemes a target URL can name (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlScheme {
    Svn,
    Http,
    Https,
}

/// A parsed `<scheme>://host[:port]/<branch-path>` target (§6).
#[derive(Debug, Clone)]
pub struct SvnUrl {
    pub scheme: UrlScheme,
    pub host: String,
    pub port: Option<u16>,
    /// The branch path, without a leading slash.
    pub branch: String,
}

impl SvnUrl {
    pub fn parse(raw: &str) -> Result<Self, crate::Error> {
        let (scheme_str, rest) = raw
            .split_once("://")
            .ok_or_else(|| crate::Error::InvalidUrl(raw.to_string()))?;
        let scheme = match scheme_str {
            "svn" => UrlScheme::Svn,
            "http" => UrlScheme::Http,
            "https" => UrlScheme::Https,
            other => return Err(crate::Error::UnsupportedScheme(other.to_string())),
        };

        let (authority, branch) = match rest.split_once('/') {
            Some((a, b)) => (a, b),
            None => (rest, ""),
        };
        if authority.is_empty() {
            return Err(crate::Error::InvalidUrl(raw.to_string()));
        }

        let (host, port) = match authority.split_once(':') {
            Some((h, p)) => (
                h.to_string(),
                Some(
                    p.parse::<u16>()
                        .map_err(|_| crate::Error::InvalidUrl(raw.to_string()))?,
                ),
            ),
            None => (authority.to_string(), None),
        };

        Ok(Self {
            scheme,
            host,
            port,
            branch: branch.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_svn_url_with_explicit_port() {
        let url = SvnUrl::parse("svn://example.org:3690/repo/trunk").unwrap();
        assert_eq!(url.scheme, UrlScheme::Svn);
        assert_eq!(url.host, "example.org");
        assert_eq!(url.port, Some(3690));
        assert_eq!(url.branch, "repo/trunk");
    }

    #[test]
    fn parses_https_url_with_default_port() {
        let url = SvnUrl::parse("https://example.org/repo/trunk").unwrap();
        assert_eq!(url.scheme, UrlScheme::Https);
        assert_eq!(url.port, None);
    }

    #[test]
    fn rejects_unknown_scheme() {
        assert!(matches!(
            SvnUrl::parse("ftp://example.org/repo"),
            Err(crate::Error::UnsupportedScheme(_))
        ));
    }
}
