//! Connection handshake and session state (§3/§4.1/§4.3).

use svnup_protocol::sexpr::{parse_one, Item};
use svnup_protocol::{svn, Assembler, Protocol};
use svnup_transport::{AddressFamily, Endpoint};

use crate::error::{Error, Result};
use crate::model::{SvnUrl, UrlScheme};

/// Everything the report walkers, fetcher, and renderer need once a
/// session is open: the assembler, the server's advertised layout,
/// and feature flags (§3's "Connection state").
pub struct ConnectionState {
    pub assembler: Assembler,
    pub protocol: Protocol,
    pub url: SvnUrl,
    /// Repository mount point as seen by the server (HTTP only; for
    /// SVN the branch is already root-relative).
    pub root: String,
    /// `branch` with `root` stripped — the path report walkers address.
    pub trunk: String,
    /// Base URL for per-revision artifact addressing (HTTP only).
    pub rev_root_stub: Option<String>,
    pub youngest_rev: Option<u64>,
}

impl ConnectionState {
    pub fn open(url: SvnUrl, family: AddressFamily) -> Result<Self> {
        let port = url.port.unwrap_or(match url.scheme {
            UrlScheme::Svn => 3690,
            UrlScheme::Http => 80,
            UrlScheme::Https => 443,
        });
        let endpoint = Endpoint::new(url.host.clone(), port, family);
        let protocol = match url.scheme {
            UrlScheme::Svn => Protocol::Svn,
            UrlScheme::Http => Protocol::Http,
            UrlScheme::Https => Protocol::Https,
        };
        let scheme = match protocol {
            Protocol::Svn => svnup_transport::Scheme::Svn,
            Protocol::Http => svnup_transport::Scheme::Http,
            Protocol::Https => svnup_transport::Scheme::Https,
        };
        let transport = svnup_transport::connect(&endpoint, scheme)?;
        let assembler = Assembler::new(transport, endpoint, protocol);

        let mut state = Self {
            assembler,
            protocol,
            url,
            root: String::new(),
            trunk: String::new(),
            rev_root_stub: None,
            youngest_rev: None,
        };

        match protocol {
            Protocol::Svn => state.handshake_svn()?,
            Protocol::Http | Protocol::Https => state.handshake_http()?,
        }
        Ok(state)
    }

    fn handshake_svn(&mut self) -> Result<()> {
        // Server's opening greeting: one response group advertising
        // its protocol range and auth mechanisms.
        self.assembler.command_svn(b"", 1, 0)?;

        // Our version-selection reply, answered by the server's
        // auth-mechanism advertisement.
        self.assembler.command_svn(&svn::greeting(), 1, 0)?;

        self.assembler.command_svn(&svn::auth_anonymous(), 1, 0)?;

        let url = format!("{}://{}/{}", self.url.scheme_str(), self.url.host, self.url.branch);
        let open = svn::reparent_or_open(&url);
        self.assembler.command_svn(&open, 1, 0)?;

        let buf = self.assembler.command_svn(&svn::get_latest_rev(), 1, 0)?;
        self.youngest_rev = Some(extract_revision(&buf)?);

        self.trunk = self.url.branch.clone();
        Ok(())
    }

    fn handshake_http(&mut self) -> Result<()> {
        let host = self.host_header();
        let request = svnup_protocol::http::build_options(&host, &self.url.branch);
        let response = self.assembler.command_http(&request)?;
        if !response.is_success() {
            return Err(Error::ServerFailure {
                branch: self.url.branch.clone(),
                revision: 0,
                detail: http_error_detail(&response),
            });
        }

        self.root = response
            .header("SVN-Repository-Root")
            .unwrap_or_default()
            .trim_start_matches('/')
            .to_string();
        self.rev_root_stub = response.header("SVN-Rev-Root-Stub").map(str::to_string);
        self.youngest_rev = response
            .header("SVN-Youngest-Rev")
            .and_then(|v| v.parse().ok());
        self.trunk = self
            .url
            .branch
            .strip_prefix(&self.root)
            .unwrap_or(&self.url.branch)
            .trim_start_matches('/')
            .to_string();
        Ok(())
    }

    pub fn host_header(&self) -> String {
        match self.url.port {
            Some(p) => format!("{}:{p}", self.url.host),
            None => self.url.host.clone(),
        }
    }

    pub fn inline_props(&self) -> bool {
        self.assembler.inline_props
    }

    pub fn latest_revision(&mut self) -> Result<u64> {
        if let Some(rev) = self.youngest_rev {
            return Ok(rev);
        }
        match self.protocol {
            Protocol::Svn => {
                let buf = self.assembler.command_svn(&svn::get_latest_rev(), 1, 0)?;
                let rev = extract_revision(&buf)?;
                self.youngest_rev = Some(rev);
                Ok(rev)
            }
            Protocol::Http | Protocol::Https => {
                // Re-issue OPTIONS; the server always advertises the
                // youngest revision on every response to it.
                let host = self.host_header();
                let request = svnup_protocol::http::build_options(&host, &self.url.branch);
                let response = self.assembler.command_http(&request)?;
                let rev = response
                    .header("SVN-Youngest-Rev")
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| Error::ServerFailure {
                        branch: self.url.branch.clone(),
                        revision: 0,
                        detail: "no SVN-Youngest-Rev header".into(),
                    })?;
                self.youngest_rev = Some(rev);
                Ok(rev)
            }
        }
    }

    /// Confirms the branch resolves to a directory at `revision`
    /// before the walker starts (§12 "check-path dir confirmation").
    /// HTTP's OPTIONS handshake already proved the branch exists, so
    /// only the SVN path issues an extra round trip.
    pub fn check_path(&mut self, revision: u64) -> Result<()> {
        if self.protocol != Protocol::Svn {
            return Ok(());
        }
        let cmd = format!(
            "( check-path ( 0: ( {revision} ) ) )"
        )
        .into_bytes();
        let buf = self.assembler.command_svn(&cmd, 2, 0)?;
        let text = String::from_utf8_lossy(&buf);
        if !text.contains("dir") {
            return Err(Error::NotADirectory {
                branch: self.url.branch.clone(),
                revision,
            });
        }
        Ok(())
    }
}

impl SvnUrl {
    pub fn scheme_str(&self) -> &'static str {
        match self.scheme {
            UrlScheme::Svn => "svn",
            UrlScheme::Http => "http",
            UrlScheme::Https => "https",
        }
    }
}

/// Pulls the trailing number out of a `( success ( N ) )`-shaped
/// response, used for `get-latest-rev`.
fn extract_revision(buf: &[u8]) -> Result<u64> {
    let item = parse_one(buf).map_err(Error::Protocol)?;
    find_number(&item).ok_or_else(|| Error::ServerFailure {
        branch: String::new(),
        revision: 0,
        detail: "no revision number in response".into(),
    })
}

fn find_number(item: &Item) -> Option<u64> {
    match item {
        Item::Number(n) if *n >= 0 => Some(*n as u64),
        Item::List(items) => items.iter().find_map(find_number),
        _ => None,
    }
}

fn http_error_detail(response: &svnup_protocol::http::HttpResponse) -> String {
    let body = String::from_utf8_lossy(&response.body);
    svnup_protocol::xml::extract_human_readable(&body)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP status {}", response.status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_revision_from_nested_response() {
        let buf = b"( success ( 42 ) )";
        assert_eq!(extract_revision(buf).unwrap(), 42);
    }
}
