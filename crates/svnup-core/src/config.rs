//! Top-level configuration assembled by the CLI (§11.3).

use std::path::PathBuf;

use svnup_transport::AddressFamily;

/// Everything `checkout` needs besides the parsed target URL, built
/// by the CLI from its flags and handed to [`crate::checkout::checkout`].
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub path_target: PathBuf,
    pub revision: Option<u64>,
    pub family: AddressFamily,
    /// Delete untracked local files/dirs outside `.svnup`/`.git` that
    /// the reconciler doesn't otherwise touch (§4.8).
    pub trim_tree: bool,
    /// Warn (rather than stay silent) about local files that aren't
    /// tracked in the manifest and aren't being removed.
    pub extra_files: bool,
    pub quiet: bool,
}

impl CheckoutConfig {
    pub fn new(path_target: PathBuf) -> Self {
        Self {
            path_target,
            revision: None,
            family: AddressFamily::default(),
            trim_tree: false,
            extra_files: false,
            quiet: false,
        }
    }
}
