//! Argument parsing (§13), built the way `smb-cli/src/cli.rs` builds
//! its top-level `Cli`/`Commands` split.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "svn", version, about = "A dependency-minimal Subversion client", long_about = None)]
pub struct Cli {
    /// Increases log verbosity; repeatable (warn -> info -> debug -> trace).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppresses progress output (equivalent to `-v 0`).
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Checks out (or incrementally updates) a revision to a local directory.
    #[command(alias = "co")]
    Checkout(CheckoutCmd),
    /// Prints `svn info`-style metadata for a revision.
    Info(InfoCmd),
    /// Prints `svn log`-style metadata for a revision.
    Log(LogCmd),
}

#[derive(Parser)]
pub struct CheckoutCmd {
    /// Revision to check out; defaults to the repository's latest.
    #[arg(short = 'r', long = "revision")]
    pub revision: Option<u64>,

    /// Deletes untracked local files/directories outside `.svnup`/`.git`.
    #[arg(long = "trim-tree")]
    pub trim_tree: bool,

    /// Warns about untracked local files instead of staying silent.
    #[arg(long = "extra-files")]
    pub extra_files: bool,

    /// `<svn|http|https>://host[:port]/<branch-path>`.
    pub url: String,

    /// Destination directory; defaults to the last segment of `url`'s branch.
    pub path: Option<String>,
}

#[derive(Parser)]
pub struct InfoCmd {
    #[arg(short = 'r', long = "revision")]
    pub revision: Option<u64>,

    /// A URL, or the path to an existing local working copy.
    pub target: String,
}

#[derive(Parser)]
pub struct LogCmd {
    #[arg(short = 'r', long = "revision")]
    pub revision: Option<u64>,

    pub target: String,
}

/// Maps the verbosity/quiet flags to an `env_logger` filter level
/// (§11.2).
pub fn log_filter(verbose: u8, quiet: bool) -> log::LevelFilter {
    if quiet {
        return log::LevelFilter::Off;
    }
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

/// Derives the destination directory from a branch path's last
/// segment when the user didn't pass one explicitly.
pub fn default_checkout_path(url: &str) -> String {
    url.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("checkout")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_path_uses_last_branch_segment() {
        assert_eq!(
            default_checkout_path("svn://example.org/repo/trunk"),
            "trunk"
        );
        assert_eq!(
            default_checkout_path("https://example.org/repo/trunk/"),
            "trunk"
        );
    }

    #[test]
    fn quiet_overrides_verbosity() {
        assert_eq!(log_filter(3, true), log::LevelFilter::Off);
    }

    #[test]
    fn verbosity_escalates_through_levels() {
        assert_eq!(log_filter(0, false), log::LevelFilter::Warn);
        assert_eq!(log_filter(1, false), log::LevelFilter::Info);
        assert_eq!(log_filter(2, false), log::LevelFilter::Debug);
        assert_eq!(log_filter(5, false), log::LevelFilter::Trace);
    }
}
