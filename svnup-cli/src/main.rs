mod cli;
mod progress;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use svnup_core::{CheckoutConfig, Error};
use svnup_transport::AddressFamily;

use cli::{Cli, Commands};

fn main() -> ExitCode {
    let args = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli::log_filter(args.verbose, args.quiet))
        .parse_default_env()
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("svn: error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<(), Error> {
    match args.command {
        Commands::Checkout(cmd) => run_checkout(cmd, args.quiet),
        Commands::Info(cmd) => run_info(cmd),
        Commands::Log(cmd) => run_log(cmd),
    }
}

fn run_checkout(cmd: cli::CheckoutCmd, quiet: bool) -> Result<(), Error> {
    let path = cmd
        .path
        .unwrap_or_else(|| cli::default_checkout_path(&cmd.url));

    let mut config = CheckoutConfig::new(PathBuf::from(path));
    config.revision = cmd.revision;
    config.trim_tree = cmd.trim_tree;
    config.extra_files = cmd.extra_files;
    config.quiet = quiet;
    config.family = AddressFamily::default();

    let bar = (!quiet).then(|| progress::make_progress_bar(0));

    let info = svnup_core::checkout::checkout(&cmd.url, &config, |path, downloaded| {
        if let Some(bar) = &bar {
            bar.inc_length(1);
            bar.inc(1);
            if downloaded {
                let width = progress::terminal_width().unwrap_or(80).saturating_sub(4);
                bar.set_message(progress::elide_front(path, width));
            }
        }
    })?;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    println!("Checked out revision {} to {}", info.revision, config.path_target.display());
    Ok(())
}

fn run_info(cmd: cli::InfoCmd) -> Result<(), Error> {
    let info = svnup_core::info_log::resolve(&cmd.target, cmd.revision, AddressFamily::default())?;
    print!("{}", svnup_core::render::render_info(&info));
    Ok(())
}

fn run_log(cmd: cli::LogCmd) -> Result<(), Error> {
    let info = svnup_core::info_log::resolve(&cmd.target, cmd.revision, AddressFamily::default())?;
    print!("{}", svnup_core::render::render_log_entry(&info));
    Ok(())
}
