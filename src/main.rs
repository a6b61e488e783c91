use std::{path::PathBuf, process};

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use crate::git::Repo;

mod catalog;
mod changes;
mod cmd;
mod git;
mod plan;
mod resolver;
mod session;
mod term;

#[derive(Parser)]
#[clap(version, about = "Check out branches without the guesswork")]
struct Opts {
    #[clap(short, long, default_value = ".")]
    dir: PathBuf,

    #[clap(subcommand)]
    cmd: Cmd,
}

#[derive(Parser)]
enum Cmd {
    #[clap(alias = "co")]
    Checkout(cmd::checkout::Opts),
    Branches(cmd::branches::Opts),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("BRANCHOUT_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let app = || {
        let repo = Repo::open(&opts.dir)?;

        match opts.cmd {
            Cmd::Checkout(opts) => cmd::checkout::run(repo, opts),
            Cmd::Branches(opts) => cmd::branches::run(repo, opts),
        }
    };

    if let Err(e) = app() {
        eprintln!("{}", format!("⚠️ {e}").red());
        process::exit(1);
    }
}
