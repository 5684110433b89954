mod cmd;
mod config;
mod error;
mod ftp;
mod remote;
mod remove;
mod retention;
mod upload;

use anyhow::{Result, anyhow};
use std::env;
use std::process::exit;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FTPBACKUP_LOG";

fn main() {
    init_logging();
    if let Err(e) = entry() {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn entry() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        return cmd::help::run();
    };

    match command.as_str() {
        "upload" => cmd::upload::run(rest),
        "prune" => cmd::prune::run(rest),
        "help" | "-h" | "--help" => cmd::help::run(),
        "-V" | "--version" => {
            println!("ftpbackup {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!(
            "unknown command '{}'. Run `ftpbackup help` for usage.",
            other
        )),
    }
}
