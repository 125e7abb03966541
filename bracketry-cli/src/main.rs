mod commands;
mod config;
mod logger;
mod render;

use std::io;
use std::path::PathBuf;
use std::process;

use bracketry_store::{FileStore, Manager};
use clap::Parser;
use thiserror::Error;

use crate::commands::Command;
use crate::config::{Config, ConfigError};

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] bracketry_store::Error),
    #[error(transparent)]
    Options(#[from] bracketry_core::options::Error),
    #[error("failed to load config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Error> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .with_environment();

    if let Err(err) = logger::init(config.loglevel) {
        eprintln!("Failed to install logger: {}", err);
    }

    log::debug!("Using config: {:?}", config);

    let store = FileStore::open(&config.store)?;
    let manager = Manager::new(store);

    let mut stdout = io::stdout().lock();
    args.command.run(&manager, &mut stdout)
}
