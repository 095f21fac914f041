mod cli;
mod collector;
mod compose;
mod config;
mod error;
mod input;
mod layout;
mod transcript;
mod update;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_tracing(cli.log_level.as_deref());

    match cli.command {
        Some(Command::Init(args)) => cli::init::run(args),
        Some(Command::Types(args)) => cli::types::run(args),
        None => cli::render::run(cli.render),
    }
}
