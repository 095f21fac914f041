use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;

use crate::cli::output;
use crate::config::{self, DEFAULT_CONFIG_YAML};

/// Arguments for the `ccline init` subcommand.
#[derive(ClapArgs, Debug)]
pub struct Args {
    /// Write ./.claude/statusline.yaml instead of ~/.claude/statusline.yaml
    #[arg(long)]
    pub project: bool,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: Args) -> Result<()> {
    let path = target(args.project)?;

    if path.exists() && !args.force {
        output::error(&format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        ));
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, DEFAULT_CONFIG_YAML)
        .with_context(|| format!("failed to write {}", path.display()))?;

    output::success(&format!("Wrote {}", path.display()));
    output::info("Run `ccline types` to see the content types and fragments you can use.");
    Ok(())
}

fn target(project: bool) -> Result<PathBuf> {
    if project {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        return Ok(config::project_path(&cwd));
    }
    config::global_path().context("could not determine home directory")
}
