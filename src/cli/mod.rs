pub mod init;
pub mod output;
pub mod render;
pub mod types;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter for stderr logging.
pub const LOG_ENV: &str = "CCLINE_LOG";

/// Grid status line for Claude Code. Reads session JSON on stdin and
/// prints the status line on stdout.
#[derive(Parser)]
#[command(name = "ccline", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub render: render::Args,

    /// Logging verbosity for stderr: off, error, warn, info, debug, trace
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a commented default statusline.yaml
    Init(init::Args),

    /// List content types and fragments
    Types(types::Args),
}

/// Install the stderr subscriber. `--log-level` wins over `CCLINE_LOG`;
/// the default is `warn`.
pub fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(known_level(level)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn known_level(level: &str) -> &'static str {
    match level {
        "off" => "off",
        "error" => "error",
        "warn" => "warn",
        "info" => "info",
        "debug" => "debug",
        "trace" => "trace",
        other => {
            eprintln!(
                "warning: unknown log level '{}', defaulting to 'warn'",
                other
            );
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_renders() {
        let cli = Cli::parse_from(["ccline", "--single-line", "--no-color"]);
        assert!(cli.command.is_none());
        assert!(cli.render.single_line);
        assert!(cli.render.no_color);
    }

    #[test]
    fn test_init_flags() {
        let cli = Cli::parse_from(["ccline", "init", "--project", "--force"]);
        match cli.command {
            Some(Command::Init(args)) => {
                assert!(args.project);
                assert!(args.force);
            }
            _ => panic!("expected init"),
        }
    }

    #[test]
    fn test_known_level_falls_back_to_warn() {
        assert_eq!(known_level("debug"), "debug");
        assert_eq!(known_level("loud"), "warn");
    }
}
