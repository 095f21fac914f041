use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use colored::Colorize;

use crate::cli::output;
use crate::collector::builtin;
use crate::collector::cache::{Clock, Manager, SystemClock};
use crate::collector::{Services, Visibility};
use crate::compose;
use crate::config::{self, StatuslineConfig};
use crate::input::{self, Input};
use crate::layout::render::{render, render_single_line};
use crate::layout::{Grid, Layout};
use crate::transcript::Summary;
use crate::update::UpdateJob;

// ---------------------------------------------------------------------------
// Clap Args
// ---------------------------------------------------------------------------

/// Options for the default render command.
#[derive(ClapArgs, Debug, Default)]
pub struct Args {
    /// Collapse all rows into one line (also CCLINE_SINGLE_LINE=1)
    #[arg(long)]
    pub single_line: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long)]
    pub no_color: bool,

    /// Read this config file instead of the project and global ones
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Render the status line. Panics and render errors print nothing and still
/// exit 0.
pub fn run(args: Args) -> Result<()> {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(|info| tracing::debug!("render panicked: {}", info)));
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run_inner(args)));
    std::panic::set_hook(previous);

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            tracing::debug!("render failed: {:#}", e);
            Ok(())
        }
        Err(_) => Ok(()),
    }
}

fn run_inner(args: Args) -> Result<()> {
    // Claude Code pipes stdout, so colors are forced on unless disabled.
    if args.no_color || std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    } else {
        colored::control::set_override(true);
    }

    let input = match input::read_stdin() {
        Ok(Some(input)) => input,
        Ok(None) => return Ok(()),
        Err(e) => {
            output::error(&e.to_string());
            return Ok(());
        }
    };

    let mut config = config::load(args.config.as_deref(), input.project_dir());
    if args.single_line {
        config.single_line = true;
    }

    let update = UpdateJob::spawn(config.update_check_url.clone(), env!("CARGO_PKG_VERSION"));
    let lines = render_lines(&input, &config)?;

    let mut stdout = std::io::stdout().lock();
    for line in &lines {
        writeln!(stdout, "{}", line)?;
    }
    if let Some(notice) = update.finish() {
        writeln!(stdout, "{}", notice.dimmed())?;
    }
    stdout.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Collect, compose, lay out and render one status line for `input`.
pub fn render_lines(input: &Input, config: &StatuslineConfig) -> Result<Vec<String>> {
    let summary = Summary::load(&input.transcript_path);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let services =
        Services::system(config, clock.clone()).context("failed to start collector services")?;
    let manager = Manager::new(builtin::collectors(), services, clock)
        .with_visibility(Visibility::from_config(&config.show, &config.hide));
    Ok(compose_lines(&manager, input, &summary, config))
}

fn compose_lines(
    manager: &Manager,
    input: &Input,
    summary: &Summary,
    config: &StatuslineConfig,
) -> Vec<String> {
    let content = manager.get_all(input, summary);
    let fragments = compose::builtin::registry(&config.composers).compose_all(&content);
    let layout = Layout::default_layout().extended(&config.cells);
    let grid = Grid::new(&layout, &fragments);

    if config.single_line {
        let line = render_single_line(&grid);
        if line.is_empty() {
            Vec::new()
        } else {
            vec![line]
        }
    } else {
        render(&grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::git::tests::FakeGit;
    use crate::collector::test_support;
    use crate::config::CellConfig;
    use crate::input::{ContextWindow, CurrentUsage};

    fn input() -> Input {
        Input {
            cwd: "/work/app".into(),
            context_window: ContextWindow {
                context_window_size: 200_000,
                current_usage: Some(CurrentUsage {
                    input_tokens: 40_000,
                    output_tokens: 5_000,
                    cache_read_input_tokens: 8_000,
                    cache_creation_input_tokens: 2_000,
                }),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn config() -> StatuslineConfig {
        StatuslineConfig {
            show: [
                "folder",
                "model",
                "token-usage",
                "token-percent",
                "git-branch",
                "git-status",
                "git-remote",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            cells: vec![CellConfig {
                name: "tokens".into(),
                row: 3,
                col: 0,
                optional: true,
            }],
            ..Default::default()
        }
    }

    fn manager(config: &StatuslineConfig) -> Manager {
        let git = FakeGit::new().respond("rev-parse --symbolic-full-name HEAD", "refs/heads/main");
        Manager::new(
            builtin::collectors(),
            test_support::services(Arc::new(git)),
            Arc::new(SystemClock),
        )
        .with_visibility(Visibility::from_config(&config.show, &config.hide))
    }

    #[test]
    fn test_compose_lines_grid() {
        colored::control::set_override(false);
        let config = config();
        let lines = compose_lines(&manager(&config), &input(), &Summary::default(), &config);
        assert_eq!(
            lines,
            vec![
                "app                | main | Claude [55.0K/200K (27.5%)]".to_string(),
                "55.0K/200K (27.5%)".to_string(),
            ]
        );
    }

    #[test]
    fn test_compose_lines_single_line() {
        colored::control::set_override(false);
        let config = StatuslineConfig {
            single_line: true,
            ..config()
        };
        let lines = compose_lines(&manager(&config), &input(), &Summary::default(), &config);
        assert_eq!(
            lines,
            vec![
                "app                | main | Claude [55.0K/200K (27.5%)] | 55.0K/200K (27.5%)"
                    .to_string()
            ]
        );
    }

    #[test]
    fn test_default_config_shows_token_percent() {
        colored::control::set_override(false);
        let config = StatuslineConfig::default();
        let lines = compose_lines(&manager(&config), &input(), &Summary::default(), &config);
        assert!(
            lines[0].ends_with("[55.0K/200K (27.5%)]"),
            "got {:?}",
            lines
        );
    }

    #[test]
    fn test_compose_lines_nothing_visible() {
        let config = StatuslineConfig {
            show: vec!["cost".into()],
            ..Default::default()
        };
        let lines = compose_lines(&manager(&config), &Input::default(), &Summary::default(), &config);
        assert!(lines.is_empty());
    }
}
