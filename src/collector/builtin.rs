//! The built-in collector registry and the formatting helpers behind it.

use std::collections::HashSet;
use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;

use super::git::GIT_TTL;
use super::quota::{QuotaState, QUOTA_TTL};
use super::{Collector, ContentType, Sources};
use crate::config::BarStyle;
use crate::error::CollectError;
use crate::layout::width::truncate_to_width;

/// Model name when the input carries neither display name nor id.
pub const DEFAULT_MODEL: &str = "Claude";

/// File names counted as memory files in each directory.
const MEMORY_FILES: &[&str] = &["CLAUDE.md", "CLAUDE.local.md", ".claude/CLAUDE.md"];

const ACTIVE_TODO_WIDTH: usize = 32;
const AGENTS_WIDTH: usize = 48;

/// Every built-in collector, in display-independent registration order.
pub fn collectors() -> Vec<Collector> {
    use ContentType::*;

    let fixed = Duration::from_secs(300);
    let live = Duration::ZERO;

    vec![
        Collector::new(Folder, fixed, false, |s| Ok(folder_name(s.input.working_dir()))),
        Collector::new(Model, live, false, |s| {
            Ok(model_name(&s.input.model.display_name, &s.input.model.id))
        }),
        Collector::new(TokenBar, live, true, |s| {
            let window = &s.input.context_window;
            Ok(ratio(window.used_tokens(), window.context_window_size)
                .map(|r| {
                    colorize_ratio(
                        &progress_bar(r, s.settings.bar_width, s.settings.bar_style),
                        r,
                    )
                })
                .unwrap_or_default())
        }),
        Collector::new(TokenUsage, live, true, |s| {
            let window = &s.input.context_window;
            Ok(token_usage(window.used_tokens(), window.context_window_size))
        }),
        Collector::new(TokenPercent, live, true, |s| {
            let window = &s.input.context_window;
            Ok(ratio(window.used_tokens(), window.context_window_size)
                .map(|r| colorize_ratio(&format!("{:.1}%", r * 100.0), r))
                .unwrap_or_default())
        }),
        Collector::new(GitBranch, GIT_TTL, true, |s| {
            Ok(s.git.snapshot(s.input.working_dir())?.branch.clone())
        }),
        Collector::new(GitStatus, GIT_TTL, true, |s| {
            Ok(s.git.snapshot(s.input.working_dir())?.status.to_string())
        }),
        Collector::new(GitRemote, GIT_TTL, true, |s| {
            Ok(s.git.snapshot(s.input.working_dir())?.remote.to_string())
        }),
        Collector::new(MemoryFiles, Duration::from_secs(30), true, |s| {
            let dir = s.input.working_dir();
            if dir.is_empty() {
                return Err(CollectError::Missing("working directory"));
            }
            std::fs::metadata(dir)?;
            let count = count_memory_files(Path::new(dir), dirs::home_dir().as_deref());
            Ok(if count == 0 {
                String::new()
            } else {
                count.to_string()
            })
        }),
        Collector::new(Todo, live, true, |s| Ok(todo_progress(s))),
        Collector::new(Agents, live, true, |s| {
            let names: Vec<&str> = s
                .summary
                .running_agents
                .iter()
                .map(|a| a.description.as_str())
                .collect();
            Ok(truncate_to_width(&names.join(", "), AGENTS_WIDTH))
        }),
        Collector::new(SessionDuration, live, true, |s| {
            let secs = s.summary.elapsed_secs().or_else(|| {
                s.input
                    .cost
                    .as_ref()
                    .map(|c| c.total_duration_ms / 1000)
                    .filter(|secs| *secs > 0)
            });
            Ok(secs.map(format_duration).unwrap_or_default())
        }),
        Collector::new(Cost, live, true, |s| {
            Ok(s.input
                .cost
                .as_ref()
                .map(|c| format!("${:.2}", c.total_cost_usd))
                .unwrap_or_default())
        }),
        Collector::new(Version, fixed, true, |s| {
            let v = s.input.version.trim();
            Ok(if v.is_empty() {
                String::new()
            } else {
                format!("v{}", v)
            })
        }),
        Collector::new(OutputStyle, live, true, |s| {
            let name = s.input.output_style.name.trim();
            Ok(if name.is_empty() || name == "default" {
                String::new()
            } else {
                name.to_string()
            })
        }),
        Collector::new(Clock, Duration::from_secs(1), true, |s| {
            clock_text(&s.settings.time_format)
        }),
        Collector::new(Quota, QUOTA_TTL, true, |s| match s.quota.state()? {
            QuotaState::Available(u) => {
                let r = (u.utilization / 100.0).clamp(0.0, 1.0);
                Ok(colorize_ratio(&format!("{:.0}%", u.utilization), r))
            }
            QuotaState::Unavailable => Ok(String::new()),
        }),
        Collector::new(QuotaReset, QUOTA_TTL, true, |s| match s.quota.state()? {
            QuotaState::Available(u) => Ok(u
                .resets_at
                .map(|at| {
                    let secs = (at - chrono::Utc::now()).num_seconds().max(0) as u64;
                    format_duration(secs)
                })
                .unwrap_or_default()),
            QuotaState::Unavailable => Ok(String::new()),
        }),
    ]
}

/// Last path component of the working directory; `~` for the home directory.
pub fn folder_name(dir: &str) -> String {
    if dir.is_empty() {
        return String::new();
    }
    let path = Path::new(dir);
    if dirs::home_dir().is_some_and(|h| h == path) {
        return "~".to_string();
    }
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.to_string())
}

/// Display name, then id, then [`DEFAULT_MODEL`].
pub fn model_name(display_name: &str, id: &str) -> String {
    [display_name, id]
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_MODEL)
        .to_string()
}

/// Fraction of the window in use, `None` without a window size.
pub fn ratio(used: u64, window: u64) -> Option<f64> {
    if window == 0 {
        return None;
    }
    Some(used as f64 / window as f64)
}

/// `55.0K/200K`, or just the used count when the window is unknown.
pub fn token_usage(used: u64, window: u64) -> String {
    match (used, window) {
        (0, 0) => String::new(),
        (u, 0) => format_tokens(u),
        (u, w) => format!("{}/{}", format_tokens(u), format_window(w)),
    }
}

/// Token count with one decimal above a thousand (e.g. 55000 -> "55.0K").
pub fn format_tokens(tokens: u64) -> String {
    if tokens < 1000 {
        return tokens.to_string();
    }
    if tokens < 1_000_000 {
        return format!("{:.1}K", tokens as f64 / 1000.0);
    }
    format!("{:.1}M", tokens as f64 / 1_000_000.0)
}

/// Window size, decimals only when needed (200000 -> "200K").
pub fn format_window(tokens: u64) -> String {
    if tokens >= 1_000_000 {
        if tokens % 1_000_000 == 0 {
            return format!("{}M", tokens / 1_000_000);
        }
        return format!("{:.1}M", tokens as f64 / 1_000_000.0);
    }
    if tokens >= 1000 {
        if tokens % 1000 == 0 {
            return format!("{}K", tokens / 1000);
        }
        return format!("{:.1}K", tokens as f64 / 1000.0);
    }
    tokens.to_string()
}

/// Format a duration in seconds as "42s", "3m42s" or "1h1m".
pub fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }
    if seconds < 3600 {
        return format!("{}m{}s", seconds / 60, seconds % 60);
    }
    format!("{}h{}m", seconds / 3600, (seconds % 3600) / 60)
}

pub fn progress_bar(ratio: f64, width: usize, style: BarStyle) -> String {
    let (full, empty) = style.glyphs();
    let filled = ((ratio.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    let mut bar = String::with_capacity(width * 3);
    bar.extend(std::iter::repeat(full).take(filled));
    bar.extend(std::iter::repeat(empty).take(width - filled));
    bar
}

/// Green below half, yellow below 80%, red above.
fn colorize_ratio(text: &str, ratio: f64) -> String {
    if ratio >= 0.8 {
        text.bright_red().to_string()
    } else if ratio >= 0.5 {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

/// `done/total`, followed by the active item when one is in progress.
fn todo_progress(s: &Sources<'_>) -> String {
    let todos = &s.summary.todos;
    if todos.is_empty() {
        return String::new();
    }
    let mut out = format!("{}/{}", s.summary.completed_todos(), todos.len());
    if let Some(active) = s.summary.active_todo() {
        let label = active.active_form.as_deref().unwrap_or(&active.content);
        out.push(' ');
        out.push_str(&truncate_to_width(label, ACTIVE_TODO_WIDTH));
    }
    out
}

/// Current local time. Invalid format strings render nothing.
fn clock_text(format: &str) -> Result<String, CollectError> {
    let mut out = String::new();
    write!(out, "{}", chrono::Local::now().format(format))
        .map_err(|_| CollectError::Unavailable("clock", format!("invalid time format {:?}", format)))?;
    Ok(out)
}

/// Count memory files from `start` up through its ancestors, plus the
/// global `~/.claude/CLAUDE.md`. Each file counts once.
pub fn count_memory_files(start: &Path, home: Option<&Path>) -> usize {
    let mut seen: HashSet<PathBuf> = HashSet::new();

    if let Some(home) = home {
        let global = home.join(".claude").join("CLAUDE.md");
        if global.is_file() {
            seen.insert(global);
        }
    }

    for dir in start.ancestors() {
        for name in MEMORY_FILES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                seen.insert(candidate);
            }
        }
        if home.is_some_and(|h| h == dir) {
            break;
        }
    }
    seen.len()
}
