pub mod schema;

use std::path::{Path, PathBuf};

pub use schema::{BarStyle, CellConfig, ComposerConfig, ConfigLayer, StatuslineConfig};

use crate::error::ConfigError;

/// File name looked up under `.claude/` in the project and home directories.
pub const CONFIG_FILE: &str = "statusline.yaml";

/// Environment variable naming an explicit config file (replaces discovery).
pub const CONFIG_ENV: &str = "CCLINE_CONFIG";

/// Environment variable forcing single-line output.
pub const SINGLE_LINE_ENV: &str = "CCLINE_SINGLE_LINE";

/// Load the layered config: explicit path, or project over global over
/// defaults. Broken layers are warned about and skipped.
pub fn load(explicit: Option<&Path>, project_dir: &str) -> StatuslineConfig {
    let mut config = StatuslineConfig::default();

    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from));

    let layers: Vec<PathBuf> = match explicit {
        Some(path) => vec![path],
        None => {
            let mut paths = Vec::new();
            if let Some(global) = global_path() {
                paths.push(global);
            }
            if !project_dir.is_empty() {
                paths.push(project_path(Path::new(project_dir)));
            }
            paths
        }
    };

    for path in layers {
        match read_layer(&path) {
            Ok(Some(layer)) => {
                tracing::debug!("config layer {}", path.display());
                config.apply(layer);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("{}", e),
        }
    }

    if let Some(forced) = single_line_override() {
        config.single_line = forced;
    }

    config
}

/// Read one layer. A missing file is `Ok(None)`.
pub fn read_layer(path: &Path) -> Result<Option<ConfigLayer>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Some(ConfigLayer::default()));
    }
    serde_yaml::from_str(&contents)
        .map(Some)
        .map_err(|source| ConfigError::Yaml {
            path: path.display().to_string(),
            source,
        })
}

/// `~/.claude/statusline.yaml`.
pub fn global_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".claude").join(CONFIG_FILE))
}

/// `<project>/.claude/statusline.yaml`.
pub fn project_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".claude").join(CONFIG_FILE)
}

/// `Some(true)` for `1`/`true`/`yes`, `Some(false)` for `0`/`false`/`no`.
fn single_line_override() -> Option<bool> {
    parse_flag(&std::env::var(SINGLE_LINE_ENV).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Commented default written by `ccline init`.
pub const DEFAULT_CONFIG_YAML: &str = r#"# ccline status line configuration.
# Project files (.claude/statusline.yaml) override ~/.claude/statusline.yaml.

# Collapse every row into one line (CCLINE_SINGLE_LINE=1 also forces this).
single_line: false

# Content types to collect. Empty means all; see `ccline types`.
show: []
hide: [clock]

# Context bar: blocks | ascii | dots
bar_style: blocks
bar_width: 10

# strftime-style format for the clock content type.
time_format: "%H:%M"

# GitHub-style releases endpoint returning {"tag_name": "vX.Y.Z"}.
# update_check_url: https://api.github.com/repos/OWNER/ccline/releases/latest

# Extra fragments built from content types.
# composers:
#   - name: where
#     inputs: [folder, git-branch]
#     template: "{folder}@{git-branch}"
#   - name: versions
#     inputs: [version, output-style]
#     separator: " / "

# Extra grid placements (4 rows x 4 columns).
# cells:
#   - { name: where, row: 3, col: 0, optional: true }
"#;
