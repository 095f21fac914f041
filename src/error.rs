use thiserror::Error;

/// Failures that stop a render before anything reaches stdout.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("failed to read stdin: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid status line input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure of a single collector. Never fatal: the content type is omitted.
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("{0} is not installed")]
    ToolMissing(&'static str),

    #[error("{0} is not available")]
    Missing(&'static str),

    #[error("{0} unavailable: {1}")]
    Unavailable(&'static str, String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Template parse/evaluation failure. Composers recover from it locally.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder {{{0}}}")]
    UnknownField(String),

    #[error("empty placeholder at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("unbalanced brace at byte {0}")]
    Unbalanced(usize),
}

/// Config layering problems. Reported as warnings; the layer is skipped.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("yaml parse error in {path}: {source}")]
    Yaml {
        path: String,
        source: serde_yaml::Error,
    },

    #[error("unknown content type '{0}'")]
    UnknownContentType(String),

    #[error("cell '{name}' at ({row},{col}) is outside the {rows}x{cols} grid")]
    CellOutOfRange {
        name: String,
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}
