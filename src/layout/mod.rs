//! Fixed-size grid placement of named fragments.

pub mod render;
pub mod width;

use crate::compose::Fragments;
use crate::config::CellConfig;
use crate::error::ConfigError;

pub const ROWS: usize = 4;
pub const COLS: usize = 4;

/// Joins fragments that share a grid position. Rendered as [`render::MERGE_SEPARATOR`].
pub const MERGE_MARK: char = '\u{1f}';

/// A fragment bound to a grid position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub name: String,
    pub row: usize,
    pub col: usize,
    /// Optional cells vanish when their fragment is empty.
    pub optional: bool,
}

impl Cell {
    pub fn new(name: &str, row: usize, col: usize, optional: bool) -> Self {
        Self {
            name: name.to_string(),
            row,
            col,
            optional,
        }
    }

    fn from_config(cfg: &CellConfig) -> Result<Self, ConfigError> {
        if cfg.row >= ROWS || cfg.col >= COLS {
            return Err(ConfigError::CellOutOfRange {
                name: cfg.name.clone(),
                row: cfg.row,
                col: cfg.col,
                rows: ROWS,
                cols: COLS,
            });
        }
        Ok(Self::new(&cfg.name, cfg.row, cfg.col, cfg.optional))
    }
}

#[derive(Debug, Clone)]
pub struct Layout {
    cells: Vec<Cell>,
}

impl Layout {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    pub fn default_layout() -> Self {
        Self::new(vec![
            Cell::new("folder", 0, 0, false),
            Cell::new("git", 0, 1, true),
            Cell::new("model-info", 0, 2, false),
            Cell::new("memory", 1, 0, true),
            Cell::new("todo", 1, 1, true),
            Cell::new("session", 1, 1, true),
            Cell::new("quota", 1, 2, true),
            Cell::new("cost", 1, 3, true),
            Cell::new("agents", 2, 0, true),
            Cell::new("style", 2, 1, true),
            Cell::new("version", 2, 2, true),
            Cell::new("clock", 2, 3, true),
        ])
    }

    /// This layout plus configured cells. Out-of-range cells are warned
    /// about and dropped.
    pub fn extended(mut self, configured: &[CellConfig]) -> Self {
        for cfg in configured {
            match Cell::from_config(cfg) {
                Ok(cell) => self.cells.push(cell),
                Err(e) => tracing::warn!("{}", e),
            }
        }
        self
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }
}

/// Fragment text placed on the `ROWS x COLS` matrix for one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(layout: &Layout, fragments: &Fragments) -> Self {
        let mut rows = vec![vec![String::new(); COLS]; ROWS];
        for cell in layout.cells() {
            let text = fragments.get(&cell.name).map(|s| s.trim()).unwrap_or("");
            if text.is_empty() {
                if !cell.optional {
                    tracing::debug!("fragment '{}' is empty", cell.name);
                }
                continue;
            }
            let slot = &mut rows[cell.row][cell.col];
            if !slot.is_empty() {
                slot.push(MERGE_MARK);
            }
            slot.push_str(text);
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
}
