use super::width::{display_width, pad_right, strip_ansi};
use super::{Grid, MERGE_MARK};

pub const SEPARATOR: &str = " | ";
pub const MERGE_SEPARATOR: &str = " \u{b7} ";

/// Drop blank cells, shift the rest left, and drop rows left empty.
pub fn compact(grid: &Grid) -> Vec<Vec<String>> {
    grid.rows()
        .iter()
        .map(|row| {
            row.iter()
                .filter(|cell| !strip_ansi(cell).trim().is_empty())
                .cloned()
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect()
}

/// Widest leading segment per column. Text after a merge mark is not
/// measured.
pub fn column_widths(rows: &[Vec<String>]) -> Vec<usize> {
    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0; cols];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let lead = cell.split(MERGE_MARK).next().unwrap_or("");
            widths[i] = widths[i].max(display_width(lead));
        }
    }
    widths
}

/// One aligned line per non-empty grid row.
pub fn render(grid: &Grid) -> Vec<String> {
    let rows = compact(grid);
    let widths = column_widths(&rows);
    let multi_row = rows.len() > 1;

    rows.iter()
        .map(|row| {
            if row.len() == 1 {
                let text = merged(&row[0]);
                return if multi_row {
                    pad_right(&text, widths[0])
                } else {
                    text
                };
            }
            let last = row.len() - 1;
            row.iter()
                .enumerate()
                .map(|(i, cell)| {
                    let text = merged(cell);
                    if i == last {
                        text
                    } else {
                        pad_right(&text, widths[i])
                    }
                })
                .collect::<Vec<_>>()
                .join(SEPARATOR)
        })
        .collect()
}

/// The rendered lines joined into one.
pub fn render_single_line(grid: &Grid) -> String {
    render(grid).join(SEPARATOR)
}

fn merged(cell: &str) -> String {
    cell.split(MERGE_MARK).collect::<Vec<_>>().join(MERGE_SEPARATOR)
}
