//! Clipboard interchange: serializing a rectangle for the system clipboard and
//! planning the cell changes of a paste.

use std::fmt;

use super::command::CellChange;
use super::errors::DomainResult;
use super::models::{CellPosition, CellRange, Grid};

/// What a copy puts on the clipboard: tab/newline text and an HTML table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClipboardPayload {
    pub text: String,
    pub html: String,
}

pub fn serialize_range(grid: &Grid, range: &CellRange) -> ClipboardPayload {
    let values = grid.values(range);

    let text = values
        .iter()
        .map(|row| row.join("\t"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut html = String::from("<table>");
    for row in &values {
        html.push_str("<tr>");
        for value in row {
            html.push_str("<td>");
            html.push_str(&escape_html(value));
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");

    ClipboardPayload { text, html }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\n' => escaped.push_str("<br>"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Splits clipboard text into rows of cells. A single trailing line break,
/// as added by most spreadsheet applications, does not produce an extra row.
pub fn parse_text(text: &str) -> Vec<Vec<String>> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let body = normalized.strip_suffix('\n').unwrap_or(&normalized);
    if body.is_empty() {
        return Vec::new();
    }
    body.lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteMode {
    /// The source lands once at the target's top-left cell.
    Normal,
    /// The source repeats across a larger multi-cell target.
    Tile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PastePlan {
    pub mode: PasteMode,
    pub changes: Vec<CellChange>,
    /// Cells written by the paste, to select afterwards.
    pub range: CellRange,
}

/// Computes the cell changes for pasting `source` into `target`.
///
/// Anything that would land past the last row or column is dropped. Returns
/// `None` for an empty source.
pub fn plan_paste(grid: &Grid, source: &[Vec<String>], target: CellRange) -> Option<PastePlan> {
    let source_rows = source.len();
    let source_columns = source.iter().map(Vec::len).max().unwrap_or(0);
    if source_rows == 0 || source_columns == 0 {
        return None;
    }

    let tile = !target.is_single_cell()
        && target.row_count() >= source_rows
        && target.column_count() >= source_columns;

    let (mode, area) = if tile {
        (PasteMode::Tile, target)
    } else {
        let origin = target.top_left();
        (
            PasteMode::Normal,
            CellRange::from_bounds(
                origin.row,
                origin.column,
                origin.row + source_rows - 1,
                origin.column + source_columns - 1,
            ),
        )
    };

    let area = CellRange::new(
        area.top_left(),
        CellPosition::new(area.end_row.min(grid.last_row()), area.end_column.min(grid.last_column())),
    );

    let changes = area
        .positions()
        .map(|position| {
            let row = (position.row - area.start_row) % source_rows;
            let column = (position.column - area.start_column) % source_columns;
            let value = source[row].get(column).cloned().unwrap_or_default();
            CellChange::new(
                position.row,
                position.column,
                grid.cell(position.row, position.column),
                value,
            )
        })
        .collect();

    Some(PastePlan {
        mode,
        changes,
        range: area,
    })
}

/// Access to a clipboard shared with other applications.
pub trait ClipboardBackend: fmt::Debug {
    fn write(&mut self, payload: &ClipboardPayload) -> DomainResult<()>;

    /// Plain text currently on the clipboard, `None` if it holds no text.
    fn read_text(&mut self) -> DomainResult<Option<String>>;
}

/// In-process clipboard used when no system clipboard is available.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    payload: Option<ClipboardPayload>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> Option<&ClipboardPayload> {
        self.payload.as_ref()
    }
}

impl ClipboardBackend for MemoryClipboard {
    fn write(&mut self, payload: &ClipboardPayload) -> DomainResult<()> {
        self.payload = Some(payload.clone());
        Ok(())
    }

    fn read_text(&mut self) -> DomainResult<Option<String>> {
        Ok(self.payload.as_ref().map(|p| p.text.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FIRST_DATA_ROW;

    fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
        data.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_serialize_range() {
        let mut grid = Grid::new(3, 5);
        grid.set_cell(FIRST_DATA_ROW, 1, "a");
        grid.set_cell(FIRST_DATA_ROW, 2, "<b>");
        grid.set_cell(FIRST_DATA_ROW + 1, 1, "c & d");
        let range = CellRange::from_bounds(FIRST_DATA_ROW, 1, FIRST_DATA_ROW + 1, 2);

        let payload = serialize_range(&grid, &range);
        assert_eq!(payload.text, "a\t<b>\nc & d\t");
        assert_eq!(
            payload.html,
            "<table><tr><td>a</td><td>&lt;b&gt;</td></tr><tr><td>c &amp; d</td><td></td></tr></table>"
        );
    }

    #[test]
    fn test_parse_text() {
        assert_eq!(parse_text("a\tb\r\nc\td\r\n"), rows(&[&["a", "b"], &["c", "d"]]));
        assert_eq!(parse_text("x"), rows(&[&["x"]]));
        assert_eq!(parse_text("\t\n"), rows(&[&["", ""]]));
        assert!(parse_text("").is_empty());
        assert!(parse_text("\n").is_empty());
    }

    #[test]
    fn test_paste_tiles_larger_target() {
        let grid = Grid::new(6, 10);
        let source = rows(&[&["a", "b"], &["c", "d"]]);
        let target = CellRange::from_bounds(FIRST_DATA_ROW, 1, FIRST_DATA_ROW + 3, 4);

        let plan = plan_paste(&grid, &source, target).unwrap();
        assert_eq!(plan.mode, PasteMode::Tile);
        assert_eq!(plan.range, target);
        assert_eq!(plan.changes.len(), 16);
        for change in &plan.changes {
            let r = (change.row - FIRST_DATA_ROW) % 2;
            let c = (change.column - 1) % 2;
            assert_eq!(change.new_value, source[r][c]);
        }
    }

    #[test]
    fn test_paste_into_single_cell_is_normal() {
        let grid = Grid::new(6, 10);
        let source = rows(&[&["a", "b"], &["c", "d"]]);
        let target = CellRange::single(CellPosition::new(FIRST_DATA_ROW + 2, 3));

        let plan = plan_paste(&grid, &source, target).unwrap();
        assert_eq!(plan.mode, PasteMode::Normal);
        assert_eq!(
            plan.range,
            CellRange::from_bounds(FIRST_DATA_ROW + 2, 3, FIRST_DATA_ROW + 3, 4)
        );
    }

    #[test]
    fn test_paste_into_smaller_range_is_normal() {
        let grid = Grid::new(6, 10);
        let source = rows(&[&["a", "b", "c"]]);
        let target = CellRange::from_bounds(FIRST_DATA_ROW, 1, FIRST_DATA_ROW + 1, 2);
        let plan = plan_paste(&grid, &source, target).unwrap();
        assert_eq!(plan.mode, PasteMode::Normal);
        assert_eq!(plan.range, CellRange::from_bounds(FIRST_DATA_ROW, 1, FIRST_DATA_ROW, 3));
    }

    #[test]
    fn test_paste_truncates_at_table_edge() {
        let grid = Grid::new(2, 2);
        let source = rows(&[&["a", "b", "c"], &["d", "e", "f"], &["g", "h", "i"]]);
        let target = CellRange::single(CellPosition::new(grid.last_row(), 2));

        let plan = plan_paste(&grid, &source, target).unwrap();
        assert_eq!(plan.range, CellRange::single(CellPosition::new(grid.last_row(), 2)));
        assert_eq!(plan.changes.len(), 1);
        assert_eq!(plan.changes[0].new_value, "a");
    }

    #[test]
    fn test_paste_records_old_values() {
        let mut grid = Grid::new(2, 2);
        grid.set_cell(FIRST_DATA_ROW, 1, "old");
        let plan = plan_paste(&grid, &rows(&[&["new"]]), CellRange::single(CellPosition::new(FIRST_DATA_ROW, 1))).unwrap();
        assert_eq!(plan.changes, vec![CellChange::new(FIRST_DATA_ROW, 1, "old", "new")]);
    }

    #[test]
    fn test_empty_source_plans_nothing() {
        let grid = Grid::new(2, 2);
        assert!(plan_paste(&grid, &[], grid.data_region()).is_none());
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::new();
        assert_eq!(clipboard.read_text().unwrap(), None);
        let payload = ClipboardPayload { text: "a\tb".to_string(), html: String::new() };
        clipboard.write(&payload).unwrap();
        assert_eq!(clipboard.read_text().unwrap().as_deref(), Some("a\tb"));
    }
}
