//! Screen geometry of the grid, shared by rendering and mouse hit-testing.

use ratatui::layout::Rect;

use crate::application::PointerTarget;
use crate::domain::{CellPosition, Grid, MetadataRow};

/// Size units covered by one terminal column.
pub const CHAR_UNITS: i32 = 8;
/// Size units covered by one terminal line.
pub const LINE_UNITS: i32 = 20;

const MIN_COLUMN_CHARS: u16 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpan {
    pub column: usize,
    pub x: u16,
    pub width: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    pub row: usize,
    pub y: u16,
    pub height: u16,
}

/// Where every visible lane sits on screen for the last drawn frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridLayout {
    pub area: Rect,
    pub row_header_width: u16,
    pub columns: Vec<ColumnSpan>,
    pub rows: Vec<RowSpan>,
}

pub fn column_chars(width: u32) -> u16 {
    ((width as i32 / CHAR_UNITS) as u16).max(MIN_COLUMN_CHARS)
}

pub fn row_lines(height: u32) -> u16 {
    ((height as i32 / LINE_UNITS) as u16).max(1)
}

impl GridLayout {
    /// Lays out the lanes starting at `scroll_row`/`scroll_col` inside `area`.
    /// Lanes are separated by one blank column; row 0 always takes the first line.
    pub fn compute(area: Rect, grid: &Grid, scroll_row: usize, scroll_col: usize) -> Self {
        let label_width = MetadataRow::ALL
            .iter()
            .map(|m| m.label().len())
            .chain(std::iter::once(grid.data_row_count().to_string().len()))
            .max()
            .unwrap_or(1) as u16;
        let row_header_width = (label_width + 1).min(area.width);

        let right = area.x + area.width;
        let mut x = area.x + row_header_width + 1;
        let mut columns = Vec::new();
        for column in scroll_col.max(1)..grid.column_count() {
            if x >= right {
                break;
            }
            let mut width = column_chars(grid.column_width(column));
            if x + width > right {
                if !columns.is_empty() {
                    break;
                }
                width = right - x;
            }
            columns.push(ColumnSpan { column, x, width });
            x += width + 1;
        }

        let bottom = area.y + area.height;
        let mut y = area.y + 1;
        let mut rows = Vec::new();
        for row in scroll_row.max(1)..grid.row_count() {
            let height = row_lines(grid.row_height(row));
            if y + height > bottom {
                break;
            }
            rows.push(RowSpan { row, y, height });
            y += height;
        }

        Self {
            area,
            row_header_width,
            columns,
            rows,
        }
    }

    fn column_at(&self, x: u16) -> Option<&ColumnSpan> {
        self.columns.iter().find(|c| x >= c.x && x < c.x + c.width)
    }

    fn row_at(&self, y: u16) -> Option<&RowSpan> {
        self.rows.iter().find(|r| y >= r.y && y < r.y + r.height)
    }

    fn in_row_header(&self, x: u16) -> bool {
        x >= self.area.x && x < self.area.x + self.row_header_width
    }

    /// What a click at `(x, y)` lands on. The last character of a column
    /// header and of a row header is the resize grip; the last character of
    /// the `fill_handle` cell is the fill handle.
    pub fn hit_test(&self, x: u16, y: u16, fill_handle: CellPosition) -> Option<PointerTarget> {
        let area = self.area;
        if x < area.x || x >= area.x + area.width || y < area.y || y >= area.y + area.height {
            return None;
        }

        if y == area.y {
            if self.in_row_header(x) {
                return Some(PointerTarget::Corner);
            }
            let span = self.column_at(x)?;
            return Some(if x == span.x + span.width - 1 {
                PointerTarget::ColumnBorder(span.column)
            } else {
                PointerTarget::ColumnHeader(span.column)
            });
        }

        let row = self.row_at(y)?;
        if self.in_row_header(x) {
            return Some(if x == area.x + self.row_header_width - 1 {
                PointerTarget::RowBorder(row.row)
            } else {
                PointerTarget::RowHeader(row.row)
            });
        }

        let column = self.column_at(x)?;
        let position = CellPosition::new(row.row, column.column);
        if position == fill_handle && x == column.x + column.width - 1 && y == row.y {
            return Some(PointerTarget::FillHandle);
        }
        Some(PointerTarget::Cell(position))
    }

    /// Nearest cell to `(x, y)` while dragging. Points past the last visible
    /// lane resolve to the lane after it so that drags can reach off screen.
    pub fn cell_at(&self, x: u16, y: u16) -> CellPosition {
        let column = match (self.columns.first(), self.columns.last()) {
            (Some(first), Some(last)) => {
                if x < first.x {
                    first.column.saturating_sub(1)
                } else if x >= last.x + last.width {
                    last.column + 1
                } else {
                    self.columns
                        .iter()
                        .rev()
                        .find(|c| x >= c.x)
                        .map_or(first.column, |c| c.column)
                }
            }
            _ => 0,
        };
        let row = match (self.rows.first(), self.rows.last()) {
            (Some(first), Some(last)) => {
                if y < first.y {
                    first.row.saturating_sub(1)
                } else if y >= last.y + last.height {
                    last.row + 1
                } else {
                    self.row_at(y).map_or(first.row, |r| r.row)
                }
            }
            _ => 0,
        };
        CellPosition::new(row, column)
    }

    /// Pointer position in size units, for resizing.
    pub fn units(x: u16, y: u16) -> (i32, i32) {
        (i32::from(x) * CHAR_UNITS, i32::from(y) * LINE_UNITS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FIRST_DATA_ROW;

    fn layout() -> GridLayout {
        let mut grid = Grid::new(30, 50);
        grid.set_column_width(2, 160);
        grid.set_row_height(FIRST_DATA_ROW, 40);
        GridLayout::compute(Rect::new(0, 0, 60, 12), &grid, 1, 1)
    }

    #[test]
    fn test_compute_spans() {
        let layout = layout();
        assert_eq!(layout.row_header_width, 11);
        assert_eq!(layout.columns[0], ColumnSpan { column: 1, x: 12, width: 12 });
        assert_eq!(layout.columns[1], ColumnSpan { column: 2, x: 25, width: 20 });
        assert_eq!(layout.columns.len(), 3);
        assert_eq!(layout.columns[2].width, 12);

        assert_eq!(layout.rows[0], RowSpan { row: 1, y: 1, height: 1 });
        assert_eq!(layout.rows[5], RowSpan { row: FIRST_DATA_ROW, y: 6, height: 2 });
        assert_eq!(layout.rows.len(), 10);
    }

    #[test]
    fn test_hit_test_headers() {
        let layout = layout();
        let handle = CellPosition::new(FIRST_DATA_ROW, 1);
        assert_eq!(layout.hit_test(3, 0, handle), Some(PointerTarget::Corner));
        assert_eq!(layout.hit_test(13, 0, handle), Some(PointerTarget::ColumnHeader(1)));
        assert_eq!(layout.hit_test(23, 0, handle), Some(PointerTarget::ColumnBorder(1)));
        assert_eq!(layout.hit_test(24, 0, handle), None);
        assert_eq!(layout.hit_test(2, 3, handle), Some(PointerTarget::RowHeader(3)));
        assert_eq!(layout.hit_test(10, 3, handle), Some(PointerTarget::RowBorder(3)));
    }

    #[test]
    fn test_hit_test_cells_and_fill_handle() {
        let layout = layout();
        let handle = CellPosition::new(FIRST_DATA_ROW, 1);
        assert_eq!(
            layout.hit_test(15, 7, handle),
            Some(PointerTarget::Cell(CellPosition::new(FIRST_DATA_ROW, 1)))
        );
        assert_eq!(layout.hit_test(23, 6, handle), Some(PointerTarget::FillHandle));
        assert_eq!(
            layout.hit_test(23, 7, handle),
            Some(PointerTarget::Cell(CellPosition::new(FIRST_DATA_ROW, 1)))
        );
        assert_eq!(layout.hit_test(70, 3, handle), None);
    }

    #[test]
    fn test_cell_at_beyond_edges() {
        let layout = layout();
        assert_eq!(layout.cell_at(30, 2), CellPosition::new(2, 2));
        assert_eq!(layout.cell_at(59, 11), CellPosition::new(10, 4));
        assert_eq!(layout.cell_at(24, 4), CellPosition::new(4, 1));
        assert_eq!(layout.cell_at(2, 0), CellPosition::new(0, 0));
    }
}
