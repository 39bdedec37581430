//! Rectangular selection, lane selection, fill handle and drag tracking.
//!
//! Coordinates are always clamped into `1..=last_row` and `1..=last_column`;
//! the header lanes at index 0 can never be part of a selection.

use super::fill_series::FillDirection;
use super::models::{shift_lane, CellPosition, CellRange, Grid, FIRST_DATA_ROW};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    Cell,
    Row,
    Column,
    All,
}

/// The single multi-event gesture in progress, if any.
///
/// `update_*` handlers only act when the matching variant is active, so
/// late or out-of-order pointer events are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Idle,
    ResizingColumn { index: usize, origin: i32, start_size: u32 },
    ResizingRow { index: usize, origin: i32, start_size: u32 },
    SelectingRange,
    SelectingColumn,
    SelectingRow,
    Filling { target: CellPosition },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Down,
    Up,
    Right,
    Left,
}

impl StepDirection {
    pub fn delta(self) -> (isize, isize) {
        match self {
            StepDirection::Down => (1, 0),
            StepDirection::Up => (-1, 0),
            StepDirection::Right => (0, 1),
            StepDirection::Left => (0, -1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillInfo {
    pub direction: FillDirection,
    pub source_range: CellRange,
    pub target_range: CellRange,
    pub count: usize,
}

impl FillInfo {
    /// Derives the fill from the source rectangle and the cell the handle was
    /// dragged to. Diagonal targets and targets inside the source yield `None`.
    pub fn compute(source: CellRange, target: CellPosition) -> Option<FillInfo> {
        let (direction, target_range, count) = if target.row > source.end_row
            && source.contains_column(target.column)
        {
            (
                FillDirection::Down,
                CellRange::from_bounds(source.end_row + 1, source.start_column, target.row, source.end_column),
                target.row - source.end_row,
            )
        } else if target.row < source.start_row && source.contains_column(target.column) {
            (
                FillDirection::Up,
                CellRange::from_bounds(target.row, source.start_column, source.start_row - 1, source.end_column),
                source.start_row - target.row,
            )
        } else if target.column > source.end_column && source.contains_row(target.row) {
            (
                FillDirection::Right,
                CellRange::from_bounds(source.start_row, source.end_column + 1, source.end_row, target.column),
                target.column - source.end_column,
            )
        } else if target.column < source.start_column && source.contains_row(target.row) {
            (
                FillDirection::Left,
                CellRange::from_bounds(source.start_row, target.column, source.end_row, source.start_column - 1),
                source.start_column - target.column,
            )
        } else {
            return None;
        };

        Some(FillInfo {
            direction,
            source_range: source,
            target_range,
            count,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    anchor: CellPosition,
    focus: CellPosition,
    kind: SelectionKind,
    drag: DragMode,
    locked_range: Option<CellRange>,
    copy_range: Option<CellRange>,
    last_row: usize,
    last_column: usize,
}

impl Selection {
    pub fn new(last_row: usize, last_column: usize) -> Self {
        let last_row = last_row.max(1);
        let last_column = last_column.max(1);
        let origin = CellPosition::new(FIRST_DATA_ROW.min(last_row), 1);
        Self {
            anchor: origin,
            focus: origin,
            kind: SelectionKind::Cell,
            drag: DragMode::Idle,
            locked_range: None,
            copy_range: None,
            last_row,
            last_column,
        }
    }

    /// Adopts new grid extents after a structural edit and re-clamps every
    /// tracked coordinate.
    pub fn set_bounds(&mut self, last_row: usize, last_column: usize) {
        self.last_row = last_row.max(1);
        self.last_column = last_column.max(1);
        self.anchor = self.clamp(self.anchor.row, self.anchor.column);
        self.focus = self.clamp(self.focus.row, self.focus.column);
        self.locked_range = self.locked_range.and_then(|r| self.clip(r));
        self.copy_range = self.copy_range.and_then(|r| self.clip(r));
        if let DragMode::Filling { target } = self.drag {
            self.drag = DragMode::Filling {
                target: self.clamp(target.row, target.column),
            };
        }
    }

    pub fn last_row(&self) -> usize {
        self.last_row
    }

    pub fn last_column(&self) -> usize {
        self.last_column
    }

    fn clamp(&self, row: usize, column: usize) -> CellPosition {
        CellPosition::new(row.clamp(1, self.last_row), column.clamp(1, self.last_column))
    }

    fn clip(&self, range: CellRange) -> Option<CellRange> {
        if range.start_row > self.last_row || range.start_column > self.last_column {
            return None;
        }
        Some(CellRange::from_bounds(
            range.start_row.max(1),
            range.start_column.max(1),
            range.end_row.min(self.last_row),
            range.end_column.min(self.last_column),
        ))
    }

    fn offset(&self, position: CellPosition, delta: (isize, isize)) -> CellPosition {
        let row = position.row.saturating_add_signed(delta.0);
        let column = position.column.saturating_add_signed(delta.1);
        self.clamp(row, column)
    }

    pub fn start(&mut self, row: usize, column: usize) {
        let position = self.clamp(row, column);
        self.anchor = position;
        self.focus = position;
        self.kind = SelectionKind::Cell;
        self.locked_range = None;
        self.drag = DragMode::SelectingRange;
    }

    pub fn update(&mut self, row: usize, column: usize) {
        if self.drag != DragMode::SelectingRange {
            return;
        }
        self.focus = self.clamp(row, column);
    }

    /// Moves the focus regardless of drag state (Shift+click, Shift+arrow).
    pub fn extend_selection(&mut self, row: usize, column: usize) {
        self.focus = self.clamp(row, column);
        self.kind = SelectionKind::Cell;
        self.locked_range = None;
    }

    pub fn extend_by(&mut self, delta: (isize, isize)) {
        let focus = self.offset(self.focus, delta);
        self.extend_selection(focus.row, focus.column);
    }

    pub fn end(&mut self) {
        if matches!(
            self.drag,
            DragMode::SelectingRange | DragMode::SelectingColumn | DragMode::SelectingRow
        ) {
            self.drag = DragMode::Idle;
        }
    }

    pub fn select_column(&mut self, column: usize) {
        let column = self.clamp(1, column).column;
        self.anchor = CellPosition::new(1, column);
        self.focus = CellPosition::new(self.last_row, column);
        self.kind = SelectionKind::Column;
        self.locked_range = None;
        self.drag = DragMode::SelectingColumn;
    }

    pub fn update_column(&mut self, column: usize) {
        if self.drag != DragMode::SelectingColumn {
            return;
        }
        self.focus.column = self.clamp(1, column).column;
    }

    pub fn select_row(&mut self, row: usize) {
        let row = self.clamp(row, 1).row;
        self.anchor = CellPosition::new(row, 1);
        self.focus = CellPosition::new(row, self.last_column);
        self.kind = SelectionKind::Row;
        self.locked_range = None;
        self.drag = DragMode::SelectingRow;
    }

    pub fn update_row(&mut self, row: usize) {
        if self.drag != DragMode::SelectingRow {
            return;
        }
        self.focus.row = self.clamp(row, 1).row;
    }

    /// Shift+column header: spans from the anchor's column to `column`.
    pub fn extend_to_column(&mut self, column: usize) {
        let column = self.clamp(1, column).column;
        self.anchor.row = 1;
        self.focus = CellPosition::new(self.last_row, column);
        self.kind = SelectionKind::Column;
        self.locked_range = None;
    }

    /// Shift+row header: spans from the anchor's row to `row`.
    pub fn extend_to_row(&mut self, row: usize) {
        let row = self.clamp(row, 1).row;
        self.anchor.column = 1;
        self.focus = CellPosition::new(row, self.last_column);
        self.kind = SelectionKind::Row;
        self.locked_range = None;
    }

    /// Ctrl+column header: grows the rectangle to the envelope that also
    /// covers `column`.
    pub fn add_column(&mut self, column: usize) {
        let column = self.clamp(1, column).column;
        let lane = CellRange::from_bounds(1, column, self.last_row, column);
        let envelope = self.range().union(&lane);
        self.anchor = envelope.top_left();
        self.focus = envelope.bottom_right();
        self.kind = SelectionKind::Column;
        self.locked_range = None;
    }

    pub fn add_row(&mut self, row: usize) {
        let row = self.clamp(row, 1).row;
        let lane = CellRange::from_bounds(row, 1, row, self.last_column);
        let envelope = self.range().union(&lane);
        self.anchor = envelope.top_left();
        self.focus = envelope.bottom_right();
        self.kind = SelectionKind::Row;
        self.locked_range = None;
    }

    pub fn select_all(&mut self) {
        self.anchor = CellPosition::new(1, 1);
        self.focus = CellPosition::new(self.last_row, self.last_column);
        self.kind = SelectionKind::All;
        self.locked_range = None;
        self.drag = DragMode::Idle;
    }

    pub fn move_to(&mut self, row: usize, column: usize) {
        let position = self.clamp(row, column);
        self.anchor = position;
        self.focus = position;
        self.kind = SelectionKind::Cell;
        self.locked_range = None;
    }

    pub fn move_by(&mut self, delta: (isize, isize)) {
        let position = self.offset(self.anchor, delta);
        self.move_to(position.row, position.column);
    }

    pub fn set_range(&mut self, range: CellRange) {
        self.anchor = self.clamp(range.start_row, range.start_column);
        self.focus = self.clamp(range.end_row, range.end_column);
        self.kind = SelectionKind::Cell;
        self.locked_range = None;
    }

    /// Puts back a rectangle and copy indicator recorded by the history.
    pub fn restore(&mut self, range: CellRange, copy_range: Option<CellRange>) {
        self.set_range(range);
        self.copy_range = copy_range.and_then(|r| self.clip(r));
    }

    /// The active rectangle: the locked range while cycling, otherwise the
    /// normalized anchor/focus pair.
    pub fn range(&self) -> CellRange {
        self.locked_range
            .unwrap_or_else(|| CellRange::new(self.anchor, self.focus))
    }

    /// Steps the active cell through the selected rectangle (Enter/Tab).
    ///
    /// Vertical steps walk down a column and continue at the top of the next
    /// one; horizontal steps walk along a row and continue on the next row.
    /// Past the last cell the walk wraps to the opposite corner. A single
    /// cell selection just moves.
    pub fn move_within_selection(&mut self, direction: StepDirection) {
        let range = self.range();
        if range.is_single_cell() {
            self.move_by(direction.delta());
            return;
        }

        let current = if range.contains(self.anchor) {
            self.anchor
        } else {
            range.top_left()
        };
        let (row, column) = (current.row, current.column);

        let next = match direction {
            StepDirection::Down => {
                if row < range.end_row {
                    CellPosition::new(row + 1, column)
                } else if column < range.end_column {
                    CellPosition::new(range.start_row, column + 1)
                } else {
                    range.top_left()
                }
            }
            StepDirection::Up => {
                if row > range.start_row {
                    CellPosition::new(row - 1, column)
                } else if column > range.start_column {
                    CellPosition::new(range.end_row, column - 1)
                } else {
                    range.bottom_right()
                }
            }
            StepDirection::Right => {
                if column < range.end_column {
                    CellPosition::new(row, column + 1)
                } else if row < range.end_row {
                    CellPosition::new(row + 1, range.start_column)
                } else {
                    range.top_left()
                }
            }
            StepDirection::Left => {
                if column > range.start_column {
                    CellPosition::new(row, column - 1)
                } else if row > range.start_row {
                    CellPosition::new(row - 1, range.end_column)
                } else {
                    range.bottom_right()
                }
            }
        };

        self.locked_range = Some(range);
        self.anchor = next;
        self.focus = next;
    }

    pub fn start_fill(&mut self) {
        self.drag = DragMode::Filling {
            target: self.range().bottom_right(),
        };
    }

    pub fn update_fill(&mut self, row: usize, column: usize) {
        let position = self.clamp(row, column);
        if let DragMode::Filling { target } = &mut self.drag {
            *target = position;
        }
    }

    /// Finishes a fill drag, returning the fill to apply if the handle ended
    /// in a valid direction.
    pub fn end_fill(&mut self) -> Option<FillInfo> {
        if !self.is_filling() {
            return None;
        }
        let info = self.fill_info();
        self.drag = DragMode::Idle;
        info
    }

    pub fn fill_target(&self) -> Option<CellPosition> {
        match self.drag {
            DragMode::Filling { target } => Some(target),
            _ => None,
        }
    }

    pub fn fill_info(&self) -> Option<FillInfo> {
        FillInfo::compute(self.range(), self.fill_target()?)
    }

    /// Fill down to the last data row holding any value in the selected
    /// columns.
    pub fn auto_fill_down(&self, grid: &Grid) -> Option<FillInfo> {
        let range = self.range();
        let last = grid.last_filled_row(range.start_column, range.end_column)?;
        if last <= range.end_row {
            return None;
        }
        FillInfo::compute(range, CellPosition::new(last, range.start_column))
    }

    pub fn set_copy_range(&mut self, range: Option<CellRange>) {
        self.copy_range = range;
    }

    pub fn clear_copy_range(&mut self) {
        self.copy_range = None;
    }

    pub fn has_copy_range(&self) -> bool {
        self.copy_range.is_some()
    }

    pub fn copy_range(&self) -> Option<CellRange> {
        self.copy_range
    }

    /// Renumbers tracked rows after a row was inserted (`inserted`) or
    /// removed at `index`.
    pub fn shift_rows(&mut self, index: usize, inserted: bool) {
        let shift = |row: usize| shift_lane(row, index, inserted);
        self.anchor.row = shift(self.anchor.row);
        self.focus.row = shift(self.focus.row);
        let shift_range = |r: CellRange| CellRange::from_bounds(shift(r.start_row), r.start_column, shift(r.end_row), r.end_column);
        self.locked_range = self.locked_range.map(&shift_range);
        self.copy_range = self.copy_range.map(shift_range);
    }

    pub fn shift_columns(&mut self, index: usize, inserted: bool) {
        let shift = |column: usize| shift_lane(column, index, inserted);
        self.anchor.column = shift(self.anchor.column);
        self.focus.column = shift(self.focus.column);
        let shift_range = |r: CellRange| CellRange::from_bounds(r.start_row, shift(r.start_column), r.end_row, shift(r.end_column));
        self.locked_range = self.locked_range.map(&shift_range);
        self.copy_range = self.copy_range.map(shift_range);
    }

    pub fn set_drag(&mut self, drag: DragMode) {
        self.drag = drag;
    }

    pub fn drag(&self) -> DragMode {
        self.drag
    }

    pub fn is_selecting(&self) -> bool {
        matches!(
            self.drag,
            DragMode::SelectingRange | DragMode::SelectingColumn | DragMode::SelectingRow
        )
    }

    pub fn is_filling(&self) -> bool {
        matches!(self.drag, DragMode::Filling { .. })
    }

    pub fn is_single_cell(&self) -> bool {
        self.range().is_single_cell()
    }

    pub fn anchor(&self) -> CellPosition {
        self.anchor
    }

    pub fn focus(&self) -> CellPosition {
        self.focus
    }

    pub fn kind(&self) -> SelectionKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> Selection {
        Selection::new(20, 5)
    }

    #[test]
    fn test_extend_normalizes_range() {
        let mut sel = selection();
        sel.move_to(5, 5);
        sel.extend_selection(2, 2);
        assert_eq!(
            sel.range(),
            CellRange { start_row: 2, start_column: 2, end_row: 5, end_column: 5 }
        );
        assert_eq!(sel.anchor(), CellPosition::new(5, 5));
    }

    #[test]
    fn test_start_clamps_to_data_region() {
        let mut sel = selection();
        sel.start(0, 0);
        assert_eq!(sel.anchor(), CellPosition::new(1, 1));
        sel.update(99, 99);
        assert_eq!(sel.focus(), CellPosition::new(20, 5));
    }

    #[test]
    fn test_update_ignored_when_not_selecting() {
        let mut sel = selection();
        sel.start(6, 1);
        sel.end();
        sel.update(10, 3);
        assert!(sel.is_single_cell());
        sel.end();
        assert_eq!(sel.drag(), DragMode::Idle);
    }

    #[test]
    fn test_select_column_and_drag() {
        let mut sel = selection();
        sel.select_column(2);
        assert_eq!(sel.kind(), SelectionKind::Column);
        assert_eq!(sel.range(), CellRange::from_bounds(1, 2, 20, 2));
        sel.update_column(4);
        assert_eq!(sel.range(), CellRange::from_bounds(1, 2, 20, 4));
        sel.update_row(3);
        assert_eq!(sel.range(), CellRange::from_bounds(1, 2, 20, 4));
    }

    #[test]
    fn test_extend_to_column_keeps_anchor_lane() {
        let mut sel = selection();
        sel.select_column(4);
        sel.end();
        sel.extend_to_column(2);
        assert_eq!(sel.range(), CellRange::from_bounds(1, 2, 20, 4));
    }

    #[test]
    fn test_add_row_envelopes() {
        let mut sel = selection();
        sel.select_row(7);
        sel.end();
        sel.add_row(10);
        assert_eq!(sel.range(), CellRange::from_bounds(7, 1, 10, 5));
        assert_eq!(sel.kind(), SelectionKind::Row);
    }

    #[test]
    fn test_select_all() {
        let mut sel = selection();
        sel.start(6, 2);
        sel.select_all();
        assert_eq!(sel.range(), CellRange::from_bounds(1, 1, 20, 5));
        assert!(!sel.is_selecting());
    }

    #[test]
    fn test_move_within_selection_cycles_down_then_right() {
        let mut sel = selection();
        sel.set_range(CellRange::from_bounds(6, 1, 7, 2));
        let mut visited = Vec::new();
        for _ in 0..5 {
            sel.move_within_selection(StepDirection::Down);
            visited.push(sel.anchor());
        }
        assert_eq!(
            visited,
            vec![
                CellPosition::new(7, 1),
                CellPosition::new(6, 2),
                CellPosition::new(7, 2),
                CellPosition::new(6, 1),
                CellPosition::new(7, 1),
            ]
        );
        assert_eq!(sel.range(), CellRange::from_bounds(6, 1, 7, 2));
    }

    #[test]
    fn test_move_within_selection_left_wraps_to_end() {
        let mut sel = selection();
        sel.set_range(CellRange::from_bounds(6, 1, 7, 2));
        sel.move_within_selection(StepDirection::Left);
        assert_eq!(sel.anchor(), CellPosition::new(7, 2));
        sel.move_within_selection(StepDirection::Left);
        assert_eq!(sel.anchor(), CellPosition::new(7, 1));
        sel.move_within_selection(StepDirection::Left);
        assert_eq!(sel.anchor(), CellPosition::new(6, 2));
    }

    #[test]
    fn test_move_clears_lock() {
        let mut sel = selection();
        sel.set_range(CellRange::from_bounds(6, 1, 7, 2));
        sel.move_within_selection(StepDirection::Right);
        sel.move_by((1, 0));
        assert!(sel.is_single_cell());
        assert_eq!(sel.anchor(), CellPosition::new(7, 2));
    }

    #[test]
    fn test_single_cell_step_is_plain_move() {
        let mut sel = selection();
        sel.move_to(6, 5);
        sel.move_within_selection(StepDirection::Right);
        assert_eq!(sel.anchor(), CellPosition::new(6, 5));
        sel.move_within_selection(StepDirection::Down);
        assert_eq!(sel.anchor(), CellPosition::new(7, 5));
    }

    #[test]
    fn test_fill_directions() {
        let source = CellRange::from_bounds(6, 2, 7, 3);

        let down = FillInfo::compute(source, CellPosition::new(10, 3)).unwrap();
        assert_eq!(down.direction, FillDirection::Down);
        assert_eq!(down.count, 3);
        assert_eq!(down.target_range, CellRange::from_bounds(8, 2, 10, 3));

        let up = FillInfo::compute(source, CellPosition::new(4, 2)).unwrap();
        assert_eq!(up.direction, FillDirection::Up);
        assert_eq!(up.target_range, CellRange::from_bounds(4, 2, 5, 3));

        let right = FillInfo::compute(source, CellPosition::new(7, 5)).unwrap();
        assert_eq!(right.direction, FillDirection::Right);
        assert_eq!(right.count, 2);

        let left = FillInfo::compute(source, CellPosition::new(6, 1)).unwrap();
        assert_eq!(left.direction, FillDirection::Left);
        assert_eq!(left.target_range, CellRange::from_bounds(6, 1, 7, 1));
    }

    #[test]
    fn test_diagonal_fill_rejected() {
        let source = CellRange::from_bounds(6, 2, 7, 3);
        assert!(FillInfo::compute(source, CellPosition::new(10, 5)).is_none());
        assert!(FillInfo::compute(source, CellPosition::new(7, 3)).is_none());
    }

    #[test]
    fn test_fill_drag_lifecycle() {
        let mut sel = selection();
        sel.move_to(6, 1);
        sel.update_fill(9, 1);
        assert!(sel.fill_target().is_none());

        sel.start_fill();
        assert_eq!(sel.fill_target(), Some(CellPosition::new(6, 1)));
        sel.update_fill(9, 1);
        let info = sel.end_fill().unwrap();
        assert_eq!(info.count, 3);
        assert_eq!(sel.drag(), DragMode::Idle);
        assert!(sel.end_fill().is_none());
    }

    #[test]
    fn test_auto_fill_down_reaches_last_filled_row() {
        let mut grid = Grid::new(3, 20);
        grid.set_cell(FIRST_DATA_ROW + 9, 1, "x");
        grid.set_cell(FIRST_DATA_ROW + 15, 3, "y");
        let mut sel = Selection::new(grid.last_row(), grid.last_column());
        sel.move_to(FIRST_DATA_ROW, 1);
        let info = sel.auto_fill_down(&grid).unwrap();
        assert_eq!(info.direction, FillDirection::Down);
        assert_eq!(info.count, 9);

        sel.extend_selection(FIRST_DATA_ROW, 3);
        assert_eq!(sel.auto_fill_down(&grid).unwrap().count, 15);

        sel.move_to(FIRST_DATA_ROW + 9, 1);
        assert!(sel.auto_fill_down(&grid).is_none());
    }

    #[test]
    fn test_shift_rows_tracks_content() {
        let mut sel = selection();
        sel.set_range(CellRange::from_bounds(8, 1, 10, 2));
        sel.set_copy_range(Some(CellRange::from_bounds(12, 1, 12, 1)));

        sel.shift_rows(9, true);
        assert_eq!(sel.range(), CellRange::from_bounds(8, 1, 11, 2));
        assert_eq!(sel.copy_range(), Some(CellRange::from_bounds(13, 1, 13, 1)));

        sel.shift_rows(6, false);
        assert_eq!(sel.range(), CellRange::from_bounds(7, 1, 10, 2));
    }

    #[test]
    fn test_shift_columns_tracks_content() {
        let mut sel = selection();
        sel.move_to(6, 3);
        sel.shift_columns(2, true);
        assert_eq!(sel.anchor(), CellPosition::new(6, 4));
        sel.shift_columns(4, false);
        assert_eq!(sel.anchor(), CellPosition::new(6, 4));
        sel.shift_columns(1, false);
        assert_eq!(sel.anchor(), CellPosition::new(6, 3));
    }

    #[test]
    fn test_set_bounds_reclamps() {
        let mut sel = selection();
        sel.set_range(CellRange::from_bounds(15, 3, 20, 5));
        sel.set_copy_range(Some(CellRange::from_bounds(18, 5, 20, 5)));
        sel.set_bounds(16, 4);
        assert_eq!(sel.range(), CellRange::from_bounds(15, 3, 16, 4));
        assert_eq!(sel.copy_range(), None);
    }
}
