//! One open table: its grid, selection and undo history.
//!
//! Every handler runs synchronously on the UI thread and leaves the three
//! parts consistent with each other before returning.

use crate::domain::{
    generate_series_data, parse_text, plan_paste, serialize_range, CellChange, CellPosition,
    CellRange, ClipboardBackend, Command, DomainResult, DragMode, FillDirection, FillInfo, Grid,
    History, HistoryOutcome, PasteMode, Selection, StepDirection, TableData, MIN_LANE_SIZE,
};
use crate::infrastructure::Settings;

/// Text being typed into a cell. `cursor` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEdit {
    pub position: CellPosition,
    pub input: String,
    pub cursor: usize,
}

impl CellEdit {
    fn byte_index(&self, cursor: usize) -> usize {
        self.input
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.input.remove(at);
            self.cursor -= 1;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.len());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.len();
    }
}

/// What the pointer went down on, as resolved by the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Cell(CellPosition),
    ColumnHeader(usize),
    RowHeader(usize),
    Corner,
    FillHandle,
    ColumnBorder(usize),
    RowBorder(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
}

#[derive(Debug)]
pub struct EditorSession {
    name: String,
    description: String,
    primary_key: String,
    grid: Grid,
    selection: Selection,
    history: History,
    editing: Option<CellEdit>,
}

impl EditorSession {
    pub fn new(name: impl Into<String>, table: &TableData, settings: &Settings) -> Self {
        let name = name.into();
        let grid = Grid::from_table(table, settings.min_rows);
        let selection = Selection::new(grid.last_row(), grid.last_column());
        let mut history = History::new(settings.history_capacity);

        let table_name = name.clone();
        history.subscribe(Box::new(move |dirty| {
            tracing::debug!(table = %table_name, dirty, "dirty state changed");
        }));

        Self {
            name,
            description: table.schema.description.clone(),
            primary_key: table.schema.primary_key.clone(),
            grid,
            selection,
            history,
            editing: None,
        }
    }

    /// Replaces the contents with `table` and forgets all history.
    pub fn reload(&mut self, table: &TableData, min_rows: usize) {
        self.grid = Grid::from_table(table, min_rows);
        self.selection = Selection::new(self.grid.last_row(), self.grid.last_column());
        self.description = table.schema.description.clone();
        self.primary_key = table.schema.primary_key.clone();
        self.editing = None;
        self.history.reset();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn editing(&self) -> Option<&CellEdit> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut CellEdit> {
        self.editing.as_mut()
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn to_table(&self) -> DomainResult<TableData> {
        self.grid.to_table(&self.description, &self.primary_key)
    }

    pub fn mark_saved(&mut self) {
        self.history.mark_saved();
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    fn sync_bounds(&mut self) {
        self.selection
            .set_bounds(self.grid.last_row(), self.grid.last_column());
    }

    fn restore(&mut self, outcome: HistoryOutcome) {
        self.sync_bounds();
        self.selection.restore(outcome.range, outcome.copy_range);
    }

    // Cell editing

    /// Opens the active cell for editing with its current text.
    pub fn begin_edit(&mut self) {
        let position = self.selection.anchor();
        let input = self.grid.cell(position.row, position.column).to_string();
        let cursor = input.chars().count();
        self.editing = Some(CellEdit { position, input, cursor });
    }

    /// Opens the active cell for editing, replacing its text with `c`.
    pub fn begin_edit_with(&mut self, c: char) {
        self.editing = Some(CellEdit {
            position: self.selection.anchor(),
            input: c.to_string(),
            cursor: 1,
        });
    }

    /// Writes the edit buffer into the grid and records it.
    ///
    /// Returns `true` if the cell text changed.
    pub fn commit_edit(&mut self) -> bool {
        let Some(edit) = self.editing.take() else {
            return false;
        };
        let position = edit.position;
        let Some(old_value) = self.grid.set_cell(position.row, position.column, edit.input.clone()) else {
            return false;
        };
        let command = Command::cell_change(vec![CellChange::new(
            position.row,
            position.column,
            old_value,
            edit.input,
        )]);
        self.history
            .push_command(command, CellRange::single(position), self.selection.copy_range())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    // Pointer

    pub fn pointer_down(&mut self, target: PointerTarget, x: i32, y: i32, modifiers: Modifiers) {
        if self.is_editing() {
            self.commit_edit();
        }

        match target {
            PointerTarget::Cell(position) => {
                if modifiers.shift {
                    self.selection.extend_selection(position.row, position.column);
                } else {
                    self.selection.start(position.row, position.column);
                }
            }
            PointerTarget::ColumnHeader(column) => {
                if modifiers.shift {
                    self.selection.extend_to_column(column);
                } else if modifiers.ctrl {
                    self.selection.add_column(column);
                } else {
                    self.selection.select_column(column);
                }
            }
            PointerTarget::RowHeader(row) => {
                if modifiers.shift {
                    self.selection.extend_to_row(row);
                } else if modifiers.ctrl {
                    self.selection.add_row(row);
                } else {
                    self.selection.select_row(row);
                }
            }
            PointerTarget::Corner => self.selection.select_all(),
            PointerTarget::FillHandle => self.selection.start_fill(),
            PointerTarget::ColumnBorder(index) => {
                self.selection.set_drag(DragMode::ResizingColumn {
                    index,
                    origin: x,
                    start_size: self.grid.column_width(index),
                });
            }
            PointerTarget::RowBorder(index) => {
                self.selection.set_drag(DragMode::ResizingRow {
                    index,
                    origin: y,
                    start_size: self.grid.row_height(index),
                });
            }
        }
    }

    /// Continues the active drag. `cell` is the cell under the pointer,
    /// `x`/`y` the pointer in size units.
    pub fn pointer_move(&mut self, cell: CellPosition, x: i32, y: i32) {
        match self.selection.drag() {
            DragMode::Idle => {}
            DragMode::SelectingRange => self.selection.update(cell.row, cell.column),
            DragMode::SelectingColumn => self.selection.update_column(cell.column),
            DragMode::SelectingRow => self.selection.update_row(cell.row),
            DragMode::Filling { .. } => self.selection.update_fill(cell.row, cell.column),
            DragMode::ResizingColumn { index, origin, start_size } => {
                self.grid.set_column_width(index, resized(start_size, x - origin));
            }
            DragMode::ResizingRow { index, origin, start_size } => {
                self.grid.set_row_height(index, resized(start_size, y - origin));
            }
        }
    }

    /// Ends the active drag, recording resizes and applying fills.
    pub fn pointer_up(&mut self) {
        match self.selection.drag() {
            DragMode::ResizingColumn { index, start_size, .. } => {
                self.selection.set_drag(DragMode::Idle);
                let command = Command::ColumnWidth {
                    index,
                    old_width: start_size,
                    new_width: self.grid.column_width(index),
                };
                self.history
                    .push_command(command, self.selection.range(), self.selection.copy_range());
            }
            DragMode::ResizingRow { index, start_size, .. } => {
                self.selection.set_drag(DragMode::Idle);
                let command = Command::RowHeight {
                    index,
                    old_height: start_size,
                    new_height: self.grid.row_height(index),
                };
                self.history
                    .push_command(command, self.selection.range(), self.selection.copy_range());
            }
            DragMode::Filling { .. } => {
                if let Some(info) = self.selection.end_fill() {
                    self.apply_fill(info);
                }
            }
            _ => self.selection.end(),
        }
    }

    // Keyboard

    pub fn move_by(&mut self, delta: (isize, isize), extend: bool) {
        if extend {
            self.selection.extend_by(delta);
        } else {
            self.selection.move_by(delta);
        }
    }

    /// Enter/Tab navigation, cycling inside a multi-cell selection.
    pub fn step(&mut self, direction: StepDirection) {
        self.selection.move_within_selection(direction);
    }

    pub fn move_to(&mut self, row: usize, column: usize) {
        self.selection.move_to(row, column);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all();
    }

    /// Cancels an edit if one is open, otherwise dismisses the copy
    /// indicator. Returns `false` if there was nothing to do.
    pub fn escape(&mut self) -> bool {
        if self.editing.take().is_some() {
            return true;
        }
        let Some(range) = self.selection.copy_range() else {
            return false;
        };
        self.history.clear_copy_range(range);
        self.selection.clear_copy_range();
        true
    }

    /// Clears every cell of the selection as one undo step.
    pub fn delete_selection(&mut self) -> bool {
        let range = self.selection.range();
        let changes = range
            .positions()
            .map(|p| CellChange::new(p.row, p.column, self.grid.cell(p.row, p.column), ""))
            .collect();
        self.history.execute_command(
            Command::cell_change(changes),
            &mut self.grid,
            range,
            self.selection.copy_range(),
        )
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&mut self.grid) {
            Some(outcome) => {
                self.restore(outcome);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&mut self.grid) {
            Some(outcome) => {
                self.restore(outcome);
                true
            }
            None => false,
        }
    }

    // Clipboard

    /// Marks the selection as copy source and places it on the clipboard.
    ///
    /// A clipboard failure is logged; the copy indicator is set regardless.
    pub fn copy(&mut self, clipboard: &mut dyn ClipboardBackend) {
        let range = self.selection.range();
        self.selection.set_copy_range(Some(range));
        let payload = serialize_range(&self.grid, &range);
        match clipboard.write(&payload) {
            Ok(()) => tracing::debug!(?range, "copied range"),
            Err(err) => tracing::warn!(error = %err, "clipboard write failed"),
        }
    }

    /// Pastes clipboard text into the selection.
    ///
    /// When the clipboard cannot be read the copied range is pasted instead.
    /// Returns `true` if any cell changed.
    pub fn paste(&mut self, clipboard: &mut dyn ClipboardBackend) -> bool {
        let source = match clipboard.read_text() {
            Ok(Some(text)) => parse_text(&text),
            Ok(None) => return false,
            Err(err) => {
                tracing::warn!(error = %err, "clipboard read failed");
                match self.selection.copy_range() {
                    Some(range) => self.grid.values(&range),
                    None => return false,
                }
            }
        };

        let target = self.selection.range();
        let Some(plan) = plan_paste(&self.grid, &source, target) else {
            return false;
        };
        tracing::debug!(mode = ?plan.mode, range = ?plan.range, "paste");

        let changed = self.history.execute_command(
            Command::cell_change(plan.changes),
            &mut self.grid,
            target,
            self.selection.copy_range(),
        );
        self.selection.set_range(plan.range);
        if plan.mode == PasteMode::Normal {
            self.selection.clear_copy_range();
        }
        changed
    }

    // Fill

    /// Writes the series described by `info` and selects source and target.
    pub fn apply_fill(&mut self, info: FillInfo) -> bool {
        let source = self.grid.values(&info.source_range);
        let series = generate_series_data(&source, info.direction, info.count);
        let src = info.source_range;

        let mut changes = Vec::new();
        for (i, line) in series.iter().enumerate() {
            for (j, value) in line.iter().enumerate() {
                let (row, column) = match info.direction {
                    FillDirection::Down => (src.end_row + 1 + i, src.start_column + j),
                    FillDirection::Up => (src.start_row.wrapping_sub(1 + i), src.start_column + j),
                    FillDirection::Right => (src.start_row + i, src.end_column + 1 + j),
                    FillDirection::Left => (src.start_row + i, src.start_column.wrapping_sub(1 + j)),
                };
                if !info.target_range.contains(CellPosition::new(row, column)) {
                    continue;
                }
                changes.push(CellChange::new(row, column, self.grid.cell(row, column), value.clone()));
            }
        }

        let changed = self.history.execute_command(
            Command::cell_change(changes),
            &mut self.grid,
            src,
            self.selection.copy_range(),
        );
        self.selection.set_range(src.union(&info.target_range));
        changed
    }

    /// Double-click on the fill handle.
    pub fn fill_handle_double_click(&mut self) -> bool {
        match self.selection.auto_fill_down(&self.grid) {
            Some(info) => self.apply_fill(info),
            None => false,
        }
    }

    /// Fills the selection's lower rows from its first row.
    pub fn fill_down(&mut self) -> bool {
        let range = self.selection.range();
        if range.row_count() < 2 {
            return false;
        }
        let info = FillInfo {
            direction: FillDirection::Down,
            source_range: CellRange::from_bounds(range.start_row, range.start_column, range.start_row, range.end_column),
            target_range: CellRange::from_bounds(range.start_row + 1, range.start_column, range.end_row, range.end_column),
            count: range.row_count() - 1,
        };
        self.apply_fill(info)
    }

    // Structure

    fn execute_structural(&mut self, command: Command) -> bool {
        let anchor = self.selection.anchor();
        self.history.execute_command(
            command,
            &mut self.grid,
            CellRange::single(anchor),
            self.selection.copy_range(),
        )
    }

    /// Inserts a blank row above the active cell.
    pub fn insert_row(&mut self) -> bool {
        let index = self.selection.anchor().row;
        if !self.grid.can_insert_row(index) {
            return false;
        }
        let executed = self.execute_structural(Command::InsertRow { index });
        if executed {
            self.selection.shift_rows(index, true);
            self.sync_bounds();
            tracing::debug!(index, "inserted row");
        }
        executed
    }

    pub fn delete_row(&mut self) -> bool {
        let index = self.selection.anchor().row;
        if !self.grid.can_remove_row(index) {
            return false;
        }
        let executed = self.execute_structural(Command::delete_row(index));
        if executed {
            self.selection.shift_rows(index, false);
            self.sync_bounds();
            tracing::debug!(index, "deleted row");
        }
        executed
    }

    /// Inserts a blank column left of the active cell.
    pub fn insert_column(&mut self) -> bool {
        let index = self.selection.anchor().column;
        if !self.grid.can_insert_column(index) {
            return false;
        }
        let executed = self.execute_structural(Command::InsertColumn { index });
        if executed {
            self.selection.shift_columns(index, true);
            self.sync_bounds();
            tracing::debug!(index, "inserted column");
        }
        executed
    }

    pub fn delete_column(&mut self) -> bool {
        let index = self.selection.anchor().column;
        if !self.grid.can_remove_column(index) {
            return false;
        }
        let executed = self.execute_structural(Command::delete_column(index));
        if executed {
            self.selection.shift_columns(index, false);
            self.sync_bounds();
            tracing::debug!(index, "deleted column");
        }
        executed
    }

    /// Resizes the active cell's column by `delta` units.
    pub fn resize_column(&mut self, delta: i32) -> bool {
        let index = self.selection.anchor().column;
        let old_width = self.grid.column_width(index);
        let command = Command::ColumnWidth {
            index,
            old_width,
            new_width: resized(old_width, delta),
        };
        self.execute_structural(command)
    }

    pub fn resize_row(&mut self, delta: i32) -> bool {
        let index = self.selection.anchor().row;
        let old_height = self.grid.row_height(index);
        let command = Command::RowHeight {
            index,
            old_height,
            new_height: resized(old_height, delta),
        };
        self.execute_structural(command)
    }
}

fn resized(size: u32, delta: i32) -> u32 {
    (i64::from(size) + i64::from(delta)).max(i64::from(MIN_LANE_SIZE)) as u32
}
