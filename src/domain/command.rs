//! Reversible units of change applied to a [`Grid`].
//!
//! Commands address cells purely by position and never hold references into
//! the grid, so a command recorded before a structural edit stays valid as
//! long as the history is replayed in order.

use std::fmt;

use super::models::{shift_lane, CellRange, Grid, MetadataRow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellChange {
    pub row: usize,
    pub column: usize,
    pub old_value: String,
    pub new_value: String,
}

impl CellChange {
    pub fn new(row: usize, column: usize, old_value: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            row,
            column,
            old_value: old_value.into(),
            new_value: new_value.into(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.old_value == self.new_value
    }
}

/// Snapshot of a lane taken right before it was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedLane {
    pub values: Vec<String>,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CellChange { changes: Vec<CellChange> },
    InsertColumn { index: usize },
    /// `removed` is captured by `execute`, not at construction.
    DeleteColumn { index: usize, removed: Option<RemovedLane> },
    InsertRow { index: usize },
    DeleteRow { index: usize, removed: Option<RemovedLane> },
    ColumnWidth { index: usize, old_width: u32, new_width: u32 },
    RowHeight { index: usize, old_height: u32, new_height: u32 },
}

impl Command {
    pub fn cell_change(changes: Vec<CellChange>) -> Self {
        Command::CellChange { changes }
    }

    pub fn delete_column(index: usize) -> Self {
        Command::DeleteColumn { index, removed: None }
    }

    pub fn delete_row(index: usize) -> Self {
        Command::DeleteRow { index, removed: None }
    }

    pub fn execute(&mut self, grid: &mut Grid) {
        match self {
            Command::CellChange { changes } => {
                for change in changes.iter() {
                    grid.set_cell(change.row, change.column, change.new_value.clone());
                }
            }
            Command::InsertColumn { index } => {
                let key = grid.next_free_key();
                if grid.insert_column(*index) {
                    grid.set_cell(MetadataRow::Key.row(), *index, key.to_string());
                }
            }
            Command::DeleteColumn { index, removed } => {
                *removed = grid
                    .remove_column(*index)
                    .map(|(values, size)| RemovedLane { values, size });
            }
            Command::InsertRow { index } => {
                grid.insert_row(*index);
            }
            Command::DeleteRow { index, removed } => {
                *removed = grid
                    .remove_row(*index)
                    .map(|(values, size)| RemovedLane { values, size });
            }
            Command::ColumnWidth { index, new_width, .. } => {
                grid.set_column_width(*index, *new_width);
            }
            Command::RowHeight { index, new_height, .. } => {
                grid.set_row_height(*index, *new_height);
            }
        }
    }

    pub fn undo(&mut self, grid: &mut Grid) {
        match self {
            Command::CellChange { changes } => {
                for change in changes.iter().rev() {
                    grid.set_cell(change.row, change.column, change.old_value.clone());
                }
            }
            Command::InsertColumn { index } => {
                grid.remove_column(*index);
            }
            Command::DeleteColumn { index, removed } => {
                let Some(lane) = removed.as_ref() else {
                    return;
                };
                if grid.insert_column(*index) {
                    for (offset, value) in lane.values.iter().enumerate() {
                        grid.set_cell(offset + 1, *index, value.clone());
                    }
                    grid.set_column_width(*index, lane.size);
                }
            }
            Command::InsertRow { index } => {
                grid.remove_row(*index);
            }
            Command::DeleteRow { index, removed } => {
                let Some(lane) = removed.as_ref() else {
                    return;
                };
                if grid.insert_row(*index) {
                    for (offset, value) in lane.values.iter().enumerate() {
                        grid.set_cell(*index, offset + 1, value.clone());
                    }
                    grid.set_row_height(*index, lane.size);
                }
            }
            Command::ColumnWidth { index, old_width, .. } => {
                grid.set_column_width(*index, *old_width);
            }
            Command::RowHeight { index, old_height, .. } => {
                grid.set_row_height(*index, *old_height);
            }
        }
    }

    /// Re-applies the command. Deletions re-capture the lane they remove.
    pub fn redo(&mut self, grid: &mut Grid) {
        self.execute(grid);
    }

    /// Maps `range` from the grid before this command ran to the grid after.
    pub fn shift_range(&self, range: CellRange) -> CellRange {
        let rows = |index: usize, inserted: bool| {
            let shift = |row: usize| shift_lane(row, index, inserted);
            CellRange::from_bounds(shift(range.start_row), range.start_column, shift(range.end_row), range.end_column)
        };
        let columns = |index: usize, inserted: bool| {
            let shift = |column: usize| shift_lane(column, index, inserted);
            CellRange::from_bounds(range.start_row, shift(range.start_column), range.end_row, shift(range.end_column))
        };
        match self {
            Command::InsertRow { index } => rows(*index, true),
            Command::DeleteRow { index, .. } => rows(*index, false),
            Command::InsertColumn { index } => columns(*index, true),
            Command::DeleteColumn { index, .. } => columns(*index, false),
            _ => range,
        }
    }

    pub fn description(&self) -> String {
        match self {
            Command::CellChange { changes } => format!("CellChange: {} cells", changes.len()),
            Command::InsertColumn { index } => format!("InsertColumn at {}", index),
            Command::DeleteColumn { index, .. } => format!("DeleteColumn at {}", index),
            Command::InsertRow { index } => format!("InsertRow at {}", index),
            Command::DeleteRow { index, .. } => format!("DeleteRow at {}", index),
            Command::ColumnWidth { index, old_width, new_width } => {
                format!("ColumnWidth[{}]: {} -> {}", index, old_width, new_width)
            }
            Command::RowHeight { index, old_height, new_height } => {
                format!("RowHeight[{}]: {} -> {}", index, old_height, new_height)
            }
        }
    }

    /// Envelope of every cell a `CellChange` touches.
    pub fn changed_range(&self) -> Option<CellRange> {
        let Command::CellChange { changes } = self else {
            return None;
        };
        let mut iter = changes.iter();
        let first = iter.next()?;
        let start = CellRange::from_bounds(first.row, first.column, first.row, first.column);
        Some(iter.fold(start, |range, c| {
            range.union(&CellRange::from_bounds(c.row, c.column, c.row, c.column))
        }))
    }

    /// Drops cell changes that leave the value unchanged.
    ///
    /// Returns `None` when nothing meaningful remains.
    pub fn without_noops(self) -> Option<Command> {
        match self {
            Command::CellChange { changes } => {
                let changes: Vec<CellChange> = changes.into_iter().filter(|c| !c.is_noop()).collect();
                (!changes.is_empty()).then_some(Command::CellChange { changes })
            }
            Command::ColumnWidth { old_width, new_width, .. } if old_width == new_width => None,
            Command::RowHeight { old_height, new_height, .. } if old_height == new_height => None,
            other => Some(other),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description())
    }
}
