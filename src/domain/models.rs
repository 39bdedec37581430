use serde::{Deserialize, Serialize};

use super::errors::{DomainError, DomainResult};

/// Number of per-column metadata rows sitting between the column header lane
/// and the first data row.
pub const METADATA_ROWS: usize = 5;
/// Grid row index of the first data row.
pub const FIRST_DATA_ROW: usize = 1 + METADATA_ROWS;
pub const DEFAULT_COLUMN_WIDTH: u32 = 100;
pub const DEFAULT_ROW_HEIGHT: u32 = 20;
pub const MIN_LANE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPosition {
    pub row: usize,
    pub column: usize,
}

impl CellPosition {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Axis-aligned rectangle of cells, inclusive on both ends.
///
/// Constructors always normalize so that `start <= end` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start_row: usize,
    pub start_column: usize,
    pub end_row: usize,
    pub end_column: usize,
}

impl CellRange {
    pub fn new(a: CellPosition, b: CellPosition) -> Self {
        Self {
            start_row: a.row.min(b.row),
            start_column: a.column.min(b.column),
            end_row: a.row.max(b.row),
            end_column: a.column.max(b.column),
        }
    }

    pub fn from_bounds(row_a: usize, column_a: usize, row_b: usize, column_b: usize) -> Self {
        Self::new(CellPosition::new(row_a, column_a), CellPosition::new(row_b, column_b))
    }

    pub fn single(position: CellPosition) -> Self {
        Self::new(position, position)
    }

    pub fn top_left(&self) -> CellPosition {
        CellPosition::new(self.start_row, self.start_column)
    }

    pub fn bottom_right(&self) -> CellPosition {
        CellPosition::new(self.end_row, self.end_column)
    }

    pub fn row_count(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn column_count(&self) -> usize {
        self.end_column - self.start_column + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.start_row == self.end_row && self.start_column == self.end_column
    }

    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.start_row && row <= self.end_row
    }

    pub fn contains_column(&self, column: usize) -> bool {
        column >= self.start_column && column <= self.end_column
    }

    pub fn contains(&self, position: CellPosition) -> bool {
        self.contains_row(position.row) && self.contains_column(position.column)
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &CellRange) -> CellRange {
        CellRange {
            start_row: self.start_row.min(other.start_row),
            start_column: self.start_column.min(other.start_column),
            end_row: self.end_row.max(other.end_row),
            end_column: self.end_column.max(other.end_column),
        }
    }

    pub fn include(&self, position: CellPosition) -> CellRange {
        self.union(&CellRange::single(position))
    }

    pub fn positions(&self) -> impl Iterator<Item = CellPosition> + '_ {
        (self.start_row..=self.end_row).flat_map(move |row| {
            (self.start_column..=self.end_column).map(move |column| CellPosition::new(row, column))
        })
    }
}

/// Where `lane` ends up after a lane is inserted at, or removed from, `index`.
pub(crate) fn shift_lane(lane: usize, index: usize, inserted: bool) -> usize {
    if inserted {
        if lane >= index { lane + 1 } else { lane }
    } else if lane > index {
        lane - 1
    } else {
        lane
    }
}

/// The metadata rows that describe each column of a master-data table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataRow {
    Key,
    Name,
    Type,
    Comment,
    References,
}

impl MetadataRow {
    pub const ALL: [MetadataRow; METADATA_ROWS] = [
        MetadataRow::Key,
        MetadataRow::Name,
        MetadataRow::Type,
        MetadataRow::Comment,
        MetadataRow::References,
    ];

    /// Grid row holding this metadata.
    pub fn row(self) -> usize {
        1 + self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            MetadataRow::Key => "key",
            MetadataRow::Name => "name",
            MetadataRow::Type => "type",
            MetadataRow::Comment => "comment",
            MetadataRow::References => "references",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub key: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub primary_key: String,
    pub header: Vec<ColumnSchema>,
}

/// A table as stored on disk: schema plus materialized string rows.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    pub schema: TableSchema,
    pub rows: Vec<Vec<String>>,
}

/// Positional cell store for one table.
///
/// Row 0 and column 0 are header lanes whose text is derived from position and
/// rewritten by [`Grid::relabel`] after every structural splice. Every row has
/// the same number of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    cells: Vec<Vec<String>>,
    column_widths: Vec<u32>,
    row_heights: Vec<u32>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Grid {
    /// Creates a blank grid with the given number of data columns and data rows.
    pub fn new(data_columns: usize, data_rows: usize) -> Self {
        let columns = data_columns.max(1) + 1;
        let rows = FIRST_DATA_ROW + data_rows.max(1);
        let mut grid = Self {
            cells: vec![vec![String::new(); columns]; rows],
            column_widths: vec![DEFAULT_COLUMN_WIDTH; columns],
            row_heights: vec![DEFAULT_ROW_HEIGHT; rows],
        };
        grid.relabel();
        grid
    }

    /// Materializes a table, padding with blank data rows up to `min_rows`.
    pub fn from_table(table: &TableData, min_rows: usize) -> Self {
        let data_columns = table
            .schema
            .header
            .len()
            .max(table.rows.iter().map(|r| r.len()).max().unwrap_or(0));
        let data_rows = table.rows.len().max(min_rows);
        let mut grid = Self::new(data_columns, data_rows);

        for (index, column) in table.schema.header.iter().enumerate() {
            let c = index + 1;
            grid.cells[MetadataRow::Key.row()][c] = column.key.to_string();
            grid.cells[MetadataRow::Name.row()][c] = column.name.clone();
            grid.cells[MetadataRow::Type.row()][c] = column.kind.clone();
            grid.cells[MetadataRow::Comment.row()][c] = column.comment.clone().unwrap_or_default();
            grid.cells[MetadataRow::References.row()][c] =
                column.references.as_ref().map(|r| r.join(",")).unwrap_or_default();
        }

        for (index, values) in table.rows.iter().enumerate() {
            let row = FIRST_DATA_ROW + index;
            for (column, value) in values.iter().enumerate() {
                grid.cells[row][column + 1] = value.clone();
            }
        }

        grid
    }

    /// Serializes the grid back into schema and rows.
    ///
    /// Data rows are emitted up to the first row whose first data cell is empty.
    pub fn to_table(&self, description: &str, primary_key: &str) -> DomainResult<TableData> {
        let mut header = Vec::with_capacity(self.data_column_count());
        for column in 1..self.column_count() {
            let key_text = self.cell(MetadataRow::Key.row(), column).trim();
            let key = key_text.parse::<i64>().map_err(|_| DomainError::InvalidKey {
                column,
                value: key_text.to_string(),
            })?;
            let comment = self.cell(MetadataRow::Comment.row(), column);
            let references: Vec<String> = self
                .cell(MetadataRow::References.row(), column)
                .split(',')
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();

            header.push(ColumnSchema {
                key,
                name: self.cell(MetadataRow::Name.row(), column).to_string(),
                kind: self.cell(MetadataRow::Type.row(), column).to_string(),
                comment: (!comment.is_empty()).then(|| comment.to_string()),
                references: (!references.is_empty()).then_some(references),
            });
        }

        let rows = self.cells[FIRST_DATA_ROW..]
            .iter()
            .take_while(|row| !row[1].is_empty())
            .map(|row| row[1..].to_vec())
            .collect();

        Ok(TableData {
            schema: TableSchema {
                description: description.to_string(),
                primary_key: primary_key.to_string(),
                header,
            },
            rows,
        })
    }

    /// Total rows including the header lane and metadata rows.
    pub fn row_count(&self) -> usize {
        self.cells.len()
    }

    /// Total columns including the row header lane.
    pub fn column_count(&self) -> usize {
        self.cells.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn data_row_count(&self) -> usize {
        self.row_count() - FIRST_DATA_ROW
    }

    pub fn data_column_count(&self) -> usize {
        self.column_count() - 1
    }

    pub fn last_row(&self) -> usize {
        self.row_count() - 1
    }

    pub fn last_column(&self) -> usize {
        self.column_count() - 1
    }

    /// Every addressable non-header cell.
    pub fn data_region(&self) -> CellRange {
        CellRange::from_bounds(1, 1, self.last_row(), self.last_column())
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.cells
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Writes a cell, returning the previous text.
    ///
    /// Header lanes and out-of-range coordinates are left untouched.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) -> Option<String> {
        if row == 0 || column == 0 {
            return None;
        }
        let cell = self.cells.get_mut(row)?.get_mut(column)?;
        Some(std::mem::replace(cell, value.into()))
    }

    /// Cell text of a rectangle, row by row.
    pub fn values(&self, range: &CellRange) -> Vec<Vec<String>> {
        (range.start_row..=range.end_row)
            .map(|row| {
                (range.start_column..=range.end_column)
                    .map(|column| self.cell(row, column).to_string())
                    .collect()
            })
            .collect()
    }

    pub fn column_width(&self, column: usize) -> u32 {
        self.column_widths.get(column).copied().unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn set_column_width(&mut self, column: usize, width: u32) -> Option<u32> {
        let slot = self.column_widths.get_mut(column)?;
        Some(std::mem::replace(slot, width.max(MIN_LANE_SIZE)))
    }

    pub fn row_height(&self, row: usize) -> u32 {
        self.row_heights.get(row).copied().unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    pub fn set_row_height(&mut self, row: usize, height: u32) -> Option<u32> {
        let slot = self.row_heights.get_mut(row)?;
        Some(std::mem::replace(slot, height.max(MIN_LANE_SIZE)))
    }

    pub fn can_insert_row(&self, index: usize) -> bool {
        index >= FIRST_DATA_ROW && index <= self.row_count()
    }

    pub fn can_remove_row(&self, index: usize) -> bool {
        index >= FIRST_DATA_ROW && index < self.row_count() && self.data_row_count() > 1
    }

    pub fn can_insert_column(&self, index: usize) -> bool {
        index >= 1 && index <= self.column_count()
    }

    pub fn can_remove_column(&self, index: usize) -> bool {
        index >= 1 && index < self.column_count() && self.data_column_count() > 1
    }

    /// Splices a blank row in at `index`, shifting later rows down.
    pub fn insert_row(&mut self, index: usize) -> bool {
        if !self.can_insert_row(index) {
            return false;
        }
        self.cells.insert(index, vec![String::new(); self.column_count()]);
        self.row_heights.insert(index, DEFAULT_ROW_HEIGHT);
        self.relabel();
        true
    }

    /// Removes the row at `index`, returning its data cells and height.
    pub fn remove_row(&mut self, index: usize) -> Option<(Vec<String>, u32)> {
        if !self.can_remove_row(index) {
            return None;
        }
        let mut values = self.cells.remove(index);
        let height = self.row_heights.remove(index);
        values.remove(0);
        self.relabel();
        Some((values, height))
    }

    /// One past the largest integer key in the key row, or 1 when no column
    /// has an integer key.
    pub fn next_free_key(&self) -> i64 {
        (1..self.column_count())
            .filter_map(|column| self.cell(MetadataRow::Key.row(), column).trim().parse::<i64>().ok())
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Splices a blank column in at `index`, shifting later columns right.
    pub fn insert_column(&mut self, index: usize) -> bool {
        if !self.can_insert_column(index) {
            return false;
        }
        for row in &mut self.cells {
            row.insert(index, String::new());
        }
        self.column_widths.insert(index, DEFAULT_COLUMN_WIDTH);
        self.relabel();
        true
    }

    /// Removes the column at `index`, returning its non-lane cells and width.
    pub fn remove_column(&mut self, index: usize) -> Option<(Vec<String>, u32)> {
        if !self.can_remove_column(index) {
            return None;
        }
        let mut values: Vec<String> = self.cells.iter_mut().map(|row| row.remove(index)).collect();
        let width = self.column_widths.remove(index);
        values.remove(0);
        self.relabel();
        Some((values, width))
    }

    /// Rewrites the header lanes from current positions.
    pub fn relabel(&mut self) {
        let columns = self.column_count();
        if let Some(header) = self.cells.first_mut() {
            header[0].clear();
            for (column, cell) in header.iter_mut().enumerate().take(columns).skip(1) {
                *cell = Self::column_label(column - 1);
            }
        }
        for (row, cells) in self.cells.iter_mut().enumerate().skip(1) {
            cells[0] = Self::row_label(row);
        }
    }

    /// Last data row with any non-empty cell between the given columns.
    pub fn last_filled_row(&self, start_column: usize, end_column: usize) -> Option<usize> {
        (FIRST_DATA_ROW..self.row_count()).rev().find(|&row| {
            (start_column..=end_column.min(self.last_column()))
                .any(|column| !self.cell(row, column).is_empty())
        })
    }

    pub fn row_label(row: usize) -> String {
        match row {
            0 => String::new(),
            r if r < FIRST_DATA_ROW => MetadataRow::ALL[r - 1].label().to_string(),
            r => (r - FIRST_DATA_ROW + 1).to_string(),
        }
    }

    pub fn column_label(col: usize) -> String {
        let mut result = String::new();
        let mut c = col;
        loop {
            result = char::from(b'A' + (c % 26) as u8).to_string() + &result;
            if c < 26 {
                break;
            }
            c = c / 26 - 1;
        }
        result
    }
}
