//! Application state management for the master-data editor.
//!
//! `App` owns the open tables (one [`EditorSession`] per tab), the active
//! input mode and the collaborators that talk to the outside world.

use std::time::{Duration, Instant};

use crate::application::session::EditorSession;
use crate::domain::{ClipboardBackend, DomainError, StepDirection, TableData};
use crate::infrastructure::{Settings, TableRepository};

const DOUBLE_CLICK: Duration = Duration::from_millis(400);

/// Represents the current mode of the application.
///
/// The mode determines how keyboard input is interpreted and which popup,
/// if any, is drawn over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
    /// Navigation and selection
    Normal,
    /// Typing into the active cell
    Editing,
    /// Help screen is displayed
    Help,
    /// Prompt for the name of a table to open
    OpenTable,
}

/// An open table and how far its view is scrolled.
#[derive(Debug)]
pub struct Tab {
    pub session: EditorSession,
    /// First grid row drawn below the column header lane.
    pub scroll_row: usize,
    /// First grid column drawn right of the row header lane.
    pub scroll_col: usize,
}

impl Tab {
    pub fn new(session: EditorSession) -> Self {
        Self {
            session,
            scroll_row: 1,
            scroll_col: 1,
        }
    }

    /// Tab caption, with `*` for unsaved changes.
    pub fn title(&self) -> String {
        if self.session.is_dirty() {
            format!("{}*", self.session.name())
        } else {
            self.session.name().to_string()
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub tabs: Vec<Tab>,
    pub active: usize,
    pub mode: AppMode,
    /// Temporary status message to display
    pub status_message: Option<String>,
    /// Input buffer for the table name prompt
    pub table_input: String,
    pub cursor_position: usize,
    /// Tables found in the project when the prompt was opened
    pub available_tables: Vec<String>,
    pub help_scroll: usize,
    /// Grid rows that fit in the view (for scrolling calculations)
    pub viewport_rows: usize,
    /// Grid columns that fit in the view (for scrolling calculations)
    pub viewport_cols: usize,
    /// Set after a close was refused because of unsaved changes
    pub pending_close: bool,
    pub settings: Settings,
    pub repository: TableRepository,
    pub clipboard: Box<dyn ClipboardBackend>,
    last_click: Option<(Instant, u16, u16)>,
}

impl App {
    pub fn new(settings: Settings, repository: TableRepository, clipboard: Box<dyn ClipboardBackend>) -> Self {
        Self {
            tabs: Vec::new(),
            active: 0,
            mode: AppMode::Normal,
            status_message: None,
            table_input: String::new(),
            cursor_position: 0,
            available_tables: Vec::new(),
            help_scroll: 0,
            viewport_rows: 20,
            viewport_cols: 8,
            pending_close: false,
            settings,
            repository,
            clipboard,
            last_click: None,
        }
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.tabs.get(self.active)
    }

    pub fn active_tab_mut(&mut self) -> Option<&mut Tab> {
        self.tabs.get_mut(self.active)
    }

    pub fn session(&self) -> Option<&EditorSession> {
        self.active_tab().map(|t| &t.session)
    }

    pub fn session_mut(&mut self) -> Option<&mut EditorSession> {
        self.active_tab_mut().map(|t| &mut t.session)
    }

    // Tabs

    /// Loads `name` from the project into a new tab, or switches to it if it
    /// is already open.
    pub fn open_table(&mut self, name: &str) {
        if let Some(index) = self.tabs.iter().position(|t| t.session.name() == name) {
            self.active = index;
            self.status_message = Some(format!("Switched to {}", name));
            return;
        }
        let result = self.repository.load_table(name);
        self.set_open_result(name, result);
    }

    /// Processes the result of loading a table.
    pub fn set_open_result(&mut self, name: &str, result: Result<TableData, DomainError>) {
        match result {
            Ok(table) => {
                let session = EditorSession::new(name, &table, &self.settings);
                self.tabs.push(Tab::new(session));
                self.active = self.tabs.len() - 1;
                self.status_message = Some(format!("Opened {} ({} rows)", name, table.rows.len()));
            }
            Err(error) => {
                tracing::warn!(table = name, %error, "open failed");
                self.status_message = Some(format!("Open failed: {}", error));
            }
        }
        self.mode = AppMode::Normal;
        self.table_input.clear();
        self.cursor_position = 0;
    }

    /// Closes the active tab. A tab with unsaved changes needs a second call.
    pub fn close_active_tab(&mut self) {
        let Some((name, dirty)) = self
            .active_tab()
            .map(|t| (t.session.name().to_string(), t.session.is_dirty()))
        else {
            return;
        };
        if dirty && !self.pending_close {
            self.pending_close = true;
            self.status_message = Some(format!("{} has unsaved changes; Ctrl+W again to discard", name));
            return;
        }
        let closed = self.tabs.remove(self.active);
        self.pending_close = false;
        if self.active >= self.tabs.len() {
            self.active = self.tabs.len().saturating_sub(1);
        }
        self.status_message = Some(format!("Closed {}", closed.session.name()));
    }

    pub fn next_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + 1) % self.tabs.len();
        }
    }

    pub fn previous_tab(&mut self) {
        if !self.tabs.is_empty() {
            self.active = (self.active + self.tabs.len() - 1) % self.tabs.len();
        }
    }

    pub fn start_open_table(&mut self) {
        self.mode = AppMode::OpenTable;
        self.table_input.clear();
        self.cursor_position = 0;
        self.status_message = None;
        self.available_tables = match self.repository.list_tables() {
            Ok(tables) => tables,
            Err(error) => {
                self.status_message = Some(format!("Cannot list tables: {}", error));
                Vec::new()
            }
        };
    }

    pub fn cancel_table_input(&mut self) {
        self.mode = AppMode::Normal;
        self.table_input.clear();
        self.cursor_position = 0;
    }

    /// Completes the prompt with the first listed table that starts with it.
    pub fn complete_table_input(&mut self) {
        if let Some(found) = self
            .available_tables
            .iter()
            .find(|t| t.starts_with(self.table_input.as_str()))
        {
            self.table_input = found.clone();
            self.cursor_position = self.table_input.chars().count();
        }
    }

    fn table_input_index(&self, cursor: usize) -> usize {
        self.table_input
            .char_indices()
            .nth(cursor)
            .map_or(self.table_input.len(), |(i, _)| i)
    }

    fn table_input_len(&self) -> usize {
        self.table_input.chars().count()
    }

    // `cursor_position` counts characters of `table_input`.

    pub fn table_input_insert(&mut self, c: char) {
        let at = self.table_input_index(self.cursor_position);
        self.table_input.insert(at, c);
        self.cursor_position += 1;
    }

    pub fn table_input_backspace(&mut self) {
        if self.cursor_position > 0 {
            let at = self.table_input_index(self.cursor_position - 1);
            self.table_input.remove(at);
            self.cursor_position -= 1;
        }
    }

    pub fn table_input_delete(&mut self) {
        if self.cursor_position < self.table_input_len() {
            let at = self.table_input_index(self.cursor_position);
            self.table_input.remove(at);
        }
    }

    pub fn table_input_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn table_input_right(&mut self) {
        self.cursor_position = (self.cursor_position + 1).min(self.table_input_len());
    }

    pub fn table_input_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn table_input_end(&mut self) {
        self.cursor_position = self.table_input_len();
    }

    pub fn confirm_table_input(&mut self) {
        let name = self.table_input.trim().to_string();
        if name.is_empty() {
            self.cancel_table_input();
            return;
        }
        self.open_table(&name);
        self.mode = AppMode::Normal;
        self.table_input.clear();
        self.cursor_position = 0;
    }

    // Saving

    /// Writes the active table back to the project.
    pub fn save_active(&mut self) {
        let Some(tab) = self.tabs.get_mut(self.active) else {
            return;
        };
        tab.session.commit_edit();
        let name = tab.session.name().to_string();
        let result = tab
            .session
            .to_table()
            .and_then(|table| self.repository.save_table(&name, &table));
        self.set_save_result(&name, result);
    }

    /// Processes the result of a save. Only a successful save marks the
    /// session clean.
    pub fn set_save_result(&mut self, name: &str, result: Result<(), DomainError>) {
        match result {
            Ok(()) => {
                if let Some(session) = self.session_mut() {
                    session.mark_saved();
                }
                self.status_message = Some(format!("Saved {}", name));
            }
            Err(error) => {
                tracing::warn!(table = name, %error, "save failed");
                self.status_message = Some(format!("Save failed: {}", error));
            }
        }
        self.mode = AppMode::Normal;
    }

    /// Discards unsaved changes by reading the table from disk again.
    pub fn reload_active(&mut self) {
        let Some(name) = self.session().map(|s| s.name().to_string()) else {
            return;
        };
        match self.repository.load_table(&name) {
            Ok(table) => {
                let min_rows = self.settings.min_rows;
                if let Some(tab) = self.active_tab_mut() {
                    tab.session.reload(&table, min_rows);
                    tab.scroll_row = 1;
                    tab.scroll_col = 1;
                }
                self.mode = AppMode::Normal;
                self.status_message = Some(format!("Reloaded {}", name));
            }
            Err(error) => {
                self.status_message = Some(format!("Reload failed: {}", error));
            }
        }
    }

    // Editing

    pub fn start_editing(&mut self) {
        if let Some(session) = self.session_mut() {
            session.begin_edit();
            self.mode = AppMode::Editing;
        }
    }

    pub fn start_editing_with(&mut self, c: char) {
        if let Some(session) = self.session_mut() {
            session.begin_edit_with(c);
            self.mode = AppMode::Editing;
        }
    }

    /// Commits the edit and moves the active cell one step.
    pub fn finish_editing(&mut self, direction: StepDirection) {
        if let Some(session) = self.session_mut() {
            session.commit_edit();
            session.step(direction);
        }
        self.mode = AppMode::Normal;
        self.ensure_cursor_visible();
    }

    pub fn cancel_editing(&mut self) {
        if let Some(session) = self.session_mut() {
            session.cancel_edit();
        }
        self.mode = AppMode::Normal;
    }

    // Clipboard and history

    pub fn copy(&mut self) {
        let Some(tab) = self.tabs.get_mut(self.active) else {
            return;
        };
        tab.session.copy(self.clipboard.as_mut());
        let range = tab.session.selection().range();
        self.status_message = Some(format!("Copied {}x{}", range.row_count(), range.column_count()));
    }

    pub fn paste(&mut self) {
        let Some(tab) = self.tabs.get_mut(self.active) else {
            return;
        };
        if !tab.session.paste(self.clipboard.as_mut()) {
            self.status_message = Some("Nothing to paste".to_string());
        }
        self.ensure_cursor_visible();
    }

    pub fn undo(&mut self) {
        if let Some(session) = self.session_mut() {
            let description = session.history().undo_description();
            if session.undo() {
                self.status_message = description.map(|d| format!("Undo {}", d));
            }
        }
        self.ensure_cursor_visible();
    }

    pub fn redo(&mut self) {
        if let Some(session) = self.session_mut() {
            session.redo();
        }
        self.ensure_cursor_visible();
    }

    // Pointer

    /// Registers a click and reports whether it completes a double click at
    /// the same screen cell.
    pub fn register_click(&mut self, x: u16, y: u16) -> bool {
        let now = Instant::now();
        let double = matches!(
            self.last_click,
            Some((at, lx, ly)) if lx == x && ly == y && now.duration_since(at) <= DOUBLE_CLICK
        );
        self.last_click = if double { None } else { Some((now, x, y)) };
        double
    }

    // Viewport

    /// Updates the viewport size for proper scrolling calculations.
    pub fn update_viewport_size(&mut self, rows: usize, cols: usize) {
        self.viewport_rows = rows.max(1);
        self.viewport_cols = cols.max(1);
    }

    /// Scrolls the active tab so the selection focus is visible.
    pub fn ensure_cursor_visible(&mut self) {
        let (rows, cols) = (self.viewport_rows, self.viewport_cols);
        let Some(tab) = self.active_tab_mut() else {
            return;
        };
        let focus = tab.session.selection().focus();

        if focus.row < tab.scroll_row {
            tab.scroll_row = focus.row;
        } else if focus.row >= tab.scroll_row + rows {
            tab.scroll_row = focus.row + 1 - rows;
        }

        if focus.column < tab.scroll_col {
            tab.scroll_col = focus.column;
        } else if focus.column >= tab.scroll_col + cols {
            tab.scroll_col = focus.column + 1 - cols;
        }

        tab.scroll_row = tab.scroll_row.max(1);
        tab.scroll_col = tab.scroll_col.max(1);
    }

    /// Scrolls without moving the selection (mouse wheel).
    pub fn scroll_by(&mut self, rows: isize) {
        if let Some(tab) = self.active_tab_mut() {
            let last = tab.session.grid().last_row();
            tab.scroll_row = tab.scroll_row.saturating_add_signed(rows).clamp(1, last);
        }
    }
}
