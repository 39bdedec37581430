use crate::application::{App, AppMode, EditorSession, Modifiers, PointerTarget};
use crate::domain::StepDirection;
use crate::presentation::layout::{GridLayout, CHAR_UNITS, LINE_UNITS};
use crate::presentation::ui::help_line_count;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

const WHEEL_ROWS: isize = 3;

pub struct InputHandler;

impl InputHandler {
    pub fn handle_key_event(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        match app.mode {
            AppMode::Normal => Self::handle_normal_mode(app, key, modifiers),
            AppMode::Editing => Self::handle_editing_mode(app, key, modifiers),
            AppMode::Help => Self::handle_help_mode(app, key),
            AppMode::OpenTable => Self::handle_table_input_mode(app, key),
        }
    }

    fn handle_normal_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);
        let shift = modifiers.contains(KeyModifiers::SHIFT);
        let alt = modifiers.contains(KeyModifiers::ALT);

        if !(ctrl && key == KeyCode::Char('w')) {
            app.pending_close = false;
        }
        app.status_message = None;

        if ctrl {
            match key {
                KeyCode::Char('o') => app.start_open_table(),
                KeyCode::Char('s') => app.save_active(),
                KeyCode::Char('w') => app.close_active_tab(),
                KeyCode::Char('c') => app.copy(),
                KeyCode::Char('v') => app.paste(),
                KeyCode::Char('z') => app.undo(),
                KeyCode::Char('y') => app.redo(),
                KeyCode::Char('a') => {
                    if let Some(session) = app.session_mut() {
                        session.select_all();
                    }
                }
                KeyCode::Char('d') => Self::with_session(app, "Select at least two rows to fill down", |s| s.fill_down()),
                KeyCode::Char('r') => Self::with_session(app, "Cannot insert a row here", |s| s.insert_row()),
                KeyCode::Char('e') => Self::with_session(app, "Cannot delete this row", |s| s.delete_row()),
                KeyCode::Char('t') => Self::with_session(app, "Cannot insert a column here", |s| s.insert_column()),
                KeyCode::Char('g') => Self::with_session(app, "Cannot delete the last column", |s| s.delete_column()),
                KeyCode::PageUp => app.previous_tab(),
                KeyCode::PageDown => app.next_tab(),
                _ => {}
            }
            return;
        }

        if alt {
            match key {
                KeyCode::Left => Self::with_session(app, "", |s| s.resize_column(-CHAR_UNITS)),
                KeyCode::Right => Self::with_session(app, "", |s| s.resize_column(CHAR_UNITS)),
                KeyCode::Up => Self::with_session(app, "", |s| s.resize_row(-LINE_UNITS)),
                KeyCode::Down => Self::with_session(app, "", |s| s.resize_row(LINE_UNITS)),
                _ => {}
            }
            return;
        }

        match key {
            KeyCode::F(1) => {
                app.mode = AppMode::Help;
                app.help_scroll = 0;
            }
            KeyCode::F(5) => app.reload_active(),
            _ => Self::handle_grid_key(app, key, shift),
        }
    }

    /// Keys that act on the active table's selection.
    fn handle_grid_key(app: &mut App, key: KeyCode, shift: bool) {
        let page = app.viewport_rows as isize;
        let Some(session) = app.session_mut() else {
            return;
        };
        let anchor = session.selection().anchor();
        let last_column = session.grid().last_column();

        match key {
            KeyCode::Up => session.move_by((-1, 0), shift),
            KeyCode::Down => session.move_by((1, 0), shift),
            KeyCode::Left => session.move_by((0, -1), shift),
            KeyCode::Right => session.move_by((0, 1), shift),
            KeyCode::PageUp => session.move_by((-page, 0), shift),
            KeyCode::PageDown => session.move_by((page, 0), shift),
            KeyCode::Home => session.move_to(anchor.row, 1),
            KeyCode::End => session.move_to(anchor.row, last_column),
            KeyCode::Enter if shift => session.step(StepDirection::Up),
            KeyCode::Enter => session.step(StepDirection::Down),
            KeyCode::Tab => session.step(StepDirection::Right),
            KeyCode::BackTab => session.step(StepDirection::Left),
            KeyCode::Esc => {
                session.escape();
            }
            KeyCode::Delete | KeyCode::Backspace => {
                session.delete_selection();
            }
            KeyCode::F(2) => app.start_editing(),
            KeyCode::Char(c) => app.start_editing_with(c),
            _ => {}
        }
        app.ensure_cursor_visible();
    }

    /// Runs `action` on the active session, reporting `failure` when it
    /// changes nothing.
    fn with_session(app: &mut App, failure: &str, action: impl FnOnce(&mut EditorSession) -> bool) {
        let Some(session) = app.session_mut() else {
            return;
        };
        if !action(session) && !failure.is_empty() {
            app.status_message = Some(failure.to_string());
        }
        app.ensure_cursor_visible();
    }

    fn handle_editing_mode(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        if modifiers.contains(KeyModifiers::CONTROL) {
            // Chords act on the committed cell, as in normal mode.
            if let Some(session) = app.session_mut() {
                session.commit_edit();
            }
            app.mode = AppMode::Normal;
            Self::handle_normal_mode(app, key, modifiers);
            return;
        }
        if modifiers.contains(KeyModifiers::ALT) {
            return;
        }
        match key {
            KeyCode::Enter if modifiers.contains(KeyModifiers::SHIFT) => app.finish_editing(StepDirection::Up),
            KeyCode::Enter | KeyCode::Down => app.finish_editing(StepDirection::Down),
            KeyCode::Up => app.finish_editing(StepDirection::Up),
            KeyCode::Tab => app.finish_editing(StepDirection::Right),
            KeyCode::BackTab => app.finish_editing(StepDirection::Left),
            KeyCode::Esc => app.cancel_editing(),
            _ => {
                let Some(edit) = app.session_mut().and_then(|s| s.editing_mut()) else {
                    app.mode = AppMode::Normal;
                    return;
                };
                match key {
                    KeyCode::Backspace => edit.backspace(),
                    KeyCode::Delete => edit.delete(),
                    KeyCode::Left => edit.left(),
                    KeyCode::Right => edit.right(),
                    KeyCode::Home => edit.home(),
                    KeyCode::End => edit.end(),
                    KeyCode::Char(c) => edit.insert(c),
                    _ => {}
                }
            }
        }
    }

    fn handle_help_mode(app: &mut App, key: KeyCode) {
        let last_line = help_line_count().saturating_sub(1);
        match key {
            KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q') => {
                app.mode = AppMode::Normal;
            }
            KeyCode::Up => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                app.help_scroll = (app.help_scroll + 1).min(last_line);
            }
            KeyCode::PageUp => {
                app.help_scroll = app.help_scroll.saturating_sub(5);
            }
            KeyCode::PageDown => {
                app.help_scroll = (app.help_scroll + 5).min(last_line);
            }
            KeyCode::Home => {
                app.help_scroll = 0;
            }
            _ => {}
        }
    }

    fn handle_table_input_mode(app: &mut App, key: KeyCode) {
        match key {
            KeyCode::Enter => app.confirm_table_input(),
            KeyCode::Esc => app.cancel_table_input(),
            KeyCode::Tab => app.complete_table_input(),
            KeyCode::Backspace => app.table_input_backspace(),
            KeyCode::Delete => app.table_input_delete(),
            KeyCode::Left => app.table_input_left(),
            KeyCode::Right => app.table_input_right(),
            KeyCode::Home => app.table_input_home(),
            KeyCode::End => app.table_input_end(),
            KeyCode::Char(c) => app.table_input_insert(c),
            _ => {}
        }
    }

    /// Routes a mouse event through the layout of the last drawn frame.
    pub fn handle_mouse_event(app: &mut App, layout: &GridLayout, event: MouseEvent) {
        if !matches!(app.mode, AppMode::Normal | AppMode::Editing) {
            return;
        }
        let (x, y) = GridLayout::units(event.column, event.row);

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let double = app.register_click(event.column, event.row);
                let Some(session) = app.session_mut() else {
                    return;
                };
                let handle = session.selection().range().bottom_right();
                let Some(target) = layout.hit_test(event.column, event.row, handle) else {
                    return;
                };
                let modifiers = Modifiers {
                    shift: event.modifiers.contains(KeyModifiers::SHIFT),
                    ctrl: event.modifiers.contains(KeyModifiers::CONTROL),
                };

                if target == PointerTarget::FillHandle && double {
                    session.commit_edit();
                    session.fill_handle_double_click();
                } else {
                    session.pointer_down(target, x, y, modifiers);
                }
                app.mode = AppMode::Normal;
                if double && matches!(target, PointerTarget::Cell(_)) && !modifiers.shift {
                    app.start_editing();
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let cell = layout.cell_at(event.column, event.row);
                if let Some(session) = app.session_mut() {
                    session.pointer_move(cell, x, y);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(session) = app.session_mut() {
                    session.pointer_up();
                }
            }
            MouseEventKind::ScrollDown => {
                app.scroll_by(WHEEL_ROWS);
                return;
            }
            MouseEventKind::ScrollUp => {
                app.scroll_by(-WHEEL_ROWS);
                return;
            }
            _ => return,
        }
        app.ensure_cursor_visible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CellPosition, MemoryClipboard, DEFAULT_COLUMN_WIDTH, FIRST_DATA_ROW};
    use crate::infrastructure::{Settings, TableRepository};
    use ratatui::layout::Rect;
    use std::fs;
    use tempfile::TempDir;

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("schema")).unwrap();
        fs::create_dir_all(dir.path().join("data")).unwrap();
        fs::write(
            dir.path().join("schema").join("items.json"),
            r#"{"description":"","primary_key":"id","header":[{"key":1,"name":"id","type":"int"},{"key":2,"name":"label","type":"string"}]}"#,
        )
        .unwrap();
        fs::write(dir.path().join("data").join("items.csv"), "id,label\n1,one\n2,two\n").unwrap();
        dir
    }

    fn app(dir: &TempDir) -> App {
        let settings = Settings {
            min_rows: 20,
            ..Settings::default()
        };
        let mut app = App::new(settings, TableRepository::new(dir.path()), Box::new(MemoryClipboard::new()));
        app.open_table("items");
        app
    }

    fn press(app: &mut App, key: KeyCode, modifiers: KeyModifiers) {
        InputHandler::handle_key_event(app, key, modifiers);
    }

    fn mouse(app: &mut App, layout: &GridLayout, kind: MouseEventKind, column: u16, row: u16) {
        let event = MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        };
        InputHandler::handle_mouse_event(app, layout, event);
    }

    fn layout(app: &App) -> GridLayout {
        let tab = app.active_tab().unwrap();
        GridLayout::compute(Rect::new(0, 0, 80, 30), tab.session.grid(), tab.scroll_row, tab.scroll_col)
    }

    #[test]
    fn test_typing_starts_and_commits_edit() {
        let dir = project();
        let mut app = app(&dir);
        app.session_mut().unwrap().move_to(FIRST_DATA_ROW + 2, 2);

        press(&mut app, KeyCode::Char('t'), KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::Editing);
        press(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('e'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        let session = app.session().unwrap();
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(session.grid().cell(FIRST_DATA_ROW + 2, 2), "tex");
        assert_eq!(session.selection().anchor(), CellPosition::new(FIRST_DATA_ROW + 3, 2));
        assert!(session.is_dirty());
    }

    #[test]
    fn test_ctrl_chords_while_editing_commit_first() {
        let dir = project();
        let mut app = app(&dir);
        app.session_mut().unwrap().move_to(FIRST_DATA_ROW + 2, 1);
        press(&mut app, KeyCode::Char('3'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('s'), KeyModifiers::CONTROL);

        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.status_message.as_deref(), Some("Saved items"));
        assert!(app.session().unwrap().editing().is_none());
        let saved = fs::read_to_string(dir.path().join("data").join("items.csv")).unwrap();
        assert_eq!(saved, "id,label\n1,one\n2,two\n3,\n");

        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('4'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(app.session().unwrap().grid().cell(FIRST_DATA_ROW + 2, 1), "3");

        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('x'), KeyModifiers::ALT);
        assert_eq!(app.mode, AppMode::Editing);
        assert_eq!(app.session().unwrap().editing().unwrap().input, "3");
    }

    #[test]
    fn test_open_prompt_with_wide_characters() {
        let dir = project();
        fs::write(
            dir.path().join("schema").join("アイテム.json"),
            r#"{"description":"","primary_key":"id","header":[{"key":1,"name":"id","type":"int"}]}"#,
        )
        .unwrap();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('o'), KeyModifiers::CONTROL);
        press(&mut app, KeyCode::Char('ア'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.table_input, "アイテム");

        press(&mut app, KeyCode::Left, KeyModifiers::NONE);
        press(&mut app, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.table_input, "アイム");
        press(&mut app, KeyCode::End, KeyModifiers::NONE);
        press(&mut app, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.table_input, "アイ");
    }

    #[test]
    fn test_escape_cancels_edit() {
        let dir = project();
        let mut app = app(&dir);
        press(&mut app, KeyCode::F(2), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('9'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::Normal);
        assert_eq!(app.session().unwrap().grid().cell(FIRST_DATA_ROW, 1), "1");
        assert!(!app.session().unwrap().is_dirty());
    }

    #[test]
    fn test_shift_arrows_extend_and_delete_clears() {
        let dir = project();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Down, KeyModifiers::SHIFT);
        press(&mut app, KeyCode::Right, KeyModifiers::SHIFT);
        let range = app.session().unwrap().selection().range();
        assert_eq!((range.row_count(), range.column_count()), (2, 2));

        press(&mut app, KeyCode::Delete, KeyModifiers::NONE);
        let grid = app.session().unwrap().grid();
        assert_eq!(grid.cell(FIRST_DATA_ROW, 2), "");
        assert_eq!(grid.cell(FIRST_DATA_ROW + 1, 1), "");

        press(&mut app, KeyCode::Char('z'), KeyModifiers::CONTROL);
        assert_eq!(app.session().unwrap().grid().cell(FIRST_DATA_ROW + 1, 2), "two");
    }

    #[test]
    fn test_structural_keys() {
        let dir = project();
        let mut app = app(&dir);
        let rows = app.session().unwrap().grid().row_count();
        let columns = app.session().unwrap().grid().column_count();

        press(&mut app, KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(app.session().unwrap().grid().row_count(), rows + 1);
        assert_eq!(app.session().unwrap().grid().cell(FIRST_DATA_ROW + 1, 2), "one");

        press(&mut app, KeyCode::Char('e'), KeyModifiers::CONTROL);
        assert_eq!(app.session().unwrap().grid().row_count(), rows);

        press(&mut app, KeyCode::Char('t'), KeyModifiers::CONTROL);
        assert_eq!(app.session().unwrap().grid().column_count(), columns + 1);
        press(&mut app, KeyCode::Char('g'), KeyModifiers::CONTROL);
        assert_eq!(app.session().unwrap().grid().column_count(), columns);

        press(&mut app, KeyCode::Right, KeyModifiers::ALT);
        let column = app.session().unwrap().selection().anchor().column;
        assert_eq!(
            app.session().unwrap().grid().column_width(column),
            DEFAULT_COLUMN_WIDTH + CHAR_UNITS as u32
        );
        assert_eq!(app.session().unwrap().history().len(), 5);
    }

    #[test]
    fn test_close_needs_second_press_when_dirty() {
        let dir = project();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Delete, KeyModifiers::NONE);

        press(&mut app, KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert!(app.pending_close);
        press(&mut app, KeyCode::Down, KeyModifiers::NONE);
        assert!(!app.pending_close);

        press(&mut app, KeyCode::Char('w'), KeyModifiers::CONTROL);
        press(&mut app, KeyCode::Char('w'), KeyModifiers::CONTROL);
        assert!(app.tabs.is_empty());
    }

    #[test]
    fn test_help_mode_scrolls_and_closes() {
        let dir = project();
        let mut app = app(&dir);
        press(&mut app, KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::Help);
        press(&mut app, KeyCode::PageDown, KeyModifiers::NONE);
        press(&mut app, KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(app.help_scroll, 4);
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::Normal);
    }

    #[test]
    fn test_open_prompt_typing() {
        let dir = project();
        let mut app = app(&dir);
        press(&mut app, KeyCode::Char('o'), KeyModifiers::CONTROL);
        assert_eq!(app.mode, AppMode::OpenTable);
        press(&mut app, KeyCode::Char('i'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Char('x'), KeyModifiers::NONE);
        press(&mut app, KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(app.table_input, "i");
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        assert_eq!(app.table_input, "items");
        press(&mut app, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(app.mode, AppMode::Normal);
        assert!(app.table_input.is_empty());
    }

    #[test]
    fn test_mouse_drag_selects_range() {
        let dir = project();
        let mut app = app(&dir);
        let layout = layout(&app);
        let first = layout.rows.iter().find(|r| r.row == FIRST_DATA_ROW).unwrap().y;
        let (a, b) = (layout.columns[0].x, layout.columns[1].x);

        mouse(&mut app, &layout, MouseEventKind::Down(MouseButton::Left), a, first);
        mouse(&mut app, &layout, MouseEventKind::Drag(MouseButton::Left), b, first + 2);
        mouse(&mut app, &layout, MouseEventKind::Up(MouseButton::Left), b, first + 2);

        let selection = app.session().unwrap().selection();
        assert!(!selection.is_selecting());
        let range = selection.range();
        assert_eq!(range.top_left(), CellPosition::new(FIRST_DATA_ROW, 1));
        assert_eq!(range.bottom_right(), CellPosition::new(FIRST_DATA_ROW + 2, 2));
    }

    #[test]
    fn test_mouse_fill_handle_drag_fills_series() {
        let dir = project();
        let mut app = app(&dir);
        app.session_mut().unwrap().move_to(FIRST_DATA_ROW, 1);
        press(&mut app, KeyCode::Down, KeyModifiers::SHIFT);
        let layout = layout(&app);

        let handle_row = layout.rows.iter().find(|r| r.row == FIRST_DATA_ROW + 1).unwrap();
        let column = layout.columns[0];
        let handle_x = column.x + column.width - 1;
        mouse(&mut app, &layout, MouseEventKind::Down(MouseButton::Left), handle_x, handle_row.y);
        assert!(app.session().unwrap().selection().is_filling());
        mouse(&mut app, &layout, MouseEventKind::Drag(MouseButton::Left), column.x, handle_row.y + 2);
        mouse(&mut app, &layout, MouseEventKind::Up(MouseButton::Left), column.x, handle_row.y + 2);

        let grid = app.session().unwrap().grid();
        assert_eq!(grid.cell(FIRST_DATA_ROW + 2, 1), "3");
        assert_eq!(grid.cell(FIRST_DATA_ROW + 3, 1), "4");
        assert_eq!(grid.cell(FIRST_DATA_ROW + 4, 1), "");
    }

    #[test]
    fn test_mouse_column_border_resizes() {
        let dir = project();
        let mut app = app(&dir);
        let layout = layout(&app);
        let column = layout.columns[0];
        let border = column.x + column.width - 1;

        mouse(&mut app, &layout, MouseEventKind::Down(MouseButton::Left), border, 0);
        mouse(&mut app, &layout, MouseEventKind::Drag(MouseButton::Left), border + 5, 0);
        mouse(&mut app, &layout, MouseEventKind::Up(MouseButton::Left), border + 5, 0);

        let session = app.session().unwrap();
        assert_eq!(session.grid().column_width(1), DEFAULT_COLUMN_WIDTH + 5 * CHAR_UNITS as u32);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_mouse_wheel_scrolls() {
        let dir = project();
        let mut app = app(&dir);
        let layout = layout(&app);
        mouse(&mut app, &layout, MouseEventKind::ScrollDown, 10, 10);
        assert_eq!(app.active_tab().unwrap().scroll_row, 1 + WHEEL_ROWS as usize);
        mouse(&mut app, &layout, MouseEventKind::ScrollUp, 10, 10);
        assert_eq!(app.active_tab().unwrap().scroll_row, 1);
    }
}
