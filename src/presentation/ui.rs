use crate::application::{App, AppMode, EditorSession, Tab};
use crate::domain::{CellPosition, Grid, FIRST_DATA_ROW};
use crate::presentation::layout::GridLayout;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, Tabs},
    Frame,
};

const FILL_HANDLE: &str = "■";

/// Draws the whole screen and returns where the grid lanes ended up, for
/// mouse hit-testing until the next frame.
pub fn render_ui(f: &mut Frame, app: &App) -> GridLayout {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_tabs(f, app, chunks[0]);
    let layout = match app.active_tab() {
        Some(tab) => render_grid(f, tab, chunks[1]),
        None => {
            render_empty(f, chunks[1]);
            GridLayout::default()
        }
    };
    render_status_bar(f, app, chunks[2]);

    match app.mode {
        AppMode::Help => render_help_popup(f, app.help_scroll),
        AppMode::OpenTable => render_open_popup(f, app),
        _ => {}
    }
    layout
}

fn render_tabs(f: &mut Frame, app: &App, area: Rect) {
    if app.tabs.is_empty() {
        let title = Paragraph::new("mdedit - master data editor").style(Style::default().fg(Color::Cyan));
        f.render_widget(title, area);
        return;
    }
    let titles: Vec<String> = app.tabs.iter().map(Tab::title).collect();
    let tabs = Tabs::new(titles)
        .select(app.active)
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    f.render_widget(tabs, area);
}

fn render_empty(f: &mut Frame, area: Rect) {
    let text = Paragraph::new("No table open. Ctrl+O: open a table | F1: help | Ctrl+Q: quit")
        .block(Block::default().borders(Borders::ALL).title("Tables"));
    f.render_widget(text, area);
}

fn render_grid(f: &mut Frame, tab: &Tab, area: Rect) -> GridLayout {
    let session = &tab.session;
    let grid = session.grid();
    let title = if session.is_dirty() {
        format!("{}*", session.name())
    } else {
        session.name().to_string()
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    let layout = GridLayout::compute(inner, grid, tab.scroll_row, tab.scroll_col);

    let selection = session.selection();
    let range = selection.range();

    let mut headers = vec![Cell::from("")];
    for span in &layout.columns {
        let style = if range.contains_column(span.column) {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else {
            Style::default().fg(Color::Yellow)
        };
        headers.push(Cell::from(grid.cell(0, span.column).to_string()).style(style));
    }
    let header_row = Row::new(headers).height(1);

    let mut rows = Vec::with_capacity(layout.rows.len());
    for lane in &layout.rows {
        let label_style = if range.contains_row(lane.row) {
            Style::default().bg(Color::LightBlue).fg(Color::Black)
        } else if lane.row < FIRST_DATA_ROW {
            Style::default().fg(Color::Magenta)
        } else {
            Style::default().fg(Color::Yellow)
        };
        let mut cells = vec![Cell::from(grid.cell(lane.row, 0).to_string()).style(label_style)];
        for span in &layout.columns {
            let position = CellPosition::new(lane.row, span.column);
            cells.push(grid_cell(session, position, span.width));
        }
        rows.push(Row::new(cells).height(lane.height));
    }

    let mut widths = vec![Constraint::Length(layout.row_header_width)];
    widths.extend(layout.columns.iter().map(|c| Constraint::Length(c.width)));

    let table = Table::new(rows, widths)
        .header(header_row)
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
    layout
}

fn grid_cell(session: &EditorSession, position: CellPosition, width: u16) -> Cell<'static> {
    let grid = session.grid();
    let selection = session.selection();
    let range = selection.range();

    let text = match session.editing() {
        Some(edit) if edit.position == position => edit.input.clone(),
        _ => grid.cell(position.row, position.column).to_string(),
    };

    let mut style = if position.row < FIRST_DATA_ROW {
        Style::default().fg(Color::Magenta)
    } else {
        Style::default()
    };
    if let Some(info) = selection.fill_info() {
        if info.target_range.contains(position) {
            style = style.bg(Color::DarkGray);
        }
    }
    if range.contains(position) {
        style = style.bg(Color::Blue).fg(Color::White);
    }
    if position == selection.anchor() {
        style = style.bg(Color::Cyan).fg(Color::Black);
        if session.is_editing() {
            style = style.bg(Color::Green);
        }
    }
    if selection.copy_range().is_some_and(|c| c.contains(position)) {
        style = style
            .add_modifier(Modifier::UNDERLINED)
            .underline_color(Color::Green);
    }

    if position != range.bottom_right() || width < 2 {
        return Cell::from(text).style(style);
    }
    let body: String = text.chars().take(usize::from(width) - 1).collect();
    let padded = format!("{:<pad$}", body, pad = usize::from(width) - 1);
    Cell::from(Line::from(vec![
        Span::raw(padded),
        Span::styled(FILL_HANDLE, Style::default().fg(Color::Green)),
    ]))
    .style(style)
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let input_text = match app.mode {
        AppMode::Normal => match (&app.status_message, app.session()) {
            (Some(status), _) => status.clone(),
            (None, Some(session)) => cell_summary(session),
            (None, None) => "Ctrl+O: open | F1: help | Ctrl+Q: quit".to_string(),
        },
        AppMode::Editing => match app.session().and_then(EditorSession::editing) {
            Some(edit) => format!(
                "{}: {} (Enter: commit, Tab: commit and move right, Esc: cancel)",
                cell_name(edit.position),
                edit.input
            ),
            None => String::new(),
        },
        AppMode::Help => "↑↓: scroll | PgUp/PgDn: fast scroll | Home: top | Esc/F1: close help".to_string(),
        AppMode::OpenTable => format!("Open table: {} (Tab: complete, Enter: open, Esc: cancel)", app.table_input),
    };

    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title("Status"))
        .style(match app.mode {
            AppMode::Normal => Style::default(),
            AppMode::Editing => Style::default().fg(Color::Green),
            AppMode::Help => Style::default().fg(Color::Cyan),
            AppMode::OpenTable => Style::default().fg(Color::Yellow),
        });
    f.render_widget(input, area);

    if app.mode == AppMode::Editing {
        if let Some(edit) = app.session().and_then(EditorSession::editing) {
            let prefix = cell_name(edit.position).chars().count() + 2;
            let x = area.x + 1 + (prefix + edit.cursor) as u16;
            f.set_cursor_position((x.min(area.right().saturating_sub(2)), area.y + 1));
        }
    }
}

fn cell_name(position: CellPosition) -> String {
    format!(
        "{}{}",
        Grid::column_label(position.column.saturating_sub(1)),
        Grid::row_label(position.row)
    )
}

fn cell_summary(session: &EditorSession) -> String {
    let selection = session.selection();
    let range = selection.range();
    let anchor = selection.anchor();
    let value = session.grid().cell(anchor.row, anchor.column);
    if range.is_single_cell() {
        format!("{}: {}", cell_name(anchor), value)
    } else {
        format!(
            "{}: {} | {}x{} selected",
            cell_name(anchor),
            value,
            range.row_count(),
            range.column_count()
        )
    }
}

fn popup_area(area: Rect) -> Rect {
    Rect {
        x: area.width / 10,
        y: area.height / 10,
        width: area.width * 4 / 5,
        height: area.height * 4 / 5,
    }
}

fn render_open_popup(f: &mut Frame, app: &App) {
    let area = popup_area(f.area());
    f.render_widget(Clear, area);
    let items: Vec<ListItem> = app
        .available_tables
        .iter()
        .filter(|t| t.starts_with(app.table_input.as_str()))
        .map(|t| ListItem::new(t.as_str()))
        .collect();
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Tables in {}", app.repository.root().display()))
            .style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(list, area);
}

fn render_help_popup(f: &mut Frame, scroll: usize) {
    let popup_area = popup_area(f.area());
    f.render_widget(Clear, popup_area);

    let help_lines: Vec<&str> = HELP_TEXT.lines().collect();
    let visible_height = popup_area.height.saturating_sub(2) as usize;

    let start_line = scroll.min(help_lines.len().saturating_sub(visible_height));
    let end_line = (start_line + visible_height).min(help_lines.len());

    let visible_text = help_lines[start_line..end_line].join("\n");

    let help_widget = Paragraph::new(visible_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("mdedit Help (Line {}/{})", start_line + 1, help_lines.len()))
                .style(Style::default().fg(Color::Cyan)),
        )
        .style(Style::default().fg(Color::White));

    f.render_widget(help_widget, popup_area);
}

pub fn help_line_count() -> usize {
    HELP_TEXT.lines().count()
}

const HELP_TEXT: &str = r#"MDEDIT MASTER DATA EDITOR

=== TABLE LAYOUT ===
• The first five rows describe each column: key, name, type, comment, references
• Data rows follow, numbered from 1
• Column letters and row labels sit in the header lanes

=== NAVIGATION ===
Arrow keys        Move the active cell
Shift+Arrows      Extend the selection
Enter / Shift+Enter   Step down / up, cycling inside a selection
Tab / Shift+Tab   Step right / left, cycling inside a selection
Home / End        First / last column
PgUp / PgDn       Move one screen
Ctrl+A            Select the whole table
Esc               Dismiss the copy marker

=== EDITING ===
F2                Edit the active cell
Any character     Start editing with that character
Enter / Tab       Commit the edit and move
Esc               Cancel the edit
Delete/Backspace  Clear the selected cells
Ctrl+D            Fill the first row of the selection down as a series

=== CLIPBOARD AND HISTORY ===
Ctrl+C            Copy the selection
Ctrl+V            Paste (a multi-cell target at least as large as the copy is tiled)
Ctrl+Z            Undo
Ctrl+Y            Redo

=== ROWS AND COLUMNS ===
Ctrl+R            Insert a row at the active row
Ctrl+E            Delete the active row
Ctrl+T            Insert a column at the active column
Ctrl+G            Delete the active column
Alt+Left/Right    Shrink / grow the active column
Alt+Up/Down       Shrink / grow the active row

=== MOUSE ===
Click / drag      Select cells
Header click      Select a row or column (Shift extends, Ctrl adds)
Corner click      Select everything
Header edge drag  Resize a column or row
■ drag            Fill the selection as a series
■ double-click    Fill down to the last used row
Wheel             Scroll

=== FILES AND TABS ===
Ctrl+O            Open a table from the project
Ctrl+S            Save the active table
F5                Reload the active table from disk
Ctrl+W            Close the tab (twice if there are unsaved changes)
Ctrl+PgUp/PgDn    Previous / next tab
F1                Show this help
Ctrl+Q            Quit

=== HELP NAVIGATION ===
↑↓                Scroll help text up/down one line
Page Up/Down      Scroll help text up/down 5 lines
Home              Jump to top of help text
Esc/F1            Close this help window"#;
