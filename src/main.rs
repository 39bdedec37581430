//! mdedit - master data editor
//!
//! Opens the tables of a project directory (`schema/<name>.json` plus
//! `data/<name>.csv`) in tabs and edits them as grids. Logs go to a file so
//! they never disturb the terminal UI.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing_subscriber::EnvFilter;

use mdedit::infrastructure::{Settings, SystemClipboard, TableRepository};
use mdedit::presentation::{render_ui, GridLayout, InputHandler};
use mdedit::App;

#[derive(Parser, Debug)]
#[command(name = "mdedit", version, about = "Terminal editor for master-data tables")]
struct Args {
    /// Project directory containing `schema/` and `data/`
    #[arg(default_value = ".")]
    project: PathBuf,

    /// Tables to open on start
    tables: Vec<String>,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log file (overrides the settings file)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref())?;
    if args.log_file.is_some() {
        settings.log_file = args.log_file.clone();
    }
    init_logging(&settings)?;
    tracing::info!(project = %args.project.display(), "starting");

    let repository = TableRepository::new(&args.project);
    let mut app = App::new(settings, repository, Box::new(SystemClipboard::new()));
    for table in &args.tables {
        app.open_table(table);
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal failure");
        println!("{err:?}");
    }
    tracing::info!("exiting");

    Ok(())
}

fn init_logging(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))?;
    let file = File::create(settings.log_path())?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Main application event loop.
///
/// Draws a frame, then routes the next key or mouse event. The layout of the
/// drawn frame is kept for mouse hit-testing. Ctrl+Q quits.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let mut layout = GridLayout::default();
    loop {
        terminal.draw(|f| {
            layout = render_ui(f, app);
        })?;
        app.update_viewport_size(layout.rows.len(), layout.columns.len());

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }
                InputHandler::handle_key_event(app, key.code, key.modifiers);
            }
            Event::Mouse(mouse) => InputHandler::handle_mouse_event(app, &layout, mouse),
            _ => {}
        }
    }
}
