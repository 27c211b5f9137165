use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tracing::info_span;

use velero_wizard::app::App;
use velero_wizard::config::{self, Settings};
use velero_wizard::logging;
use velero_wizard::shell::ShellExecutor;
use velero_wizard::types::Outcome;
use velero_wizard::ui::run_app;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = config::cli().get_matches();
    let settings = Settings::from_matches(&matches);
    let log_buffer = logging::init(settings.debug);

    let span = info_span!("wizard", dry_run = settings.dry_run);
    let executor = ShellExecutor::new(span.clone());
    let mut app = App::new(Box::new(executor), settings, span);

    let res = run_tui_app(&mut app).await;

    if let Some(buffer) = log_buffer {
        println!("\nDebug log:");
        println!("{}", buffer.contents());
    }
    res?;

    match app.outcome() {
        Some(Outcome::Completed { kind, name }) => println!("{kind} {name} completed successfully"),
        Some(Outcome::DryRun { command }) => println!("Dry run, would run: {command}"),
        _ => {}
    }
    if let Some(err) = &app.last_error {
        println!("Error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_tui_app(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}
