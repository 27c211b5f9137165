use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::watch;
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::config::RESTORE_NAME_NOTE;
use crate::error::WizardError;
use crate::types::{Item, OperationKind, Outcome, StepId};

const BASE_FG: Color = Color::Rgb(216, 222, 233);
const BASE_BG: Color = Color::Rgb(46, 52, 64);
const ACCENT_COLOR: Color = Color::Rgb(136, 192, 208);
const SUCCESS_COLOR: Color = Color::Rgb(163, 190, 140);
const WARNING_COLOR: Color = Color::Rgb(235, 203, 139);
const HIGHLIGHT_BG: Color = Color::Rgb(59, 66, 82);
const BORDER_COLOR: Color = Color::Rgb(76, 86, 106);
const INPUT_TEXT: Color = Color::Rgb(235, 203, 139);

const TICK_RATE: Duration = Duration::from_millis(250);
const QUIT_LISTEN_RATE: Duration = Duration::from_millis(100);

pub async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if app.step_id() == StepId::Execute {
            run_execution(app).await?;
            if matches!(app.last_error, Some(WizardError::Cancelled { .. })) {
                break;
            }
            continue;
        }

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.is_finished() {
                    break;
                }
                if app.step_id() == StepId::EnterName {
                    handle_edit_input(app, key.code, key.modifiers).await?;
                } else {
                    handle_normal_input(app, key.code, key.modifiers).await?;
                }
                if matches!(app.outcome(), Some(Outcome::Quit)) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Runs the execute step while a blocking listener watches for the quit key
/// and turns it into a cancel signal for the poller.
async fn run_execution(app: &mut App) -> Result<()> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let listener = tokio::task::spawn_blocking(move || listen_for_quit(&cancel_tx));
    app.execute(cancel_rx).await;
    listener.await??;
    Ok(())
}

fn listen_for_quit(cancel: &watch::Sender<bool>) -> io::Result<()> {
    while !cancel.is_closed() {
        if event::poll(QUIT_LISTEN_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && is_quit_key(key.code, key.modifiers) {
                    let _ = cancel.send(true);
                    return Ok(());
                }
            }
        }
    }
    Ok(())
}

fn is_quit_key(key: KeyCode, modifiers: KeyModifiers) -> bool {
    matches!(key, KeyCode::Char('q'))
        || (matches!(key, KeyCode::Char('c')) && modifiers.contains(KeyModifiers::CONTROL))
}

pub async fn handle_normal_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
    if is_quit_key(key, modifiers) {
        app.quit();
        return Ok(());
    }
    if app.show_help {
        if matches!(key, KeyCode::Char('h') | KeyCode::Esc) {
            app.toggle_help();
        }
        return Ok(());
    }
    match key {
        KeyCode::Char('h') => app.toggle_help(),
        KeyCode::Up | KeyCode::Char('k') => app.move_selection_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection_down(),
        KeyCode::Char(' ') => app.toggle_current(),
        KeyCode::Enter => app.confirm().await,
        _ => {}
    }
    Ok(())
}

/// Keys while the name is being typed; only ctrl+c quits here.
pub async fn handle_edit_input(app: &mut App, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
    match key {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.quit(),
        KeyCode::Enter => app.confirm().await,
        KeyCode::Char(c) => app.push_char(c),
        KeyCode::Backspace => app.pop_char(),
        _ => {}
    }
    Ok(())
}

pub fn ui(f: &mut Frame, app: &App) {
    let error_height = if app.last_error.is_some() { 3 } else { 0 };
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(error_height),
            Constraint::Length(3),
        ])
        .split(f.area());

    render_header(f, main_chunks[0], app);
    render_content(f, main_chunks[1], app);
    if let Some(err) = &app.last_error {
        render_error_line(f, main_chunks[2], err);
    }
    render_footer(f, main_chunks[3], app);

    if app.show_help {
        render_help_popup(f);
    }
}

fn step_subtitle(app: &App) -> String {
    match (app.step_id(), app.outcome()) {
        (_, Some(Outcome::Failed { at })) => format!("Stopped at: {}", at.title()),
        (StepId::Terminal, _) => StepId::Terminal.title().to_string(),
        (step, _) => format!("Step {}: {}", step_number(app, step), step.title()),
    }
}

/// Position of `step` along the path this session takes.
fn step_number(app: &App, step: StepId) -> usize {
    let choices = &app.choices;
    let restore = usize::from(choices.backup().is_some());
    let resource_steps = if choices.operation() == Some(OperationKind::Backup)
        && app.settings.resource_selection
    {
        1 + usize::from(!choices.resources().is_empty())
    } else {
        0
    };
    let name = 4 + restore + resource_steps;
    match step {
        StepId::ChooseOperation => 1,
        StepId::ChooseExistingBackup => 2,
        StepId::ChooseContext => 2 + restore,
        StepId::ChooseNamespaces => 3 + restore,
        StepId::DecideSpecificResources => 4 + restore,
        StepId::ChooseResources => 5 + restore,
        StepId::EnterName => name,
        StepId::Execute | StepId::Terminal => name + 1,
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let title = if app.settings.dry_run {
        " Velero Wizard - DRY RUN MODE "
    } else {
        " Velero Wizard "
    };

    let header_block = Block::default()
        .title(title)
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(if app.settings.dry_run {
            Style::default().fg(WARNING_COLOR).bg(BASE_BG)
        } else {
            Style::default().fg(BASE_FG).bg(BASE_BG)
        });

    let header_content = Paragraph::new(step_subtitle(app))
        .style(Style::default().fg(ACCENT_COLOR))
        .alignment(Alignment::Center)
        .block(header_block);

    f.render_widget(header_content, area);
}

fn render_content(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    match app.step_id() {
        StepId::EnterName => render_name_input(f, chunks[0], app),
        StepId::Execute => render_running(f, chunks[0], app),
        StepId::Terminal => render_outcome(f, chunks[0], app),
        _ => render_item_list(f, chunks[0], app),
    }
    render_summary(f, chunks[1], app);
}

fn render_item_list(f: &mut Frame, area: Rect, app: &App) {
    let step = app.step_id();
    let selection = app.selection();

    let items: Vec<ListItem> = app
        .items()
        .iter()
        .map(|item| {
            let mut spans = Vec::new();
            if step.is_multi_select() {
                let marker = if selection.is_some_and(|set| set.contains(item)) {
                    "[x] "
                } else {
                    "[ ] "
                };
                spans.push(Span::styled(marker, Style::default().fg(SUCCESS_COLOR)));
            }
            spans.push(Span::styled(item.title(), Style::default().fg(BASE_FG)));
            if !item.description().is_empty() {
                spans.push(Span::styled(
                    format!("  {}", item.description()),
                    Style::default().fg(BORDER_COLOR),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = if step.is_multi_select() {
        format!("{} (Space to toggle, Enter to confirm)", step.title())
    } else {
        format!("{} (Enter to confirm)", step.title())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(ACCENT_COLOR));

    if items.is_empty() {
        f.render_widget(
            Paragraph::new("→ Nothing found")
                .block(block)
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(HIGHLIGHT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("► ");

    let mut state = ListState::default();
    state.select(app.cursor());

    f.render_stateful_widget(list, area, &mut state);
}

fn render_name_input(f: &mut Frame, area: Rect, app: &App) {
    let buffer = app.name_buffer().unwrap_or_default();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let title = match app.choices.operation() {
        Some(kind) => format!("Enter a Name for the {}", kind.title()),
        None => "Enter a Name".to_string(),
    };
    let input = Paragraph::new(buffer)
        .style(Style::default().fg(INPUT_TEXT))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title)
                .style(Style::default().fg(ACCENT_COLOR).bg(BASE_BG)),
        );
    f.render_widget(input, chunks[0]);

    f.set_cursor_position((
        chunks[0].x + buffer.width() as u16 + 1,
        chunks[0].y + 1,
    ));

    let help = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Confirm | [Ctrl+C] Quit",
            Style::default().fg(WARNING_COLOR),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(help, chunks[1]);
}

fn render_running(f: &mut Frame, area: Rect, app: &App) {
    let record = app.choices.record();
    let target = record
        .as_ref()
        .map(|record| format!("{} {}", record.kind, record.poll_name()))
        .unwrap_or_default();
    let mut text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("🔄 Submitting {target} and waiting for it to complete..."),
            Style::default().fg(WARNING_COLOR),
        )),
        Line::from(""),
        Line::from(format!(
            "Status is checked every {}s.",
            app.settings.poll_interval.as_secs()
        )),
        Line::from("Press 'q' to stop waiting (the operation keeps running in the cluster)."),
    ];
    if record.is_some_and(|record| record.kind == OperationKind::Restore) {
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            RESTORE_NAME_NOTE,
            Style::default().fg(BORDER_COLOR),
        )));
    }

    f.render_widget(
        Paragraph::new(text)
            .block(
                Block::default()
                    .title("Running")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(WARNING_COLOR)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_outcome(f: &mut Frame, area: Rect, app: &App) {
    let (headline, detail, style) = match app.outcome() {
        Some(Outcome::Completed { kind, name }) => (
            "✅ Completed".to_string(),
            format!("{kind} {name} completed successfully"),
            Style::default().fg(SUCCESS_COLOR),
        ),
        Some(Outcome::DryRun { command }) => (
            "Dry run - nothing was executed".to_string(),
            command.clone(),
            Style::default().fg(WARNING_COLOR),
        ),
        Some(Outcome::Failed { at }) => (
            "❌ ERROR".to_string(),
            format!("Stopped at step: {}", at.title()),
            Style::default().fg(Color::Red),
        ),
        Some(Outcome::Quit) | None => (String::new(), String::new(), Style::default()),
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(headline, style.add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(detail),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to exit",
            Style::default().fg(Color::Yellow),
        )),
    ];

    f.render_widget(
        Paragraph::new(text)
            .block(
                Block::default()
                    .title("Result")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(style),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn summary_line<'a>(label: &'a str, value: Option<String>) -> Line<'a> {
    match value {
        Some(value) => Line::from(vec![
            Span::styled(format!("{label}: "), Style::default().fg(BORDER_COLOR)),
            Span::styled(format!("✓ {value}"), Style::default().fg(SUCCESS_COLOR)),
        ]),
        None => Line::from(Span::styled(
            format!("{label}: Pending..."),
            Style::default().fg(BORDER_COLOR),
        )),
    }
}

fn joined(items: &[Item]) -> Option<String> {
    if items.is_empty() {
        None
    } else {
        Some(items.iter().map(Item::title).collect::<Vec<_>>().join(", "))
    }
}

fn render_summary(f: &mut Frame, area: Rect, app: &App) {
    let choices = &app.choices;
    let mut lines = vec![summary_line(
        "Operation",
        choices.operation().map(|kind| kind.title().to_string()),
    )];
    if choices.backup().is_some() {
        lines.push(summary_line(
            "Backup",
            choices.backup().map(|backup| backup.title().to_string()),
        ));
    }
    lines.push(summary_line(
        "Context",
        choices.context().map(|context| context.title().to_string()),
    ));
    lines.push(summary_line("Namespaces", joined(choices.namespaces())));
    if !choices.resources().is_empty() {
        lines.push(summary_line("Resources", joined(choices.resources())));
    }
    lines.push(summary_line("Name", choices.name().map(str::to_string)));

    if let Some(selection) = app.selection() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "Selected {} ({}):",
                app.step_id().title().trim_start_matches("Select "),
                selection.len()
            ),
            Style::default().fg(ACCENT_COLOR).add_modifier(Modifier::BOLD),
        )));
        for item in selection.items() {
            lines.push(Line::from(format!("• {}", item.title())));
        }
    }

    f.render_widget(
        Paragraph::new(lines)
            .block(
                Block::default()
                    .title("Selected so far")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(BORDER_COLOR)),
            )
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_error_line(f: &mut Frame, area: Rect, err: &WizardError) {
    f.render_widget(
        Paragraph::new(format!("Error: {err}"))
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Double)
                    .style(Style::default().fg(Color::Red)),
            )
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let help_text = match app.step_id() {
        StepId::ChooseNamespaces | StepId::ChooseResources => {
            " [↑/↓] Navigate | [Space] Toggle | [Enter] Confirm | [h] Help | [q] Quit "
        }
        StepId::EnterName => " [Enter] Confirm | [Ctrl+C] Quit ",
        StepId::Execute => " [q] Stop waiting ",
        StepId::Terminal => " [any key] Exit ",
        _ => " [↑/↓] Navigate | [Enter] Select | [h] Help | [q] Quit ",
    };

    f.render_widget(
        Paragraph::new(help_text)
            .block(
                Block::default()
                    .title("Controls")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .style(Style::default().fg(BORDER_COLOR)),
            )
            .alignment(Alignment::Center)
            .style(Style::default().fg(BASE_FG)),
        area,
    );
}

fn render_help_popup(f: &mut Frame) {
    let popup_area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, popup_area);

    let heading = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled(
            "🔧 HELP - Velero Wizard",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled("General:", heading)),
        Line::from("  --dry-run                 Show the command instead of running it"),
        Line::from("  --debug                   Print a debug log after exit"),
        Line::from(""),
        Line::from(Span::styled("Navigation:", heading)),
        Line::from("  ↑/↓ or k/j  Navigate through lists"),
        Line::from("  Space       Toggle a namespace or resource"),
        Line::from("  Enter       Confirm the current step"),
        Line::from(""),
        Line::from(Span::styled("Commands:", heading)),
        Line::from("  H           Toggle this help screen"),
        Line::from("  Q / Ctrl+C  Quit (Ctrl+C only while typing a name)"),
        Line::from(""),
        Line::from(Span::styled(
            "Press H or Esc to close this help",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true })
        .style(Style::default().bg(Color::Black));

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
