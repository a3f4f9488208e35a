pub mod app;
pub mod event;
mod views;
mod widgets;

use std::time::Duration;

use aether_core::api::{ChatBackend, HttpBackend};
use aether_core::auth;
use aether_core::config::AetherConfig;
use aether_core::files::fetch_files;
use aether_core::workspace::Workspace;
use anyhow::{Context, Result};
use crossterm::event::{
    self as ct_event, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEventKind,
};
use crossterm::execute;
use ratatui::{
    layout::{Constraint, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    DefaultTerminal, Frame,
};
use tokio::sync::mpsc;

use self::app::{App, Screen};
use self::event::{AsyncAction, AsyncResult};
use self::widgets::help_bar::HelpBar;

/// Entry point for the interactive TUI mode.
pub async fn run_tui(config: &AetherConfig) -> Result<()> {
    let storage = aether_core::storage::create_storage(config)
        .context("failed to open client storage")?;
    let workspace = Workspace::load(storage, config).context("failed to load client state")?;
    let backend =
        HttpBackend::from_config(&config.api).context("failed to create HTTP client")?;

    // Channels for async communication
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<AsyncAction>();
    let (result_tx, mut result_rx) = mpsc::unbounded_channel::<AsyncResult>();

    // Spawn async worker
    let legacy_files = config.api.legacy_files;
    tokio::spawn(async move {
        worker_loop(backend, legacy_files, &mut action_rx, &result_tx).await;
    });

    let mut app = App::new(workspace);
    for action in app.take_queued() {
        action_tx.send(action)?;
    }

    // Initialize terminal
    let mut terminal = ratatui::init();
    execute!(std::io::stdout(), EnableBracketedPaste)?;

    let result = run_loop(&mut terminal, &mut app, &action_tx, &mut result_rx);

    // Restore terminal
    let _ = execute!(std::io::stdout(), DisableBracketedPaste);
    ratatui::restore();

    result
}

fn run_loop(
    terminal: &mut DefaultTerminal,
    app: &mut App,
    action_tx: &mpsc::UnboundedSender<AsyncAction>,
    result_rx: &mut mpsc::UnboundedReceiver<AsyncResult>,
) -> Result<()> {
    loop {
        // Draw
        terminal.draw(|frame| render(frame, app))?;

        // Poll for async results (non-blocking)
        while let Ok(result) = result_rx.try_recv() {
            app.handle_result(result);
        }

        // Follow-ups such as post-login refreshes
        for action in app.take_queued() {
            let _ = action_tx.send(action);
        }

        // Poll for terminal events (50ms timeout for responsive UI)
        if ct_event::poll(Duration::from_millis(50))? {
            match ct_event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Some(action) = app.handle_key(key) {
                        let _ = action_tx.send(action);
                    }
                    for action in app.take_queued() {
                        let _ = action_tx.send(action);
                    }
                }
                Event::Paste(text) => app.handle_paste(&text),
                _ => {}
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.screen {
        Screen::Login => views::login::render(frame, app, area),
        Screen::Main => render_main(frame, app),
    }

    if let Some(ref msg) = app.alert {
        render_alert(frame, msg);
    }

    // Render error toast overlay if present
    if let Some(ref msg) = app.error_message {
        render_error_toast(frame, msg);
    }
}

fn render_main(frame: &mut Frame, app: &App) {
    let [header, body, help] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(5),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    let mut spans = vec![Span::styled(
        format!(" {} ", app.workspace.brand()),
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(user) = app.workspace.user() {
        spans.push(Span::styled(
            format!("  {} <{}>", user.display_name(), user.email),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Line::from(spans), header);

    let [sidebar, chat] =
        Layout::horizontal([Constraint::Percentage(32), Constraint::Min(30)]).areas(body);
    views::sidebar::render(frame, app, sidebar);
    views::chat::render(frame, app, chat);

    if app.workspace.history.is_open() {
        views::history::render(frame, app, body);
    }

    frame.render_widget(
        HelpBar {
            screen: &app.screen,
            input_mode: &app.input_mode,
            focus: &app.focus,
            history_open: app.workspace.history.is_open(),
        },
        help,
    );
}

fn render_alert(frame: &mut Frame, msg: &str) {
    use ratatui::{
        layout::Flex,
        widgets::{Block, Borders, Clear, Paragraph},
    };

    let [alert_area] = Layout::horizontal([Constraint::Length(40)])
        .flex(Flex::Center)
        .areas(frame.area());
    let [alert_area] = Layout::vertical([Constraint::Length(5)])
        .flex(Flex::Center)
        .areas(alert_area);

    frame.render_widget(Clear, alert_area);
    let alert = Paragraph::new(vec![
        Line::from(Span::styled(
            msg.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Press Enter to dismiss",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .centered()
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(alert, alert_area);
}

fn render_error_toast(frame: &mut Frame, msg: &str) {
    use ratatui::{
        layout::Flex,
        widgets::{Block, Borders, Clear, Paragraph},
    };

    let area = frame.area();
    let [toast_area] = Layout::horizontal([Constraint::Percentage(60)])
        .flex(Flex::Center)
        .areas(area);
    let [toast_area] = Layout::vertical([Constraint::Length(3)])
        .flex(Flex::End)
        .areas(toast_area);

    frame.render_widget(Clear, toast_area);
    let toast = Paragraph::new(format!(" ✗ {msg}"))
        .style(Style::default().fg(Color::White).bg(Color::Red))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Error "),
        );
    frame.render_widget(toast, toast_area);
}

/// Async worker loop: runs actions against the backend.
///
/// Selection mirrors are awaited in order so the backend always ends on the
/// latest snapshot. Everything else runs on its own task; the panels drop
/// whatever arrives stale.
async fn worker_loop<B>(
    backend: B,
    legacy_files: bool,
    action_rx: &mut mpsc::UnboundedReceiver<AsyncAction>,
    result_tx: &mpsc::UnboundedSender<AsyncResult>,
) where
    B: ChatBackend + Clone + 'static,
{
    while let Some(action) = action_rx.recv().await {
        if let AsyncAction::MirrorSelection(files) = action {
            aether_core::files::mirror_selection(&backend, &files).await;
            continue;
        }
        if result_tx.is_closed() {
            break; // UI closed
        }
        let backend = backend.clone();
        let tx = result_tx.clone();
        tokio::spawn(async move {
            if let Some(result) = run_action(&backend, legacy_files, action).await {
                let _ = tx.send(result);
            }
        });
    }
}

async fn run_action<B: ChatBackend>(
    backend: &B,
    legacy_files: bool,
    action: AsyncAction,
) -> Option<AsyncResult> {
    let result = match action {
        AsyncAction::Login { credential } => match auth::exchange(backend, &credential).await {
            Ok(user) => AsyncResult::LoggedIn(user),
            Err(e) => AsyncResult::LoginFailed(e.to_string()),
        },
        AsyncAction::LoadFiles { email } => {
            match fetch_files(backend, &email, legacy_files).await {
                Ok(files) => AsyncResult::Files { email, files },
                Err(e) => AsyncResult::Error(format!("Failed to load files: {e}")),
            }
        }
        AsyncAction::LoadSessions { email } => match backend.chat_sessions(&email).await {
            Ok(sessions) => AsyncResult::Sessions { email, sessions },
            Err(e) => AsyncResult::Error(format!("Failed to load sessions: {e}")),
        },
        AsyncAction::LoadTranscript(load) => AsyncResult::Transcript {
            epoch: load.epoch,
            messages: load.execute(backend).await,
        },
        AsyncAction::Send(pending) => AsyncResult::Sent(pending.execute(backend).await),
        AsyncAction::Upload(upload) => AsyncResult::Uploaded(backend.upload(upload).await),
        AsyncAction::MirrorSelection(files) => {
            aether_core::files::mirror_selection(backend, &files).await;
            return None;
        }
    };
    Some(result)
}
