//! Core TUI application state and event loop.

use std::io;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Tabs};
use tokio::runtime::Runtime;
use tracing::info;

use apidash_core::{AppContext, Notification, SilentReporter};

use crate::screens::{ScreenAction, ScreenId, Screens};
use crate::widgets::status_bar;

/// How long an edit notification stays in the status bar.
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

/// Application state.
pub(crate) struct App {
    pub ctx: AppContext,
    runtime: Runtime,
    /// Currently active screen tab.
    pub active_tab: usize,
    pub should_quit: bool,
    /// Whether help overlay is visible.
    pub show_help: bool,
    notification: Option<(Notification, Instant)>,
    pub screens: Screens,
}

impl App {
    pub(crate) fn new(runtime: Runtime, ctx: AppContext) -> Self {
        Self {
            ctx,
            runtime,
            active_tab: 0,
            should_quit: false,
            show_help: false,
            notification: None,
            screens: Screens::new(),
        }
    }

    fn current(&self) -> ScreenId {
        ScreenId::ALL[self.active_tab]
    }

    fn notify(&mut self, note: Notification) {
        self.notification = Some((note, Instant::now()));
    }

    /// The latest notification, while it is still fresh.
    fn live_notification(&self) -> Option<&Notification> {
        self.notification
            .as_ref()
            .filter(|(_, at)| at.elapsed() < NOTIFICATION_TTL)
            .map(|(note, _)| note)
    }

    fn perform(&mut self, action: ScreenAction) {
        match action {
            ScreenAction::Apply(intent) => {
                let note = self.runtime.block_on(self.ctx.apply(intent));
                self.notify(note);
            }
            ScreenAction::Notify(note) => self.notify(note),
        }
        self.screens.clamp(&self.ctx);
    }

    fn reload(&mut self) {
        let result = self.runtime.block_on(self.ctx.reload(&SilentReporter));
        let note = match result {
            Ok(()) => Notification::success(format!(
                "Reloaded {} API(s) from {}",
                self.ctx.catalog().api_count(),
                self.ctx.store_description()
            )),
            Err(e) => Notification::error(format!("Reload failed: {e}")),
        };
        self.screens.clamp(&self.ctx);
        self.notify(note);
    }
}

/// Entry point: sets up terminal, runs event loop, restores terminal.
pub(crate) fn run(runtime: Runtime, ctx: AppContext) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, App::new(runtime, ctx));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    info!(source = %app.ctx.store_description(), "dashboard started");

    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Short poll so expired notifications clear without a key press.
        if event::poll(Duration::from_millis(250))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(&mut app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let editing = app.screens.is_editing(app.current());

    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('q') if !editing => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('?') if !editing => {
            app.show_help = !app.show_help;
            return;
        }
        KeyCode::Esc if app.show_help => {
            app.show_help = false;
            return;
        }
        KeyCode::Char(c @ '1'..='3') if !editing => {
            app.active_tab = (c as usize) - ('1' as usize);
            return;
        }
        KeyCode::Tab if !editing => {
            app.active_tab = (app.active_tab + 1) % ScreenId::ALL.len();
            return;
        }
        KeyCode::BackTab if !editing => {
            app.active_tab = (app.active_tab + ScreenId::ALL.len() - 1) % ScreenId::ALL.len();
            return;
        }
        KeyCode::Char('r') if !editing => {
            app.reload();
            return;
        }
        _ => {}
    }

    if app.show_help {
        app.show_help = false;
        return;
    }

    let screen = app.current();
    if let Some(action) = app.screens.handle_key(screen, code, &mut app.ctx) {
        app.perform(action);
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let tab_titles: Vec<Line> = ScreenId::ALL
        .iter()
        .map(|s| Line::from(s.to_string()))
        .collect();

    let title = match &app.ctx.resolution().repo {
        Some(repo) => format!(" API Catalog · {repo} "),
        None => " API Catalog · local ".to_string(),
    };
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(app.active_tab)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(" │ ");
    f.render_widget(tabs, chunks[0]);

    app.screens.draw(app.current(), f, chunks[1], &app.ctx);

    let bar = match app.live_notification() {
        Some(note) => status_bar(&note.message, Some(note.level)),
        None => {
            let stale = if app.ctx.is_stale() {
                format!(" · {} change(s) pending", app.ctx.pending_changes().len())
            } else {
                String::new()
            };
            status_bar(
                &format!(
                    "{} · {} API(s){stale} · ? help",
                    app.ctx.store_description(),
                    app.ctx.catalog().api_count()
                ),
                None,
            )
        }
    };
    f.render_widget(bar, chunks[2]);

    if app.show_help {
        draw_help_overlay(f);
    }
}

fn draw_help_overlay(f: &mut Frame) {
    let area = centered_rect(60, 60, f.area());

    let help_text = vec![
        Line::from("Keybindings").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from(""),
        Line::from("  1-3          Switch tab"),
        Line::from("  Tab/S-Tab    Next/previous tab"),
        Line::from("  r            Reload the catalog"),
        Line::from("  ?            Toggle this help"),
        Line::from("  q / Ctrl-C   Quit"),
        Line::from(""),
        Line::from("APIs").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  /            Search (Enter keeps, Esc clears)"),
        Line::from("  t            Cycle team filter"),
        Line::from("  d            Delete selected API"),
        Line::from("  ↑/↓ j/k      Move selection"),
        Line::from(""),
        Line::from("Teams").style(Style::default().add_modifier(Modifier::BOLD)),
        Line::from("  d            Delete selected team"),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Help · press any key to close ")
                .style(Style::default().bg(Color::DarkGray)),
        )
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));

    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

/// Create a centered rectangle with percentage width and height.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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
