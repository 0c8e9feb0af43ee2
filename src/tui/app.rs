//! Main TUI application logic.

use super::{dashboard, events, logs, LogBuffer, Route, Theme};
use crate::services::{Command, SchedulerHandle};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Tabs},
    Frame, Terminal,
};
use std::{io, sync::Arc, time::Duration};
use tracing::warn;

/// Main TUI application.
pub struct App {
    current_route: Route,
    scheduler: SchedulerHandle,
    log_buffer: Arc<LogBuffer>,
    log_view: logs::LogView,
    theme: Theme,
    should_quit: bool,
}

impl App {
    /// Create a new TUI application.
    pub fn new(scheduler: SchedulerHandle, log_buffer: Arc<LogBuffer>) -> Self {
        Self {
            current_route: Route::Dashboard,
            scheduler,
            log_buffer,
            log_view: logs::LogView::default(),
            theme: Theme::default(),
            should_quit: false,
        }
    }

    /// Handle an event.
    pub fn handle_event(&mut self, event: events::Event) {
        let events::Event::Key(key) = event else {
            // Ticks, resizes and updates only need a redraw
            return;
        };

        if events::is_quit(&key) {
            self.should_quit = true;
            return;
        }

        for route in Route::all() {
            if events::is_key(&key, crossterm::event::KeyCode::Char(route.key())) {
                self.current_route = route;
                return;
            }
        }

        match self.current_route {
            Route::Dashboard => {
                if let Some(command) = dashboard::command_for_key(&key) {
                    self.send(command);
                }
            }
            Route::Logs => self.log_view.handle_event(&key, &self.log_buffer),
        }
    }

    fn send(&mut self, command: Command) {
        if let Err(e) = self.scheduler.send(command) {
            warn!("{}", e);
            self.should_quit = true;
        }
    }

    /// Check if the app should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Render the TUI.
    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Status bar
            ])
            .split(area);

        self.render_tabs(frame, chunks[0]);

        match self.current_route {
            Route::Dashboard => {
                let snapshot = self.scheduler.snapshot();
                dashboard::render(frame, chunks[1], &snapshot, &self.theme);
            }
            Route::Logs => logs::render(frame, chunks[1], &self.log_view, &self.log_buffer, &self.theme),
        }

        self.render_status_bar(frame, chunks[2]);
    }

    fn render_tabs(&self, frame: &mut Frame, area: Rect) {
        let routes = Route::all();
        let titles: Vec<Line> = routes
            .iter()
            .map(|r| {
                Line::from(vec![
                    Span::styled(format!("[{}] ", r.key()), self.theme.muted()),
                    Span::raw(r.name().to_string()),
                ])
            })
            .collect();

        let selected = routes
            .iter()
            .position(|r| *r == self.current_route)
            .unwrap_or(0);

        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("Signal Watch"))
            .select(selected)
            .style(self.theme.tab_inactive())
            .highlight_style(self.theme.tab_active());

        frame.render_widget(tabs, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let key = |k: &'static str| Span::styled(k, self.theme.muted());
        let text = match self.current_route {
            Route::Dashboard => Line::from(vec![
                key("r"),
                Span::raw(" refresh | "),
                key("←/→"),
                Span::raw(" symbol | "),
                key("[/]"),
                Span::raw(" interval | "),
                key("x"),
                Span::raw(" dismiss | "),
                key("q"),
                Span::raw(" quit"),
            ]),
            Route::Logs => Line::from(vec![
                key("a/e/w/i/d"),
                Span::raw(" filter | "),
                key("c"),
                Span::raw(" clear | "),
                key("p"),
                Span::raw(" pause | "),
                key("q"),
                Span::raw(" quit"),
            ]),
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border());
        frame.render_widget(block, area);

        let inner = Rect {
            x: area.x + 2,
            y: area.y + 1,
            width: area.width.saturating_sub(4),
            height: 1,
        };
        frame.render_widget(text, inner);
    }
}

/// Run the TUI until the user quits.
pub async fn run_tui(
    scheduler: SchedulerHandle,
    log_buffer: Arc<LogBuffer>,
    tick_rate: Duration,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_handler = events::EventHandler::new(tick_rate, scheduler.subscribe());
    let mut app = App::new(scheduler, log_buffer);

    let result = async {
        loop {
            terminal.draw(|f| app.render(f))?;

            match event_handler.next().await {
                Some(event) => app.handle_event(event),
                None => break,
            }

            if app.should_quit() {
                break;
            }
        }
        Ok::<(), io::Error>(())
    }
    .await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
