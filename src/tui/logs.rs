//! Logs view - captured tracing output.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::{LogBuffer, Theme};

/// Level filter applied to the log view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFilter {
    #[default]
    All,
    Error,
    Warn,
    Info,
    Debug,
}

impl LogFilter {
    fn token(&self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Error => Some("ERROR"),
            Self::Warn => Some("WARN"),
            Self::Info => Some("INFO"),
            Self::Debug => Some("DEBUG"),
        }
    }

    pub fn matches(&self, line: &str) -> bool {
        self.token().map_or(true, |token| line.contains(token))
    }
}

/// Interactive state of the log view.
#[derive(Debug, Default)]
pub struct LogView {
    pub filter: LogFilter,
    /// Lines frozen while paused.
    pub frozen: Option<Vec<String>>,
}

impl LogView {
    /// Handle keyboard events for the logs view.
    pub fn handle_event(&mut self, key: &KeyEvent, buffer: &LogBuffer) {
        match key.code {
            KeyCode::Char('a') | KeyCode::Char('A') => self.filter = LogFilter::All,
            KeyCode::Char('e') | KeyCode::Char('E') => self.filter = LogFilter::Error,
            KeyCode::Char('w') | KeyCode::Char('W') => self.filter = LogFilter::Warn,
            KeyCode::Char('i') | KeyCode::Char('I') => self.filter = LogFilter::Info,
            KeyCode::Char('d') | KeyCode::Char('D') => self.filter = LogFilter::Debug,
            KeyCode::Char('c') | KeyCode::Char('C') => {
                buffer.clear();
                self.frozen = self.frozen.take().map(|_| Vec::new());
            }
            KeyCode::Char('p') | KeyCode::Char('P') => {
                self.frozen = match self.frozen.take() {
                    Some(_) => None,
                    None => Some(buffer.recent(LOG_LINES)),
                };
            }
            _ => {}
        }
    }

    /// Lines to show, newest first.
    pub fn visible_lines(&self, buffer: &LogBuffer) -> Vec<String> {
        let lines = match &self.frozen {
            Some(lines) => lines.clone(),
            None => buffer.recent(LOG_LINES),
        };
        lines
            .into_iter()
            .rev()
            .filter(|line| self.filter.matches(line))
            .collect()
    }
}

const LOG_LINES: usize = 200;

/// Render the logs view.
pub fn render(frame: &mut Frame, area: Rect, view: &LogView, buffer: &LogBuffer, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Log controls
            Constraint::Min(0),    // Log output
        ])
        .split(area);

    render_log_controls(frame, chunks[0], view, theme);
    render_log_output(frame, chunks[1], view, buffer, theme);
}

fn render_log_controls(frame: &mut Frame, area: Rect, view: &LogView, theme: &Theme) {
    let marker = |filter: LogFilter| if view.filter == filter { theme.title() } else { theme.muted() };
    let text = vec![
        Line::from(vec![
            Span::styled("Filter: ", theme.muted()),
            Span::styled("[A] All  ", marker(LogFilter::All)),
            Span::styled("[E] Error  ", marker(LogFilter::Error)),
            Span::styled("[W] Warn  ", marker(LogFilter::Warn)),
            Span::styled("[I] Info  ", marker(LogFilter::Info)),
            Span::styled("[D] Debug", marker(LogFilter::Debug)),
        ]),
        Line::from(vec![
            Span::styled("Actions: ", theme.muted()),
            Span::styled("[C]", theme.info()),
            Span::raw(" Clear  "),
            Span::styled("[P]", theme.info()),
            Span::raw(if view.frozen.is_some() { " Resume" } else { " Pause" }),
        ]),
    ];

    let block = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Log Controls")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_log_output(frame: &mut Frame, area: Rect, view: &LogView, buffer: &LogBuffer, theme: &Theme) {
    let title = if view.frozen.is_some() { "Logs (Paused)" } else { "Logs (Live)" };
    let lines = view.visible_lines(buffer);

    if lines.is_empty() {
        let block = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No logs yet.", theme.muted())),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(theme.border()),
        )
        .alignment(Alignment::Center);
        frame.render_widget(block, area);
        return;
    }

    let items: Vec<ListItem> = lines
        .into_iter()
        .map(|line| {
            let style = if line.contains("ERROR") {
                theme.error()
            } else if line.contains("WARN") {
                theme.warning()
            } else if line.contains("INFO") {
                theme.success()
            } else if line.contains("DEBUG") {
                theme.muted()
            } else {
                theme.info()
            };
            ListItem::new(Line::from(Span::styled(line, style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(theme.border()),
    );
    frame.render_widget(list, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_filter_and_pause() {
        let buffer = LogBuffer::new(10);
        buffer.push_line(" INFO signal_watch: started".into());
        buffer.push_line(" WARN signal_watch: Error fetching signal".into());

        let mut view = LogView::default();
        assert_eq!(view.visible_lines(&buffer).len(), 2);

        view.handle_event(&key('w'), &buffer);
        assert_eq!(view.visible_lines(&buffer), vec![" WARN signal_watch: Error fetching signal"]);

        view.handle_event(&key('a'), &buffer);
        view.handle_event(&key('p'), &buffer);
        buffer.push_line(" INFO signal_watch: later".into());
        assert_eq!(view.visible_lines(&buffer).len(), 2);

        view.handle_event(&key('p'), &buffer);
        assert_eq!(view.visible_lines(&buffer).len(), 3);

        view.handle_event(&key('c'), &buffer);
        assert!(view.visible_lines(&buffer).is_empty());
    }
}
