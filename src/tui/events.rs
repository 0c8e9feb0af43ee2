//! Event handling for the TUI.

use crate::services::DashboardSnapshot;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input.
    Key(KeyEvent),
    /// Redraw tick.
    Tick,
    Resize(u16, u16),
    /// The scheduler published new state.
    Update,
}

/// Merges terminal input, redraw ticks and scheduler updates into one stream.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration, mut snapshots: watch::Receiver<DashboardSnapshot>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // crossterm polling blocks, keep it off the async workers
        let input_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            let event = match event::poll(tick_rate) {
                Ok(true) => match event::read() {
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => Event::Key(key),
                    Ok(CrosstermEvent::Resize(w, h)) => Event::Resize(w, h),
                    Ok(_) => continue,
                    Err(_) => break,
                },
                Ok(false) => Event::Tick,
                Err(_) => break,
            };
            if input_tx.send(event).is_err() {
                break;
            }
        });

        tokio::spawn(async move {
            while snapshots.changed().await.is_ok() {
                if tx.send(Event::Update).is_err() {
                    break;
                }
            }
        });

        Self { rx }
    }

    /// Receive the next event.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// Check if a key event matches a specific key code.
pub fn is_key(event: &KeyEvent, code: KeyCode) -> bool {
    event.code == code && (event.modifiers == KeyModifiers::NONE || event.modifiers == KeyModifiers::SHIFT)
}

/// Check if a key event is Ctrl+C or `q`.
pub fn is_quit(event: &KeyEvent) -> bool {
    event.code == KeyCode::Char('c') && event.modifiers == KeyModifiers::CONTROL
        || event.code == KeyCode::Char('q')
}
