//! Terminal UI for watching trading signals.

mod app;
mod dashboard;
mod events;
mod logs;
mod state;
mod theme;

pub use app::{run_tui, App};
pub use dashboard::command_for_key;
pub use state::{LogBuffer, LogMakeWriter};
pub use theme::Theme;

/// Route/View enum for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Logs,
}

impl Route {
    /// Get all available routes.
    pub fn all() -> [Self; 2] {
        [Self::Dashboard, Self::Logs]
    }

    /// Get the route name.
    pub fn name(&self) -> &str {
        match self {
            Self::Dashboard => "Signals",
            Self::Logs => "Logs",
        }
    }

    /// Get the route shortcut key.
    pub fn key(&self) -> char {
        match self {
            Self::Dashboard => '1',
            Self::Logs => '2',
        }
    }
}
