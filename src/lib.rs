//! Signal Watch - terminal dashboard for a trading-signal service

pub mod config;
pub mod error;
pub mod services;
pub mod tui;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, FetchError, FetchErrorKind};
pub use services::{HttpSignalSource, RefreshScheduler, SchedulerHandle, SignalController, SignalSource};
pub use types::*;
