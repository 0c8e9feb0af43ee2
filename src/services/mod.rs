pub mod controller;
pub mod fetcher;
pub mod notifier;
pub mod projector;
pub mod scheduler;

pub use controller::{Applied, DashboardSnapshot, FetchKind, FetchTicket, SignalController};
pub use fetcher::{HttpSignalSource, SignalSource};
pub use notifier::{detect_change, NotificationCenter};
pub use projector::project;
pub use scheduler::{Command, RefreshScheduler, SchedulerHandle};
