use thiserror::Error;

/// Why a fetch against the signal service failed.
#[derive(Error, Debug)]
pub enum FetchErrorKind {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("API error: HTTP {0}")]
    Status(u16),

    #[error("parse error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid signal: {0}")]
    InvalidSignal(String),

    #[error("response was for {0}")]
    SymbolMismatch(String),
}

/// A failed fetch of signal or history data for one symbol.
#[derive(Error, Debug)]
#[error("fetch failed for {symbol}: {kind}")]
pub struct FetchError {
    pub symbol: String,
    #[source]
    pub kind: FetchErrorKind,
}

impl FetchError {
    pub fn new(symbol: impl Into<String>, kind: FetchErrorKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
        }
    }

    /// Whether the failure happened before a response arrived.
    pub fn is_transport(&self) -> bool {
        matches!(self.kind, FetchErrorKind::Transport(_))
    }
}

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Scheduler stopped")]
    SchedulerStopped,

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

pub type Result<T> = std::result::Result<T, AppError>;
