use crate::error::{AppError, Result};
use crate::types::{RefreshInterval, DEFAULT_HISTORY_LIMIT};
use std::env;
use std::time::Duration;
use tracing::warn;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_SYMBOLS: &str = "BTCUSDT,ETHUSDT,SOLUSDT,BNBUSDT";
const MAX_NOTIFICATIONS: usize = 100;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the signal service.
    pub api_url: String,
    /// Symbols the user can switch between.
    pub symbols: Vec<String>,
    /// Symbol selected at startup.
    pub initial_symbol: String,
    /// Auto-refresh period.
    pub refresh_interval: RefreshInterval,
    /// How long a notification stays visible.
    pub notification_ttl: Duration,
    /// Maximum notifications kept visible at once.
    pub notification_capacity: usize,
    /// Number of history rows shown in the history table.
    pub history_limit: usize,
    /// Per-request timeout for the signal service.
    pub request_timeout: Duration,
    /// TUI redraw tick.
    pub tui_tick: Duration,
    /// Run without the terminal UI, logging to stdout.
    pub headless: bool,
}

impl Default for Config {
    fn default() -> Self {
        let symbols = parse_symbols(DEFAULT_SYMBOLS);
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            initial_symbol: symbols[0].clone(),
            symbols,
            refresh_interval: RefreshInterval::default(),
            notification_ttl: Duration::from_millis(5000),
            notification_capacity: 20,
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout: Duration::from_secs(10),
            tui_tick: Duration::from_millis(250),
            headless: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let symbols = lookup("SIGNAL_SYMBOLS")
            .map(|s| parse_symbols(&s))
            .unwrap_or(defaults.symbols);

        let initial_symbol = lookup("SIGNAL_SYMBOL")
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .or_else(|| symbols.first().cloned())
            .unwrap_or_default();

        let refresh_interval = match lookup("REFRESH_INTERVAL_SECS") {
            Some(raw) => match raw.trim().parse().ok().and_then(RefreshInterval::from_secs) {
                Some(interval) => interval,
                None => {
                    warn!(
                        "REFRESH_INTERVAL_SECS={} is not one of 30, 60, 300, 900; using {}",
                        raw,
                        defaults.refresh_interval.secs()
                    );
                    defaults.refresh_interval
                }
            },
            None => defaults.refresh_interval,
        };

        Self {
            api_url: lookup("SIGNAL_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_url),
            symbols,
            initial_symbol,
            refresh_interval,
            notification_ttl: lookup("NOTIFICATION_TTL_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.notification_ttl),
            notification_capacity: lookup("NOTIFICATION_CAPACITY")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.notification_capacity),
            history_limit: lookup("HISTORY_LIMIT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.history_limit),
            request_timeout: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            tui_tick: lookup("TUI_TICK_MS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.tui_tick),
            headless: lookup("SIGNAL_WATCH_HEADLESS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.symbols.is_empty() {
            return Err(AppError::Config("SIGNAL_SYMBOLS is empty".to_string()));
        }
        if !self.symbols.contains(&self.initial_symbol) {
            return Err(AppError::Config(format!(
                "SIGNAL_SYMBOL {} is not in SIGNAL_SYMBOLS",
                self.initial_symbol
            )));
        }
        if self.history_limit == 0 {
            return Err(AppError::Config("HISTORY_LIMIT must be at least 1".to_string()));
        }
        if self.notification_capacity == 0 || self.notification_capacity > MAX_NOTIFICATIONS {
            return Err(AppError::Config(format!(
                "NOTIFICATION_CAPACITY must be between 1 and {}",
                MAX_NOTIFICATIONS
            )));
        }
        Ok(())
    }
}

/// Parse a comma separated symbol list, e.g. "btcusdt, ETHUSDT".
fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
