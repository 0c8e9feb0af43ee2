//! Signal dashboard state.
//!
//! [`SignalController`] is the single owner of everything the dashboard shows.
//! It is mutated only through its `on_*` methods, all called from one task, so
//! no locking is involved. Every fetch is issued through [`SignalController::begin_fetch`],
//! which tags it with the selected symbol and a sequence number; a completion is
//! applied only if that symbol is still selected and no newer fetch of the same
//! kind has been issued since.

use super::notifier::{detect_change, NotificationCenter};
use super::projector;
use crate::config::Config;
use crate::error::{AppError, FetchError, Result};
use crate::types::{
    format_confidence, ChartSeries, Notification, RefreshInterval, Signal, SignalHistory,
};
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Which endpoint a fetch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Signal,
    History,
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub symbol: String,
    pub seq: u64,
    pub kind: FetchKind,
}

/// Result of handing a fetch completion to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// The completion was for a superseded request and was dropped.
    Stale,
}

/// Read-only copy of the dashboard state.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
    pub symbols: Vec<String>,
    pub selected: String,
    pub current: Option<Signal>,
    pub history: SignalHistory,
    /// Rows of `history` shown in the history table.
    pub history_rows: usize,
    pub series: ChartSeries,
    pub error: Option<String>,
    pub loading: bool,
    pub refreshing: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub interval: RefreshInterval,
    pub notifications: Vec<Notification>,
}

impl DashboardSnapshot {
    pub fn notifications_visible(&self) -> bool {
        !self.notifications.is_empty()
    }
}

/// Owner of the dashboard state.
#[derive(Debug)]
pub struct SignalController {
    symbols: Vec<String>,
    selected: String,
    current: Option<Signal>,
    history: SignalHistory,
    history_rows: usize,
    series: ChartSeries,
    error: Option<String>,
    loading: bool,
    last_updated: Option<DateTime<Utc>>,
    interval: RefreshInterval,
    notifications: NotificationCenter,
    signal_seq: u64,
    history_seq: u64,
    /// Latest signal fetch still outstanding, if any.
    pending_signal: Option<u64>,
}

impl SignalController {
    /// Create a controller for the configured symbols.
    pub fn new(config: &Config) -> Self {
        Self {
            symbols: config.symbols.clone(),
            selected: config.initial_symbol.clone(),
            current: None,
            history: SignalHistory::default(),
            history_rows: config.history_limit,
            series: ChartSeries::default(),
            error: None,
            loading: true,
            last_updated: None,
            interval: config.refresh_interval,
            notifications: NotificationCenter::new(
                config.notification_ttl,
                config.notification_capacity,
            ),
            signal_seq: 0,
            history_seq: 0,
            pending_signal: None,
        }
    }

    pub fn selected(&self) -> &str {
        &self.selected
    }

    pub fn current(&self) -> Option<&Signal> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &SignalHistory {
        &self.history
    }

    pub fn series(&self) -> &ChartSeries {
        &self.series
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn is_refreshing(&self) -> bool {
        self.pending_signal.is_some()
    }

    /// Issue a ticket for a new fetch of `kind` for the selected symbol.
    pub fn begin_fetch(&mut self, kind: FetchKind) -> FetchTicket {
        let seq = match kind {
            FetchKind::Signal => {
                self.signal_seq += 1;
                self.pending_signal = Some(self.signal_seq);
                self.signal_seq
            }
            FetchKind::History => {
                self.history_seq += 1;
                self.history_seq
            }
        };
        FetchTicket {
            symbol: self.selected.clone(),
            seq,
            kind,
        }
    }

    /// Whether a completion for `ticket` should still be applied.
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        let latest = match ticket.kind {
            FetchKind::Signal => self.signal_seq,
            FetchKind::History => self.history_seq,
        };
        ticket.symbol == self.selected && ticket.seq == latest
    }

    /// Apply a fetched current signal.
    pub fn on_fetch_success(&mut self, ticket: &FetchTicket, signal: Signal, now: Instant) -> Applied {
        if ticket.kind != FetchKind::Signal || !self.is_current(ticket) {
            debug!("Dropping stale signal for {} (seq {})", ticket.symbol, ticket.seq);
            return Applied::Stale;
        }

        if let Some((message, kind)) = detect_change(self.current.as_ref(), &signal) {
            info!("{}", message);
            self.notifications.push(message, kind, now);
        }

        debug!(
            "{}: {} ({}) @ {:.2}",
            signal.symbol,
            signal.classification,
            format_confidence(signal.confidence),
            signal.price
        );

        self.current = Some(signal);
        self.error = None;
        self.loading = false;
        self.pending_signal = None;
        self.last_updated = Some(Utc::now());
        Applied::Updated
    }

    /// Apply a fetched history, replacing the previous one.
    pub fn on_history_success(&mut self, ticket: &FetchTicket, history: SignalHistory) -> Applied {
        if ticket.kind != FetchKind::History || !self.is_current(ticket) {
            debug!("Dropping stale history for {} (seq {})", ticket.symbol, ticket.seq);
            return Applied::Stale;
        }

        self.series = projector::project(&history);
        self.history = history;
        Applied::Updated
    }

    /// Record a failed fetch. Previously held data is kept.
    pub fn on_fetch_error(&mut self, ticket: &FetchTicket, err: &FetchError) -> Applied {
        if !self.is_current(ticket) {
            debug!("Ignoring stale failure for {}: {}", ticket.symbol, err);
            return Applied::Stale;
        }

        match ticket.kind {
            FetchKind::Signal => {
                warn!("Error fetching signal: {}", err);
                self.error = Some(format!("Failed to get signal for {}", ticket.symbol));
                self.loading = false;
                self.pending_signal = None;
            }
            FetchKind::History => {
                warn!("Error fetching history: {}", err);
            }
        }
        Applied::Updated
    }

    /// Switch to another symbol. Returns `Ok(false)` if it was already selected.
    ///
    /// Held data for the previous symbol is cleared and all outstanding tickets
    /// become stale. Switching never raises a notification.
    pub fn on_symbol_change(&mut self, symbol: &str) -> Result<bool> {
        let symbol = symbol.trim().to_uppercase();
        if !self.symbols.is_empty() && !self.symbols.contains(&symbol) {
            return Err(AppError::UnknownSymbol(symbol));
        }
        if symbol == self.selected {
            return Ok(false);
        }

        info!("Switching symbol {} -> {}", self.selected, symbol);
        self.selected = symbol;
        self.current = None;
        self.history = SignalHistory::default();
        self.series = ChartSeries::default();
        self.error = None;
        self.loading = true;
        self.last_updated = None;
        self.pending_signal = None;
        self.signal_seq += 1;
        self.history_seq += 1;
        Ok(true)
    }

    /// Symbol after the selected one in the list, wrapping.
    pub fn next_symbol(&self) -> Option<String> {
        self.symbol_at_offset(1)
    }

    /// Symbol before the selected one in the list, wrapping.
    pub fn previous_symbol(&self) -> Option<String> {
        self.symbol_at_offset(self.symbols.len().saturating_sub(1))
    }

    fn symbol_at_offset(&self, offset: usize) -> Option<String> {
        if self.symbols.is_empty() {
            return None;
        }
        let index = self
            .symbols
            .iter()
            .position(|s| *s == self.selected)
            .unwrap_or(0);
        self.symbols
            .get((index + offset) % self.symbols.len())
            .cloned()
    }

    /// Expire notifications whose display window has elapsed.
    pub fn on_tick(&mut self, now: Instant) -> usize {
        let removed = self.notifications.sweep(now);
        if removed > 0 {
            debug!("Expired {} notification(s)", removed);
        }
        removed
    }

    /// Earliest notification deadline.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.notifications.next_expiry()
    }

    /// Change the refresh period. Returns whether it changed.
    pub fn set_interval(&mut self, interval: RefreshInterval) -> bool {
        if interval == self.interval {
            return false;
        }
        info!("Refresh interval set to {}", interval.label());
        self.interval = interval;
        true
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        self.notifications.dismiss(id)
    }

    pub fn dismiss_latest(&mut self) -> bool {
        self.notifications.dismiss_latest().is_some()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            symbols: self.symbols.clone(),
            selected: self.selected.clone(),
            current: self.current.clone(),
            history: self.history.clone(),
            history_rows: self.history_rows,
            series: self.series.clone(),
            error: self.error.clone(),
            loading: self.loading,
            refreshing: self.is_refreshing(),
            last_updated: self.last_updated,
            interval: self.interval,
            notifications: self.notifications.to_vec(),
        }
    }
}
