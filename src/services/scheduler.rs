//! Refresh scheduler.
//!
//! Runs the dashboard event loop on a single task: user commands, fetch
//! completions, the periodic refresh tick and notification expiry are all
//! serialized through one `select!`, so the controller never needs a lock.

use super::controller::{DashboardSnapshot, FetchKind, FetchTicket, SignalController};
use super::fetcher::SignalSource;
use crate::error::{AppError, FetchError, Result};
use crate::types::{RefreshInterval, Signal, SignalHistory};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Requests accepted by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch signal and history now.
    Refresh,
    SelectSymbol(String),
    NextSymbol,
    PreviousSymbol,
    SetInterval(RefreshInterval),
    NextInterval,
    PreviousInterval,
    Dismiss(Uuid),
    DismissLatest,
    Shutdown,
}

/// A finished fetch, tagged with the ticket that issued it.
enum FetchOutcome {
    Signal(FetchTicket, std::result::Result<Signal, FetchError>),
    History(FetchTicket, std::result::Result<SignalHistory, FetchError>),
}

/// Cloneable handle for talking to a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<DashboardSnapshot>,
}

impl SchedulerHandle {
    /// Send a command to the scheduler.
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| AppError::SchedulerStopped)
    }

    pub fn refresh(&self) -> Result<()> {
        self.send(Command::Refresh)
    }

    pub fn select_symbol(&self, symbol: impl Into<String>) -> Result<()> {
        self.send(Command::SelectSymbol(symbol.into()))
    }

    pub fn set_interval(&self, interval: RefreshInterval) -> Result<()> {
        self.send(Command::SetInterval(interval))
    }

    pub fn dismiss(&self, id: Uuid) -> Result<()> {
        self.send(Command::Dismiss(id))
    }

    /// Ask the scheduler to stop. Pending fetches are aborted.
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Latest published state.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }
}

/// Drives a [`SignalController`] from timers, commands and fetch results.
pub struct RefreshScheduler {
    controller: SignalController,
    source: Arc<dyn SignalSource>,
    commands: mpsc::UnboundedReceiver<Command>,
    outcomes_tx: mpsc::UnboundedSender<FetchOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    snapshots: watch::Sender<DashboardSnapshot>,
    in_flight: Vec<JoinHandle<()>>,
}

impl RefreshScheduler {
    /// Start the event loop on a new task.
    pub fn spawn(
        controller: SignalController,
        source: Arc<dyn SignalSource>,
    ) -> (SchedulerHandle, JoinHandle<()>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(controller.snapshot());

        let scheduler = Self {
            controller,
            source,
            commands: commands_rx,
            outcomes_tx,
            outcomes_rx,
            snapshots: snapshots_tx,
            in_flight: Vec::new(),
        };
        let task = tokio::spawn(scheduler.run());

        let handle = SchedulerHandle {
            commands: commands_tx,
            snapshots: snapshots_rx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        info!(
            "Watching {} every {}",
            self.controller.selected(),
            self.controller.interval().label()
        );
        self.fetch_all();
        self.publish();

        let mut ticker = self.new_ticker();

        loop {
            let expiry = self.controller.next_expiry();

            tokio::select! {
                command = self.commands.recv() => {
                    match command {
                        None | Some(Command::Shutdown) => break,
                        Some(command) => {
                            if self.handle_command(command) {
                                ticker = self.new_ticker();
                            }
                        }
                    }
                }
                Some(outcome) = self.outcomes_rx.recv() => {
                    self.apply(outcome);
                }
                _ = ticker.tick() => {
                    debug!("Refresh tick for {}", self.controller.selected());
                    self.fetch_signal();
                }
                _ = sleep_until_opt(expiry) => {
                    self.controller.on_tick(Instant::now());
                }
            }

            self.publish();
        }

        self.abort_in_flight();
        info!("Scheduler stopped");
    }

    /// Handle a command. Returns whether the refresh timer must be recreated.
    fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Refresh => {
                self.fetch_all();
                false
            }
            Command::SelectSymbol(symbol) => self.select(Some(symbol)),
            Command::NextSymbol => {
                let next = self.controller.next_symbol();
                self.select(next)
            }
            Command::PreviousSymbol => {
                let previous = self.controller.previous_symbol();
                self.select(previous)
            }
            Command::SetInterval(interval) => self.controller.set_interval(interval),
            Command::NextInterval => {
                let next = self.controller.interval().next();
                self.controller.set_interval(next)
            }
            Command::PreviousInterval => {
                let previous = self.controller.interval().previous();
                self.controller.set_interval(previous)
            }
            Command::Dismiss(id) => {
                self.controller.dismiss(id);
                false
            }
            Command::DismissLatest => {
                self.controller.dismiss_latest();
                false
            }
            Command::Shutdown => false,
        }
    }

    fn select(&mut self, symbol: Option<String>) -> bool {
        let Some(symbol) = symbol else {
            return false;
        };
        match self.controller.on_symbol_change(&symbol) {
            Ok(true) => {
                self.abort_in_flight();
                self.fetch_all();
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("{}", e);
                false
            }
        }
    }

    fn apply(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Signal(ticket, Ok(signal)) => {
                self.controller.on_fetch_success(&ticket, signal, Instant::now());
            }
            FetchOutcome::History(ticket, Ok(history)) => {
                self.controller.on_history_success(&ticket, history);
            }
            FetchOutcome::Signal(ticket, Err(e)) | FetchOutcome::History(ticket, Err(e)) => {
                self.controller.on_fetch_error(&ticket, &e);
            }
        }
    }

    fn fetch_all(&mut self) {
        self.fetch_signal();
        self.fetch_history();
    }

    fn fetch_signal(&mut self) {
        let ticket = self.controller.begin_fetch(FetchKind::Signal);
        let source = self.source.clone();
        let tx = self.outcomes_tx.clone();
        self.track(tokio::spawn(async move {
            let result = source.fetch_signal(&ticket.symbol).await;
            let _ = tx.send(FetchOutcome::Signal(ticket, result));
        }));
    }

    fn fetch_history(&mut self) {
        let ticket = self.controller.begin_fetch(FetchKind::History);
        let source = self.source.clone();
        let tx = self.outcomes_tx.clone();
        self.track(tokio::spawn(async move {
            let result = source.fetch_history(&ticket.symbol).await;
            let _ = tx.send(FetchOutcome::History(ticket, result));
        }));
    }

    fn track(&mut self, task: JoinHandle<()>) {
        self.in_flight.retain(|t| !t.is_finished());
        self.in_flight.push(task);
    }

    fn abort_in_flight(&mut self) {
        for task in self.in_flight.drain(..) {
            task.abort();
        }
    }

    /// Timer whose first tick is one full period from now.
    fn new_ticker(&self) -> Interval {
        let period = self.controller.interval().duration();
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
