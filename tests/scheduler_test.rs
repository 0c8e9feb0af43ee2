//! Scheduler tests with a scripted signal source and paused time.

use async_trait::async_trait;
use chrono::Utc;
use signal_watch::services::{Command, DashboardSnapshot, RefreshScheduler, SchedulerHandle, SignalController};
use signal_watch::{
    AppError, Classification, Config, FetchError, FetchErrorKind, Indicators, NotificationKind,
    RefreshInterval, Signal, SignalHistory, SignalSource,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Step {
    Signal(Classification, f64),
    Fail(u16),
}

/// Serves queued responses per symbol, repeating the last one when the queue runs dry.
#[derive(Default)]
struct ScriptedSource {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    last: Mutex<HashMap<String, Step>>,
    delays: HashMap<String, Duration>,
    signal_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl ScriptedSource {
    fn new(script: &[(&str, Vec<Step>)]) -> Self {
        let steps = script
            .iter()
            .map(|(symbol, steps)| (symbol.to_string(), steps.iter().cloned().collect()))
            .collect();
        Self {
            steps: Mutex::new(steps),
            ..Default::default()
        }
    }

    fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    fn signal_calls(&self) -> usize {
        self.signal_calls.load(Ordering::SeqCst)
    }

    fn history_calls(&self) -> usize {
        self.history_calls.load(Ordering::SeqCst)
    }

    fn next_step(&self, symbol: &str) -> Step {
        let popped = self
            .steps
            .lock()
            .unwrap()
            .get_mut(symbol)
            .and_then(|queue| queue.pop_front());
        let mut last = self.last.lock().unwrap();
        match popped {
            Some(step) => {
                last.insert(symbol.to_string(), step.clone());
                step
            }
            None => last
                .get(symbol)
                .cloned()
                .unwrap_or(Step::Signal(Classification::Hold, 0.5)),
        }
    }
}

fn make_signal(symbol: &str, classification: Classification, confidence: f64) -> Signal {
    Signal {
        symbol: symbol.to_string(),
        timestamp: Utc::now(),
        classification,
        confidence,
        price: 61234.5,
        indicators: Indicators {
            rsi: 55.0,
            macd: 1.2,
            macd_signal: 0.8,
            ..Default::default()
        },
    }
}

#[async_trait]
impl SignalSource for ScriptedSource {
    async fn fetch_signal(&self, symbol: &str) -> Result<Signal, FetchError> {
        self.signal_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        match self.next_step(symbol) {
            Step::Signal(classification, confidence) => Ok(make_signal(symbol, classification, confidence)),
            Step::Fail(status) => Err(FetchError::new(symbol, FetchErrorKind::Status(status))),
        }
    }

    async fn fetch_history(&self, symbol: &str) -> Result<SignalHistory, FetchError> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        let now = Utc::now();
        let signals = (0..3)
            .map(|i| {
                let mut signal = make_signal(symbol, Classification::Hold, 0.5);
                signal.timestamp = now - chrono::Duration::minutes(i);
                signal
            })
            .collect();
        Ok(SignalHistory::new(signals))
    }
}

fn config() -> Config {
    Config {
        symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
        initial_symbol: "BTCUSDT".to_string(),
        ..Config::default()
    }
}

fn start(source: Arc<ScriptedSource>) -> (SchedulerHandle, tokio::task::JoinHandle<()>) {
    RefreshScheduler::spawn(SignalController::new(&config()), source)
}

async fn wait_for<F>(handle: &SchedulerHandle, predicate: F) -> DashboardSnapshot
where
    F: Fn(&DashboardSnapshot) -> bool,
{
    let mut rx = handle.subscribe();
    let snapshot = tokio::time::timeout(Duration::from_secs(3), rx.wait_for(|s| predicate(s)))
        .await
        .expect("timed out waiting for scheduler state")
        .expect("scheduler stopped");
    snapshot.clone()
}

fn has_classification(snapshot: &DashboardSnapshot, classification: Classification) -> bool {
    snapshot
        .current
        .as_ref()
        .map_or(false, |s| s.classification == classification)
}

#[tokio::test(start_paused = true)]
async fn test_startup_fetches_signal_and_history() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![Step::Signal(Classification::Buy, 0.7)],
    )]));
    let (handle, _task) = start(source.clone());

    let snapshot = wait_for(&handle, |s| s.current.is_some() && !s.series.is_empty()).await;
    assert_eq!(snapshot.selected, "BTCUSDT");
    assert!(!snapshot.loading);
    assert_eq!(snapshot.series.len(), 3);
    assert!(snapshot.notifications.is_empty());
    assert_eq!(source.signal_calls(), 1);
    assert_eq!(source.history_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_buy_to_sell_raises_one_notification() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![
            Step::Signal(Classification::Buy, 0.7),
            Step::Signal(Classification::Sell, 0.91),
        ],
    )]));
    let (handle, _task) = start(source);

    wait_for(&handle, |s| has_classification(s, Classification::Buy)).await;
    handle.refresh().unwrap();
    let snapshot = wait_for(&handle, |s| has_classification(s, Classification::Sell)).await;

    assert_eq!(snapshot.notifications.len(), 1);
    assert_eq!(snapshot.notifications[0].kind, NotificationKind::Sell);
    assert!(snapshot.notifications[0].message.contains("91%"));
}

#[tokio::test(start_paused = true)]
async fn test_repeated_classification_is_silent() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![Step::Signal(Classification::Buy, 0.7)],
    )]));
    let (handle, _task) = start(source.clone());

    wait_for(&handle, |s| s.current.is_some()).await;
    handle.refresh().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(source.signal_calls(), 2);
    assert!(handle.snapshot().notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_tick_refetches_signal_only() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![Step::Signal(Classification::Buy, 0.7)],
    )]));
    let (handle, _task) = start(source.clone());
    wait_for(&handle, |s| s.current.is_some()).await;

    tokio::time::sleep(Duration::from_secs(59)).await;
    assert_eq!(source.signal_calls(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(source.signal_calls(), 2);
    assert_eq!(source.history_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_interval_change_recreates_timer() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![Step::Signal(Classification::Buy, 0.7)],
    )]));
    let (handle, _task) = start(source.clone());
    wait_for(&handle, |s| s.current.is_some()).await;

    handle.set_interval(RefreshInterval::ThirtySeconds).unwrap();
    wait_for(&handle, |s| s.interval == RefreshInterval::ThirtySeconds).await;

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(source.signal_calls(), 2);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(source.signal_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_slow_response_for_previous_symbol_is_not_shown() {
    let source = Arc::new(
        ScriptedSource::new(&[
            ("BTCUSDT", vec![Step::Signal(Classification::Buy, 0.9)]),
            ("ETHUSDT", vec![Step::Signal(Classification::Sell, 0.6)]),
        ])
        .with_delay("BTCUSDT", Duration::from_secs(10)),
    );
    let (handle, _task) = start(source);

    handle.select_symbol("ETHUSDT").unwrap();
    let snapshot = wait_for(&handle, |s| s.current.is_some()).await;
    assert_eq!(snapshot.selected, "ETHUSDT");
    assert_eq!(snapshot.current.as_ref().unwrap().symbol, "ETHUSDT");

    tokio::time::sleep(Duration::from_secs(15)).await;
    let snapshot = handle.snapshot();
    assert_eq!(snapshot.selected, "ETHUSDT");
    assert_eq!(snapshot.current.as_ref().unwrap().symbol, "ETHUSDT");
    assert!(snapshot.history.signals.iter().all(|s| s.symbol == "ETHUSDT"));
    assert!(snapshot.notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_symbol_switch_does_not_notify() {
    let source = Arc::new(ScriptedSource::new(&[
        ("BTCUSDT", vec![Step::Signal(Classification::Buy, 0.9)]),
        ("ETHUSDT", vec![Step::Signal(Classification::Sell, 0.6)]),
    ]));
    let (handle, _task) = start(source);
    wait_for(&handle, |s| has_classification(s, Classification::Buy)).await;

    handle.send(Command::NextSymbol).unwrap();
    let snapshot = wait_for(&handle, |s| has_classification(s, Classification::Sell)).await;
    assert_eq!(snapshot.selected, "ETHUSDT");
    assert!(snapshot.notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_symbol_is_ignored() {
    let source = Arc::new(ScriptedSource::new(&[]));
    let (handle, _task) = start(source);
    wait_for(&handle, |s| s.current.is_some()).await;

    handle.select_symbol("DOGEUSDT").unwrap();
    handle.refresh().unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(handle.snapshot().selected, "BTCUSDT");
}

#[tokio::test(start_paused = true)]
async fn test_notification_expires_after_display_window() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![
            Step::Signal(Classification::Hold, 0.5),
            Step::Signal(Classification::Buy, 0.83),
        ],
    )]));
    let (handle, _task) = start(source);
    wait_for(&handle, |s| has_classification(s, Classification::Hold)).await;

    handle.refresh().unwrap();
    let snapshot = wait_for(&handle, |s| s.notifications_visible()).await;
    assert_eq!(snapshot.notifications[0].kind, NotificationKind::Buy);
    assert!(snapshot.notifications[0].message.contains("83%"));

    tokio::time::sleep(Duration::from_millis(4900)).await;
    assert_eq!(handle.snapshot().notifications.len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!handle.snapshot().notifications_visible());
}

#[tokio::test(start_paused = true)]
async fn test_dismissing_one_notification_keeps_the_other() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![
            Step::Signal(Classification::Buy, 0.7),
            Step::Signal(Classification::Sell, 0.8),
            Step::Signal(Classification::Buy, 0.9),
        ],
    )]));
    let (handle, _task) = start(source);
    wait_for(&handle, |s| has_classification(s, Classification::Buy)).await;

    handle.refresh().unwrap();
    let first = wait_for(&handle, |s| s.notifications.len() == 1).await.notifications[0].clone();

    tokio::time::sleep(Duration::from_secs(2)).await;
    handle.refresh().unwrap();
    wait_for(&handle, |s| s.notifications.len() == 2).await;

    handle.dismiss(first.id).unwrap();
    let snapshot = wait_for(&handle, |s| s.notifications.len() == 1).await;
    assert!(snapshot.notifications[0].message.contains("90%"));

    // the survivor keeps its own 5s window, counted from t=2s
    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(handle.snapshot().notifications.len(), 1);

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(handle.snapshot().notifications.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_keeps_last_good_signal() {
    let source = Arc::new(ScriptedSource::new(&[(
        "BTCUSDT",
        vec![Step::Signal(Classification::Buy, 0.7), Step::Fail(500)],
    )]));
    let (handle, _task) = start(source);
    wait_for(&handle, |s| s.current.is_some()).await;

    handle.refresh().unwrap();
    let snapshot = wait_for(&handle, |s| s.error.is_some()).await;
    assert_eq!(snapshot.error.as_deref(), Some("Failed to get signal for BTCUSDT"));
    assert!(has_classification(&snapshot, Classification::Buy));
    assert!(!snapshot.refreshing);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_scheduler() {
    let source = Arc::new(ScriptedSource::new(&[]));
    let (handle, task) = start(source);

    handle.shutdown().unwrap();
    task.await.unwrap();
    assert!(matches!(handle.refresh(), Err(AppError::SchedulerStopped)));
}
