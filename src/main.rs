use signal_watch::services::{HttpSignalSource, RefreshScheduler, SignalController};
use signal_watch::tui::{self, LogBuffer, LogMakeWriter};
use signal_watch::Config;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_CAPACITY: usize = 1000;

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| "signal_watch=info".into())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = Config::from_env();
    if std::env::args().skip(1).any(|arg| arg == "--headless") {
        config.headless = true;
    }

    // Logs go to stdout when headless, into the Logs view otherwise
    let log_buffer = Arc::new(LogBuffer::new(LOG_CAPACITY));
    if config.headless {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(LogMakeWriter::new(log_buffer.clone())),
            )
            .init();
    }

    config.validate()?;

    let source = HttpSignalSource::new(config.api_url.clone(), config.request_timeout)?;
    info!(
        "Starting signal watch against {} for {}",
        source.base_url(),
        config.initial_symbol
    );
    let controller = SignalController::new(&config);
    let (scheduler, task) = RefreshScheduler::spawn(controller, Arc::new(source));

    if config.headless {
        let mut snapshots = scheduler.subscribe();
        tokio::spawn(async move {
            let mut last_seen = None;
            while snapshots.changed().await.is_ok() {
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.last_updated == last_seen {
                    continue;
                }
                last_seen = snapshot.last_updated;
                if let Some(signal) = &snapshot.current {
                    info!(
                        "{} {} ({}) @ {:.2}",
                        signal.symbol,
                        signal.classification,
                        signal.confidence_label(),
                        signal.price
                    );
                }
            }
        });

        tokio::signal::ctrl_c().await?;
        info!("Shutting down");
    } else {
        tui::run_tui(scheduler.clone(), log_buffer, config.tui_tick).await?;
    }

    scheduler.shutdown().ok();
    task.await?;
    Ok(())
}
