//! Signal service client.
//!
//! Fetches the current signal and the recent signal history for a symbol.
//! Every response is validated before it is handed to the controller, so a
//! malformed payload surfaces as a [`FetchError`] instead of bad state.

use crate::error::{FetchError, FetchErrorKind};
use crate::types::{Signal, SignalHistory};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Source of trading signals.
#[async_trait]
pub trait SignalSource: Send + Sync {
    /// Fetch the latest signal for a symbol.
    async fn fetch_signal(&self, symbol: &str) -> Result<Signal, FetchError>;

    /// Fetch the recent signal history for a symbol, newest first.
    async fn fetch_history(&self, symbol: &str) -> Result<SignalHistory, FetchError>;
}

/// HTTP client for the signal service.
pub struct HttpSignalSource {
    client: Client,
    base_url: String,
}

impl HttpSignalSource {
    /// Create a new client.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, symbol: &str) -> Result<T, FetchError> {
        let url = format!("{}/{}/{}", self.base_url, path, symbol);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::new(symbol, FetchErrorKind::Transport(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(symbol, FetchErrorKind::Status(status.as_u16())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::new(symbol, FetchErrorKind::Transport(e)))?;

        serde_json::from_slice(&body).map_err(|e| FetchError::new(symbol, FetchErrorKind::Decode(e)))
    }
}

fn check_symbol(requested: &str, signal: &Signal) -> Result<(), FetchError> {
    if signal.symbol.eq_ignore_ascii_case(requested) {
        Ok(())
    } else {
        Err(FetchError::new(
            requested,
            FetchErrorKind::SymbolMismatch(signal.symbol.clone()),
        ))
    }
}

#[async_trait]
impl SignalSource for HttpSignalSource {
    async fn fetch_signal(&self, symbol: &str) -> Result<Signal, FetchError> {
        let signal: Signal = self.get_json("signal", symbol).await?;
        signal
            .validate()
            .map_err(|e| FetchError::new(symbol, FetchErrorKind::InvalidSignal(e)))?;
        check_symbol(symbol, &signal)?;
        Ok(signal)
    }

    async fn fetch_history(&self, symbol: &str) -> Result<SignalHistory, FetchError> {
        let history: SignalHistory = self.get_json("history", symbol).await?;
        history
            .validate()
            .map_err(|e| FetchError::new(symbol, FetchErrorKind::InvalidSignal(e)))?;
        for signal in &history.signals {
            check_symbol(symbol, signal)?;
        }
        debug!("Fetched {} history entries for {}", history.len(), symbol);
        Ok(history)
    }
}
