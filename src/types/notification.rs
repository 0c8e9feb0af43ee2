//! Notification types for signal change alerts.

use super::Classification;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use uuid::Uuid;

/// Notification kind, mirrors the signal direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Buy,
    Sell,
    Neutral,
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::Buy => "buy",
            NotificationKind::Sell => "sell",
            NotificationKind::Neutral => "neutral",
        }
    }
}

impl From<Classification> for NotificationKind {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Buy => NotificationKind::Buy,
            Classification::Sell => NotificationKind::Sell,
            Classification::Hold => NotificationKind::Neutral,
        }
    }
}

/// A transient notification shown until it expires or is dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    pub message: String,
    pub kind: NotificationKind,
    /// Wall-clock creation time, for display
    pub created_at: DateTime<Utc>,
    /// Monotonic deadline after which the notification is swept
    pub expires_at: Instant,
}

impl Notification {
    /// Create a notification that expires `ttl` after `now`.
    pub fn new(
        message: impl Into<String>,
        kind: NotificationKind,
        now: Instant,
        ttl: std::time::Duration,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            message: message.into(),
            kind,
            created_at: Utc::now(),
            expires_at: now + ttl,
        }
    }

    /// Whether the display window has elapsed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
