//! Classification change detection and the visible notification set.

use crate::types::{format_confidence, Notification, NotificationKind, Signal};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

/// Compare a freshly fetched signal with the one held before it.
///
/// Returns the message and kind of the notification to raise, or `None` when
/// there is no previous signal for the same symbol or the classification is
/// unchanged.
pub fn detect_change(previous: Option<&Signal>, next: &Signal) -> Option<(String, NotificationKind)> {
    let previous = previous?;
    if previous.symbol != next.symbol || previous.classification == next.classification {
        return None;
    }

    let message = format!(
        "New {} signal for {} with {} confidence",
        next.classification,
        next.symbol,
        format_confidence(next.confidence)
    );
    Some((message, next.classification.into()))
}

/// Visible notifications, oldest first, each with its own expiry deadline.
#[derive(Debug)]
pub struct NotificationCenter {
    items: VecDeque<Notification>,
    ttl: Duration,
    capacity: usize,
}

impl NotificationCenter {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Enqueue a notification expiring `ttl` after `now`.
    pub fn push(&mut self, message: String, kind: NotificationKind, now: Instant) -> Uuid {
        let notification = Notification::new(message, kind, now, self.ttl);
        let id = notification.id;
        self.items.push_back(notification);
        while self.items.len() > self.capacity {
            self.items.pop_front();
        }
        id
    }

    /// Remove one notification by ID. Returns whether it was present.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.id != id);
        self.items.len() != before
    }

    /// Remove the most recent notification.
    pub fn dismiss_latest(&mut self) -> Option<Notification> {
        self.items.pop_back()
    }

    /// Drop every notification whose own deadline has passed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.items.len();
        self.items.retain(|n| !n.is_expired(now));
        before - self.items.len()
    }

    /// Earliest pending deadline.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.items.iter().map(|n| n.expires_at).min()
    }

    /// The stack is shown while anything is in it.
    pub fn is_visible(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
