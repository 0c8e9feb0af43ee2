use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Auto-refresh period, limited to a fixed menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RefreshInterval {
    ThirtySeconds,
    #[default]
    OneMinute,
    FiveMinutes,
    FifteenMinutes,
}

impl RefreshInterval {
    /// Get all menu entries, shortest first.
    pub fn all() -> [Self; 4] {
        [
            Self::ThirtySeconds,
            Self::OneMinute,
            Self::FiveMinutes,
            Self::FifteenMinutes,
        ]
    }

    /// Look up a menu entry by its length in seconds.
    pub fn from_secs(secs: u64) -> Option<Self> {
        Self::all().into_iter().find(|i| i.secs() == secs)
    }

    pub fn secs(&self) -> u64 {
        match self {
            Self::ThirtySeconds => 30,
            Self::OneMinute => 60,
            Self::FiveMinutes => 300,
            Self::FifteenMinutes => 900,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.secs())
    }

    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ThirtySeconds => "30 seconds",
            Self::OneMinute => "1 minute",
            Self::FiveMinutes => "5 minutes",
            Self::FifteenMinutes => "15 minutes",
        }
    }

    /// Next longer entry, wrapping around.
    pub fn next(&self) -> Self {
        match self {
            Self::ThirtySeconds => Self::OneMinute,
            Self::OneMinute => Self::FiveMinutes,
            Self::FiveMinutes => Self::FifteenMinutes,
            Self::FifteenMinutes => Self::ThirtySeconds,
        }
    }

    /// Next shorter entry, wrapping around.
    pub fn previous(&self) -> Self {
        match self {
            Self::ThirtySeconds => Self::FifteenMinutes,
            Self::OneMinute => Self::ThirtySeconds,
            Self::FiveMinutes => Self::OneMinute,
            Self::FifteenMinutes => Self::FiveMinutes,
        }
    }
}
