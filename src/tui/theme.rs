//! Theme and color definitions for the TUI.

use crate::types::{
    BandPosition, Classification, ConfidenceBand, MacdBias, NotificationKind, RsiZone,
};
use ratatui::style::{Color, Modifier, Style};

/// Theme for the TUI with consistent color scheme.
#[derive(Debug, Clone)]
pub struct Theme {
    pub primary: Color,
    pub secondary: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub info: Color,
    pub muted: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary: Color::Cyan,
            secondary: Color::Magenta,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            info: Color::Blue,
            muted: Color::DarkGray,
        }
    }
}

impl Theme {
    pub fn title(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn header(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.danger)
    }

    pub fn info(&self) -> Style {
        Style::default().fg(self.info)
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn tab_active(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn tab_inactive(&self) -> Style {
        Style::default().fg(self.muted)
    }

    /// Badge style for a signal classification.
    pub fn classification(&self, classification: Classification) -> Style {
        let bg = match classification {
            Classification::Buy => self.success,
            Classification::Sell => self.danger,
            Classification::Hold => self.muted,
        };
        Style::default()
            .fg(Color::Black)
            .bg(bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Line color for a classification in charts.
    pub fn classification_color(&self, classification: Option<Classification>) -> Color {
        match classification {
            Some(Classification::Buy) => self.info,
            Some(Classification::Sell) => self.danger,
            _ => Color::Gray,
        }
    }

    pub fn confidence(&self, band: ConfidenceBand) -> Style {
        let fg = match band {
            ConfidenceBand::High => self.success,
            ConfidenceBand::Moderate => self.info,
            ConfidenceBand::Low => self.warning,
            ConfidenceBand::Weak => self.danger,
        };
        Style::default().fg(fg).add_modifier(Modifier::BOLD)
    }

    pub fn rsi(&self, zone: RsiZone) -> Style {
        match zone {
            RsiZone::Overbought => self.error(),
            RsiZone::Oversold => self.success(),
            RsiZone::Neutral => Style::default(),
        }
    }

    pub fn macd(&self, bias: MacdBias) -> Style {
        match bias {
            MacdBias::Bullish => self.success(),
            MacdBias::Bearish => self.error(),
        }
    }

    pub fn band(&self, position: BandPosition) -> Style {
        match position {
            BandPosition::AboveUpper => self.error(),
            BandPosition::BelowLower => self.success(),
            BandPosition::Inside => Style::default(),
        }
    }

    pub fn notification(&self, kind: NotificationKind) -> Style {
        match kind {
            NotificationKind::Buy => self.success(),
            NotificationKind::Sell => self.error(),
            NotificationKind::Neutral => self.muted(),
        }
    }
}
