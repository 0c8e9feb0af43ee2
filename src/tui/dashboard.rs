//! Dashboard view - current signal, indicators and history charts.

use crate::services::projector::{bounds, to_xy};
use crate::services::{Command, DashboardSnapshot};
use crate::types::{format_confidence, ChartSeries, Classification, Signal};
use chrono::{DateTime, Local, Utc};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, BarChart, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, Paragraph, Row,
        Table, Wrap,
    },
    Frame,
};

use super::Theme;

/// Render the dashboard view.
pub fn render(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let error_height = if snapshot.error.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),            // Controls
            Constraint::Length(error_height), // Error banner
            Constraint::Min(0),               // Body
        ])
        .split(area);

    render_controls(frame, chunks[0], snapshot, theme);
    if let Some(error) = &snapshot.error {
        render_error(frame, chunks[1], error, theme);
    }

    if snapshot.loading && snapshot.current.is_none() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("Loading signals for {}...", snapshot.selected),
                theme.info(),
            )),
        ];
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border()),
            ),
            chunks[2],
        );
    } else {
        render_body(frame, chunks[2], snapshot, theme);
    }

    if snapshot.notifications_visible() {
        render_notifications(frame, area, snapshot, theme);
    }
}

fn render_controls(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let last_updated = snapshot
        .last_updated
        .map(format_timestamp)
        .unwrap_or_else(|| "Never".to_string());

    let mut spans = vec![
        Span::styled("Symbol: ", theme.muted()),
        Span::styled("◀ ", theme.muted()),
        Span::styled(snapshot.selected.clone(), theme.title()),
        Span::styled(" ▶", theme.muted()),
        Span::raw("  |  "),
        Span::styled("Auto-refresh: ", theme.muted()),
        Span::raw(snapshot.interval.label()),
        Span::raw("  |  "),
        Span::styled("Last Updated: ", theme.muted()),
        Span::raw(last_updated),
    ];
    if snapshot.refreshing {
        spans.push(Span::raw("  "));
        spans.push(Span::styled("⟳ refreshing", theme.warning()));
    }

    let block = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Controls")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_error(frame: &mut Frame, area: Rect, error: &str, theme: &Theme) {
    let block = Paragraph::new(Line::from(vec![
        Span::styled("⚠ ", theme.error()),
        Span::styled(error.to_string(), theme.error()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.error()),
    );
    frame.render_widget(block, area);
}

fn render_body(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let rows = snapshot.history.recent(snapshot.history_rows);
    // Header plus borders
    let table_height = match u16::try_from(rows.len()) {
        Ok(0) => 0,
        Ok(len) => len.saturating_add(3),
        Err(_) => u16::MAX,
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Min(0),
            Constraint::Length(table_height),
        ])
        .split(area);

    if !rows.is_empty() {
        render_history_table(frame, chunks[2], rows, theme);
    }

    if let Some(signal) = &snapshot.current {
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(chunks[0]);
        render_current_signal(frame, top[0], signal, theme);
        render_indicators(frame, top[1], signal, theme);
    }

    if snapshot.series.is_empty() {
        let block = Paragraph::new(Span::styled("No signal history yet.", theme.muted()))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("History")
                    .border_style(theme.border()),
            );
        frame.render_widget(block, chunks[1]);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    let upper = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    let current = snapshot.current.as_ref().map(|s| s.classification);
    render_price_chart(frame, upper[0], &snapshot.series, theme);
    render_rsi_chart(frame, upper[1], &snapshot.series, theme);
    render_macd_chart(frame, lower[0], &snapshot.series, theme);
    render_confidence_chart(frame, lower[1], &snapshot.series, current, theme);
}

fn render_current_signal(frame: &mut Frame, area: Rect, signal: &Signal, theme: &Theme) {
    let arrow = match signal.classification {
        Classification::Buy => "▲ ",
        Classification::Sell => "▼ ",
        Classification::Hold => "",
    };
    let lines = vec![
        Line::from(Span::styled(
            format!(" {}{} ", arrow, signal.classification),
            theme.classification(signal.classification),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Confidence: ", theme.muted()),
            Span::styled(
                format_confidence(signal.confidence),
                theme.confidence(signal.confidence_band()),
            ),
        ]),
        Line::from(vec![
            Span::styled("Price: ", theme.muted()),
            Span::styled(format!("${:.2}", signal.price), theme.title()),
        ]),
        Line::from(vec![
            Span::styled("As of: ", theme.muted()),
            Span::raw(format_timestamp(signal.timestamp)),
        ]),
    ];

    let block = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Current Signal")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_indicators(frame: &mut Frame, area: Rect, signal: &Signal, theme: &Theme) {
    let i = &signal.indicators;
    let reading = |label: &'static str, value: String, style: Style| {
        Line::from(vec![
            Span::styled(format!("{:<16}", label), theme.muted()),
            Span::styled(value, style),
        ])
    };

    let lines = vec![
        reading("RSI (14)", format!("{:.2}", i.rsi), theme.rsi(i.rsi_zone())),
        reading("MACD", format!("{:.4}", i.macd), theme.macd(i.macd_bias())),
        reading("MACD Signal", format!("{:.4}", i.macd_signal), Style::default()),
        reading(
            "BB Position",
            format!("{:.2}", i.bb_position),
            theme.band(i.band_position()),
        ),
        reading("SMA (20)", format!("{:.2}", i.sma_20), Style::default()),
        reading("SMA (50)", format!("{:.2}", i.sma_50), Style::default()),
    ];

    let block = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Technical Indicators")
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn x_axis<'a>(series: &ChartSeries, theme: &Theme) -> Axis<'a> {
    let max_x = series.len().saturating_sub(1).max(1) as f64;
    let labels = match (series.price.first(), series.price.last()) {
        (Some(first), Some(last)) => vec![
            Span::styled(format_time(first.time), theme.muted()),
            Span::styled(format_time(last.time), theme.muted()),
        ],
        _ => Vec::new(),
    };
    Axis::default()
        .style(theme.muted())
        .bounds([0.0, max_x])
        .labels(labels)
}

fn y_axis<'a>(range: [f64; 2], decimals: usize, theme: &Theme) -> Axis<'a> {
    Axis::default().style(theme.muted()).bounds(range).labels(vec![
        Span::raw(format!("{:.*}", decimals, range[0])),
        Span::raw(format!("{:.*}", decimals, range[1])),
    ])
}

fn chart_block<'a>(title: &'a str, theme: &Theme) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(theme.border())
}

fn render_price_chart(frame: &mut Frame, area: Rect, series: &ChartSeries, theme: &Theme) {
    let data = to_xy(&series.price, |p| p.price);
    let range = bounds(data.iter().map(|(_, y)| *y)).unwrap_or([0.0, 1.0]);

    let datasets = vec![Dataset::default()
        .name("Price")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(theme.info())
        .data(&data)];

    let chart = Chart::new(datasets)
        .block(chart_block("Price History", theme))
        .x_axis(x_axis(series, theme))
        .y_axis(y_axis(range, 2, theme));
    frame.render_widget(chart, area);
}

fn render_rsi_chart(frame: &mut Frame, area: Rect, series: &ChartSeries, theme: &Theme) {
    let data = to_xy(&series.price, |p| p.rsi);
    let max_x = series.len().saturating_sub(1).max(1) as f64;
    let oversold = [(0.0, 30.0), (max_x, 30.0)];
    let overbought = [(0.0, 70.0), (max_x, 70.0)];

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(theme.success())
            .data(&oversold),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(theme.error())
            .data(&overbought),
        Dataset::default()
            .name("RSI")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(theme.danger))
            .data(&data),
    ];

    let chart = Chart::new(datasets)
        .block(chart_block("RSI Indicator", theme))
        .x_axis(x_axis(series, theme))
        .y_axis(y_axis([0.0, 100.0], 0, theme));
    frame.render_widget(chart, area);
}

fn render_macd_chart(frame: &mut Frame, area: Rect, series: &ChartSeries, theme: &Theme) {
    let macd = to_xy(&series.macd, |p| p.macd);
    let signal_line = to_xy(&series.macd, |p| p.signal_line);
    let histogram = to_xy(&series.macd, |p| p.histogram);
    let range = bounds(
        series
            .macd
            .iter()
            .flat_map(|p| [p.macd, p.signal_line, p.histogram]),
    )
    .unwrap_or([-1.0, 1.0]);

    let datasets = vec![
        Dataset::default()
            .name("Histogram")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(theme.muted())
            .data(&histogram),
        Dataset::default()
            .name("MACD")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.info())
            .data(&macd),
        Dataset::default()
            .name("Signal Line")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(theme.error())
            .data(&signal_line),
    ];

    let chart = Chart::new(datasets)
        .block(chart_block("MACD", theme))
        .x_axis(x_axis(series, theme))
        .y_axis(y_axis(range, 4, theme));
    frame.render_widget(chart, area);
}

fn render_confidence_chart(
    frame: &mut Frame,
    area: Rect,
    series: &ChartSeries,
    current: Option<Classification>,
    theme: &Theme,
) {
    let labels: Vec<String> = series
        .confidence
        .iter()
        .map(|p| p.time.with_timezone(&Local).format("%H:%M").to_string())
        .collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(&series.confidence)
        .map(|(label, p)| (label.as_str(), p.confidence_percent.round() as u64))
        .collect();

    let chart = BarChart::default()
        .block(chart_block("Signal Confidence %", theme))
        .data(bars.as_slice())
        .max(100)
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme.classification_color(current)))
        .value_style(Style::default().fg(Color::Black).bg(theme.classification_color(current)));
    frame.render_widget(chart, area);
}

fn render_history_table(frame: &mut Frame, area: Rect, signals: &[Signal], theme: &Theme) {
    let header = Row::new(["Time", "Signal", "Confidence", "Price", "RSI", "MACD"])
        .style(theme.header());

    let rows = signals.iter().map(|signal| {
        let i = &signal.indicators;
        Row::new(vec![
            Cell::from(format_timestamp(signal.timestamp)),
            Cell::from(Span::styled(
                signal.classification.label(),
                theme.classification(signal.classification),
            )),
            Cell::from(Span::styled(
                format!(
                    "{} {}",
                    confidence_bar(signal.confidence),
                    format_confidence(signal.confidence)
                ),
                theme.confidence(signal.confidence_band()),
            )),
            Cell::from(format!("${:.2}", signal.price)),
            Cell::from(Span::styled(format!("{:.2}", i.rsi), theme.rsi(i.rsi_zone()))),
            Cell::from(Span::styled(format!("{:.4}", i.macd), theme.macd(i.macd_bias()))),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(8),
            Constraint::Length(16),
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(chart_block("Signal History", theme));
    frame.render_widget(table, area);
}

/// Ten-cell bar, one cell per 10% confidence.
fn confidence_bar(confidence: f64) -> String {
    let filled = ((confidence * 10.0).round() as usize).min(10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn render_notifications(frame: &mut Frame, area: Rect, snapshot: &DashboardSnapshot, theme: &Theme) {
    let width = 44.min(area.width);
    let count = u16::try_from(snapshot.notifications.len()).unwrap_or(u16::MAX);
    let height = count.saturating_mul(4).min(area.height);
    let mut y = area.y + 1;

    for notification in snapshot.notifications.iter().rev() {
        if y + 4 > area.y + height + 1 {
            break;
        }
        let rect = Rect {
            x: area.x + area.width.saturating_sub(width + 1),
            y,
            width,
            height: 4,
        };
        let style = theme.notification(notification.kind);
        let block = Paragraph::new(notification.message.clone())
            .style(style)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!("{} [x]", notification.kind.as_str()))
                    .border_style(style),
            );
        frame.render_widget(Clear, rect);
        frame.render_widget(block, rect);
        y += 4;
    }
}

fn format_timestamp(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%H:%M:%S %Y-%m-%d")
        .to_string()
}

fn format_time(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%H:%M:%S").to_string()
}

/// Map a key press on the dashboard to a scheduler command.
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    match key.code {
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Command::Refresh),
        KeyCode::Char(']') => Some(Command::NextInterval),
        KeyCode::Char('[') => Some(Command::PreviousInterval),
        KeyCode::Right | KeyCode::Tab => Some(Command::NextSymbol),
        KeyCode::Left | KeyCode::BackTab => Some(Command::PreviousSymbol),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::DismissLatest),
        _ => None,
    }
}
