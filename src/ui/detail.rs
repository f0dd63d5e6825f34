//! Detail overlay rendering.
//!
//! Displays a modal overlay with detailed information about a selected device.

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::data::history::{metric_series, sparkline_levels};
use crate::data::Metric;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the device detail as a modal overlay.
///
/// Shows the selected device's identity, liveness, per-metric ranges over
/// the retained history, and the most recent samples.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    // Skip rendering if terminal is too small for the overlay
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(device_id) = app.selected_device_id() else {
        return;
    };
    let Some(device) = app.store.get(&device_id) else {
        return;
    };

    // Calculate overlay size - use most of the screen
    // Width: 95% of screen, clamped to [MIN_OVERLAY_WIDTH, 100]
    let overlay_width = (area.width * 95 / 100).clamp(MIN_OVERLAY_WIDTH, 100);
    // Height: 90% of screen, clamped to [MIN_OVERLAY_HEIGHT, 50]
    let overlay_height = (area.height * 90 / 100).clamp(MIN_OVERLAY_HEIGHT, 50);

    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    // Split overlay into header and content sections
    let chunks = Layout::vertical([
        Constraint::Length(6), // Header with device identity
        Constraint::Min(10),   // Content (metrics/samples tables)
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    // ===== HEADER SECTION =====
    let liveness_style = app.theme.liveness_style(device.liveness);
    let now = Instant::now();

    let header_lines = vec![
        Line::from(vec![
            Span::styled(
                format!(" {} ", device.display_name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("({})", device_id),
                Style::default().add_modifier(Modifier::DIM),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Status: "),
            Span::styled(
                format!("{} {}", device.liveness.symbol(), device.liveness.label()),
                liveness_style.add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Last event: "),
            Span::styled(
                format!("{} ago", format_age(device.silence(now))),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw("    Events: "),
            Span::styled(
                format_count(device.events_seen),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw(" First seen: "),
            Span::raw(device.first_seen.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]),
    ];

    let header_block = Block::default()
        .title(" Device Detail ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let header = Paragraph::new(header_lines).block(header_block);
    frame.render_widget(header, chunks[0]);

    // ===== CONTENT SECTION (Metrics and Samples) =====
    let content_chunks = Layout::vertical([
        Constraint::Length(7), // Metric ranges
        Constraint::Min(4),    // Recent samples
    ])
    .split(chunks[1]);

    // ----- METRICS TABLE -----
    let metrics_header = Row::new(vec![
        Cell::from("Metric"),
        Cell::from("Current"),
        Cell::from("Min"),
        Cell::from("Max"),
        Cell::from("Unit"),
        Cell::from("Trend"),
    ])
    .height(1)
    .style(app.theme.header);

    let metrics_rows: Vec<Row> = Metric::ALL
        .iter()
        .map(|&metric| {
            let series = metric_series(&device.history, metric);
            let decimals = metric_decimals(metric);

            let current = series.last().map(|v| format!("{:.*}", decimals, v));
            let min = series
                .iter()
                .copied()
                .reduce(f64::min)
                .map(|v| format!("{:.*}", decimals, v));
            let max = series
                .iter()
                .copied()
                .reduce(f64::max)
                .map(|v| format!("{:.*}", decimals, v));

            Row::new(vec![
                Cell::from(metric.label()),
                value_cell(app, current),
                value_cell(app, min),
                value_cell(app, max),
                Cell::from(metric.unit()).style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(sparkline(&sparkline_levels(&series))),
            ])
        })
        .collect();

    let metrics_widths = [
        Constraint::Fill(2),    // Metric
        Constraint::Length(9),  // Current
        Constraint::Length(9),  // Min
        Constraint::Length(9),  // Max
        Constraint::Length(6),  // Unit
        Constraint::Length(22), // Trend
    ];

    let metrics_table = Table::new(metrics_rows, metrics_widths).header(metrics_header).block(
        Block::default()
            .title(" Metrics ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );

    frame.render_widget(metrics_table, content_chunks[0]);

    // ----- RECENT SAMPLES TABLE -----
    if !device.history.is_empty() {
        let samples_header = Row::new(vec![
            Cell::from("Time"),
            Cell::from("pH"),
            Cell::from("Temp"),
            Cell::from("COD"),
            Cell::from("SS"),
        ])
        .height(1)
        .style(app.theme.header);

        // Newest first
        let samples_rows: Vec<Row> = device
            .history
            .iter()
            .rev()
            .map(|entry| {
                Row::new(vec![
                    Cell::from(entry.observed_at.format("%H:%M:%S").to_string()),
                    value_cell(app, entry.sample.ph.map(|v| format!("{:.2}", v))),
                    value_cell(app, entry.sample.temp.map(|v| format!("{:.1}", v))),
                    value_cell(app, entry.sample.cod.map(|v| format!("{:.1}", v))),
                    value_cell(app, entry.sample.ss.map(|v| format!("{:.1}", v))),
                ])
            })
            .collect();

        let samples_widths = [
            Constraint::Fill(2),   // Time
            Constraint::Length(9), // pH
            Constraint::Length(9), // Temp
            Constraint::Length(9), // COD
            Constraint::Length(9), // SS
        ];

        let samples_table = Table::new(samples_rows, samples_widths)
            .header(samples_header)
            .block(
                Block::default()
                    .title(format!(" Recent Samples ({}) ", device.history.len()))
                    .borders(Borders::ALL)
                    .border_type(app.theme.border_type)
                    .border_style(Style::default().fg(app.theme.border)),
            );

        frame.render_widget(samples_table, content_chunks[1]);
    } else {
        let empty_block = Block::default()
            .title(" Recent Samples (0) ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No samples recorded",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(empty_block);
        frame.render_widget(empty, content_chunks[1]);
    }

    // ===== FOOTER =====
    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}

fn metric_decimals(metric: Metric) -> usize {
    match metric {
        Metric::Ph => 2,
        Metric::Temp | Metric::Cod | Metric::Ss => 1,
    }
}

fn value_cell(app: &App, value: Option<String>) -> Cell<'static> {
    match value {
        Some(text) => Cell::from(text),
        None => Cell::from("-").style(Style::default().fg(app.theme.absent)),
    }
}

fn sparkline(levels: &[u8]) -> String {
    const CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    levels.iter().map(|&v| CHARS[v.min(7) as usize]).collect()
}

fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}
