//! Devices view rendering.
//!
//! Displays the whole fleet in a sortable table: current readings,
//! time since the last event, a pH trend sparkline, and liveness.

use std::time::Instant;

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::data::history::{metric_series, sparkline_levels};
use crate::data::order::address_cmp;
use crate::data::{DeviceState, Metric};

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Column to sort by in the Devices view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    /// Sort by address in display order (prefix group, then address).
    #[default]
    Address,
    /// Sort by device name alphabetically.
    Name,
    /// Sort by when the device was last heard from.
    LastSeen,
    /// Sort by liveness.
    Status,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Address => SortColumn::Name,
            SortColumn::Name => SortColumn::LastSeen,
            SortColumn::LastSeen => SortColumn::Status,
            SortColumn::Status => SortColumn::Address,
        }
    }
}

/// Build the filtered, sorted device list the view renders.
///
/// Also used by `App::selected_device_id` so that the selection index
/// and the rows on screen always agree.
pub fn collect_devices(app: &App) -> Vec<(&String, &DeviceState)> {
    let mut devices: Vec<(&String, &DeviceState)> = app
        .store
        .devices()
        .iter()
        .filter(|(id, state)| app.matches_filter(id, &state.display_name))
        .collect();
    sort_devices_by(&mut devices, app.sort_column, app.sort_ascending);
    devices
}

/// Render the Devices view showing the fleet in a sortable table.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.store.is_empty() {
        let block = Block::default()
            .title(" Devices (0/0) ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let message = Paragraph::new(format!(
            "\n  No devices yet. Listening on {}.",
            app.source_description()
        ))
        .block(block);
        frame.render_widget(message, area);
        return;
    }

    let now = Instant::now();
    let devices = collect_devices(app);

    let header = Row::new(vec![
        Cell::from(format_header("Address", SortColumn::Address, app)),
        Cell::from(format_header("Name", SortColumn::Name, app)),
        Cell::from(Span::raw("pH")),
        Cell::from(Span::raw("Temp")),
        Cell::from(Span::raw("COD")),
        Cell::from(Span::raw("SS")),
        Cell::from(format_header("Last seen", SortColumn::LastSeen, app)),
        Cell::from(Span::raw("Trend")),
        Cell::from(format_header("Status", SortColumn::Status, app)),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = devices
        .iter()
        .map(|(id, state)| {
            let status_style = app.theme.liveness_style(state.liveness);
            let latest = state.latest().map(|entry| entry.sample);

            // Stale rows keep their last values but the age stands out
            let age_style = match state.liveness {
                crate::data::Liveness::Offline => status_style,
                crate::data::Liveness::Online => Style::default(),
            };

            let trend = render_sparkline(&sparkline_levels(&metric_series(
                &state.history,
                Metric::Ph,
            )));

            Row::new(vec![
                Cell::from((*id).clone()),
                Cell::from(state.display_name.clone()),
                metric_cell(app, latest.and_then(|s| s.ph), 2),
                metric_cell(app, latest.and_then(|s| s.temp), 1),
                metric_cell(app, latest.and_then(|s| s.cod), 1),
                metric_cell(app, latest.and_then(|s| s.ss), 1),
                Cell::from(format_age(state.silence(now))).style(age_style),
                Cell::from(trend),
                Cell::from(state.liveness.symbol()).style(status_style),
            ])
        })
        .collect();

    // Use Fill to distribute space evenly while respecting minimum widths
    let widths = [
        Constraint::Fill(2), // Address - gets the largest share
        Constraint::Fill(2), // Name
        Constraint::Min(6),  // pH
        Constraint::Min(6),  // Temp
        Constraint::Min(6),  // COD
        Constraint::Min(6),  // SS
        Constraint::Min(9),  // Last seen
        Constraint::Min(8),  // Trend/Sparkline - fixed 8 for sparkline chars
        Constraint::Min(6),  // Status
    ];

    // selected_device_index is the visual index; clamp to valid range
    let selected_visual_index = app.selected_device_index.min(devices.len().saturating_sub(1));

    let sort_indicator = match app.sort_column {
        SortColumn::Address => "address",
        SortColumn::Name => "name",
        SortColumn::LastSeen => "last seen",
        SortColumn::Status => "status",
    };
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    // Build title with filter info
    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    // Show scroll position if there are items
    let position_info = if !devices.is_empty() {
        format!(" [{}/{}]", selected_visual_index + 1, devices.len())
    } else {
        String::new()
    };

    let title = format!(
        " Devices ({}/{}) [s:sort {}{}]{}{} ",
        devices.len(),
        app.store.len(),
        sort_indicator,
        sort_dir,
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected_visual_index));

    frame.render_stateful_widget(table, area, &mut state);
}

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

fn sort_devices_by(
    devices: &mut [(&String, &DeviceState)],
    column: SortColumn,
    ascending: bool,
) {
    devices.sort_by(|a, b| {
        let primary = match column {
            SortColumn::Address => address_cmp(a.0, b.0),
            SortColumn::Name => {
                a.1.display_name.to_lowercase().cmp(&b.1.display_name.to_lowercase())
            }
            SortColumn::LastSeen => a.1.last_seen.cmp(&b.1.last_seen),
            SortColumn::Status => a.1.liveness.cmp(&b.1.liveness),
        };

        // Apply direction to primary comparison
        let primary = if ascending { primary } else { primary.reverse() };

        // Secondary sort keeps the order total, so equal keys can never
        // reshuffle between frames
        if primary == std::cmp::Ordering::Equal {
            address_cmp(a.0, b.0)
        } else {
            primary
        }
    });
}

/// A table cell for one metric value; absent readings get a dim dash.
fn metric_cell(app: &App, value: Option<f64>, decimals: usize) -> Cell<'static> {
    match value {
        Some(v) => Cell::from(format!("{:.*}", decimals, v)),
        None => Cell::from("-").style(Style::default().fg(app.theme.absent)),
    }
}

fn render_sparkline(levels: &[u8]) -> String {
    if levels.is_empty() {
        return "        ".to_string(); // 8 spaces placeholder
    }

    // Take last 8 values
    let values: Vec<u8> = levels.iter().rev().take(8).rev().copied().collect();

    values.iter().map(|&v| SPARKLINE_CHARS[v.min(7) as usize]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Instant;

    use crate::data::{HistoryEntry, Liveness, Reading};

    fn device(name: &str, liveness: Liveness) -> DeviceState {
        DeviceState {
            display_name: name.to_string(),
            history: VecDeque::from(vec![HistoryEntry {
                observed_at: chrono::Utc::now(),
                sample: Reading {
                    ph: Some(7.0),
                    ..Reading::default()
                },
            }]),
            first_seen: chrono::Utc::now(),
            last_seen: Instant::now(),
            liveness,
            events_seen: 1,
        }
    }

    #[test]
    fn test_sort_by_address_uses_group_order() {
        let ids = ["A:B:C9:X".to_string(), "A:B:C:X".to_string()];
        let one = device("one", Liveness::Online);
        let two = device("two", Liveness::Online);
        let mut devices = vec![(&ids[0], &one), (&ids[1], &two)];

        sort_devices_by(&mut devices, SortColumn::Address, true);
        assert_eq!(devices[0].0, "A:B:C:X");
        assert_eq!(devices[1].0, "A:B:C9:X");
    }

    #[test]
    fn test_sort_by_status_ties_break_on_address() {
        let ids = ["B:B:B:1".to_string(), "A:A:A:1".to_string()];
        let b = device("b", Liveness::Online);
        let a = device("a", Liveness::Online);
        let mut devices = vec![(&ids[0], &b), (&ids[1], &a)];

        sort_devices_by(&mut devices, SortColumn::Status, true);
        assert_eq!(devices[0].0, "A:A:A:1");
        assert_eq!(devices[1].0, "B:B:B:1");
    }

    #[test]
    fn test_sparkline_rendering() {
        assert_eq!(render_sparkline(&[]), "        ");
        assert_eq!(render_sparkline(&[0, 7]), "▁█");
        // Only the last 8 levels fit in the cell
        assert_eq!(render_sparkline(&[0, 1, 2, 3, 4, 5, 6, 7, 7]).chars().count(), 8);
    }
}
