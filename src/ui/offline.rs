use std::time::Instant;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::data::order::{address_cmp, prefix_group};
use crate::data::{DeviceState, Liveness};

/// Column to sort offline devices by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OfflineSortColumn {
    #[default]
    Silence,
    Address,
    Name,
    Group,
}

impl OfflineSortColumn {
    pub fn next(self) -> Self {
        match self {
            Self::Silence => Self::Address,
            Self::Address => Self::Name,
            Self::Name => Self::Group,
            Self::Group => Self::Silence,
        }
    }
}

/// Build the filtered, sorted offline list the view renders.
///
/// Shared with `App::selected_device_id` so the selection index always
/// matches the rows on screen.
pub fn collect_offline(app: &App) -> Vec<(&String, &DeviceState)> {
    let mut devices: Vec<(&String, &DeviceState)> = app
        .store
        .devices()
        .iter()
        .filter(|(_, state)| state.liveness == Liveness::Offline)
        .filter(|(id, state)| app.matches_filter(id, &state.display_name))
        .collect();
    sort_offline(&mut devices, app.offline_sort_column, app.offline_sort_ascending);
    devices
}

/// Render the Offline view as a table of silent devices.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let total_offline = app
        .store
        .devices()
        .values()
        .filter(|state| state.liveness == Liveness::Offline)
        .count();

    if total_offline == 0 {
        render_all_reporting_message(frame, app, area);
        return;
    }

    let now = Instant::now();
    let sorted = collect_offline(app);

    // Build header row with sort indicators
    let header = Row::new(vec![
        Cell::from(format_header("Address", OfflineSortColumn::Address, app)),
        Cell::from(format_header("Name", OfflineSortColumn::Name, app)),
        Cell::from(format_header("Group", OfflineSortColumn::Group, app)),
        Cell::from(format_header("Silent for", OfflineSortColumn::Silence, app)),
        Cell::from(Span::raw("Last sample")),
        Cell::from(Span::raw("Samples")),
    ])
    .height(1)
    .style(app.theme.header);

    // Build data rows
    let offline_style = app.theme.liveness_style(Liveness::Offline);
    let rows: Vec<Row> = sorted
        .iter()
        .map(|(id, state)| {
            let last_sample = state
                .latest()
                .map(|entry| entry.observed_at.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());

            Row::new(vec![
                Cell::from((*id).clone()),
                Cell::from(state.display_name.clone())
                    .style(Style::default().add_modifier(Modifier::BOLD)),
                Cell::from(prefix_group(id).to_string())
                    .style(Style::default().add_modifier(Modifier::DIM)),
                Cell::from(format_age(state.silence(now))).style(offline_style),
                Cell::from(last_sample),
                Cell::from(format!("{}", state.history.len())),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),    // Address
        Constraint::Fill(2),    // Name
        Constraint::Fill(1),    // Group
        Constraint::Length(11), // Silent for - fixed
        Constraint::Length(12), // Last sample - fixed
        Constraint::Length(8),  // Samples - fixed
    ];

    // Build title
    let sort_indicator = match app.offline_sort_column {
        OfflineSortColumn::Silence => "silence",
        OfflineSortColumn::Address => "address",
        OfflineSortColumn::Name => "name",
        OfflineSortColumn::Group => "group",
    };
    let sort_dir = if app.offline_sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if !sorted.is_empty() {
        format!(" [{}/{}]", app.selected_row_index + 1, sorted.len())
    } else {
        String::new()
    };

    let title = format!(
        " Offline ({} of {}) [s:sort {}{}]{}{} ",
        total_offline,
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
                .border_style(Style::default().fg(app.theme.offline)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(
        app.selected_row_index.min(sorted.len().saturating_sub(1)),
    ));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_all_reporting_message(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Offline ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.online));

    let lines = vec![
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled("    ✓ ", Style::default().fg(app.theme.online)),
            Span::styled(
                "All devices reporting",
                Style::default().fg(app.theme.online).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(""),
        Line::from(vec![Span::styled(
            "      Nothing has gone silent past the offline threshold.",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}

fn format_header(name: &str, col: OfflineSortColumn, app: &App) -> Span<'static> {
    if app.offline_sort_column == col {
        let arrow = if app.offline_sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

fn sort_offline(
    devices: &mut [(&String, &DeviceState)],
    column: OfflineSortColumn,
    ascending: bool,
) {
    devices.sort_by(|a, b| {
        let primary = match column {
            // Ascending silence means most recently heard first, which
            // is the reverse of the receipt clock.
            OfflineSortColumn::Silence => b.1.last_seen.cmp(&a.1.last_seen),
            OfflineSortColumn::Address => address_cmp(a.0, b.0),
            OfflineSortColumn::Name => {
                a.1.display_name.to_lowercase().cmp(&b.1.display_name.to_lowercase())
            }
            OfflineSortColumn::Group => prefix_group(a.0).cmp(prefix_group(b.0)),
        };

        // Apply direction to primary comparison
        let primary = if ascending { primary } else { primary.reverse() };

        // Secondary sort by address keeps the order total
        if primary == std::cmp::Ordering::Equal {
            address_cmp(a.0, b.0)
        } else {
            primary
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn device(name: &str, last_seen: Instant) -> DeviceState {
        DeviceState {
            display_name: name.to_string(),
            history: VecDeque::new(),
            first_seen: chrono::Utc::now(),
            last_seen,
            liveness: Liveness::Offline,
            events_seen: 0,
        }
    }

    #[test]
    fn test_sort_by_silence_descending_puts_longest_silent_first() {
        let base = Instant::now();
        let ids = ["A:A:A:1".to_string(), "B:B:B:1".to_string()];
        let fresh = device("fresh", base + Duration::from_secs(120));
        let stale = device("stale", base);
        let mut devices = vec![(&ids[0], &fresh), (&ids[1], &stale)];

        // descending silence = longest silent first
        sort_offline(&mut devices, OfflineSortColumn::Silence, false);
        assert_eq!(devices[0].1.display_name, "stale");
        assert_eq!(devices[1].1.display_name, "fresh");

        sort_offline(&mut devices, OfflineSortColumn::Silence, true);
        assert_eq!(devices[0].1.display_name, "fresh");
    }
}
