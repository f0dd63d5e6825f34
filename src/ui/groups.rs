use std::time::Instant;

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_age;
use crate::data::groups::{group_members, group_rollups};
use crate::data::Liveness;

/// Render the Groups view: a rollup table per address prefix group,
/// with the selected group's members listed below.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    if app.store.is_empty() {
        let block = Block::default()
            .title(" Groups ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border));
        let paragraph = Paragraph::new("No devices yet").block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let now = Instant::now();
    let rollups = group_rollups(&app.store, now);
    let selected = app.selected_row_index.min(rollups.len().saturating_sub(1));

    // Split area: rollup table on top, members panel below
    let chunks = Layout::vertical([
        Constraint::Fill(2),
        Constraint::Min(6), // Members panel
    ])
    .split(area);

    // ===== RENDER ROLLUP TABLE =====
    let header = Row::new(vec![
        Cell::from("Group"),
        Cell::from("Devices"),
        Cell::from("Online"),
        Cell::from("Offline"),
        Cell::from("Last event"),
        Cell::from("Events"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = rollups
        .iter()
        .map(|rollup| {
            let offline_cell = if rollup.offline > 0 {
                Cell::from(format!("{}", rollup.offline))
                    .style(app.theme.liveness_style(Liveness::Offline))
            } else {
                Cell::from("0").style(Style::default().add_modifier(Modifier::DIM))
            };

            Row::new(vec![
                Cell::from(rollup.group.clone()),
                Cell::from(format!("{}", rollup.devices)),
                Cell::from(format!("{}", rollup.online))
                    .style(Style::default().fg(app.theme.online)),
                offline_cell,
                Cell::from(format_age(rollup.freshest_silence)),
                Cell::from(format!("{}", rollup.events_seen)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),    // Group
        Constraint::Length(9),  // Devices
        Constraint::Length(8),  // Online
        Constraint::Length(9),  // Offline
        Constraint::Length(12), // Last event
        Constraint::Length(8),  // Events
    ];

    let position_info = if !rollups.is_empty() {
        format!(" [{}/{}]", selected + 1, rollups.len())
    } else {
        String::new()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Groups ({}){} ", rollups.len(), position_info))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected));

    frame.render_stateful_widget(table, chunks[0], &mut state);

    // ===== RENDER MEMBERS PANEL =====
    let mut member_lines: Vec<Line> = Vec::new();

    if let Some(rollup) = rollups.get(selected) {
        let members = group_members(&app.store, &rollup.group);

        // Rows that fit: panel height minus borders and the footer
        let capacity = (chunks[1].height.saturating_sub(4)) as usize;
        let shown = members.len().min(capacity.max(1));

        for id in members.iter().take(shown) {
            if let Some(device) = app.store.get(id) {
                let status_style = app.theme.liveness_style(device.liveness);
                member_lines.push(Line::from(vec![
                    Span::styled(format!(" {:<5}", device.liveness.symbol()), status_style),
                    Span::raw(format!("{:<22}", truncate(id, 21))),
                    Span::raw(truncate(&device.display_name, 30)),
                ]));
            }
        }

        if members.len() > shown {
            member_lines.push(Line::from(vec![Span::styled(
                format!("   … and {} more", members.len() - shown),
                Style::default().add_modifier(Modifier::DIM),
            )]));
        }
    }

    member_lines.push(Line::from(""));
    member_lines.push(Line::from(vec![Span::styled(
        " ↑/↓ select group    Tab switch view",
        Style::default().add_modifier(Modifier::DIM),
    )]));

    let members_block = Block::default()
        .title(" Group members ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let members_paragraph = Paragraph::new(member_lines).block(members_block);
    frame.render_widget(members_paragraph, chunks[1]);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", truncated)
    }
}
