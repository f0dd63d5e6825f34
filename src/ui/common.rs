//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::duration::format_age;

/// Render the header bar with fleet liveness overview.
///
/// Displays: status indicator, online/offline counts, device total,
/// events applied since start.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    if app.store.is_empty() {
        let line = Line::from(vec![
            Span::styled(" ● ", Style::default().add_modifier(Modifier::DIM)),
            Span::styled("AQUAWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("│ waiting for telemetry..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let summary = app.summary();

    // Overall status indicator: red as soon as anything is offline
    let status_style = if summary.offline > 0 {
        Style::default().fg(app.theme.offline)
    } else {
        Style::default().fg(app.theme.online)
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("AQUAWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(
            format!("{}", summary.online),
            Style::default().fg(app.theme.online),
        ),
        Span::raw(" online "),
        if summary.offline > 0 {
            Span::styled(
                format!("{}", summary.offline),
                Style::default().fg(app.theme.offline).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" offline │ "),
        Span::styled(
            format!("{}", summary.total),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" devices │ "),
        Span::raw(format!("{} events", format_count(app.events_applied))),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![
        Line::from(" 1:Devices "),
        Line::from(" 2:Offline "),
        Line::from(" 3:Groups "),
    ];

    let selected = match app.current_view {
        View::Devices => 0,
        View::Offline => 1,
        View::Groups => 2,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: breadcrumb trail, event source, time since the last event,
/// available controls. Also displays temporary status messages and
/// transport errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Check for temporary status message first
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    // Transport errors take priority over the normal status line
    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Source error: {} | q:quit", err))
            .style(Style::default().fg(app.theme.offline));
        frame.render_widget(paragraph, area);
        return;
    }

    let last_event = match app.last_event_at {
        Some(at) => format!("Last event {} ago", format_age(at.elapsed())),
        None => "No events yet".to_string(),
    };

    // Context-sensitive controls
    let controls = match app.current_view {
        View::Devices => {
            if app.filter_active {
                "Type to search | Enter:apply Esc:cancel"
            } else {
                "/:search s:sort Tab:switch Enter:detail ?:help q:quit"
            }
        }
        View::Offline => {
            if app.filter_active {
                "Type to search | Enter:apply Esc:cancel"
            } else {
                "/:search s:sort S:reverse Tab:switch Enter:detail ?:help q:quit"
            }
        }
        View::Groups => "↑↓:select Tab:switch ?:help q:quit",
    };

    let status = format!(
        " {} | {} | {} | {}",
        app.breadcrumb(),
        app.source_description(),
        last_event,
        controls,
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Navigation",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Device detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " Devices & Offline",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  /         Start filter/search"),
        Line::from("  c         Clear filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from(""),
        Line::from(vec![Span::styled(
            " General",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from("  r         Pump pending events now"),
        Line::from("  e         Export fleet to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 24u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    // Clear the area behind the help
    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
