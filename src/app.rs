//! Application state and navigation logic.

use std::time::{Duration, Instant};

use anyhow::{bail, Result};

use crate::data::groups::group_rollups;
use crate::data::order::prefix_group;
use crate::data::{DeviceStore, FleetSummary, Liveness};
use crate::source::EventSource;
use crate::ui::devices::SortColumn;
use crate::ui::OfflineSortColumn;
use crate::ui::Theme;

/// The current view/tab in the TUI.
///
/// Device detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// The whole fleet with current samples and liveness.
    Devices,
    /// Only the devices the sweep has marked Offline.
    Offline,
    /// Fleet rolled up by address prefix group.
    Groups,
}

impl View {
    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Devices => View::Offline,
            View::Offline => View::Groups,
            View::Groups => View::Devices,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Devices => View::Groups,
            View::Offline => View::Devices,
            View::Groups => View::Offline,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Devices => "Devices",
            View::Offline => "Offline",
            View::Groups => "Groups",
        }
    }
}

/// Saved state for returning to a previous view.
///
/// Used by the view stack to restore navigation state when going back.
#[derive(Debug, Clone)]
pub struct ViewState {
    /// The view that was active.
    pub view: View,
    /// The selected device index in that view.
    pub selected_device_index: usize,
    /// The selected row index (Offline and Groups views).
    pub selected_row_index: usize,
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Event intake
    source: Box<dyn EventSource>,
    pub store: DeviceStore,
    pub events_applied: u64,
    pub last_event_at: Option<Instant>,
    pub load_error: Option<String>,

    // Navigation state
    pub selected_device_index: usize,
    pub selected_row_index: usize,
    pub view_stack: Vec<ViewState>,

    // Sorting (Devices view)
    pub sort_column: SortColumn,
    pub sort_ascending: bool,

    // Sorting (Offline view)
    pub offline_sort_column: OfflineSortColumn,
    pub offline_sort_ascending: bool,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    /// Create a new App around an event source and a configured store.
    pub fn new(source: Box<dyn EventSource>, store: DeviceStore) -> Self {
        Self {
            running: true,
            current_view: View::Devices,
            show_help: false,
            show_detail_overlay: false,
            source,
            store,
            events_applied: 0,
            last_event_at: None,
            load_error: None,
            selected_device_index: 0,
            selected_row_index: 0,
            view_stack: Vec::new(),
            sort_column: SortColumn::default(),
            sort_ascending: true,
            offline_sort_column: OfflineSortColumn::default(),
            offline_sort_ascending: false, // Default descending (longest silent first)
            filter_text: String::new(),
            filter_active: false,
            theme: Theme::auto_detect(),
            status_message: None,
        }
    }

    /// Returns a description of the current event source.
    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Push current state to stack and navigate to a new view.
    #[allow(dead_code)]
    pub fn push_view(&mut self, view: View) {
        self.view_stack.push(ViewState {
            view: self.current_view,
            selected_device_index: self.selected_device_index,
            selected_row_index: self.selected_row_index,
        });
        self.current_view = view;
        self.selected_row_index = 0;
    }

    /// Pop the view stack and restore previous state.
    pub fn pop_view(&mut self) -> bool {
        if let Some(state) = self.view_stack.pop() {
            self.current_view = state.view;
            self.selected_device_index = state.selected_device_index;
            self.selected_row_index = state.selected_row_index;
            true
        } else {
            false
        }
    }

    /// Get breadcrumb trail for current navigation.
    pub fn breadcrumb(&self) -> String {
        let mut parts: Vec<&str> = self.view_stack.iter().map(|s| s.view.label()).collect();
        parts.push(self.current_view.label());
        parts.join(" > ")
    }

    /// Drain pending events from the source and apply them in arrival
    /// order. Returns how many were applied.
    ///
    /// Bounded per call so one busy stream cannot starve the UI loop;
    /// whatever is left over is picked up on the next pump.
    pub fn pump_source(&mut self) -> usize {
        const MAX_EVENTS_PER_PUMP: usize = 256;

        let mut applied = 0usize;
        while applied < MAX_EVENTS_PER_PUMP {
            let Some(event) = self.source.poll() else {
                break;
            };
            let now = Instant::now();
            self.store.apply(event, now);
            self.last_event_at = Some(now);
            applied += 1;
        }

        self.events_applied += applied as u64;
        self.load_error = self.source.error().map(str::to_string);
        if applied > 0 {
            self.clamp_selection();
        }
        applied
    }

    /// Reclassify fleet liveness from elapsed silence.
    ///
    /// The main loop calls this on the sweep cadence; events between
    /// sweeps flip devices back Online on their own.
    pub fn run_sweep(&mut self) {
        self.store.sweep(Instant::now());
        self.clamp_selection();
    }

    /// The configured sweep cadence.
    pub fn sweep_interval(&self) -> Duration {
        self.store.policy().sweep_interval
    }

    /// Current fleet accounting.
    pub fn summary(&self) -> FleetSummary {
        FleetSummary::of(&self.store)
    }

    /// Switch to the next view (cycles through Devices → Offline → Groups).
    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
        self.selected_row_index = 0;
    }

    /// Switch to the previous view (cycles through Groups → Offline → Devices).
    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
        self.selected_row_index = 0;
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_row_index = 0;
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    /// Move selection down by n items.
    pub fn select_next_n(&mut self, n: usize) {
        match self.current_view {
            View::Devices => {
                let max = self.filtered_device_count().saturating_sub(1);
                self.selected_device_index = (self.selected_device_index + n).min(max);
            }
            View::Offline => {
                let max = self.filtered_offline_count().saturating_sub(1);
                self.selected_row_index = (self.selected_row_index + n).min(max);
            }
            View::Groups => {
                let max = self.group_count().saturating_sub(1);
                self.selected_row_index = (self.selected_row_index + n).min(max);
            }
        }
    }

    /// Move selection up by n items.
    pub fn select_prev_n(&mut self, n: usize) {
        match self.current_view {
            View::Devices => {
                self.selected_device_index = self.selected_device_index.saturating_sub(n);
            }
            View::Offline | View::Groups => {
                self.selected_row_index = self.selected_row_index.saturating_sub(n);
            }
        }
    }

    /// Jump to the first item in the list.
    pub fn select_first(&mut self) {
        match self.current_view {
            View::Devices => self.selected_device_index = 0,
            View::Offline | View::Groups => self.selected_row_index = 0,
        }
    }

    /// Jump to the last item in the list.
    pub fn select_last(&mut self) {
        match self.current_view {
            View::Devices => {
                self.selected_device_index = self.filtered_device_count().saturating_sub(1);
            }
            View::Offline => {
                self.selected_row_index = self.filtered_offline_count().saturating_sub(1);
            }
            View::Groups => {
                self.selected_row_index = self.group_count().saturating_sub(1);
            }
        }
    }

    /// Get count of devices after applying the filter.
    pub fn filtered_device_count(&self) -> usize {
        self.store
            .devices()
            .iter()
            .filter(|(id, state)| self.matches_filter(id, &state.display_name))
            .count()
    }

    /// Get count of offline devices after applying the filter.
    pub fn filtered_offline_count(&self) -> usize {
        self.store
            .devices()
            .iter()
            .filter(|(_, state)| state.liveness == Liveness::Offline)
            .filter(|(id, state)| self.matches_filter(id, &state.display_name))
            .count()
    }

    /// Number of distinct prefix groups in the fleet. The Groups view
    /// does not apply the text filter.
    pub fn group_count(&self) -> usize {
        let groups: std::collections::HashSet<&str> =
            self.store.devices().keys().map(|id| prefix_group(id)).collect();
        groups.len()
    }

    /// The address behind the current selection, resolved through the
    /// same filtering and sorting the active view renders with.
    pub fn selected_device_id(&self) -> Option<String> {
        match self.current_view {
            View::Devices => crate::ui::devices::collect_devices(self)
                .get(self.selected_device_index)
                .map(|(id, _)| (*id).clone()),
            View::Offline => crate::ui::offline::collect_offline(self)
                .get(self.selected_row_index)
                .map(|(id, _)| (*id).clone()),
            // Groups view selects groups, not devices
            View::Groups => None,
        }
    }

    /// Open the detail overlay for the currently selected device.
    pub fn enter_detail(&mut self) {
        let has_selection = matches!(self.current_view, View::Devices | View::Offline)
            && self.selected_device_id().is_some();
        if has_selection {
            self.show_detail_overlay = true;
        }
    }

    /// Navigate back: close overlay first, then pop view stack, then go
    /// to the Devices view.
    pub fn go_back(&mut self) {
        // First close any overlays
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        // Then try to pop the view stack
        if !self.pop_view() {
            // If stack is empty, go to the fleet view
            if self.current_view != View::Devices {
                self.current_view = View::Devices;
            }
        }
    }

    /// Close the detail overlay if open.
    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Cycle to the next sort column for the current view.
    pub fn cycle_sort(&mut self) {
        match self.current_view {
            View::Devices => self.sort_column = self.sort_column.next(),
            View::Offline => self.offline_sort_column = self.offline_sort_column.next(),
            _ => {}
        }
    }

    /// Toggle sort direction between ascending and descending.
    pub fn toggle_sort_direction(&mut self) {
        match self.current_view {
            View::Devices => self.sort_ascending = !self.sort_ascending,
            View::Offline => self.offline_sort_ascending = !self.offline_sort_ascending,
            _ => {}
        }
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    /// Clear the filter text and exit filter mode.
    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
        self.clamp_selection();
    }

    /// Append a character to the filter text.
    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    /// Remove the last character from the filter text.
    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    /// Check if a device matches the current filter, by address or name.
    pub fn matches_filter(&self, id: &str, name: &str) -> bool {
        if self.filter_text.is_empty() {
            return true;
        }
        let search = self.filter_text.to_lowercase();
        id.to_lowercase().contains(&search) || name.to_lowercase().contains(&search)
    }

    /// Keep selection indices inside the lists they point into.
    fn clamp_selection(&mut self) {
        let device_count = self.filtered_device_count();
        if self.selected_device_index >= device_count {
            self.selected_device_index = device_count.saturating_sub(1);
        }
        let row_count = match self.current_view {
            View::Devices => return,
            View::Offline => self.filtered_offline_count(),
            View::Groups => self.group_count(),
        };
        if self.selected_row_index >= row_count {
            self.selected_row_index = row_count.saturating_sub(1);
        }
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export current fleet state to a JSON file.
    pub fn export_state(&self, path: &std::path::Path) -> Result<()> {
        use std::io::Write;

        if self.store.is_empty() {
            bail!("No devices to export");
        }

        let now = Instant::now();
        let summary = self.summary();

        let mut export = serde_json::Map::new();
        export.insert(
            "summary".to_string(),
            serde_json::json!({
                "total": summary.total,
                "online": summary.online,
                "offline": summary.offline,
            }),
        );

        // Devices in display order, with the full retained history
        let devices: Vec<serde_json::Value> =
            crate::data::order::display_order(self.store.devices().keys().cloned())
                .into_iter()
                .filter_map(|id| {
                    let state = self.store.get(&id)?;
                    Some(serde_json::json!({
                        "address": id,
                        "name": state.display_name,
                        "group": prefix_group(&id),
                        "liveness": state.liveness.label(),
                        "first_seen": state.first_seen.to_rfc3339(),
                        "events_seen": state.events_seen,
                        "silent_for_secs": state.silence(now).as_secs_f64(),
                        "history": state.history.iter().map(|entry| serde_json::json!({
                            "observed_at": entry.observed_at.to_rfc3339(),
                            "sample": entry.sample,
                        })).collect::<Vec<_>>(),
                    }))
                })
                .collect();
        export.insert("devices".to_string(), serde_json::Value::Array(devices));

        let groups: Vec<serde_json::Value> = group_rollups(&self.store, now)
            .into_iter()
            .map(|rollup| {
                serde_json::json!({
                    "group": rollup.group,
                    "devices": rollup.devices,
                    "online": rollup.online,
                    "offline": rollup.offline,
                    "freshest_silence_secs": rollup.freshest_silence.as_secs_f64(),
                    "events_seen": rollup.events_seen,
                })
            })
            .collect();
        export.insert("groups".to_string(), serde_json::Value::Array(groups));

        let json = serde_json::to_string_pretty(&serde_json::Value::Object(export))?;
        let mut file = std::fs::File::create(path)?;
        file.write_all(json.as_bytes())?;

        Ok(())
    }
}
