//! Device state tracking: the store, bounded histories, and the
//! liveness sweep.
//!
//! The store is the single stateful piece of the engine. Decoded events
//! flow in through [`DeviceStore::apply`], the periodic
//! [`DeviceStore::sweep`] reclassifies liveness, and everything the UI
//! shows is derived from the resulting map on demand.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use super::history::HistoryEntry;
use crate::source::UpdateEvent;

/// Samples retained per device; the oldest entry is evicted first.
pub const HISTORY_LIMIT: usize = 20;

/// Liveness classification, derived purely from elapsed time since a
/// device's last event. Devices never report this themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Liveness {
    Online,
    Offline,
}

impl Liveness {
    /// Short status-column symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Liveness::Online => "UP",
            Liveness::Offline => "DOWN",
        }
    }

    /// Full label for detail panes and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Liveness::Online => "Online",
            Liveness::Offline => "Offline",
        }
    }
}

/// Timing policy for the liveness sweep.
#[derive(Debug, Clone)]
pub struct LivenessPolicy {
    /// Silence strictly longer than this marks a device Offline.
    pub offline_after: Duration,
    /// How often the sweep reclassifies the fleet. Must stay below
    /// `offline_after` so staleness is noticed within one interval.
    pub sweep_interval: Duration,
}

impl Default for LivenessPolicy {
    fn default() -> Self {
        Self {
            offline_after: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(5),
        }
    }
}

impl LivenessPolicy {
    /// Reject a cadence that could let a device sit stale for longer
    /// than the threshold before anyone looks.
    pub fn validate(&self) -> Result<()> {
        if self.sweep_interval >= self.offline_after {
            bail!(
                "sweep interval ({:.0?}) must be shorter than the offline threshold ({:.0?})",
                self.sweep_interval,
                self.offline_after
            );
        }
        Ok(())
    }
}

/// Live state for one tracked device.
#[derive(Debug, Clone)]
pub struct DeviceState {
    /// Name from the most recent event. Earlier names are overwritten,
    /// not merged.
    pub display_name: String,
    /// Most recent samples in arrival order (not source-time order),
    /// capped at [`HISTORY_LIMIT`].
    pub history: VecDeque<HistoryEntry>,
    /// When this address was first seen.
    pub first_seen: DateTime<Utc>,
    /// Receipt time of the most recent event, on the engine's own
    /// clock. Drives the liveness sweep; probe timestamps play no part.
    pub last_seen: Instant,
    /// Current classification, owned by `apply` and `sweep`.
    pub liveness: Liveness,
    /// Events applied for this device since it was first seen.
    pub events_seen: u64,
}

impl DeviceState {
    fn new(now: Instant) -> Self {
        Self {
            display_name: String::new(),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
            first_seen: Utc::now(),
            last_seen: now,
            liveness: Liveness::Online,
            events_seen: 0,
        }
    }

    /// The most recently arrived entry. Every applied event appends
    /// one, so this is only `None` before the first event, and a device
    /// does not exist before its first event.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.history.back()
    }

    /// How long this device has been silent as of `now`.
    pub fn silence(&self, now: Instant) -> Duration {
        now.duration_since(self.last_seen)
    }
}

/// The engine's single owner of per-device state.
///
/// One instance is built at startup and owned by the UI loop. Sources
/// hand events over a channel and the loop applies them one at a time,
/// so no two mutations ever race and every borrow of the map is a
/// consistent snapshot.
#[derive(Debug)]
pub struct DeviceStore {
    devices: HashMap<String, DeviceState>,
    policy: LivenessPolicy,
    /// Optional whole-fleet cap. Unbounded growth is the default;
    /// devices are otherwise never removed, only reclassified.
    max_devices: Option<usize>,
}

impl Default for DeviceStore {
    fn default() -> Self {
        Self::new(LivenessPolicy::default())
    }
}

impl DeviceStore {
    pub fn new(policy: LivenessPolicy) -> Self {
        Self {
            devices: HashMap::new(),
            policy,
            max_devices: None,
        }
    }

    /// Cap the tracked fleet at `cap` devices, evicting the
    /// longest-silent one when a new address would overflow it.
    pub fn with_max_devices(mut self, cap: usize) -> Self {
        self.max_devices = Some(cap.max(1));
        self
    }

    pub fn policy(&self) -> &LivenessPolicy {
        &self.policy
    }

    /// Apply one decoded event received at `now`.
    ///
    /// Upserts the device, appends the sample to its bounded history,
    /// adopts the event's name, and marks the device Online. An event
    /// is itself proof of life, so an Offline classification is
    /// reversed here immediately rather than waiting for the next
    /// sweep.
    pub fn apply(&mut self, event: UpdateEvent, now: Instant) {
        if let Some(cap) = self.max_devices {
            if !self.devices.contains_key(&event.device_id) && self.devices.len() >= cap {
                self.evict_longest_silent();
            }
        }

        let state = self
            .devices
            .entry(event.device_id)
            .or_insert_with(|| DeviceState::new(now));

        state.display_name = event.display_name;
        state.history.push_back(HistoryEntry {
            observed_at: event.source_time.unwrap_or_else(Utc::now),
            sample: event.sample,
        });
        while state.history.len() > HISTORY_LIMIT {
            state.history.pop_front();
        }
        state.last_seen = now;
        state.liveness = Liveness::Online;
        state.events_seen += 1;
    }

    /// Reclassify every device from its elapsed silence.
    ///
    /// Idempotent: running it twice at the same instant changes
    /// nothing. Never removes a device and never touches history, so a
    /// long-dead probe keeps its last samples on screen.
    pub fn sweep(&mut self, now: Instant) {
        let threshold = self.policy.offline_after;
        for state in self.devices.values_mut() {
            state.liveness = if state.silence(now) > threshold {
                Liveness::Offline
            } else {
                Liveness::Online
            };
        }
    }

    fn evict_longest_silent(&mut self) {
        let oldest = self
            .devices
            .iter()
            .min_by_key(|(_, state)| state.last_seen)
            .map(|(id, _)| id.clone());
        if let Some(id) = oldest {
            self.devices.remove(&id);
        }
    }

    pub fn get(&self, id: &str) -> Option<&DeviceState> {
        self.devices.get(id)
    }

    /// All tracked devices, keyed by address. Iteration order is
    /// arbitrary; display ordering is applied by the views.
    pub fn devices(&self) -> &HashMap<String, DeviceState> {
        &self.devices
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metric::Reading;

    fn event(id: &str, name: &str, ph: f64) -> UpdateEvent {
        UpdateEvent {
            device_id: id.to_string(),
            display_name: name.to_string(),
            sample: Reading {
                ph: Some(ph),
                ..Reading::default()
            },
            source_time: None,
        }
    }

    fn timed_event(id: &str, ph: f64, epoch_secs: i64) -> UpdateEvent {
        UpdateEvent {
            source_time: DateTime::from_timestamp(epoch_secs, 0),
            ..event(id, "Probe", ph)
        }
    }

    #[test]
    fn test_first_event_creates_online_device() {
        let mut store = DeviceStore::default();
        let now = Instant::now();
        store.apply(event("A:B:C:1", "Tank 1", 7.0), now);

        let state = store.get("A:B:C:1").unwrap();
        assert_eq!(state.display_name, "Tank 1");
        assert_eq!(state.liveness, Liveness::Online);
        assert_eq!(state.events_seen, 1);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.latest().unwrap().sample.ph, Some(7.0));
    }

    #[test]
    fn test_later_event_overwrites_display_name() {
        let mut store = DeviceStore::default();
        let now = Instant::now();
        store.apply(event("A:B:C:1", "Old name", 7.0), now);
        store.apply(event("A:B:C:1", "New name", 7.1), now);
        assert_eq!(store.get("A:B:C:1").unwrap().display_name, "New name");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_history_capped_with_oldest_evicted_first() {
        let mut store = DeviceStore::default();
        let now = Instant::now();
        for i in 1..=25 {
            store.apply(event("A:B:C:1", "Probe", i as f64), now);
        }

        let state = store.get("A:B:C:1").unwrap();
        assert_eq!(state.history.len(), HISTORY_LIMIT);
        assert_eq!(state.history.front().unwrap().sample.ph, Some(6.0));
        assert_eq!(state.history.back().unwrap().sample.ph, Some(25.0));
        assert_eq!(state.events_seen, 25);
    }

    #[test]
    fn test_history_keeps_arrival_order_not_source_order() {
        let mut store = DeviceStore::default();
        let now = Instant::now();
        // A late-arriving older measurement still lands at the back.
        store.apply(timed_event("A:B:C:1", 7.0, 2000), now);
        store.apply(timed_event("A:B:C:1", 6.5, 1000), now);

        let state = store.get("A:B:C:1").unwrap();
        let times: Vec<_> = state.history.iter().map(|e| e.observed_at).collect();
        assert_eq!(times[0], DateTime::from_timestamp(2000, 0).unwrap());
        assert_eq!(times[1], DateTime::from_timestamp(1000, 0).unwrap());
        assert_eq!(state.latest().unwrap().sample.ph, Some(6.5));
    }

    #[test]
    fn test_missing_source_time_falls_back_to_receipt_clock() {
        let mut store = DeviceStore::default();
        let before = Utc::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), Instant::now());
        let after = Utc::now();

        let observed = store.get("A:B:C:1").unwrap().latest().unwrap().observed_at;
        assert!(observed >= before && observed <= after);
    }

    #[test]
    fn test_empty_sample_still_counts_as_an_event() {
        let mut store = DeviceStore::default();
        let now = Instant::now();
        store.apply(
            UpdateEvent {
                device_id: "A:B:C:1".to_string(),
                display_name: "Probe".to_string(),
                sample: Reading::default(),
                source_time: None,
            },
            now,
        );

        let state = store.get("A:B:C:1").unwrap();
        assert_eq!(state.events_seen, 1);
        assert_eq!(state.history.len(), 1);
        assert!(state.latest().unwrap().sample.is_empty());
        assert_eq!(state.liveness, Liveness::Online);
    }

    #[test]
    fn test_sweep_marks_silent_device_offline() {
        let mut store = DeviceStore::default();
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), start);

        store.sweep(start + Duration::from_secs(31));
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Offline);
    }

    #[test]
    fn test_sweep_leaves_fresh_device_online() {
        let mut store = DeviceStore::default();
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), start);

        store.sweep(start + Duration::from_secs(29));
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Online);
    }

    #[test]
    fn test_sweep_threshold_is_strictly_greater_than() {
        let mut store = DeviceStore::default();
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), start);

        // Exactly at the threshold is not yet past it.
        store.sweep(start + Duration::from_secs(30));
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Online);
    }

    #[test]
    fn test_event_revives_offline_device_immediately() {
        let mut store = DeviceStore::default();
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), start);
        store.sweep(start + Duration::from_secs(60));
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Offline);

        // No sweep needed: the event itself flips the device back.
        store.apply(event("A:B:C:1", "Probe", 7.1), start + Duration::from_secs(61));
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Online);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut store = DeviceStore::default();
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), start);
        store.apply(event("D:E:F:1", "Other", 6.5), start + Duration::from_secs(40));

        let later = start + Duration::from_secs(45);
        store.sweep(later);
        let first: Vec<_> = {
            let mut v: Vec<_> = store
                .devices()
                .iter()
                .map(|(id, s)| (id.clone(), s.liveness))
                .collect();
            v.sort();
            v
        };
        store.sweep(later);
        let second: Vec<_> = {
            let mut v: Vec<_> = store
                .devices()
                .iter()
                .map(|(id, s)| (id.clone(), s.liveness))
                .collect();
            v.sort();
            v
        };
        assert_eq!(first, second);
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Offline);
        assert_eq!(store.get("D:E:F:1").unwrap().liveness, Liveness::Online);
    }

    #[test]
    fn test_sweep_never_removes_devices_or_history() {
        let mut store = DeviceStore::default();
        let start = Instant::now();
        for i in 0..5 {
            store.apply(event("A:B:C:1", "Probe", i as f64), start);
        }

        store.sweep(start + Duration::from_secs(3600));
        let state = store.get("A:B:C:1").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(state.history.len(), 5);
        assert_eq!(state.latest().unwrap().sample.ph, Some(4.0));
    }

    #[test]
    fn test_max_devices_evicts_longest_silent() {
        let mut store =
            DeviceStore::new(LivenessPolicy::default()).with_max_devices(2);
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Oldest", 7.0), start);
        store.apply(event("D:E:F:1", "Middle", 7.0), start + Duration::from_secs(1));
        store.apply(event("G:H:I:1", "Newest", 7.0), start + Duration::from_secs(2));

        assert_eq!(store.len(), 2);
        assert!(store.get("A:B:C:1").is_none());
        assert!(store.get("D:E:F:1").is_some());
        assert!(store.get("G:H:I:1").is_some());
    }

    #[test]
    fn test_max_devices_does_not_evict_on_known_address() {
        let mut store =
            DeviceStore::new(LivenessPolicy::default()).with_max_devices(2);
        let start = Instant::now();
        store.apply(event("A:B:C:1", "One", 7.0), start);
        store.apply(event("D:E:F:1", "Two", 7.0), start + Duration::from_secs(1));
        // Re-seen address must not push anyone out.
        store.apply(event("A:B:C:1", "One", 7.1), start + Duration::from_secs(2));

        assert_eq!(store.len(), 2);
        assert!(store.get("D:E:F:1").is_some());
    }

    #[test]
    fn test_policy_validation() {
        assert!(LivenessPolicy::default().validate().is_ok());
        let bad = LivenessPolicy {
            offline_after: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(5),
        };
        assert!(bad.validate().is_err());
        let worse = LivenessPolicy {
            offline_after: Duration::from_secs(5),
            sweep_interval: Duration::from_secs(10),
        };
        assert!(worse.validate().is_err());
    }

    #[test]
    fn test_custom_offline_threshold_is_honored() {
        let policy = LivenessPolicy {
            offline_after: Duration::from_secs(10),
            sweep_interval: Duration::from_secs(2),
        };
        let mut store = DeviceStore::new(policy);
        let start = Instant::now();
        store.apply(event("A:B:C:1", "Probe", 7.0), start);

        store.sweep(start + Duration::from_secs(11));
        assert_eq!(store.get("A:B:C:1").unwrap().liveness, Liveness::Offline);
    }
}
