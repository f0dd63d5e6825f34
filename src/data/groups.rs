//! Prefix-group rollups for the Groups view.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::order::{self, prefix_group};
use super::store::{DeviceStore, Liveness};

/// Aggregated state of one address prefix group.
#[derive(Debug, Clone)]
pub struct GroupRollup {
    pub group: String,
    pub devices: usize,
    pub online: usize,
    pub offline: usize,
    /// Silence of the group's most recently heard device.
    pub freshest_silence: Duration,
    /// Events applied across the whole group.
    pub events_seen: u64,
}

/// Roll the fleet up by prefix group, ordered by group key.
pub fn group_rollups(store: &DeviceStore, now: Instant) -> Vec<GroupRollup> {
    let mut groups: BTreeMap<String, GroupRollup> = BTreeMap::new();

    for (id, state) in store.devices() {
        let key = prefix_group(id);
        let entry = groups.entry(key.to_string()).or_insert_with(|| GroupRollup {
            group: key.to_string(),
            devices: 0,
            online: 0,
            offline: 0,
            freshest_silence: Duration::MAX,
            events_seen: 0,
        });

        entry.devices += 1;
        match state.liveness {
            Liveness::Online => entry.online += 1,
            Liveness::Offline => entry.offline += 1,
        }
        entry.freshest_silence = entry.freshest_silence.min(state.silence(now));
        entry.events_seen += state.events_seen;
    }

    groups.into_values().collect()
}

/// Addresses belonging to `group`, in display order.
pub fn group_members(store: &DeviceStore, group: &str) -> Vec<String> {
    order::display_order(
        store
            .devices()
            .keys()
            .filter(|id| prefix_group(id) == group)
            .cloned(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metric::Reading;
    use crate::data::store::LivenessPolicy;
    use crate::source::UpdateEvent;

    fn event(id: &str) -> UpdateEvent {
        UpdateEvent {
            device_id: id.to_string(),
            display_name: "Probe".to_string(),
            sample: Reading::default(),
            source_time: None,
        }
    }

    #[test]
    fn test_rollups_aggregate_per_prefix() {
        let mut store = DeviceStore::new(LivenessPolicy::default());
        let start = Instant::now();
        store.apply(event("AA:00:01:01"), start);
        store.apply(event("AA:00:01:02"), start + Duration::from_secs(40));
        store.apply(event("FC:01:5C:01"), start + Duration::from_secs(40));
        store.sweep(start + Duration::from_secs(45));

        let rollups = group_rollups(&store, start + Duration::from_secs(45));
        assert_eq!(rollups.len(), 2);

        let aa = &rollups[0];
        assert_eq!(aa.group, "AA:00:01");
        assert_eq!(aa.devices, 2);
        assert_eq!(aa.online, 1);
        assert_eq!(aa.offline, 1);
        assert_eq!(aa.freshest_silence, Duration::from_secs(5));
        assert_eq!(aa.events_seen, 2);

        let fc = &rollups[1];
        assert_eq!(fc.group, "FC:01:5C");
        assert_eq!(fc.devices, 1);
        assert_eq!(fc.offline, 0);
    }

    #[test]
    fn test_rollups_ordered_by_group_key() {
        let mut store = DeviceStore::new(LivenessPolicy::default());
        let now = Instant::now();
        store.apply(event("ZZ:00:00:01"), now);
        store.apply(event("AA:00:00:01"), now);
        store.apply(event("MM:00:00:01"), now);

        let groups: Vec<String> =
            group_rollups(&store, now).into_iter().map(|r| r.group).collect();
        assert_eq!(groups, vec!["AA:00:00", "MM:00:00", "ZZ:00:00"]);
    }

    #[test]
    fn test_group_members_in_display_order() {
        let mut store = DeviceStore::new(LivenessPolicy::default());
        let now = Instant::now();
        store.apply(event("AA:00:01:09"), now);
        store.apply(event("AA:00:01:01"), now);
        store.apply(event("FC:01:5C:01"), now);

        assert_eq!(
            group_members(&store, "AA:00:01"),
            vec!["AA:00:01:01", "AA:00:01:09"]
        );
        assert_eq!(group_members(&store, "FC:01:5C"), vec!["FC:01:5C:01"]);
        assert!(group_members(&store, "XX:XX:XX").is_empty());
    }
}
