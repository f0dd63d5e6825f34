//! Fleet-wide accounting derived from the store.

use super::store::{DeviceStore, Liveness};

/// Device counts for the whole tracked fleet.
///
/// Liveness is two-valued and every tracked device carries one, so
/// `online + offline == total` holds after every event and every sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FleetSummary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

impl FleetSummary {
    /// Count the fleet as it stands right now.
    pub fn of(store: &DeviceStore) -> Self {
        let mut summary = Self {
            total: store.len(),
            online: 0,
            offline: 0,
        };
        for state in store.devices().values() {
            match state.liveness {
                Liveness::Online => summary.online += 1,
                Liveness::Offline => summary.offline += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::metric::Reading;
    use crate::data::store::LivenessPolicy;
    use crate::source::UpdateEvent;
    use std::time::{Duration, Instant};

    fn event(id: &str) -> UpdateEvent {
        UpdateEvent {
            device_id: id.to_string(),
            display_name: "Probe".to_string(),
            sample: Reading::default(),
            source_time: None,
        }
    }

    #[test]
    fn test_empty_store_counts_zero() {
        let store = DeviceStore::default();
        assert_eq!(FleetSummary::of(&store), FleetSummary::default());
    }

    #[test]
    fn test_counts_split_by_liveness() {
        let mut store = DeviceStore::new(LivenessPolicy::default());
        let start = Instant::now();
        store.apply(event("A:B:C:1"), start);
        store.apply(event("A:B:C:2"), start);
        store.apply(event("D:E:F:1"), start + Duration::from_secs(40));

        store.sweep(start + Duration::from_secs(45));
        let summary = FleetSummary::of(&store);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.online, 1);
        assert_eq!(summary.offline, 2);
    }

    #[test]
    fn test_counts_follow_a_device_through_silence_and_revival() {
        let mut store = DeviceStore::new(LivenessPolicy::default());
        let start = Instant::now();

        store.apply(event("A:B:C:1"), start);
        assert_eq!(FleetSummary::of(&store).online, 1);

        store.sweep(start + Duration::from_secs(31));
        let silent = FleetSummary::of(&store);
        assert_eq!((silent.total, silent.online, silent.offline), (1, 0, 1));

        // A new event flips the device back before any sweep runs
        store.apply(event("A:B:C:1"), start + Duration::from_secs(60));
        let revived = FleetSummary::of(&store);
        assert_eq!((revived.total, revived.online, revived.offline), (1, 1, 0));
    }

    #[test]
    fn test_accounting_holds_across_event_and_sweep_sequences() {
        let mut store = DeviceStore::new(LivenessPolicy::default());
        let start = Instant::now();
        let ids = ["A:B:C:1", "A:B:C:2", "D:E:F:1", "D:E:F:2", "G:H:I:1"];

        for step in 0..50u64 {
            let now = start + Duration::from_secs(step * 7);
            store.apply(event(ids[(step as usize) % ids.len()]), now);
            if step % 3 == 0 {
                store.sweep(now + Duration::from_secs(3));
            }
            let summary = FleetSummary::of(&store);
            assert_eq!(summary.online + summary.offline, summary.total);
            assert_eq!(summary.total, store.len());
        }
    }
}
