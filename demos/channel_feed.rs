//! Feed synthetic telemetry through a ChannelSource into the device store.
//!
//! Shows the library wiring without a terminal: a producer thread pushes
//! decoded events while the main thread pumps them and prints the fleet
//! summary.
//!
//! ```bash
//! cargo run --example channel_feed
//! ```

use std::time::Duration;

use aquawatch::{App, ChannelSource, DeviceStore, Reading, UpdateEvent};

fn main() {
    let (tx, source) = ChannelSource::create("synthetic feed");
    let mut app = App::new(Box::new(source), DeviceStore::default());

    // Producer: three sensors reporting once a second
    std::thread::spawn(move || {
        let mut tick = 0u64;
        loop {
            for unit in 1..=3u64 {
                let event = UpdateEvent {
                    device_id: format!("WTP:PLC:{}:AI1", unit),
                    display_name: format!("Basin {} pH", unit),
                    sample: Reading {
                        ph: Some(6.8 + 0.1 * unit as f64 + (tick % 5) as f64 * 0.02),
                        temp: Some(18.5),
                        cod: None,
                        ss: None,
                    },
                    source_time: None,
                };
                if tx.blocking_send(event).is_err() {
                    return;
                }
            }
            tick += 1;
            std::thread::sleep(Duration::from_secs(1));
        }
    });

    for _ in 0..10 {
        std::thread::sleep(Duration::from_secs(1));
        let applied = app.pump_source();
        let summary = app.summary();
        println!(
            "applied {:>2} events | {} devices, {} online, {} offline",
            applied, summary.total, summary.online, summary.offline
        );
    }
}
