//! Replay an NDJSON telemetry log and print decoded events.
//!
//! Run with:
//!
//! ```bash
//! cargo run --example file_replay -- telemetry.ndjson
//! ```
//!
//! The log is re-read whenever its mtime changes, so appending lines to it
//! from another shell shows up here.

use std::time::Duration;

use aquawatch::{EventSource, FileSource};

fn main() {
    let path = std::env::args().nth(1).unwrap_or_else(|| "telemetry.ndjson".to_string());
    let mut source = FileSource::new(&path);

    println!("Watching {} (Ctrl-C to stop)", path);
    loop {
        while let Some(event) = source.poll() {
            let ph = event
                .sample
                .ph
                .map(|v| format!("{:.2}", v))
                .unwrap_or_else(|| "-".to_string());
            println!("{:<24} {:<20} pH {}", event.device_id, event.display_name, ph);
        }
        if let Some(err) = source.error() {
            eprintln!("source error: {}", err);
        }
        std::thread::sleep(Duration::from_millis(500));
    }
}
