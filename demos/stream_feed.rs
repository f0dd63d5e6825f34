//! Poll telemetry from a TCP endpoint and print decoded events.
//!
//! Start something that writes one JSON envelope per line, e.g. with netcat:
//!
//! ```bash
//! echo '{"payload":{"id":"00:1A:2B:3C","name":"Intake Probe","fields":[{"ph":7.1,"temp":18.4,"timestamp":1700000000}]}}' | nc -l 9090
//! ```
//!
//! Then run this demo:
//!
//! ```bash
//! cargo run --example stream_feed -- localhost:9090
//! ```

use std::time::Duration;

use tokio::net::TcpStream;

use aquawatch::{EventSource, StreamSource};

#[tokio::main]
async fn main() {
    let addr = std::env::args().nth(1).unwrap_or_else(|| {
        eprintln!("Usage: cargo run --example stream_feed -- <host:port>");
        std::process::exit(1);
    });

    println!("Connecting to {}...", addr);
    let stream = match TcpStream::connect(&addr).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    println!("Connected, waiting for telemetry (Ctrl-C to stop)");

    let mut source = StreamSource::spawn(stream, &addr);
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
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
