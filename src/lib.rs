// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # aquawatch
//!
//! A live TUI and library for monitoring water-quality sensor telemetry.
//!
//! This crate turns an unordered stream of sensor events into a per-device
//! picture of a fleet: the latest readings, a bounded sample history, and an
//! Online/Offline classification driven by how long each device has been
//! silent. Events can arrive from files, TCP streams, or in-process channels,
//! and the resulting state is displayed in an interactive terminal UI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│   data   │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │ (store)  │    │(rendering)   │         │ │
//! │  └────┬────┘    └──────────┘    └─────────┘    └─────────┘ │
//! │       │                                                     │
//! │       ▼                                                     │
//! │  ┌─────────┐                                                │
//! │  │ source  │◀── FileSource | StreamSource | ChannelSource  │
//! │  │ (input) │                                                │
//! │  └─────────┘                                                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`app`]**: Application state, view navigation, and user interaction logic
//! - **[`source`]**: Event source abstraction ([`EventSource`] trait) with
//!   implementations for file replay, TCP streams, and channel-based input,
//!   plus the wire-format decoder
//! - **[`data`]**: The device store - applies events in arrival order, keeps a
//!   bounded history per device, sweeps liveness, and rolls the fleet up into
//!   summaries and prefix groups
//! - **[`ui`]**: Terminal rendering using ratatui - fleet tables, offline and
//!   group views, a detail overlay, and theme support
//!
//! ## Features
//!
//! - **Devices view**: The whole fleet with the latest reading per metric
//! - **Offline view**: Devices that have gone silent, longest silent first
//! - **Groups view**: Fleet rolled up by address prefix group
//! - **Liveness sweep**: A device is Offline once its silence exceeds the
//!   configured threshold; any event flips it back Online immediately
//! - **Bounded history**: The last twenty samples per device, oldest evicted
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Replay and follow an NDJSON telemetry log
//! aquawatch --file telemetry.ndjson
//!
//! # Watch a live TCP telemetry stream
//! aquawatch --connect localhost:9999
//! ```
//!
//! ### As a library with file source
//!
//! ```
//! use aquawatch::{App, DeviceStore, FileSource};
//!
//! let source = Box::new(FileSource::new("telemetry.ndjson"));
//! let app = App::new(source, DeviceStore::default());
//! ```
//!
//! ### As a library with stream source (TCP, etc.)
//!
//! ```no_run
//! use std::io::Cursor;
//! use aquawatch::{App, DeviceStore, StreamSource};
//!
//! # tokio_test::block_on(async {
//! // Example with a cursor (in practice, use TcpStream)
//! let data = b"{\"payload\":{\"id\":\"WTP:PLC:1:AI1\",\"name\":\"Inlet pH\"}}\n";
//! let stream = Cursor::new(data.to_vec());
//! let source = StreamSource::spawn(stream, "example");
//! let app = App::new(Box::new(source), DeviceStore::default());
//! # });
//! ```
//!
//! ### As a library with channel source (for in-process feeds)
//!
//! ```
//! use aquawatch::{App, ChannelSource, DeviceStore};
//!
//! // Create a channel for feeding decoded events
//! let (tx, source) = ChannelSource::create("plant gateway");
//!
//! // Create the app
//! let app = App::new(Box::new(source), DeviceStore::default());
//! ```
//!
//! ### Decoding raw telemetry
//!
//! ```
//! use aquawatch::decode;
//!
//! let raw = r#"{"payload":{"id":"WTP:PLC:5:AI2","name":"Inlet pH","fields":[{"ph":7.2}]}}"#;
//! let event = decode(raw).unwrap();
//! assert_eq!(event.device_id, "WTP:PLC:5:AI2");
//! assert_eq!(event.sample.ph, Some(7.2));
//! ```

pub mod app;
pub mod data;
pub mod events;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use data::order::{display_order, prefix_group};
pub use data::{
    DeviceState, DeviceStore, FleetSummary, GroupRollup, HistoryEntry, Liveness, LivenessPolicy,
    Metric, Reading, HISTORY_LIMIT,
};
pub use source::{
    decode, ChannelSource, DecodeError, EventSource, FileSource, StreamSource, TelemetryEnvelope,
    TelemetryPayload, UpdateEvent,
};
