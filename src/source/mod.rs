//! Event source abstraction for inbound telemetry.
//!
//! This module provides a trait-based abstraction for receiving device
//! events from various transports (capture files, network streams,
//! in-process channels), plus the wire envelope and its decoder.

mod channel;
mod envelope;
mod file;
mod stream;

pub use channel::ChannelSource;
pub use envelope::{decode, DecodeError, SampleRecord, TelemetryEnvelope, TelemetryPayload, UpdateEvent};
pub use file::FileSource;
pub use stream::StreamSource;

use std::fmt::Debug;

/// Trait for receiving telemetry events from various transports.
///
/// Implementations deliver already-decoded [`UpdateEvent`]s in arrival
/// order. Messages that fail to decode never reach the consumer: the
/// contract is drop-and-continue, one garbled probe must not take down
/// the fleet display.
///
/// # Example
///
/// ```
/// use aquawatch::{EventSource, FileSource};
///
/// let mut source = FileSource::new("telemetry.ndjson");
/// if let Some(event) = source.poll() {
///     println!("Heard from {}", event.device_id);
/// }
/// ```
pub trait EventSource: Send + Debug {
    /// Poll for the next pending event, oldest first.
    ///
    /// Returns `None` when nothing is queued. This method must be
    /// non-blocking; the UI loop calls it between frames.
    fn poll(&mut self) -> Option<UpdateEvent>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;

    /// The last transport-level error, if any.
    ///
    /// Only I/O failures (unreadable file, dropped connection) are
    /// reported here. Undecodable messages are not errors, they are
    /// silently skipped.
    fn error(&self) -> Option<&str>;
}
