//! Channel-based event source.
//!
//! Receives already-decoded events via a tokio mpsc channel. This is
//! the embedding path: a host application decodes (or synthesizes)
//! events, pushes them through the sender, and the TUI drains them.
//! Every event matters for history and liveness, so this is a queue,
//! not a latest-value cell.

use tokio::sync::mpsc;

use super::{EventSource, UpdateEvent};

/// Queue depth for pushed events.
const CHANNEL_CAPACITY: usize = 256;

/// An event source fed by an in-process channel.
///
/// # Example
///
/// ```
/// use aquawatch::ChannelSource;
///
/// // Create a channel pair
/// let (tx, source) = ChannelSource::create("plant-gateway");
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: mpsc::Receiver<UpdateEvent>,
    description: String,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of an mpsc channel
    /// * `source_description` - A description of where events come from
    ///   (e.g., "plant-gateway", "mqtt://broker:1883")
    pub fn new(receiver: mpsc::Receiver<UpdateEvent>, source_description: &str) -> Self {
        let description = format!("channel: {}", source_description);
        Self {
            receiver,
            description,
        }
    }

    /// Create a channel pair for pushing events to a ChannelSource.
    ///
    /// Returns (sender, source) where the sender can be handed to the
    /// producing side and the source drives the TUI.
    pub fn create(source_description: &str) -> (mpsc::Sender<UpdateEvent>, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let source = Self::new(rx, source_description);
        (tx, source)
    }
}

impl EventSource for ChannelSource {
    fn poll(&mut self) -> Option<UpdateEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            // A dropped sender is normal teardown, not a transport fault
            Err(_) => None,
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        // Transport failures belong to the producing side here
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Reading;

    fn event(id: &str, ph: f64) -> UpdateEvent {
        UpdateEvent {
            device_id: id.to_string(),
            display_name: "Probe".to_string(),
            sample: Reading {
                ph: Some(ph),
                ..Reading::default()
            },
            source_time: None,
        }
    }

    #[test]
    fn test_channel_source_delivers_in_order() {
        let (tx, mut source) = ChannelSource::create("test");

        assert!(source.poll().is_none());

        tx.try_send(event("A:B:C:1", 6.8)).unwrap();
        tx.try_send(event("A:B:C:2", 7.2)).unwrap();

        assert_eq!(source.poll().unwrap().device_id, "A:B:C:1");
        assert_eq!(source.poll().unwrap().device_id, "A:B:C:2");
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_channel_source_survives_sender_drop() {
        let (tx, mut source) = ChannelSource::create("test");
        tx.try_send(event("A:B:C:1", 7.0)).unwrap();
        drop(tx);

        // Queued events drain first, then poll settles on None
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_channel_source_description() {
        let (_tx, source) = ChannelSource::create("mqtt://broker:1883");
        assert_eq!(source.description(), "channel: mqtt://broker:1883");
    }
}
