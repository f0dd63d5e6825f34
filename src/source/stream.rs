//! Stream-based event source.
//!
//! Receives line-framed telemetry envelopes from an async byte stream.
//! This is the live mode: a collector (or the probes' gateway) streams
//! one envelope per line over TCP.

use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use super::{decode, EventSource, UpdateEvent};

/// Queue depth between the reader task and the UI thread. Sized for a
/// plant's worth of probes reporting at once.
const CHANNEL_CAPACITY: usize = 256;

/// An event source that decodes envelopes from an async stream.
///
/// A background task reads newline-delimited JSON from the provided
/// reader, decodes each line, and queues the events for `poll()`.
///
/// # Example with a byte stream
///
/// ```no_run
/// use std::io::Cursor;
/// use aquawatch::StreamSource;
///
/// # tokio_test::block_on(async {
/// let data = b"{\"payload\":{\"id\":\"A:B:C:1\",\"name\":\"Probe\",\"fields\":[]}}\n";
/// let stream = Cursor::new(data.to_vec());
/// let source = StreamSource::spawn(stream, "example");
/// # });
/// ```
#[derive(Debug)]
pub struct StreamSource {
    receiver: mpsc::Receiver<UpdateEvent>,
    description: String,
    /// Written by the reader task, cached on this side by `poll()` so
    /// `error()` can hand out a plain borrow.
    last_error: Arc<Mutex<Option<String>>>,
    cached_error: Option<String>,
}

impl StreamSource {
    /// Spawn a background task that reads from the given async reader.
    ///
    /// Each line is one envelope. Lines that fail to decode are dropped
    /// with a debug log and never surface as errors: one garbled probe
    /// must not stall the stream. Connection-level failures do surface
    /// through [`EventSource::error`].
    pub fn spawn<R>(reader: R, description: &str) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let last_error = Arc::new(Mutex::new(None));
        let error_handle = last_error.clone();
        let desc = description.to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        // EOF
                        *error_handle.lock().unwrap() = Some("Connection closed".to_string());
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        if trimmed.is_empty() {
                            continue;
                        }
                        match decode(trimmed) {
                            Ok(event) => {
                                if tx.send(event).await.is_err() {
                                    // Receiver dropped
                                    break;
                                }
                            }
                            Err(e) => {
                                debug!(error = %e, "dropped undecodable message");
                            }
                        }
                    }
                    Err(e) => {
                        *error_handle.lock().unwrap() = Some(format!("Read error: {}", e));
                        break;
                    }
                }
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", desc),
            last_error,
            cached_error: None,
        }
    }

    /// Create a StreamSource from a channel of pre-framed message text.
    ///
    /// This is useful when another transport (a broker subscription, a
    /// serial reader) already splits messages and just needs them
    /// decoded and queued.
    pub fn from_lines_channel(mut rx: mpsc::Receiver<String>, description: &str) -> Self {
        let (tx, event_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let last_error = Arc::new(Mutex::new(None));

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match decode(message.trim()) {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(error = %e, "dropped undecodable message");
                    }
                }
            }
        });

        Self {
            receiver: event_rx,
            description: format!("stream: {}", description),
            last_error,
            cached_error: None,
        }
    }
}

impl EventSource for StreamSource {
    fn poll(&mut self) -> Option<UpdateEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => {
                self.cached_error = self.last_error.lock().unwrap().clone();
                None
            }
            Err(mpsc::error::TryRecvError::Disconnected) => {
                let task_error = self.last_error.lock().unwrap().clone();
                self.cached_error =
                    task_error.or_else(|| Some("Stream disconnected".to_string()));
                None
            }
        }
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.cached_error.as_deref()
    }
}
