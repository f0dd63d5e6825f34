//! Wire format for inbound telemetry and the event decoder.
//!
//! Probes publish one JSON envelope per transport message:
//!
//! ```json
//! {
//!   "payload": {
//!     "id": "FC:01:5C:8A:3B:21",
//!     "name": "Aeration Tank 1",
//!     "fields": [
//!       { "ph": 7.1, "temp": 22.4, "cod": 38.0, "ss": 12.5, "timestamp": 1723891200 }
//!     ]
//!   }
//! }
//! ```
//!
//! `fields` carries the probe's buffered readings oldest-first; only the
//! most recent one becomes the device's current sample.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::data::metric::Reading;

/// Failure to turn a raw transport message into an [`UpdateEvent`].
///
/// Decode failures are drop-and-continue by contract: a malformed
/// message never mutates device state and never stops the stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Not valid JSON, or valid JSON that does not match the envelope shape.
    #[error("invalid envelope: {0}")]
    Envelope(#[from] serde_json::Error),
}

/// Top-level transport envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryEnvelope {
    pub payload: TelemetryPayload,
}

/// The payload object inside the envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryPayload {
    /// Stable colon-delimited device address.
    pub id: String,
    /// Human-readable device name, as configured on the probe.
    pub name: String,
    /// Buffered readings, oldest first. May be absent or empty.
    #[serde(default)]
    pub fields: Vec<SampleRecord>,
}

/// One reading as reported on the wire.
///
/// Keys beyond the known set are ignored; known keys may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleRecord {
    pub ph: Option<f64>,
    pub temp: Option<f64>,
    pub cod: Option<f64>,
    pub ss: Option<f64>,
    /// Measurement time in seconds since the Unix epoch. Probes with a
    /// bad clock send garbage here, so anything non-numeric decodes as
    /// `None` instead of failing the whole envelope.
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub timestamp: Option<f64>,
}

impl SampleRecord {
    fn reading(&self) -> Reading {
        Reading {
            ph: self.ph,
            temp: self.temp,
            cod: self.cod,
            ss: self.ss,
        }
    }

    fn source_time(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.filter(|t| t.is_finite() && *t >= 0.0)?;
        DateTime::from_timestamp(secs.trunc() as i64, (secs.fract() * 1e9) as u32)
    }
}

/// A decoded telemetry update, ready to apply to the store.
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    pub device_id: String,
    pub display_name: String,
    /// The most recent reading in the envelope; empty when `fields` was.
    pub sample: Reading,
    /// Measurement time of `sample`, when the probe supplied a usable one.
    pub source_time: Option<DateTime<Utc>>,
}

/// Decode one raw transport message into an [`UpdateEvent`].
///
/// Pure: no clock, no I/O. An envelope with absent or empty `fields`
/// still yields an event (carrying an empty sample); only an envelope
/// that cannot be decoded at all is an error.
pub fn decode(raw: &str) -> Result<UpdateEvent, DecodeError> {
    let envelope: TelemetryEnvelope = serde_json::from_str(raw)?;
    let payload = envelope.payload;
    let current = payload.fields.last();

    Ok(UpdateEvent {
        device_id: payload.id,
        display_name: payload.name,
        sample: current.map(SampleRecord::reading).unwrap_or_default(),
        source_time: current.and_then(SampleRecord::source_time),
    })
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_envelope() {
        let raw = r#"{"payload":{"id":"FC:01:5C:8A:3B:21","name":"Aeration Tank 1",
            "fields":[{"ph":7.1,"temp":22.4,"cod":38.0,"ss":12.5,"timestamp":1723891200}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.device_id, "FC:01:5C:8A:3B:21");
        assert_eq!(event.display_name, "Aeration Tank 1");
        assert_eq!(event.sample.ph, Some(7.1));
        assert_eq!(event.sample.temp, Some(22.4));
        assert_eq!(event.sample.cod, Some(38.0));
        assert_eq!(event.sample.ss, Some(12.5));
        assert_eq!(
            event.source_time,
            DateTime::from_timestamp(1723891200, 0)
        );
    }

    #[test]
    fn test_decode_takes_most_recent_reading() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe",
            "fields":[{"ph":6.0,"timestamp":100},{"ph":6.5,"timestamp":200}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.sample.ph, Some(6.5));
        assert_eq!(event.source_time, DateTime::from_timestamp(200, 0));
    }

    #[test]
    fn test_decode_missing_fields_key() {
        let event = decode(r#"{"payload":{"id":"A:B:C:1","name":"Probe"}}"#).unwrap();
        assert!(event.sample.is_empty());
        assert_eq!(event.source_time, None);
    }

    #[test]
    fn test_decode_empty_fields() {
        let event = decode(r#"{"payload":{"id":"A:B:C:1","name":"Probe","fields":[]}}"#).unwrap();
        assert!(event.sample.is_empty());
        assert_eq!(event.source_time, None);
    }

    #[test]
    fn test_decode_partial_reading() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe","fields":[{"temp":19.0}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.sample.temp, Some(19.0));
        assert_eq!(event.sample.ph, None);
        assert_eq!(event.sample.cod, None);
        assert_eq!(event.sample.ss, None);
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe","firmware":"2.1",
            "fields":[{"ph":7.0,"turbidity":3.2}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.sample.ph, Some(7.0));
    }

    #[test]
    fn test_decode_non_numeric_timestamp_is_tolerated() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe",
            "fields":[{"ph":7.0,"timestamp":"not-a-clock"}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.sample.ph, Some(7.0));
        assert_eq!(event.source_time, None);
    }

    #[test]
    fn test_decode_null_timestamp_is_tolerated() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe",
            "fields":[{"ph":7.0,"timestamp":null}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.source_time, None);
    }

    #[test]
    fn test_decode_negative_timestamp_is_dropped() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe",
            "fields":[{"ph":7.0,"timestamp":-42}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.source_time, None);
    }

    #[test]
    fn test_decode_fractional_timestamp() {
        let raw = r#"{"payload":{"id":"A:B:C:1","name":"Probe",
            "fields":[{"ph":7.0,"timestamp":1000.5}]}}"#;
        let event = decode(raw).unwrap();
        assert_eq!(event.source_time, DateTime::from_timestamp(1000, 500_000_000));
    }

    #[test]
    fn test_decode_rejects_broken_json() {
        assert!(decode("{not json").is_err());
        assert!(decode("").is_err());
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        assert!(decode(r#"{"payload":{"name":"no id"}}"#).is_err());
        assert!(decode(r#"{"payload":{"id":"A:B:C:1"}}"#).is_err());
        assert!(decode(r#"{"id":"A:B:C:1","name":"no payload wrapper"}"#).is_err());
        assert!(decode(r#"{"payload":{"id":7,"name":"Probe"}}"#).is_err());
        assert!(decode(r#"[1,2,3]"#).is_err());
    }
}
