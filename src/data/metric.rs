//! The fixed metric vocabulary and per-sample readings.

use serde::{Deserialize, Serialize};

/// The metrics a probe can report.
///
/// The set is closed: unknown keys on the wire are ignored rather than
/// tracked, so every consumer can iterate [`Metric::ALL`] and know it
/// has seen everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Ph,
    Temp,
    Cod,
    Ss,
}

impl Metric {
    /// All metrics, in display order.
    pub const ALL: [Metric; 4] = [Metric::Ph, Metric::Temp, Metric::Cod, Metric::Ss];

    /// Short column label.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Ph => "pH",
            Metric::Temp => "Temp",
            Metric::Cod => "COD",
            Metric::Ss => "SS",
        }
    }

    /// Measurement unit, empty for dimensionless metrics.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Ph => "",
            Metric::Temp => "°C",
            Metric::Cod => "mg/L",
            Metric::Ss => "mg/L",
        }
    }

    /// Key used on the wire and in JSON exports.
    pub fn key(&self) -> &'static str {
        match self {
            Metric::Ph => "ph",
            Metric::Temp => "temp",
            Metric::Cod => "cod",
            Metric::Ss => "ss",
        }
    }
}

/// One measurement snapshot across the metric set.
///
/// `None` means the probe did not report that metric. Absence is
/// preserved all the way to the screen (rendered as a placeholder),
/// never coerced to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cod: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ss: Option<f64>,
}

impl Reading {
    /// Value for one metric, if the probe reported it.
    pub fn get(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Ph => self.ph,
            Metric::Temp => self.temp,
            Metric::Cod => self.cod,
            Metric::Ss => self.ss,
        }
    }

    /// True when no metric carries a value.
    pub fn is_empty(&self) -> bool {
        Metric::ALL.iter().all(|m| self.get(*m).is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_all_covers_every_variant() {
        assert_eq!(Metric::ALL.len(), 4);
        let keys: Vec<&str> = Metric::ALL.iter().map(|m| m.key()).collect();
        assert_eq!(keys, vec!["ph", "temp", "cod", "ss"]);
    }

    #[test]
    fn test_reading_get_matches_fields() {
        let reading = Reading {
            ph: Some(7.2),
            temp: None,
            cod: Some(41.0),
            ss: None,
        };
        assert_eq!(reading.get(Metric::Ph), Some(7.2));
        assert_eq!(reading.get(Metric::Temp), None);
        assert_eq!(reading.get(Metric::Cod), Some(41.0));
        assert_eq!(reading.get(Metric::Ss), None);
    }

    #[test]
    fn test_reading_default_is_empty() {
        assert!(Reading::default().is_empty());
        let partial = Reading {
            ss: Some(0.0),
            ..Reading::default()
        };
        assert!(!partial.is_empty());
    }

    #[test]
    fn test_reading_serializes_without_missing_metrics() {
        let reading = Reading {
            ph: Some(7.0),
            ..Reading::default()
        };
        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(json, r#"{"ph":7.0}"#);
    }
}
