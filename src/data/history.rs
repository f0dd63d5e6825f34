//! Per-device sample history and sparkline helpers.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::metric::{Metric, Reading};

/// One applied sample. Entries are immutable once recorded; later
/// events append, they never rewrite.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Chart time for this entry: the probe's own measurement time, or
    /// the receipt time when the probe supplied none. Out-of-order
    /// delivery means this axis is not guaranteed monotonic.
    pub observed_at: DateTime<Utc>,
    pub sample: Reading,
}

/// Values a device reported for one metric, in arrival order.
///
/// Entries whose sample lacks the metric are skipped, so the series can
/// be shorter than the history itself.
pub fn metric_series(history: &VecDeque<HistoryEntry>, metric: Metric) -> Vec<f64> {
    history
        .iter()
        .filter_map(|entry| entry.sample.get(metric))
        .collect()
}

/// Normalize a value series to 0..=7 for eight-level sparkline bars.
///
/// Levels are scaled between the series' own min and max. Fewer than
/// two points gives nothing to compare, so the result is empty.
pub fn sparkline_levels(values: &[f64]) -> Vec<u8> {
    if values.len() < 2 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range <= 0.0 {
        return vec![0; values.len()];
    }

    values
        .iter()
        .map(|v| (((v - min) / range * 7.0).round() as u8).min(7))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ph: Option<f64>, temp: Option<f64>) -> HistoryEntry {
        HistoryEntry {
            observed_at: Utc::now(),
            sample: Reading {
                ph,
                temp,
                ..Reading::default()
            },
        }
    }

    #[test]
    fn test_metric_series_skips_absent_values() {
        let history: VecDeque<HistoryEntry> = vec![
            entry(Some(6.8), Some(20.0)),
            entry(None, Some(21.0)),
            entry(Some(7.2), None),
        ]
        .into();
        assert_eq!(metric_series(&history, Metric::Ph), vec![6.8, 7.2]);
        assert_eq!(metric_series(&history, Metric::Temp), vec![20.0, 21.0]);
        assert!(metric_series(&history, Metric::Cod).is_empty());
    }

    #[test]
    fn test_sparkline_needs_two_points() {
        assert!(sparkline_levels(&[]).is_empty());
        assert!(sparkline_levels(&[5.0]).is_empty());
    }

    #[test]
    fn test_sparkline_flat_series_is_all_zero() {
        assert_eq!(sparkline_levels(&[3.0, 3.0, 3.0]), vec![0, 0, 0]);
    }

    #[test]
    fn test_sparkline_scales_between_min_and_max() {
        let levels = sparkline_levels(&[0.0, 7.0, 3.5]);
        assert_eq!(levels, vec![0, 7, 4]);
    }

    #[test]
    fn test_sparkline_levels_never_exceed_seven() {
        let levels = sparkline_levels(&[1.0, 1e9, -1e9]);
        assert!(levels.iter().all(|l| *l <= 7));
    }
}
