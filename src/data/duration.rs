use std::time::Duration;

use anyhow::{bail, Result};

/// Suffix to seconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[("ms", 0.001), ("s", 1.0), ("m", 60.0), ("h", 3600.0)];

/// Parse duration strings like "30s", "2m", "1.5h", "500ms"
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    for (suffix, multiplier) in UNITS {
        if let Some(val_str) = s.strip_suffix(suffix) {
            let val: f64 = val_str.trim().parse()?;
            return match Duration::try_from_secs_f64(val * multiplier) {
                Ok(d) => Ok(d),
                Err(_) => bail!("Duration out of range: {}", s),
            };
        }
    }

    bail!("Unknown duration format: {} (expected e.g. \"30s\", \"2m\", \"500ms\")", s)
}

/// Format an elapsed duration coarsely, for "time since" columns
pub fn format_age(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 1 {
        "now".to_string()
    } else if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m{:02}s", secs / 60, secs % 60)
    } else {
        format!("{}h{:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_seconds() {
        let d = parse_duration("30s").unwrap();
        assert_eq!(d, Duration::from_secs(30));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let d = parse_duration("29.5s").unwrap();
        assert!((d.as_secs_f64() - 29.5).abs() < 0.0001);
    }

    #[test]
    fn test_parse_minutes_and_hours() {
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn test_parse_milliseconds() {
        let d = parse_duration("500ms").unwrap();
        assert_eq!(d, Duration::from_millis(500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("30").is_err());
        assert!(parse_duration("-5s").is_err());
        assert!(parse_duration("infs").is_err());
    }

    #[test]
    fn test_format_age_buckets() {
        assert_eq!(format_age(Duration::from_millis(300)), "now");
        assert_eq!(format_age(Duration::from_secs(42)), "42s");
        assert_eq!(format_age(Duration::from_secs(192)), "3m12s");
        assert_eq!(format_age(Duration::from_secs(7440)), "2h04m");
    }
}
