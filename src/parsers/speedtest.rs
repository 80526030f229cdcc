//! `networkQuality -v` speed test

use super::cached_regex;
use crate::models::SpeedTestResult;

/// Extract capacities, responsiveness and idle latency. Returns `None` when
/// nothing could be read.
pub fn parse_network_quality(text: &str) -> Option<SpeedTestResult> {
    let mut result = SpeedTestResult::default();

    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("Downlink capacity:") {
            result.download_mbps = parse_rate(rest);
        } else if let Some(rest) = line.strip_prefix("Uplink capacity:") {
            result.upload_mbps = parse_rate(rest);
        } else if let Some(rest) = line.strip_prefix("Responsiveness:") {
            result.responsiveness_rpm = cached_regex!(r"([\d.]+)\s*RPM")
                .and_then(|re| re.captures(rest))
                .and_then(|caps| caps.get(1)?.as_str().parse().ok());
        } else if let Some(rest) = line.strip_prefix("Idle Latency:") {
            result.idle_latency_ms = cached_regex!(r"([\d.]+)\s*milliseconds")
                .and_then(|re| re.captures(rest))
                .and_then(|caps| caps.get(1)?.as_str().parse().ok());
        }
    }

    (!result.is_empty()).then_some(result)
}

/// `245.678 Mbps`, `950 Kbps`, `1.2 Gbps` to Mbps
fn parse_rate(text: &str) -> Option<f64> {
    let caps = cached_regex!(r"([\d.]+)\s*([KMG])bps")?.captures(text)?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let scale = match caps.get(2)?.as_str() {
        "K" => 0.001,
        "G" => 1000.0,
        _ => 1.0,
    };
    Some(value * scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary() {
        let text = "\
==== SUMMARY ====
Uplink capacity: 21.345 Mbps (Accuracy: High)
Downlink capacity: 245.678 Mbps (Accuracy: High)
Responsiveness: Medium (876 RPM) (Accuracy: High)
Idle Latency: 24.125 milliseconds (Accuracy: High)
Interface: en0
";
        let result = parse_network_quality(text).unwrap();
        assert_eq!(result.upload_mbps, Some(21.345));
        assert_eq!(result.download_mbps, Some(245.678));
        assert_eq!(result.responsiveness_rpm, Some(876.0));
        assert_eq!(result.idle_latency_ms, Some(24.125));
    }

    #[test]
    fn test_parse_older_format() {
        let text = "\
Upload capacity: 0.000 Mbps
Uplink capacity: 950 Kbps
Downlink capacity: 1.2 Gbps
Responsiveness: High (2487 RPM)
Idle Latency: 2487 RPM (24.125 milliseconds)
";
        let result = parse_network_quality(text).unwrap();
        assert!((result.upload_mbps.unwrap() - 0.95).abs() < 1e-9);
        assert!((result.download_mbps.unwrap() - 1200.0).abs() < 1e-9);
        assert_eq!(result.responsiveness_rpm, Some(2487.0));
        assert_eq!(result.idle_latency_ms, Some(24.125));
    }

    #[test]
    fn test_missing_fields_stay_absent() {
        let result = parse_network_quality("Downlink capacity: 88.5 Mbps\n").unwrap();
        assert_eq!(result.download_mbps, Some(88.5));
        assert_eq!(result.upload_mbps, None);
        assert_eq!(result.responsiveness_rpm, None);

        assert!(parse_network_quality("Error: could not connect\n").is_none());
        assert!(parse_network_quality("Downlink capacity: fast\n").is_none());
    }
}
