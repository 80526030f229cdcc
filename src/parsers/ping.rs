//! `ping` summary

use super::cached_regex;
use crate::models::{LatencyResult, RttStats};

/// Extract the summary of a ping run.
///
/// The target comes from the `--- host ping statistics ---` line when
/// present, otherwise from `target`. Returns `None` without a
/// `packets transmitted` line.
pub fn parse_ping(text: &str, target: Option<&str>) -> Option<LatencyResult> {
    let counts = cached_regex!(r"(\d+) packets transmitted, (\d+) (?:packets )?received")?;
    let caps = counts.captures(text)?;
    let sent: u32 = caps.get(1)?.as_str().parse().ok()?;
    let received: u32 = caps.get(2)?.as_str().parse().ok()?;

    let rtt = cached_regex!(r"(?:round-trip|rtt) min/avg/max/(?:stddev|mdev) = ([\d.]+)/([\d.]+)/([\d.]+)/([\d.]+) ms")
        .and_then(|re| re.captures(text))
        .and_then(|caps| {
            let field = |i: usize| caps.get(i)?.as_str().parse::<f64>().ok();
            RttStats::new(field(1)?, field(2)?, field(3)?, field(4)?)
        });

    let header_target = cached_regex!(r"--- (\S+) ping statistics ---")
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str());

    let mut result = LatencyResult::new(sent, received, rtt);
    if let Some(host) = header_target.or(target) {
        result = result.with_target(host);
    }
    Some(result)
}
