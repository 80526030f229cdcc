//! `iperf3 -J` bandwidth test

use serde_json::Value;

/// Throughput of one iperf3 pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IperfPass {
    pub mbps: f64,
    pub retransmits: Option<u64>,
}

/// Extract one direction from iperf3's JSON report.
///
/// For a reverse (`-R`) pass the receiver-side sum is what this host got;
/// retransmits are always counted on the sending side.
pub fn parse_iperf3(json: &str, reverse: bool) -> Option<IperfPass> {
    let report: Value = serde_json::from_str(json).ok()?;
    if report.get("error").is_some() {
        return None;
    }
    let end = report.get("end")?;

    let preferred: &[&str] = if reverse {
        &["sum_received", "sum_sent", "sum"]
    } else {
        &["sum_sent", "sum"]
    };

    let bits_per_second = preferred
        .iter()
        .filter_map(|key| end.get(*key)?.get("bits_per_second")?.as_f64())
        .next()?;
    if !bits_per_second.is_finite() || bits_per_second < 0.0 {
        return None;
    }

    let retransmits = end
        .get("sum_sent")
        .and_then(|sum| sum.get("retransmits"))
        .and_then(Value::as_u64);

    Some(IperfPass {
        mbps: bits_per_second / 1_000_000.0,
        retransmits,
    })
}
