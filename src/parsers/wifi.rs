//! `airport -I` link info and `airport -s` scan

use super::{cached_regex, split_key_value};
use crate::models::{MacAddress, ScanEntry, WifiBand, WifiInfo};

/// Extract the current association. Returns `None` on empty output, when
/// WiFi is off, or when no known field was found.
pub fn parse_airport_info(text: &str) -> Option<WifiInfo> {
    if text.trim().is_empty() || text.contains("AirPort: Off") {
        return None;
    }

    let mut wifi = WifiInfo::default();

    for line in text.lines() {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }
        match key {
            "agrCtlRSSI" => wifi.rssi = value.parse().ok(),
            "agrCtlNoise" => wifi.noise = value.parse().ok(),
            "lastTxRate" => wifi.tx_rate_mbps = value.parse().ok(),
            "MCS" => wifi.mcs_index = value.parse().ok(),
            "SSID" => wifi.ssid = Some(value.to_string()),
            "BSSID" => {
                wifi.bssid = MacAddress::parse(value).map(|mac| mac.to_string());
            }
            "link auth" => wifi.security = Some(value.to_string()),
            "phyMode" | "PHY Mode" => wifi.phy_mode = Some(value.to_string()),
            "channel" => {
                let (channel, width) = parse_channel(value);
                wifi.channel = channel;
                wifi.channel_width_mhz = width;
            }
            "band" | "Band" => wifi.reported_band = WifiBand::from_label(value),
            _ => {}
        }
    }

    (!wifi.is_empty()).then_some(wifi)
}

/// Extract the nearby networks from a scan listing
pub fn parse_airport_scan(text: &str) -> Vec<ScanEntry> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Vec::new();
    };
    // SSIDs are right-aligned to the end of the SSID header column
    let Some(ssid_end) = header.find("SSID").map(|i| i + "SSID".len()) else {
        return Vec::new();
    };

    lines.filter_map(|line| parse_scan_line(line, ssid_end)).collect()
}

fn parse_scan_line(line: &str, ssid_end: usize) -> Option<ScanEntry> {
    let mac = cached_regex!(r"\s([0-9A-Fa-f]{1,2}(?::[0-9A-Fa-f]{1,2}){5})\s");

    let (ssid, bssid, rest) = match mac.and_then(|re| re.captures(line)) {
        Some(caps) => {
            let whole = caps.get(0)?;
            let bssid = MacAddress::parse(caps.get(1)?.as_str())?;
            (
                line[..whole.start()].trim(),
                Some(bssid.to_string()),
                &line[whole.end()..],
            )
        }
        // Newer releases redact the BSSID column
        None => (line.get(..ssid_end)?.trim(), None, line.get(ssid_end..)?),
    };

    let mut tokens = rest.split_whitespace();
    let rssi = tokens.next()?.parse::<i32>().ok()?;
    let (channel, _) = parse_channel(tokens.next()?);
    let _ht = tokens.next();
    let _country = tokens.next();
    let security = tokens.collect::<Vec<_>>().join(" ");

    Some(ScanEntry {
        ssid: ssid.to_string(),
        bssid,
        rssi: Some(rssi),
        channel,
        security: (!security.is_empty()).then_some(security),
    })
}

/// `149,80` -> (149, 80 MHz); `36,+1` -> (36, 40 MHz); `6` -> (6, none)
fn parse_channel(value: &str) -> (Option<u32>, Option<u32>) {
    let mut parts = value.split(',');
    let channel = parts
        .next()
        .and_then(|c| c.trim().parse().ok())
        .filter(|c: &u32| *c > 0);
    let width = parts.next().and_then(|w| match w.trim() {
        "+1" | "-1" | "1" => Some(40),
        other => other.parse().ok().filter(|w: &u32| *w >= 20),
    });
    (channel, width)
}
