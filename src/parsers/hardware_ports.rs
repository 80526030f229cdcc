//! `networksetup -listallhardwareports`

use super::split_key_value;
use crate::models::MacAddress;

/// One hardware port block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwarePort {
    /// Port label, e.g. `Wi-Fi`
    pub port: String,
    /// BSD device name, e.g. `en0`
    pub device: String,
    pub mac_address: Option<MacAddress>,
}

/// Extract all port blocks that name a device
pub fn parse_hardware_ports(text: &str) -> Vec<HardwarePort> {
    let mut ports = Vec::new();
    let mut current: Option<(String, Option<String>, Option<MacAddress>)> = None;

    for line in text.lines() {
        let Some((key, value)) = split_key_value(line) else {
            continue;
        };
        if key == "Hardware Port" {
            ports.extend(current.take().and_then(finish));
            current = Some((value.to_string(), None, None));
            continue;
        }
        let Some((_, device, mac)) = current.as_mut() else {
            continue;
        };
        match key {
            "Device" if !value.is_empty() => *device = Some(value.to_string()),
            "Ethernet Address" => *mac = MacAddress::parse(value),
            _ => {}
        }
    }
    ports.extend(current.and_then(finish));

    ports
}

fn finish((port, device, mac_address): (String, Option<String>, Option<MacAddress>)) -> Option<HardwarePort> {
    Some(HardwarePort {
        port,
        device: device?,
        mac_address,
    })
}
