//! Interface record: the merged view of one network interface

use crate::models::metrics::{LatencyResult, OnlineMetrics};
use crate::models::wifi::WifiInfo;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 6-byte physical address, rendered as `xx:xx:xx:xx:xx:xx`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// Parse a textual MAC, accepting single-digit octets as printed by `arp`
    /// (`0:1b:2c:3:4:5`). Returns `None` on anything else.
    pub fn parse(text: &str) -> Option<Self> {
        let mut octets = [0u8; 6];
        let mut parts = text.trim().split([':', '-']);
        for slot in octets.iter_mut() {
            let part = parts.next()?;
            if part.is_empty() || part.len() > 2 {
                return None;
            }
            *slot = u8::from_str_radix(part, 16).ok()?;
        }
        if parts.next().is_some() {
            return None;
        }
        Some(Self(octets))
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}", a, b, c, d, e, g)
    }
}

impl FromStr for MacAddress {
    type Err = crate::error::AppError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        Self::parse(s).ok_or_else(|| crate::error::AppError::parse(format!("Invalid MAC address: {}", s)))
    }
}

impl Serialize for MacAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).ok_or_else(|| serde::de::Error::custom(format!("invalid MAC address: {}", text)))
    }
}

/// Interface traffic counters. Every counter is independently optional:
/// a counter no source reported stays `None`, never zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub packets_in: Option<u64>,
    pub packets_out: Option<u64>,
    pub bytes_in: Option<u64>,
    pub bytes_out: Option<u64>,
    pub errors_in: Option<u64>,
    pub errors_out: Option<u64>,
    pub collisions: Option<u64>,
}

impl Counters {
    /// True when no counter is known
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Total packets in both directions, known only if both directions are
    pub fn total_packets(&self) -> Option<u64> {
        Some(self.packets_in?.saturating_add(self.packets_out?))
    }

    /// Total errors in both directions, known only if both directions are
    pub fn total_errors(&self) -> Option<u64> {
        Some(self.errors_in?.saturating_add(self.errors_out?))
    }

    /// Error rate in percent of all packets. Undefined without traffic.
    pub fn error_rate_percent(&self) -> Option<f64> {
        let packets = self.total_packets()?;
        let errors = self.total_errors()?;
        if packets == 0 {
            return None;
        }
        Some(errors as f64 / packets as f64 * 100.0)
    }
}

/// One row of the routing table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub destination: String,
    pub gateway: String,
    pub flags: String,
    pub interface: String,
}

impl RouteEntry {
    pub fn is_default(&self) -> bool {
        self.destination == "default" || self.destination == "0.0.0.0/0"
    }
}

/// One ARP cache entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArpEntry {
    pub ip: String,
    pub mac: MacAddress,
    pub interface: String,
}

/// Lease options of the last DHCP reply
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DhcpInfo {
    /// `server_identifier`
    pub server: Option<String>,
    pub lease_time_secs: Option<u32>,
    pub router: Option<String>,
    pub subnet_mask: Option<String>,
    pub dns_servers: Vec<String>,
    pub domain_name: Option<String>,
}

/// Combined state of one network interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceRecord {
    /// BSD device name, e.g. `en0`
    pub name: String,
    /// Hardware port label, e.g. `Wi-Fi`
    pub hardware_port: Option<String>,
    pub is_active: Option<bool>,
    pub mac_address: Option<MacAddress>,
    pub ipv4_addresses: Vec<String>,
    pub ipv6_addresses: Vec<String>,
    pub mtu: Option<u32>,
    pub media_type: Option<String>,
    pub counters: Counters,
    pub wifi: Option<WifiInfo>,
    pub routing: Vec<RouteEntry>,
    pub dns: Vec<String>,
    pub arp_entries: Vec<ArpEntry>,
    /// Absent for statically configured interfaces
    pub dhcp: Option<DhcpInfo>,
    pub latency: Option<LatencyResult>,
    pub online: Option<OnlineMetrics>,
}

impl InterfaceRecord {
    /// Record with only a name; every other field absent
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hardware_port: None,
            is_active: None,
            mac_address: None,
            ipv4_addresses: Vec::new(),
            ipv6_addresses: Vec::new(),
            mtu: None,
            media_type: None,
            counters: Counters::default(),
            wifi: None,
            routing: Vec::new(),
            dns: Vec::new(),
            arp_entries: Vec::new(),
            dhcp: None,
            latency: None,
            online: None,
        }
    }

    /// Gateway of the default route through this interface, else the
    /// router named by the DHCP lease
    pub fn default_gateway(&self) -> Option<&str> {
        self.routing
            .iter()
            .find(|route| route.is_default() && route.interface == self.name)
            .map(|route| route.gateway.as_str())
            .filter(|gateway| !gateway.starts_with("link#"))
            .or_else(|| self.dhcp.as_ref()?.router.as_deref())
    }
}

/// Hardware port labels used by macOS for wireless interfaces
pub fn is_wireless_port_label(label: &str) -> bool {
    let label = label.to_ascii_lowercase();
    label.contains("wi-fi") || label.contains("airport") || label.contains("wlan")
}
