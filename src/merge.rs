//! Source-keyed merge of partial interface records
//!
//! Extractors complete in any order. Their partial records are parked in an
//! [`Arena`] keyed by `(interface, Source)` and folded once, after fan-in,
//! by [`reduce`] following the ordered [`PRECEDENCE`] table. The result is
//! independent of insertion order.

use crate::models::{
    ArpEntry, Counters, DhcpInfo, InterfaceRecord, LatencyResult, MacAddress, RouteEntry, ScanEntry,
    WifiInfo,
};
use crate::parsers::{HardwarePort, IfconfigBlock, InterfaceStats};
use std::collections::BTreeMap;
use std::fmt;

/// Which extractor produced a partial record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    HardwarePorts,
    Ifconfig,
    InterfaceStats,
    RoutingTable,
    DnsConfig,
    WifiInfo,
    WifiScan,
    ArpCache,
    Dhcp,
    Ping,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::HardwarePorts => "hardware-ports",
            Self::Ifconfig => "ifconfig",
            Self::InterfaceStats => "interface-stats",
            Self::RoutingTable => "routing-table",
            Self::DnsConfig => "dns-config",
            Self::WifiInfo => "wifi-info",
            Self::WifiScan => "wifi-scan",
            Self::ArpCache => "arp-cache",
            Self::Dhcp => "dhcp",
            Self::Ping => "ping",
        };
        write!(f, "{}", label)
    }
}

/// Record fields filled by the reducer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    HardwarePort,
    IsActive,
    MacAddress,
    Ipv4Addresses,
    Ipv6Addresses,
    Mtu,
    MediaType,
    Counters,
    Wifi,
    NearbyNetworks,
    Routing,
    Dns,
    ArpEntries,
    Dhcp,
    Latency,
}

/// For every field, the sources allowed to fill it, most authoritative first
pub const PRECEDENCE: &[(Field, &[Source])] = &[
    (Field::HardwarePort, &[Source::HardwarePorts]),
    (Field::IsActive, &[Source::Ifconfig]),
    (
        Field::MacAddress,
        &[Source::Ifconfig, Source::InterfaceStats, Source::HardwarePorts],
    ),
    (Field::Ipv4Addresses, &[Source::Ifconfig, Source::InterfaceStats]),
    (Field::Ipv6Addresses, &[Source::Ifconfig, Source::InterfaceStats]),
    (Field::Mtu, &[Source::Ifconfig, Source::InterfaceStats]),
    (Field::MediaType, &[Source::Ifconfig]),
    (Field::Counters, &[Source::InterfaceStats]),
    (Field::Wifi, &[Source::WifiInfo]),
    (Field::NearbyNetworks, &[Source::WifiScan]),
    (Field::Routing, &[Source::RoutingTable]),
    (Field::Dns, &[Source::DnsConfig]),
    (Field::ArpEntries, &[Source::ArpCache]),
    (Field::Dhcp, &[Source::Dhcp]),
    (Field::Latency, &[Source::Ping]),
];

/// Whatever one extractor learned about one interface
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub hardware_port: Option<String>,
    pub is_active: Option<bool>,
    pub mac_address: Option<MacAddress>,
    pub ipv4_addresses: Option<Vec<String>>,
    pub ipv6_addresses: Option<Vec<String>>,
    pub mtu: Option<u32>,
    pub media_type: Option<String>,
    pub counters: Option<Counters>,
    pub wifi: Option<WifiInfo>,
    pub nearby_networks: Option<Vec<ScanEntry>>,
    pub routing: Option<Vec<RouteEntry>>,
    pub dns: Option<Vec<String>>,
    pub arp_entries: Option<Vec<ArpEntry>>,
    pub dhcp: Option<DhcpInfo>,
    pub latency: Option<LatencyResult>,
}

impl PartialRecord {
    fn has(&self, field: Field) -> bool {
        match field {
            Field::HardwarePort => self.hardware_port.is_some(),
            Field::IsActive => self.is_active.is_some(),
            Field::MacAddress => self.mac_address.is_some(),
            Field::Ipv4Addresses => self.ipv4_addresses.is_some(),
            Field::Ipv6Addresses => self.ipv6_addresses.is_some(),
            Field::Mtu => self.mtu.is_some(),
            Field::MediaType => self.media_type.is_some(),
            Field::Counters => self.counters.is_some(),
            Field::Wifi => self.wifi.is_some(),
            Field::NearbyNetworks => self.nearby_networks.is_some(),
            Field::Routing => self.routing.is_some(),
            Field::Dns => self.dns.is_some(),
            Field::ArpEntries => self.arp_entries.is_some(),
            Field::Dhcp => self.dhcp.is_some(),
            Field::Latency => self.latency.is_some(),
        }
    }

    /// Copy `field` from `self` into `record`
    fn apply(&self, field: Field, record: &mut InterfaceRecord) {
        match field {
            Field::HardwarePort => record.hardware_port = self.hardware_port.clone(),
            Field::IsActive => record.is_active = self.is_active,
            Field::MacAddress => record.mac_address = self.mac_address,
            Field::Ipv4Addresses => {
                record.ipv4_addresses = self.ipv4_addresses.clone().unwrap_or_default()
            }
            Field::Ipv6Addresses => {
                record.ipv6_addresses = self.ipv6_addresses.clone().unwrap_or_default()
            }
            Field::Mtu => record.mtu = self.mtu,
            Field::MediaType => record.media_type = self.media_type.clone(),
            Field::Counters => record.counters = self.counters.clone().unwrap_or_default(),
            Field::Wifi => record.wifi = self.wifi.clone(),
            Field::NearbyNetworks => {
                // Scan results only attach to an existing association
                if let (Some(wifi), Some(networks)) = (record.wifi.as_mut(), &self.nearby_networks) {
                    wifi.nearby_networks = networks.clone();
                }
            }
            Field::Routing => record.routing = self.routing.clone().unwrap_or_default(),
            Field::Dns => record.dns = self.dns.clone().unwrap_or_default(),
            Field::ArpEntries => record.arp_entries = self.arp_entries.clone().unwrap_or_default(),
            Field::Dhcp => record.dhcp = self.dhcp.clone(),
            Field::Latency => record.latency = self.latency.clone(),
        }
    }
}

impl From<&HardwarePort> for PartialRecord {
    fn from(port: &HardwarePort) -> Self {
        Self {
            hardware_port: Some(port.port.clone()),
            mac_address: port.mac_address,
            ..Default::default()
        }
    }
}

impl From<IfconfigBlock> for PartialRecord {
    fn from(block: IfconfigBlock) -> Self {
        Self {
            is_active: block.is_active,
            mac_address: block.mac_address,
            ipv4_addresses: Some(block.ipv4_addresses),
            ipv6_addresses: Some(block.ipv6_addresses),
            mtu: block.mtu,
            media_type: block.media,
            ..Default::default()
        }
    }
}

impl From<InterfaceStats> for PartialRecord {
    fn from(stats: InterfaceStats) -> Self {
        let non_empty = |v: Vec<String>| (!v.is_empty()).then_some(v);
        Self {
            mac_address: stats.mac_address,
            ipv4_addresses: non_empty(stats.ipv4_addresses),
            ipv6_addresses: non_empty(stats.ipv6_addresses),
            mtu: stats.mtu,
            counters: (!stats.counters.is_empty()).then_some(stats.counters),
            ..Default::default()
        }
    }
}

impl From<WifiInfo> for PartialRecord {
    fn from(wifi: WifiInfo) -> Self {
        Self {
            wifi: Some(wifi),
            ..Default::default()
        }
    }
}

impl From<DhcpInfo> for PartialRecord {
    fn from(dhcp: DhcpInfo) -> Self {
        Self {
            dhcp: Some(dhcp),
            ..Default::default()
        }
    }
}

impl From<LatencyResult> for PartialRecord {
    fn from(latency: LatencyResult) -> Self {
        Self {
            latency: Some(latency),
            ..Default::default()
        }
    }
}

impl PartialRecord {
    pub fn routing(routes: Vec<RouteEntry>) -> Self {
        Self {
            routing: Some(routes),
            ..Default::default()
        }
    }

    pub fn dns(servers: Vec<String>) -> Self {
        Self {
            dns: Some(servers),
            ..Default::default()
        }
    }

    pub fn arp(entries: Vec<ArpEntry>) -> Self {
        Self {
            arp_entries: Some(entries),
            ..Default::default()
        }
    }

    pub fn nearby_networks(networks: Vec<ScanEntry>) -> Self {
        Self {
            nearby_networks: Some(networks),
            ..Default::default()
        }
    }
}

/// Partial records keyed by `(interface, source)`
#[derive(Debug, Clone, Default)]
pub struct Arena {
    slots: BTreeMap<(String, Source), PartialRecord>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park a partial. Returns `false` and keeps the existing partial when
    /// the slot is already filled.
    pub fn insert(&mut self, interface: &str, source: Source, partial: PartialRecord) -> bool {
        use std::collections::btree_map::Entry;
        match self.slots.entry((interface.to_string(), source)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(partial);
                true
            }
        }
    }

    pub fn get(&self, interface: &str, source: Source) -> Option<&PartialRecord> {
        self.slots.get(&(interface.to_string(), source))
    }

    /// Fold the partials for `interface` into a record
    pub fn reduce(&self, interface: &str) -> InterfaceRecord {
        reduce(interface, |source| self.get(interface, source))
    }
}

/// Build a record by taking every field from its highest-priority source
pub fn reduce<'a, F>(interface: &str, lookup: F) -> InterfaceRecord
where
    F: Fn(Source) -> Option<&'a PartialRecord>,
{
    let mut record = InterfaceRecord::empty(interface);

    for (field, sources) in PRECEDENCE {
        let winner = sources
            .iter()
            .filter_map(|source| lookup(*source))
            .find(|partial| partial.has(*field));
        if let Some(partial) = winner {
            partial.apply(*field, &mut record);
        }
    }

    record
}
