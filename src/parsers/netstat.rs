//! `netstat -I <if> -b` interface statistics

use super::parse_counter;
use crate::models::{Counters, MacAddress};

/// Statistics for one interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceStats {
    pub name: String,
    pub mtu: Option<u32>,
    pub mac_address: Option<MacAddress>,
    pub ipv4_addresses: Vec<String>,
    pub ipv6_addresses: Vec<String>,
    pub counters: Counters,
}

/// Columns right of `Address`, in the order netstat prints them
const COUNTER_COLUMNS: &[&str] = &[
    "Ipkts", "Ierrs", "Ibytes", "Opkts", "Oerrs", "Obytes", "Coll", "Drop",
];

/// Extract the statistics table. The interface is taken from the `Name`
/// column of the first data row; rows for other interfaces are ignored.
pub fn parse_interface_stats(text: &str) -> Option<InterfaceStats> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let header: Vec<&str> = lines.next()?.split_whitespace().collect();
    if header.first() != Some(&"Name") {
        return None;
    }

    // Counter columns are right-aligned and always present; the Address
    // column may be blank, so rows are mapped from the right.
    let trailing: Vec<&str> = header
        .iter()
        .copied()
        .skip_while(|column| !COUNTER_COLUMNS.contains(column))
        .collect();
    if trailing.is_empty() {
        return None;
    }

    let mut stats: Option<InterfaceStats> = None;

    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < trailing.len() + 3 {
            continue;
        }
        let name = tokens[0].trim_end_matches('*');
        let entry = stats.get_or_insert_with(|| InterfaceStats {
            name: name.to_string(),
            ..Default::default()
        });
        if entry.name != name {
            continue;
        }

        let (leading, counters) = tokens.split_at(tokens.len() - trailing.len());
        let network = leading[2];
        let address = leading.get(3).copied();

        if entry.mtu.is_none() {
            entry.mtu = leading[1].parse().ok().filter(|mtu: &u32| *mtu > 0);
        }

        if network.starts_with("<Link#") {
            // Link-layer row carries the authoritative counters
            if let Some(mac) = address.and_then(MacAddress::parse) {
                entry.mac_address = Some(mac);
            }
            for (column, value) in trailing.iter().zip(counters) {
                let value = parse_counter(value);
                match *column {
                    "Ipkts" => entry.counters.packets_in = value,
                    "Ierrs" => entry.counters.errors_in = value,
                    "Ibytes" => entry.counters.bytes_in = value,
                    "Opkts" => entry.counters.packets_out = value,
                    "Oerrs" => entry.counters.errors_out = value,
                    "Obytes" => entry.counters.bytes_out = value,
                    "Coll" => entry.counters.collisions = value,
                    _ => {}
                }
            }
        } else if let Some(address) = address {
            if address.parse::<std::net::Ipv4Addr>().is_ok() {
                entry.ipv4_addresses.push(address.to_string());
            } else if let Ok(v6) = address.split('%').next().unwrap_or(address).parse::<std::net::Ipv6Addr>() {
                entry.ipv6_addresses.push(v6.to_string());
            }
        }
    }

    stats
}
