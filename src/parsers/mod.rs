//! Field extractors for the output of the macOS network utilities
//!
//! Every extractor is a pure function from raw text to a structured value.
//! Missing sections yield absent fields, unknown lines are skipped and a
//! number that fails to parse stays absent rather than becoming zero.

/// Compile a regex once per call site. Yields `None` if the pattern is invalid,
/// which extractors treat like a missing field.
macro_rules! cached_regex {
    ($pattern:literal) => {{
        static RE: std::sync::OnceLock<Option<regex::Regex>> = std::sync::OnceLock::new();
        RE.get_or_init(|| regex::Regex::new($pattern).ok()).as_ref()
    }};
}
pub(crate) use cached_regex;

pub mod arp;
pub mod dhcp;
pub mod dig;
pub mod dns;
pub mod hardware_ports;
pub mod ifconfig;
pub mod iperf;
pub mod netstat;
pub mod ping;
pub mod routes;
pub mod speedtest;
pub mod wifi;

pub use arp::parse_arp;
pub use dhcp::parse_dhcp_packet;
pub use dig::{parse_dig, DigAnswer};
pub use dns::{parse_scutil_dns, DnsConfiguration, ResolverEntry};
pub use hardware_ports::{parse_hardware_ports, HardwarePort};
pub use ifconfig::{parse_ifconfig, IfconfigBlock};
pub use iperf::{parse_iperf3, IperfPass};
pub use netstat::{parse_interface_stats, InterfaceStats};
pub use ping::parse_ping;
pub use routes::{default_route_interface, parse_routes};
pub use speedtest::parse_network_quality;
pub use wifi::{parse_airport_info, parse_airport_scan};

/// Parse a counter column; `-` and garbage are absent
pub(crate) fn parse_counter(token: &str) -> Option<u64> {
    token.trim().parse().ok()
}

/// Split `key: value` with surrounding whitespace trimmed
pub(crate) fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}
