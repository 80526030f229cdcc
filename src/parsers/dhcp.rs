//! `ipconfig getpacket <if>` lease options

use crate::models::DhcpInfo;

/// Extract the lease options of the last DHCP reply.
///
/// Option lines read `name (type): value`; header lines (`op = BOOTREPLY`)
/// and unknown options are skipped. Returns `None` when none of the known
/// options is present, which is what a statically configured interface
/// looks like.
pub fn parse_dhcp_packet(text: &str) -> Option<DhcpInfo> {
    let mut info = DhcpInfo::default();

    for line in text.lines() {
        let Some((name, value)) = parse_option(line) else {
            continue;
        };
        match name {
            "server_identifier" => info.server = ipv4(value),
            "lease_time" => info.lease_time_secs = parse_uint(value),
            "subnet_mask" => info.subnet_mask = ipv4(value),
            "router" => info.router = ip_list(value).into_iter().next(),
            "domain_name_server" => info.dns_servers = ip_list(value),
            "domain_name" if !value.is_empty() => info.domain_name = Some(value.to_string()),
            _ => {}
        }
    }

    (info != DhcpInfo::default()).then_some(info)
}

// lease_time (uint32): 0x15180
fn parse_option(line: &str) -> Option<(&str, &str)> {
    let (name, rest) = line.trim().split_once(" (")?;
    let (_kind, value) = rest.split_once("):")?;
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some((name, value.trim()))
}

fn ipv4(value: &str) -> Option<String> {
    value.parse::<std::net::Ipv4Addr>().ok().map(|ip| ip.to_string())
}

/// `{192.168.1.1, 8.8.8.8}`; unparseable members are dropped
fn ip_list(value: &str) -> Vec<String> {
    value
        .trim_start_matches('{')
        .trim_end_matches('}')
        .split(',')
        .filter_map(|member| ipv4(member.trim()))
        .collect()
}

/// `ipconfig` prints integers in hex; plain decimal is accepted too
fn parse_uint(value: &str) -> Option<u32> {
    match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => value.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKET: &str = "\
op = BOOTREPLY
htype = 1
flags = 0
hlen = 6
hops = 0
xid = 0x5b2f1a3c
secs = 0
ciaddr = 0.0.0.0
yiaddr = 192.168.1.23
siaddr = 0.0.0.0
giaddr = 0.0.0.0
chaddr = a4:83:e7:0:11:22
sname =
file =
options:
Options count is 7
dhcp_message_type (uint8): ACK 0x5
server_identifier (ip): 192.168.1.1
lease_time (uint32): 0x15180
subnet_mask (ip): 255.255.255.0
router (ip_mult): {192.168.1.1}
domain_name_server (ip_mult): {192.168.1.1, 8.8.8.8}
domain_name (string): lan
end (none):
";

    #[test]
    fn test_parse_lease() {
        let info = parse_dhcp_packet(PACKET).unwrap();
        assert_eq!(info.server.as_deref(), Some("192.168.1.1"));
        assert_eq!(info.lease_time_secs, Some(86400));
        assert_eq!(info.subnet_mask.as_deref(), Some("255.255.255.0"));
        assert_eq!(info.router.as_deref(), Some("192.168.1.1"));
        assert_eq!(info.dns_servers, vec!["192.168.1.1", "8.8.8.8"]);
        assert_eq!(info.domain_name.as_deref(), Some("lan"));
    }

    #[test]
    fn test_decimal_lease_and_missing_options() {
        let info = parse_dhcp_packet("lease_time (uint32): 3600\nrouter (ip_mult): {}\n").unwrap();
        assert_eq!(info.lease_time_secs, Some(3600));
        assert_eq!(info.router, None);
        assert_eq!(info.server, None);
        assert!(info.dns_servers.is_empty());
    }

    #[test]
    fn test_malformed_values_stay_absent() {
        let text = "server_identifier (ip): 999.1.1.1\nlease_time (uint32): 0xZZ\nsubnet_mask (ip): 255.255.255.0\n";
        let info = parse_dhcp_packet(text).unwrap();
        assert_eq!(info.server, None);
        assert_eq!(info.lease_time_secs, None);
        assert_eq!(info.subnet_mask.as_deref(), Some("255.255.255.0"));
    }

    #[test]
    fn test_no_lease() {
        assert!(parse_dhcp_packet("").is_none());
        assert!(parse_dhcp_packet("op = BOOTREPLY\nOptions count is 0\n").is_none());
        assert!(parse_dhcp_packet("dhcp_message_type (uint8): ACK 0x5\n").is_none());
    }
}
