//! `arp -a -i <if>` cache listing

use crate::models::{ArpEntry, MacAddress};

/// Extract resolved entries; `(incomplete)` rows are dropped
pub fn parse_arp(text: &str) -> Vec<ArpEntry> {
    text.lines().filter_map(parse_line).collect()
}

// ? (192.168.1.1) at a4:83:e7:1:2:3 on en0 ifscope [ethernet]
fn parse_line(line: &str) -> Option<ArpEntry> {
    let (_, rest) = line.split_once('(')?;
    let (ip, rest) = rest.split_once(')')?;
    let mut tokens = rest.split_whitespace();

    if tokens.next()? != "at" {
        return None;
    }
    let mac = MacAddress::parse(tokens.next()?)?;
    if tokens.next()? != "on" {
        return None;
    }
    let interface = tokens.next()?;

    ip.parse::<std::net::IpAddr>().ok()?;
    Some(ArpEntry {
        ip: ip.to_string(),
        mac,
        interface: interface.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arp_cache() {
        let text = "\
? (192.168.1.1) at a4:83:e7:1:2:3 on en0 ifscope [ethernet]
router.lan (192.168.1.254) at 0:1b:2c:3d:4e:5f on en0 ifscope [ethernet]
? (192.168.1.50) at (incomplete) on en0 ifscope [ethernet]
? (224.0.0.251) at 1:0:5e:0:0:fb on en0 ifscope permanent [ethernet]
";
        let entries = parse_arp(text);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].ip, "192.168.1.1");
        assert_eq!(entries[0].mac.to_string(), "a4:83:e7:01:02:03");
        assert_eq!(entries[0].interface, "en0");
        assert_eq!(entries[1].ip, "192.168.1.254");
        assert_eq!(entries[2].mac.to_string(), "01:00:5e:00:00:fb");
    }

    #[test]
    fn test_unrelated_output() {
        assert!(parse_arp("arp: en9: no such interface\n").is_empty());
        assert!(parse_arp("").is_empty());
    }
}
