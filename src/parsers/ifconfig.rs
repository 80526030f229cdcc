//! `ifconfig` interface listing

use crate::models::MacAddress;

/// Everything ifconfig reports about one interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IfconfigBlock {
    pub name: String,
    pub flags: Vec<String>,
    pub mtu: Option<u32>,
    pub mac_address: Option<MacAddress>,
    pub ipv4_addresses: Vec<String>,
    pub ipv6_addresses: Vec<String>,
    pub media: Option<String>,
    /// `status: active` / `status: inactive`; absent without a status line
    pub is_active: Option<bool>,
}

impl IfconfigBlock {
    pub fn is_up(&self) -> bool {
        self.flags.iter().any(|flag| flag == "UP")
    }
}

/// Extract every interface block in the listing
pub fn parse_ifconfig(text: &str) -> Vec<IfconfigBlock> {
    let mut blocks: Vec<IfconfigBlock> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            continue;
        }

        // Headers start in column 0; detail lines are indented
        if !line.starts_with(char::is_whitespace) {
            if let Some(block) = parse_header(line) {
                blocks.push(block);
            }
            continue;
        }

        let Some(block) = blocks.last_mut() else {
            continue;
        };
        let mut tokens = line.split_whitespace();
        match tokens.next() {
            Some("ether") => {
                block.mac_address = tokens.next().and_then(MacAddress::parse);
            }
            Some("inet") => {
                if let Some(addr) = tokens.next() {
                    if addr.parse::<std::net::Ipv4Addr>().is_ok() {
                        block.ipv4_addresses.push(addr.to_string());
                    }
                }
            }
            Some("inet6") => {
                if let Some(addr) = tokens.next() {
                    let addr = addr.split('%').next().unwrap_or(addr);
                    if addr.parse::<std::net::Ipv6Addr>().is_ok() {
                        block.ipv6_addresses.push(addr.to_string());
                    }
                }
            }
            Some("media:") => {
                let media = tokens.collect::<Vec<_>>().join(" ");
                if !media.is_empty() {
                    block.media = Some(media);
                }
            }
            Some("status:") => {
                block.is_active = match tokens.next() {
                    Some("active") => Some(true),
                    Some("inactive") => Some(false),
                    _ => None,
                };
            }
            _ => {}
        }
    }

    blocks
}

/// Block for `name`, if the listing has one
pub fn find_block<'a>(blocks: &'a [IfconfigBlock], name: &str) -> Option<&'a IfconfigBlock> {
    blocks.iter().find(|block| block.name == name)
}

// en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
fn parse_header(line: &str) -> Option<IfconfigBlock> {
    let (name, rest) = line.split_once(": ")?;
    if name.is_empty() || name.contains(char::is_whitespace) || !rest.starts_with("flags=") {
        return None;
    }

    let flags = rest
        .split_once('<')
        .and_then(|(_, tail)| tail.split_once('>'))
        .map(|(inner, _)| {
            inner
                .split(',')
                .filter(|flag| !flag.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let mut tokens = rest.split_whitespace();
    let mut mtu = None;
    while let Some(token) = tokens.next() {
        if token == "mtu" {
            mtu = tokens.next().and_then(|v| v.parse().ok()).filter(|v: &u32| *v > 0);
        }
    }

    Some(IfconfigBlock {
        name: name.to_string(),
        flags,
        mtu,
        ..Default::default()
    })
}
