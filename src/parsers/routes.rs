//! `netstat -rn` routing table

use crate::models::RouteEntry;

/// Extract every route row from all address-family sections
pub fn parse_routes(text: &str) -> Vec<RouteEntry> {
    let mut routes = Vec::new();
    let mut columns: Option<Columns> = None;

    for line in text.lines() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }

        if tokens[0] == "Destination" {
            columns = Columns::from_header(&tokens);
            continue;
        }

        // Section titles have too few columns to be rows
        let Some(cols) = &columns else {
            continue;
        };
        let (Some(destination), Some(gateway), Some(flags), Some(interface)) = (
            tokens.get(cols.destination),
            tokens.get(cols.gateway),
            tokens.get(cols.flags),
            tokens.get(cols.netif),
        ) else {
            continue;
        };

        routes.push(RouteEntry {
            destination: destination.to_string(),
            gateway: gateway.to_string(),
            flags: flags.to_string(),
            interface: interface.to_string(),
        });
    }

    routes
}

/// Interface of the first default route with a gateway address
pub fn default_route_interface(routes: &[RouteEntry]) -> Option<&str> {
    routes
        .iter()
        .find(|route| route.is_default() && !route.gateway.starts_with("link#"))
        .map(|route| route.interface.as_str())
}

struct Columns {
    destination: usize,
    gateway: usize,
    flags: usize,
    netif: usize,
}

impl Columns {
    fn from_header(header: &[&str]) -> Option<Self> {
        let position = |name: &str| header.iter().position(|column| *column == name);
        Some(Self {
            destination: position("Destination")?,
            gateway: position("Gateway")?,
            flags: position("Flags")?,
            netif: position("Netif")?,
        })
    }
}
