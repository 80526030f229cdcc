//! `scutil --dns` resolver configuration

use super::split_key_value;

/// One `resolver #N` block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverEntry {
    pub nameservers: Vec<String>,
    pub search_domains: Vec<String>,
    /// Set on resolvers that only answer for one domain (e.g. `local`)
    pub domain: Option<String>,
    /// Interface named by `if_index : 14 (en0)`
    pub interface: Option<String>,
    pub scoped: bool,
}

/// Parsed `scutil --dns` output
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DnsConfiguration {
    pub resolvers: Vec<ResolverEntry>,
}

impl DnsConfiguration {
    /// Ordered, de-duplicated nameservers applying to `interface`: general
    /// resolvers that are unbound or bound to that interface.
    pub fn nameservers_for(&self, interface: &str) -> Vec<String> {
        let mut servers: Vec<String> = Vec::new();
        for resolver in &self.resolvers {
            if resolver.domain.is_some() {
                continue;
            }
            if resolver.interface.as_deref().is_some_and(|name| name != interface) {
                continue;
            }
            for server in &resolver.nameservers {
                if !servers.contains(server) {
                    servers.push(server.clone());
                }
            }
        }
        servers
    }
}

/// Extract resolver blocks from both the default and the scoped sections
pub fn parse_scutil_dns(text: &str) -> DnsConfiguration {
    let mut config = DnsConfiguration::default();
    let mut scoped = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("DNS configuration") {
            scoped = trimmed.contains("scoped");
            continue;
        }
        if trimmed.starts_with("resolver #") {
            config.resolvers.push(ResolverEntry {
                scoped,
                ..Default::default()
            });
            continue;
        }

        let Some(resolver) = config.resolvers.last_mut() else {
            continue;
        };
        let Some((key, value)) = split_key_value(trimmed) else {
            continue;
        };

        if key.starts_with("nameserver[") {
            let server = value.split('%').next().unwrap_or(value);
            if server.parse::<std::net::IpAddr>().is_ok() {
                resolver.nameservers.push(server.to_string());
            }
        } else if key.starts_with("search domain[") {
            resolver.search_domains.push(value.to_string());
        } else if key == "domain" {
            resolver.domain = Some(value.to_string());
        } else if key == "if_index" {
            resolver.interface = value
                .split_once('(')
                .and_then(|(_, tail)| tail.split_once(')'))
                .map(|(name, _)| name.trim().to_string())
                .filter(|name| !name.is_empty());
        }
    }

    config
}
