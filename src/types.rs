//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Mode requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RequestedMode {
    /// Never touch the internet
    Offline,
    /// Run online measurements unconditionally
    Online,
    /// Decide with a reachability probe
    #[default]
    Auto,
}

impl RequestedMode {
    /// Whether resolving this mode needs a reachability probe
    pub fn needs_probe(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl FromStr for RequestedMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "offline" => Ok(Self::Offline),
            "online" => Ok(Self::Online),
            "auto" => Ok(Self::Auto),
            other => Err(AppError::config(format!(
                "Invalid mode '{}': expected offline, online or auto",
                other
            ))),
        }
    }
}

impl fmt::Display for RequestedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Online => write!(f, "online"),
            Self::Auto => write!(f, "auto"),
        }
    }
}

/// Mode a run actually executes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Offline,
    Online,
}

impl Mode {
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Online)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => write!(f, "offline"),
            Self::Online => write!(f, "online"),
        }
    }
}

/// iperf3 server address, `host` or `host:port`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandwidthTarget {
    pub host: String,
    pub port: Option<u16>,
}

impl FromStr for BandwidthTarget {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let malformed = || AppError::config(format!("Malformed bandwidth target '{}'", s));

        if text.is_empty() {
            return Err(malformed());
        }

        // Bare IPv6 addresses carry colons of their own
        if let Ok(ip) = text.parse::<std::net::Ipv6Addr>() {
            return Ok(Self { host: ip.to_string(), port: None });
        }
        if let Ok(addr) = text.parse::<std::net::SocketAddr>() {
            return Ok(Self { host: addr.ip().to_string(), port: Some(addr.port()) });
        }

        let (host, port) = match text.rsplit_once(':') {
            Some((host, port)) => {
                let port: u16 = port.parse().map_err(|_| malformed())?;
                if port == 0 {
                    return Err(malformed());
                }
                (host, Some(port))
            }
            None => (text, None),
        };

        let hostname = regex::Regex::new(r"^[A-Za-z0-9]([A-Za-z0-9-]{0,62})(\.[A-Za-z0-9]([A-Za-z0-9-]{0,62}))*$")
            .map_err(|e| AppError::internal(format!("hostname pattern: {}", e)))?;
        if !hostname.is_match(host) {
            return Err(malformed());
        }

        Ok(Self { host: host.to_string(), port })
    }
}

impl fmt::Display for BandwidthTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) if self.host.contains(':') => write!(f, "[{}]:{}", self.host, port),
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// Resolve the requested mode against a reachability probe result.
///
/// `probe` is `None` when no probe was run. `Auto` only becomes `Online` on a
/// successful probe.
pub fn resolve_mode(requested: RequestedMode, probe: Option<bool>) -> Mode {
    match requested {
        RequestedMode::Offline => Mode::Offline,
        RequestedMode::Online => Mode::Online,
        RequestedMode::Auto => {
            if probe == Some(true) {
                Mode::Online
            } else {
                Mode::Offline
            }
        }
    }
}
