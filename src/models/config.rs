//! Configuration data model and validation

use crate::types::{AppError, BandwidthTarget, RequestedMode, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// How the DNS reliability sweep performs lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DnsBackend {
    /// Shell out to `dig` and parse its output
    #[default]
    Dig,
    /// In-process resolver
    Native,
}

impl FromStr for DnsBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "dig" => Ok(Self::Dig),
            "native" => Ok(Self::Native),
            other => Err(AppError::config(format!(
                "Invalid DNS backend '{}': expected dig or native",
                other
            ))),
        }
    }
}

impl fmt::Display for DnsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dig => write!(f, "dig"),
            Self::Native => write!(f, "native"),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Interface to analyze; `None` picks the default-route interface
    #[serde(default)]
    pub interface: Option<String>,

    #[serde(default)]
    pub mode: RequestedMode,

    #[serde(default)]
    pub skip_wifi_scan: bool,

    #[serde(default)]
    pub skip_dns_test: bool,

    /// iperf3 server, `host` or `host:port`
    #[serde(default)]
    pub iperf3_server: Option<String>,

    #[serde(default = "default_iperf3_duration")]
    pub iperf3_duration_secs: u32,

    #[serde(default)]
    pub dns_backend: DnsBackend,

    /// Per-command timeout
    #[serde(default = "default_command_timeout_secs")]
    pub command_timeout_seconds: u64,

    #[serde(default = "default_speed_test_timeout_secs")]
    pub speed_test_timeout_seconds: u64,

    /// Whole-run timeout
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_seconds: u64,

    #[serde(default = "default_dns_concurrency")]
    pub dns_concurrency: usize,

    #[serde(default = "default_ping_count")]
    pub ping_count: u32,

    #[serde(default = "default_public_ip_url")]
    pub public_ip_url: String,

    #[serde(default = "default_geolocation_url")]
    pub geolocation_url: String,

    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    #[serde(default)]
    pub json_output: bool,

    /// Exit non-zero when the assessment is Critical
    #[serde(default)]
    pub strict: bool,

    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interface: None,
            mode: RequestedMode::default(),
            skip_wifi_scan: false,
            skip_dns_test: false,
            iperf3_server: None,
            iperf3_duration_secs: default_iperf3_duration(),
            dns_backend: DnsBackend::default(),
            command_timeout_seconds: default_command_timeout_secs(),
            speed_test_timeout_seconds: default_speed_test_timeout_secs(),
            run_timeout_seconds: default_run_timeout_secs(),
            dns_concurrency: default_dns_concurrency(),
            ping_count: default_ping_count(),
            public_ip_url: default_public_ip_url(),
            geolocation_url: default_geolocation_url(),
            enable_color: default_enable_color(),
            json_output: false,
            strict: false,
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_seconds)
    }

    pub fn speed_test_timeout(&self) -> Duration {
        Duration::from_secs(self.speed_test_timeout_seconds)
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_seconds)
    }

    /// Parsed bandwidth target, if one is configured
    pub fn bandwidth_target(&self) -> Result<Option<BandwidthTarget>> {
        self.iperf3_server
            .as_deref()
            .map(str::parse::<BandwidthTarget>)
            .transpose()
    }

    /// Validate the configuration and return the first problem found
    pub fn validate(&self) -> Result<()> {
        if let Some(interface) = &self.interface {
            validate_interface_name(interface)?;
        }

        let target = self.bandwidth_target()?;
        if target.is_some() && self.mode == RequestedMode::Offline {
            return Err(AppError::config(
                "A bandwidth target requires online measurements but mode is offline",
            ));
        }

        if self.iperf3_duration_secs == 0 || self.iperf3_duration_secs > 60 {
            return Err(AppError::config("iperf3 duration must be between 1 and 60 seconds"));
        }

        if self.command_timeout_seconds == 0 {
            return Err(AppError::config("Command timeout must be greater than 0"));
        }

        if self.speed_test_timeout_seconds == 0 {
            return Err(AppError::config("Speed test timeout must be greater than 0"));
        }

        if self.run_timeout_seconds == 0 {
            return Err(AppError::config("Run timeout must be greater than 0"));
        }

        if self.dns_concurrency == 0 || self.dns_concurrency > 100 {
            return Err(AppError::config("DNS concurrency must be between 1 and 100"));
        }

        if self.ping_count == 0 || self.ping_count > 100 {
            return Err(AppError::config("Ping count must be between 1 and 100"));
        }

        for (label, value) in [
            ("public IP", &self.public_ip_url),
            ("geolocation", &self.geolocation_url),
        ] {
            let parsed = url::Url::parse(value).map_err(|e| {
                AppError::config(format!("Invalid {} URL '{}': {}", label, value, e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::config(format!(
                    "{} URL must use http or https: {}",
                    label, value
                )));
            }
        }

        Ok(())
    }

    /// Merge `NA_*` environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(mode) = std::env::var("NA_MODE") {
            self.mode = mode.parse()?;
        }

        if let Ok(value) = std::env::var("NA_SKIP_WIFI_SCAN") {
            self.skip_wifi_scan = parse_env("NA_SKIP_WIFI_SCAN", &value)?;
        }

        if let Ok(value) = std::env::var("NA_SKIP_DNS_TEST") {
            self.skip_dns_test = parse_env("NA_SKIP_DNS_TEST", &value)?;
        }

        if let Ok(server) = std::env::var("NA_IPERF3_SERVER") {
            let server = server.trim();
            self.iperf3_server = (!server.is_empty()).then(|| server.to_string());
        }

        if let Ok(backend) = std::env::var("NA_DNS_BACKEND") {
            self.dns_backend = backend.parse()?;
        }

        if let Ok(value) = std::env::var("NA_COMMAND_TIMEOUT") {
            self.command_timeout_seconds = parse_env("NA_COMMAND_TIMEOUT", &value)?;
        }

        if let Ok(value) = std::env::var("NA_SPEED_TEST_TIMEOUT") {
            self.speed_test_timeout_seconds = parse_env("NA_SPEED_TEST_TIMEOUT", &value)?;
        }

        if let Ok(value) = std::env::var("NA_RUN_TIMEOUT") {
            self.run_timeout_seconds = parse_env("NA_RUN_TIMEOUT", &value)?;
        }

        if let Ok(value) = std::env::var("NA_DNS_CONCURRENCY") {
            self.dns_concurrency = parse_env("NA_DNS_CONCURRENCY", &value)?;
        }

        if let Ok(value) = std::env::var("NA_PING_COUNT") {
            self.ping_count = parse_env("NA_PING_COUNT", &value)?;
        }

        if let Ok(value) = std::env::var("NA_ENABLE_COLOR") {
            self.enable_color = parse_env("NA_ENABLE_COLOR", &value)?;
        }

        Ok(())
    }
}

/// BSD interface names: a letter followed by letters or digits, at most 15 chars
pub fn validate_interface_name(name: &str) -> Result<()> {
    let pattern = regex::Regex::new(r"^[A-Za-z][A-Za-z0-9]{0,14}$")
        .map_err(|e| AppError::internal(format!("interface pattern: {}", e)))?;
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(AppError::config(format!("Invalid interface name '{}'", name)))
    }
}

fn parse_env<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

// Default value functions for serde
fn default_iperf3_duration() -> u32 {
    crate::defaults::DEFAULT_IPERF3_DURATION_SECS
}

fn default_command_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_COMMAND_TIMEOUT.as_secs()
}

fn default_speed_test_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_SPEED_TEST_TIMEOUT.as_secs()
}

fn default_run_timeout_secs() -> u64 {
    crate::defaults::DEFAULT_RUN_TIMEOUT.as_secs()
}

fn default_dns_concurrency() -> usize {
    crate::defaults::DEFAULT_DNS_CONCURRENCY
}

fn default_ping_count() -> u32 {
    crate::defaults::DEFAULT_PING_COUNT
}

fn default_public_ip_url() -> String {
    crate::defaults::DEFAULT_PUBLIC_IP_URL.to_string()
}

fn default_geolocation_url() -> String {
    crate::defaults::DEFAULT_GEOLOCATION_URL.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
