//! Environment variable handling and .env file management

use crate::error::{AppError, ErrorContext, Result};
use crate::models::DnsBackend;
use crate::types::{BandwidthTarget, RequestedMode};
use std::path::Path;

/// Serializes tests that touch the process environment
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `.env` from the current directory if it exists
    pub fn load_env_file(debug: bool) -> Result<()> {
        Self::load_env_file_from(Path::new(".env"), debug)
    }

    /// Load an env file if it exists. Variables already set win.
    pub fn load_env_file_from(path: &Path, debug: bool) -> Result<()> {
        if path.exists() {
            dotenv::from_path(path).with_context(|| format!("Failed to load {}", path.display()))?;

            if debug {
                eprintln!("Loaded configuration from {}", path.display());
            }
        } else if debug {
            eprintln!("No {} file found, using defaults and CLI arguments", path.display());
        }

        Ok(())
    }

    /// Create example .env file content
    pub fn create_example_env_content() -> String {
        r#"# Network Analyzer Configuration
#
# Values here are used as defaults and can be overridden by command-line
# arguments. Variables already set in the environment take precedence.

# Measurement mode: offline, online or auto
# NA_MODE=auto

# Skip the scan for nearby WiFi networks (true/false)
# NA_SKIP_WIFI_SCAN=false

# Skip the 100-domain DNS reliability sweep (true/false)
# NA_SKIP_DNS_TEST=false

# DNS sweep backend: dig or native
# NA_DNS_BACKEND=dig

# iperf3 server for the bandwidth test, host or host:port
# NA_IPERF3_SERVER=192.168.1.10:5201

# Per-command timeout in seconds
# NA_COMMAND_TIMEOUT=30

# networkQuality timeout in seconds
# NA_SPEED_TEST_TIMEOUT=180

# Whole-run timeout in seconds
# NA_RUN_TIMEOUT=600

# Concurrent lookups during the DNS sweep
# NA_DNS_CONCURRENCY=16

# Echo requests per latency test
# NA_PING_COUNT=10

# Enable colored output (true/false)
# NA_ENABLE_COLOR=true
"#
        .to_string()
    }

    /// Save example .env file to disk
    pub fn save_example_env_file(path: &Path) -> Result<()> {
        std::fs::write(path, Self::create_example_env_content())
            .map_err(|e| AppError::io(format!("Failed to write example env file {}: {}", path.display(), e)))
    }

    /// Validate environment variable format before parsing
    pub fn validate_env_var(key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key {
            "NA_MODE" => {
                value.parse::<RequestedMode>()?;
            }
            "NA_DNS_BACKEND" => {
                value.parse::<DnsBackend>()?;
            }
            "NA_IPERF3_SERVER" => {
                if !value.is_empty() {
                    value.parse::<BandwidthTarget>()?;
                }
            }
            "NA_SKIP_WIFI_SCAN" | "NA_SKIP_DNS_TEST" | "NA_ENABLE_COLOR" => {
                value
                    .parse::<bool>()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
            }
            "NA_COMMAND_TIMEOUT" | "NA_SPEED_TEST_TIMEOUT" | "NA_RUN_TIMEOUT" => {
                let secs: u64 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if secs == 0 || secs > 3600 {
                    return Err(AppError::config(format!("{} must be between 1 and 3600, got: {}", key, secs)));
                }
            }
            "NA_DNS_CONCURRENCY" | "NA_PING_COUNT" => {
                let count: u32 = value
                    .parse()
                    .map_err(|e| AppError::config(format!("Invalid {} value '{}': {}", key, value, e)))?;
                if count == 0 || count > 100 {
                    return Err(AppError::config(format!("{} must be between 1 and 100, got: {}", key, count)));
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Supported environment variables: name, description, example
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![
            ("NA_MODE", "Measurement mode (offline, online, auto)", "auto"),
            ("NA_SKIP_WIFI_SCAN", "Skip the nearby-network WiFi scan", "false"),
            ("NA_SKIP_DNS_TEST", "Skip the DNS reliability sweep", "false"),
            ("NA_DNS_BACKEND", "DNS sweep backend (dig, native)", "dig"),
            ("NA_IPERF3_SERVER", "iperf3 server, host or host:port", "192.168.1.10:5201"),
            ("NA_COMMAND_TIMEOUT", "Per-command timeout in seconds (1-3600)", "30"),
            ("NA_SPEED_TEST_TIMEOUT", "Speed test timeout in seconds (1-3600)", "180"),
            ("NA_RUN_TIMEOUT", "Whole-run timeout in seconds (1-3600)", "600"),
            ("NA_DNS_CONCURRENCY", "Concurrent DNS lookups (1-100)", "16"),
            ("NA_PING_COUNT", "Echo requests per latency test (1-100)", "10"),
            ("NA_ENABLE_COLOR", "Enable colored output", "true"),
        ]
    }

    /// Display environment variable help
    pub fn display_env_help() -> String {
        let mut help = String::new();
        help.push_str("Supported Environment Variables:\n\n");

        for (var, description, example) in Self::get_supported_env_vars() {
            help.push_str(&format!("  {:<22} {}\n", var, description));
            help.push_str(&format!("  {:<22} Example: {}\n\n", "", example));
        }

        help.push_str("Configuration Priority (highest to lowest):\n");
        help.push_str("  1. Command-line arguments\n");
        help.push_str("  2. Environment variables\n");
        help.push_str("  3. .env file values\n");
        help.push_str("  4. Default values\n");

        help
    }

    /// Validate every supported variable currently set
    pub fn validate_current_env() -> Vec<String> {
        Self::get_supported_env_vars()
            .into_iter()
            .filter_map(|(name, _, _)| {
                let value = std::env::var(name).ok()?;
                Self::validate_env_var(name, &value).err().map(|e| format!("Warning: {}", e))
            })
            .collect()
    }

    /// Validate the entries of an env file without loading it
    pub fn check_env_file(path: &Path) -> Result<Option<Vec<String>>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read {}: {}", path.display(), e)))?;

        let warnings = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let (key, value) = line.split_once('=')?;
                Self::validate_env_var(key.trim(), value)
                    .err()
                    .map(|e| format!("Line '{}': {}", line, e))
            })
            .collect();

        Ok(Some(warnings))
    }
}
