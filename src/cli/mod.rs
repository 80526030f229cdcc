//! Command-line interface

use crate::models::DnsBackend;
use crate::types::RequestedMode;
use clap::Parser;
use std::path::PathBuf;

/// Network Analyzer - diagnose a macOS network interface and grade its health
#[derive(Parser, Debug, Clone)]
#[command(name = "netanalyzer")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Interface to analyze (defaults to the interface of the default route)
    #[arg(short, long, value_name = "NAME")]
    pub interface: Option<String>,

    /// Measurement mode; auto probes internet reachability first
    #[arg(long, value_enum)]
    pub mode: Option<RequestedMode>,

    /// Skip the scan for nearby WiFi networks
    #[arg(long)]
    pub no_wifi_scan: bool,

    /// Skip the DNS reliability sweep
    #[arg(long)]
    pub skip_dns_test: bool,

    /// iperf3 server for the bandwidth test, host or host:port
    #[arg(long, value_name = "ADDR")]
    pub iperf3: Option<String>,

    /// Seconds per iperf3 direction
    #[arg(long, value_name = "SECS", requires = "iperf3")]
    pub iperf3_duration: Option<u32>,

    /// How the DNS sweep performs lookups
    #[arg(long, value_enum)]
    pub dns_backend: Option<DnsBackend>,

    /// Whole-run timeout in seconds
    #[arg(short, long, value_name = "SECS", value_parser = parse_duration)]
    pub timeout: Option<u64>,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Exit with status 4 when the assessment is Critical
    #[arg(long)]
    pub strict: bool,

    /// Serve command output from a JSON capture instead of running the tools
    #[arg(long, value_name = "FILE", hide = true)]
    pub replay: Option<PathBuf>,

    /// List the supported environment variables and exit
    #[arg(long)]
    pub env_help: bool,
}

impl Cli {
    /// Check argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.mode == Some(RequestedMode::Offline) && self.iperf3.is_some() {
            return Err("--iperf3 needs online measurements and cannot be combined with --mode offline".to_string());
        }

        if let Some(duration) = self.iperf3_duration {
            if duration == 0 || duration > 60 {
                return Err("--iperf3-duration must be between 1 and 60 seconds".to_string());
            }
        }

        if let Some(path) = &self.replay {
            if !path.exists() {
                return Err(format!("Replay file not found: {}", path.display()));
            }
        }

        Ok(())
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        if self.no_color || self.json {
            false
        } else {
            supports_color()
        }
    }

    /// Get configuration summary for display
    pub fn get_config_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Command-line options:\n");
        summary.push_str(&format!(
            "  Interface: {}\n",
            self.interface.as_deref().unwrap_or("default route")
        ));
        if let Some(mode) = self.mode {
            summary.push_str(&format!("  Mode: {}\n", mode));
        }
        if let Some(timeout) = self.timeout {
            summary.push_str(&format!("  Run timeout: {}s\n", timeout));
        }
        if let Some(ref server) = self.iperf3 {
            summary.push_str(&format!("  iperf3 server: {}\n", server));
        }
        if self.no_wifi_scan {
            summary.push_str("  WiFi scan: skipped\n");
        }
        if self.skip_dns_test {
            summary.push_str("  DNS sweep: skipped\n");
        }
        summary.push_str(&format!("  Colored output: {}\n", self.use_colors()));
        summary.push_str(&format!("  Verbose mode: {}\n", self.verbose));
        summary.push_str(&format!("  Debug mode: {}\n", self.debug));

        summary
    }
}

/// Parse the run timeout from a seconds string
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else if secs > 3600 {
                Err("Duration cannot exceed 3600 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    cfg!(unix)
}
