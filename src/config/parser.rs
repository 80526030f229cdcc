//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that layers defaults, `.env`, `NA_*` variables and
/// CLI arguments, in that order
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file(self.cli.debug)?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        let cli = &self.cli;

        if let Some(ref interface) = cli.interface {
            config.interface = Some(interface.clone());
        }
        if let Some(mode) = cli.mode {
            config.mode = mode;
        }
        if cli.no_wifi_scan {
            config.skip_wifi_scan = true;
        }
        if cli.skip_dns_test {
            config.skip_dns_test = true;
        }
        if let Some(ref server) = cli.iperf3 {
            config.iperf3_server = Some(server.clone());
        }
        if let Some(duration) = cli.iperf3_duration {
            config.iperf3_duration_secs = duration;
        }
        if let Some(backend) = cli.dns_backend {
            config.dns_backend = backend;
        }
        if let Some(timeout) = cli.timeout {
            config.run_timeout_seconds = timeout;
        }
        if cli.no_color || cli.json {
            config.enable_color = false;
        }

        // CLI-only switches
        config.json_output = cli.json;
        config.strict = cli.strict;
        config.verbose = cli.verbose;
        config.debug = cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!(
        "Interface: {}",
        config.interface.as_deref().unwrap_or("default route")
    ));
    summary.push(format!("Mode: {}", config.mode));
    summary.push(format!("WiFi scan: {}", if config.skip_wifi_scan { "skipped" } else { "enabled" }));
    summary.push(format!("DNS sweep: {}", if config.skip_dns_test { "skipped" } else { "enabled" }));
    summary.push(format!("DNS backend: {}", config.dns_backend));
    summary.push(format!("DNS concurrency: {}", config.dns_concurrency));
    summary.push(format!(
        "iperf3 server: {}",
        config.iperf3_server.as_deref().unwrap_or("none")
    ));
    summary.push(format!("Ping count: {}", config.ping_count));
    summary.push(format!(
        "Timeouts: command {}s, speed test {}s, run {}s",
        config.command_timeout_seconds, config.speed_test_timeout_seconds, config.run_timeout_seconds
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::env::ENV_LOCK;
    use crate::models::DnsBackend;
    use crate::types::RequestedMode;
    use clap::Parser;
    use std::env;

    fn clear_env() {
        for (name, _, _) in EnvManager::get_supported_env_vars() {
            env::remove_var(name);
        }
    }

    #[test]
    fn test_defaults_without_arguments() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let config = ConfigParser::new(Cli::parse_from(["test"])).parse().unwrap();
        assert_eq!(config.mode, RequestedMode::Auto);
        assert_eq!(config.interface, None);
        assert_eq!(config.run_timeout_seconds, crate::defaults::DEFAULT_RUN_TIMEOUT.as_secs());
        assert!(!config.json_output);
    }

    #[test]
    fn test_cli_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let cli = Cli::parse_from([
            "test", "-i", "en1", "--mode", "online", "--timeout", "90", "--no-color", "--verbose",
            "--dns-backend", "native", "--json", "--strict",
        ]);
        let config = ConfigParser::new(cli).parse().unwrap();

        assert_eq!(config.interface.as_deref(), Some("en1"));
        assert_eq!(config.mode, RequestedMode::Online);
        assert_eq!(config.run_timeout_seconds, 90);
        assert_eq!(config.dns_backend, DnsBackend::Native);
        assert!(!config.enable_color);
        assert!(config.verbose);
        assert!(config.json_output);
        assert!(config.strict);
    }

    #[test]
    fn test_cli_overrides_env_vars() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("NA_MODE", "offline");
        env::set_var("NA_PING_COUNT", "4");

        let config = ConfigParser::new(Cli::parse_from(["test", "--mode", "auto"])).parse().unwrap();
        assert_eq!(config.mode, RequestedMode::Auto);
        assert_eq!(config.ping_count, 4);

        clear_env();
    }

    #[test]
    fn test_invalid_env_value_is_config_error() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();
        env::set_var("NA_DNS_CONCURRENCY", "lots");

        let err = ConfigParser::new(Cli::parse_from(["test"])).parse().unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(err.to_string().contains("NA_DNS_CONCURRENCY"));

        clear_env();
    }

    #[test]
    fn test_invalid_interface_from_cli() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        clear_env();

        let err = ConfigParser::new(Cli::parse_from(["test", "-i", "en0;reboot"])).parse().unwrap_err();
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_summary() {
        let config = Config::default();
        let summary = display_config_summary(&config);

        assert!(summary.contains("Interface: default route"));
        assert!(summary.contains("Mode: auto"));
        assert!(summary.contains("DNS backend: dig"));
        assert!(summary.contains("Timeouts:"));
    }
}
