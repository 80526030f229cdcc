//! Output formatting and display system
//!
//! Renders an [`Analysis`] as a human-readable report, plain or colored,
//! or as pretty-printed JSON.

mod colored;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use formatter::{
    format_percentage, interface_fields, latency_fields, online_fields, wifi_fields, Alignment,
    Column, Field, FormattingOptions, OutputFormatter, PlainFormatter, RowData, TableFormat, Tone, UNKNOWN,
};

use crate::{
    analyzer::{Analysis, Interruption},
    error::{AppError, Result},
    models::{InterfaceRecord, LatencyResult},
};

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
            table_borders: true,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }
}

/// Serialize an analysis as pretty-printed JSON
pub fn render_json(analysis: &Analysis) -> Result<String> {
    serde_json::to_string_pretty(analysis)
        .map_err(|e| AppError::internal(format!("Failed to serialize analysis: {}", e)))
}

/// Main output coordinator that handles all result display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
    verbose: bool,
}

impl OutputCoordinator {
    /// Create a new output coordinator with the specified formatter
    pub fn new(formatter: Box<dyn OutputFormatter>, verbose: bool) -> Self {
        Self { formatter, verbose }
    }

    /// Coordinator matching the color and verbosity settings
    pub fn for_terminal(enable_color: bool, verbose: bool) -> Self {
        Self::new(OutputFormatterFactory::create_formatter(enable_color, verbose), verbose)
    }

    /// Render the complete report
    pub fn display_analysis(&self, analysis: &Analysis) -> Result<String> {
        let record = &analysis.record;
        let mut sections = vec![self.formatter.format_header(analysis)?];

        if let Some(interruption) = analysis.interruption {
            let note = match interruption {
                Interruption::TimedOut => "Run timeout reached; results are partial",
                Interruption::Cancelled => "Run cancelled; results are partial",
            };
            sections.push(self.formatter.format_warning(note)?);
        }

        sections.push(self.formatter.format_section("Interface", &interface_fields(record))?);

        if let Some(wifi) = &record.wifi {
            sections.push(self.formatter.format_section("WiFi", &wifi_fields(wifi))?);
        }
        if let Some(latency) = &record.latency {
            sections.push(self.formatter.format_section("Latency", &latency_fields(latency))?);
        }
        if let Some(online) = &record.online {
            sections.push(self.formatter.format_section("Online", &online_fields(online))?);
            if !online.global_pings.is_empty() {
                sections.push(self.global_latency_table(&online.global_pings)?);
            }
        }

        if self.verbose {
            sections.extend(self.detail_tables(record)?);
        }

        sections.push(self.formatter.format_assessment(&analysis.assessment)?);
        sections.push(self.formatter.format_recommendations(&analysis.assessment)?);

        Ok(sections.join("\n\n"))
    }

    /// One row per well-known resolver pinged in online mode
    fn global_latency_table(&self, pings: &[LatencyResult]) -> Result<String> {
        let format = TableFormat::with_headers(&["Target", "Loss", "Avg", "Jitter"], true);
        let optional = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());
        let rows: Vec<RowData> = pings
            .iter()
            .map(|ping| {
                vec![
                    optional(ping.target.clone()),
                    optional(ping.packet_loss_percent().map(format_percentage)),
                    optional(ping.rtt.map(|rtt| format!("{:.1} ms", rtt.avg_ms))),
                    optional(ping.rtt.map(|rtt| format!("{:.1} ms", rtt.jitter_ms))),
                ]
            })
            .collect();
        self.formatter.format_table("Global latency", &format, &rows)
    }

    /// Routing table, ARP cache and nearby networks
    fn detail_tables(&self, record: &InterfaceRecord) -> Result<Vec<String>> {
        let mut tables = Vec::new();

        if !record.routing.is_empty() {
            let format = TableFormat::with_headers(&["Destination", "Gateway", "Flags", "Netif"], true);
            let rows: Vec<RowData> = record
                .routing
                .iter()
                .map(|route| {
                    vec![
                        route.destination.clone(),
                        route.gateway.clone(),
                        route.flags.clone(),
                        route.interface.clone(),
                    ]
                })
                .collect();
            tables.push(self.formatter.format_table("Routes", &format, &rows)?);
        }

        if !record.arp_entries.is_empty() {
            let format = TableFormat::with_headers(&["Address", "MAC", "Interface"], true);
            let rows: Vec<RowData> = record
                .arp_entries
                .iter()
                .map(|entry| vec![entry.ip.clone(), entry.mac.to_string(), entry.interface.clone()])
                .collect();
            tables.push(self.formatter.format_table("ARP entries", &format, &rows)?);
        }

        if let Some(wifi) = record.wifi.as_ref().filter(|w| !w.nearby_networks.is_empty()) {
            let format = TableFormat::with_headers(&["SSID", "BSSID", "RSSI", "Channel", "Security"], true);
            let optional = |value: Option<String>| value.unwrap_or_else(|| UNKNOWN.to_string());
            let rows: Vec<RowData> = wifi
                .nearby_networks
                .iter()
                .map(|network| {
                    vec![
                        network.ssid.clone(),
                        optional(network.bssid.clone()),
                        optional(network.rssi.map(|rssi| rssi.to_string())),
                        optional(network.channel.map(|channel| channel.to_string())),
                        optional(network.security.clone()),
                    ]
                })
                .collect();
            tables.push(self.formatter.format_table("Nearby networks", &format, &rows)?);
        }

        Ok(tables)
    }

    /// Format a warning line
    pub fn display_warning(&self, warning: &str) -> Result<String> {
        self.formatter.format_warning(warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ArpEntry, MacAddress, OnlineMetrics, RouteEntry, RttStats};
    use crate::types::Mode;
    use chrono::Utc;
    use std::time::Duration;

    fn analysis(record: InterfaceRecord, interruption: Option<Interruption>) -> Analysis {
        Analysis {
            mode: Mode::Offline,
            assessment: crate::health::assess(&record),
            record,
            started_at: Utc::now(),
            duration: Duration::from_millis(1500),
            interruption,
        }
    }

    fn wired_record() -> InterfaceRecord {
        let mut record = InterfaceRecord::empty("en0");
        record.is_active = Some(true);
        record.hardware_port = Some("Ethernet".to_string());
        record.ipv4_addresses = vec!["192.168.1.23".to_string()];
        record.latency = Some(LatencyResult::new(10, 10, RttStats::new(1.0, 2.0, 3.0, 0.5)).with_target("192.168.1.1"));
        record.routing = vec![RouteEntry {
            destination: "default".to_string(),
            gateway: "192.168.1.1".to_string(),
            flags: "UGScg".to_string(),
            interface: "en0".to_string(),
        }];
        record.arp_entries = vec![ArpEntry {
            ip: "192.168.1.1".to_string(),
            mac: MacAddress::new([0xaa, 0xbb, 0xcc, 0x00, 0x11, 0x22]),
            interface: "en0".to_string(),
        }];
        record
    }

    #[test]
    fn test_report_sections() {
        let coordinator = OutputCoordinator::for_terminal(false, false);
        let report = coordinator.display_analysis(&analysis(wired_record(), None)).unwrap();

        assert!(report.contains("Network Analysis: en0"));
        assert!(report.contains("Interface:"));
        assert!(report.contains("Latency:"));
        assert!(report.contains("Score:    100/100"));
        assert!(report.contains("No issues found."));
        assert!(!report.contains("WiFi:"));
        assert!(!report.contains("Routes"));
    }

    #[test]
    fn test_verbose_report_has_tables() {
        let coordinator = OutputCoordinator::for_terminal(false, true);
        let report = coordinator.display_analysis(&analysis(wired_record(), None)).unwrap();

        assert!(report.contains("Routes (1):"));
        assert!(report.contains("UGScg"));
        assert!(report.contains("ARP entries (1):"));
        assert!(report.contains("aa:bb:cc:00:11:22"));
    }

    #[test]
    fn test_global_latency_table() {
        let mut record = wired_record();
        record.online = Some(OnlineMetrics {
            global_pings: vec![
                LatencyResult::new(10, 10, RttStats::new(8.0, 12.4, 20.0, 2.2)).with_target("Google DNS (8.8.8.8)"),
                LatencyResult::new(10, 0, None).with_target("Quad9 DNS (9.9.9.9)"),
            ],
            ..Default::default()
        });
        let coordinator = OutputCoordinator::for_terminal(false, false);
        let report = coordinator.display_analysis(&analysis(record, None)).unwrap();

        assert!(report.contains("Global latency (2):"));
        assert!(report.contains("Google DNS (8.8.8.8)"));
        assert!(report.contains("12.4 ms"));
        assert!(report.contains("100.0%"));
    }

    #[test]
    fn test_partial_run_is_flagged() {
        let coordinator = OutputCoordinator::for_terminal(false, false);
        let report = coordinator
            .display_analysis(&analysis(InterfaceRecord::empty("en0"), Some(Interruption::TimedOut)))
            .unwrap();
        assert!(report.contains("WARNING: Run timeout reached"));
    }

    #[test]
    fn test_json_rendering() {
        let json = render_json(&analysis(wired_record(), Some(Interruption::Cancelled))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["mode"], "offline");
        assert_eq!(value["record"]["name"], "en0");
        assert_eq!(value["assessment"]["score"], 100);
        assert_eq!(value["interruption"], "cancelled");
        assert_eq!(value["duration_seconds"], 1.5);
    }
}
