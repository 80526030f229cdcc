//! Core formatting traits and implementations
//!
//! Sections of the report are built as labelled fields from the models;
//! formatters only decide how a field, a table or the verdict looks.

use super::colored::PerformanceLevel;
use crate::{
    analyzer::Analysis,
    error::{AppError, Result},
    models::{
        HealthAssessment, InterfaceRecord, LatencyResult, OnlineMetrics, Severity,
        SignalQuality, WifiInfo,
    },
};
use std::fmt::Write as _;

/// Shown for a value no source reported
pub const UNKNOWN: &str = "n/a";

/// Main trait for output formatting
pub trait OutputFormatter {
    /// Format the report banner
    fn format_header(&self, analysis: &Analysis) -> Result<String>;

    /// Format a titled block of labelled values
    fn format_section(&self, title: &str, fields: &[Field]) -> Result<String>;

    /// Format rows as a table
    fn format_table(&self, title: &str, format: &TableFormat, rows: &[RowData]) -> Result<String>;

    /// Format score, category and warnings
    fn format_assessment(&self, assessment: &HealthAssessment) -> Result<String>;

    /// Format recommendations
    fn format_recommendations(&self, assessment: &HealthAssessment) -> Result<String>;

    /// Format error messages
    fn format_warning(&self, warning: &str) -> Result<String>;
}

/// How a value should be read at a glance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Good,
    Fair,
    Bad,
}

/// One labelled value of a section
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub label: &'static str,
    pub value: Option<String>,
    pub tone: Tone,
}

impl Field {
    pub fn new(label: &'static str, value: Option<String>) -> Self {
        Self {
            label,
            value,
            tone: Tone::Neutral,
        }
    }

    pub fn toned(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    /// Value text, or the unknown marker
    pub fn display_value(&self) -> &str {
        self.value.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Include routes, ARP entries, scan results and deductions
    pub verbose_mode: bool,
    /// Show table borders
    pub table_borders: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
            table_borders: true,
        }
    }
}

/// Table formatting configuration
#[derive(Debug, Clone)]
pub struct TableFormat {
    pub columns: Vec<Column>,
    pub show_borders: bool,
    pub show_header: bool,
    pub min_column_width: usize,
    pub max_column_width: usize,
}

impl TableFormat {
    /// Left-aligned columns with the given headers
    pub fn with_headers(headers: &[&str], show_borders: bool) -> Self {
        Self {
            columns: headers.iter().map(|h| Column::left(h)).collect(),
            show_borders,
            show_header: true,
            min_column_width: 4,
            max_column_width: 40,
        }
    }
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self {
            header: header.to_string(),
            alignment: Alignment::Left,
            min_width: 4,
            max_width: 40,
        }
    }
}

/// Text alignment options
#[derive(Debug, Clone)]
pub enum Alignment {
    Left,
    Right,
}

/// Row data for table formatting
pub type RowData = Vec<String>;

/// Interface identity, addressing and counters
pub fn interface_fields(record: &InterfaceRecord) -> Vec<Field> {
    let status = record.is_active.map(|active| if active { "active" } else { "inactive" }.to_string());
    let status_tone = match record.is_active {
        Some(true) => Tone::Good,
        Some(false) => Tone::Bad,
        None => Tone::Neutral,
    };
    let counters = &record.counters;
    let error_rate = counters.error_rate_percent();
    let dhcp = record.dhcp.as_ref();

    vec![
        Field::new("Status", status).toned(status_tone),
        Field::new("Hardware port", record.hardware_port.clone()),
        Field::new("MAC address", record.mac_address.map(|mac| mac.to_string())),
        Field::new("IPv4", join_nonempty(&record.ipv4_addresses)),
        Field::new("IPv6", join_nonempty(&record.ipv6_addresses)),
        Field::new("MTU", record.mtu.map(|mtu| mtu.to_string())),
        Field::new("Media", record.media_type.clone()),
        Field::new("Gateway", record.default_gateway().map(str::to_string)),
        Field::new("Subnet mask", dhcp.and_then(|d| d.subnet_mask.clone())),
        Field::new("DHCP server", dhcp.and_then(|d| d.server.clone())),
        Field::new("DHCP lease", dhcp.and_then(|d| d.lease_time_secs).map(format_lease_time)),
        Field::new("Domain", dhcp.and_then(|d| d.domain_name.clone())),
        Field::new("DNS servers", join_nonempty(&record.dns)),
        Field::new(
            "Packets in/out",
            pair(counters.packets_in, counters.packets_out, |v| v.to_string()),
        ),
        Field::new(
            "Bytes in/out",
            pair(counters.bytes_in, counters.bytes_out, format_bytes),
        ),
        Field::new("Errors in/out", pair(counters.errors_in, counters.errors_out, |v| v.to_string())),
        Field::new("Error rate", error_rate.map(format_percentage)).toned(match error_rate {
            Some(rate) if rate >= 1.0 => Tone::Bad,
            Some(rate) if rate >= 0.1 => Tone::Fair,
            Some(_) => Tone::Good,
            None => Tone::Neutral,
        }),
        Field::new("Collisions", counters.collisions.map(|c| c.to_string())).toned(match counters.collisions {
            Some(0) => Tone::Good,
            Some(_) => Tone::Fair,
            None => Tone::Neutral,
        }),
    ]
}

/// Current association and radio quality
pub fn wifi_fields(wifi: &WifiInfo) -> Vec<Field> {
    let quality = wifi.signal_quality();
    let rssi = wifi.rssi.map(|rssi| match (quality, wifi.rssi_is_reliable()) {
        (_, Some(false)) => format!("{} dBm (unreliable)", rssi),
        (Some(quality), _) => format!("{} dBm ({})", rssi, quality),
        (None, _) => format!("{} dBm", rssi),
    });
    let rssi_tone = match (quality, wifi.rssi_is_reliable()) {
        (_, Some(false)) | (None, _) => Tone::Neutral,
        (Some(SignalQuality::Excellent | SignalQuality::Good), _) => Tone::Good,
        (Some(SignalQuality::Fair), _) => Tone::Fair,
        (Some(SignalQuality::Weak | SignalQuality::VeryWeak), _) => Tone::Bad,
    };
    let snr_tone = match wifi.snr() {
        Some(snr) if snr >= 30 => Tone::Good,
        Some(snr) if snr >= 20 => Tone::Fair,
        Some(_) => Tone::Bad,
        None => Tone::Neutral,
    };
    let channel = wifi.channel.map(|channel| {
        let mut text = channel.to_string();
        if let Some(band) = wifi.band() {
            text.push_str(&format!(" ({}", band));
            if let Some(width) = wifi.channel_width_mhz {
                text.push_str(&format!(", {} MHz", width));
            }
            text.push(')');
        }
        text
    });

    vec![
        Field::new("SSID", wifi.ssid.clone()),
        Field::new("BSSID", wifi.bssid.clone()),
        Field::new("RSSI", rssi).toned(rssi_tone),
        Field::new("Noise", wifi.noise.map(|noise| format!("{} dBm", noise))),
        Field::new("SNR", wifi.snr().map(|snr| format!("{} dB", snr))).toned(snr_tone),
        Field::new("Channel", channel),
        Field::new("PHY mode", wifi.phy_mode.clone()),
        Field::new("Tx rate", wifi.tx_rate_mbps.map(|rate| format!("{} Mbps", rate))),
        Field::new("MCS index", wifi.mcs_index.map(|mcs| mcs.to_string())),
        Field::new("Security", wifi.security.clone()),
        Field::new(
            "Nearby networks",
            Some(format!(
                "{} ({} on this channel)",
                wifi.nearby_networks.len(),
                wifi.co_channel_networks()
            )),
        ),
    ]
}

/// Ping result
pub fn latency_fields(latency: &LatencyResult) -> Vec<Field> {
    let loss = latency.packet_loss_percent();
    let loss_tone = match loss {
        Some(loss) if loss >= 5.0 => Tone::Bad,
        Some(loss) if loss > 0.0 => Tone::Fair,
        Some(_) => Tone::Good,
        None => Tone::Neutral,
    };
    let rtt = latency.rtt;

    vec![
        Field::new("Target", latency.target.clone()),
        Field::new(
            "Packets",
            Some(format!("{} sent, {} received", latency.packets_sent, latency.packets_received)),
        ),
        Field::new("Packet loss", loss.map(format_percentage)).toned(loss_tone),
        Field::new(
            "RTT min/avg/max",
            rtt.map(|r| format!("{:.1} / {:.1} / {:.1} ms", r.min_ms, r.avg_ms, r.max_ms)),
        )
        .toned(rtt.map_or(Tone::Neutral, |r| PerformanceLevel::from_response_time(r.avg_ms).tone())),
        Field::new("Jitter", rtt.map(|r| format!("{:.1} ms", r.jitter_ms))).toned(match rtt {
            Some(r) if r.jitter_ms > 20.0 => Tone::Bad,
            Some(r) if r.jitter_ms > 10.0 => Tone::Fair,
            Some(_) => Tone::Good,
            None => Tone::Neutral,
        }),
    ]
}

/// Speed test, DNS sweep, bandwidth test and public address
pub fn online_fields(online: &OnlineMetrics) -> Vec<Field> {
    let speed = online.speed_test.as_ref();
    let dns = online.dns_test.as_ref();
    let bandwidth = online.bandwidth_test.as_ref();
    let dns_rate = dns.and_then(|dns| dns.success_rate());

    vec![
        Field::new("Download", online.download_mbps().map(format_mbps)).toned(match online.download_mbps() {
            Some(mbps) if mbps < 10.0 => Tone::Bad,
            Some(mbps) if mbps < 25.0 => Tone::Fair,
            Some(_) => Tone::Good,
            None => Tone::Neutral,
        }),
        Field::new("Upload", online.upload_mbps().map(format_mbps)).toned(match online.upload_mbps() {
            Some(mbps) if mbps < 5.0 => Tone::Bad,
            Some(_) => Tone::Good,
            None => Tone::Neutral,
        }),
        Field::new(
            "Responsiveness",
            online.responsiveness_rpm().map(|rpm| format!("{:.0} RPM", rpm)),
        )
        .toned(match online.responsiveness_rpm() {
            Some(rpm) if rpm < 200.0 => Tone::Bad,
            Some(_) => Tone::Good,
            None => Tone::Neutral,
        }),
        Field::new(
            "Idle latency",
            speed.and_then(|s| s.idle_latency_ms).map(|ms| format!("{:.1} ms", ms)),
        ),
        Field::new("DNS resolver", dns.map(|dns| dns.resolver.clone())),
        Field::new(
            "DNS success",
            dns.map(|dns| {
                format!(
                    "{}/{} ({})",
                    dns.success_count,
                    dns.domains_tested,
                    dns_rate.map(format_percentage).unwrap_or_else(|| UNKNOWN.to_string())
                )
            }),
        )
        .toned(match dns_rate {
            Some(rate) if rate < 90.0 => Tone::Bad,
            Some(rate) if rate < 99.0 => Tone::Fair,
            Some(_) => Tone::Good,
            None => Tone::Neutral,
        }),
        Field::new(
            "DNS min/avg/max",
            dns.and_then(|dns| Some(format!("{:.1} / {:.1} / {:.1} ms", dns.min_ms?, dns.avg_ms?, dns.max_ms?))),
        ),
        Field::new("iperf3 server", bandwidth.map(|b| b.server.clone())),
        Field::new(
            "iperf3 up/down",
            bandwidth.map(|b| {
                format!(
                    "{} / {}",
                    b.upload_mbps.map(format_mbps).unwrap_or_else(|| UNKNOWN.to_string()),
                    b.download_mbps.map(format_mbps).unwrap_or_else(|| UNKNOWN.to_string())
                )
            }),
        ),
        Field::new(
            "Retransmits",
            bandwidth.and_then(|b| pair(b.upload_retransmits, b.download_retransmits, |v| v.to_string())),
        ),
        Field::new("Public IP", online.public_ip.clone()),
        Field::new("Location", online.geolocation.as_ref().and_then(|geo| geo.summary())),
        Field::new("ISP", online.geolocation.as_ref().and_then(|geo| geo.isp.clone())),
    ]
}

fn join_nonempty(values: &[String]) -> Option<String> {
    (!values.is_empty()).then(|| values.join(", "))
}

/// `a / b` when both sides are known
fn pair<T, F>(a: Option<T>, b: Option<T>, render: F) -> Option<String>
where
    F: Fn(T) -> String,
{
    Some(format!("{} / {}", render(a?), render(b?)))
}

pub fn format_mbps(mbps: f64) -> String {
    format!("{:.1} Mbps", mbps)
}

/// Format percentage with appropriate precision
pub fn format_percentage(percentage: f64) -> String {
    if percentage >= 99.95 {
        "100.0%".to_string()
    } else if percentage < 0.005 {
        "0.0%".to_string()
    } else if percentage < 1.0 {
        format!("{:.2}%", percentage)
    } else {
        format!("{:.1}%", percentage)
    }
}

/// Format a byte count with binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// Lease length as `1d 2h`, `12h 30m` or `45m`
pub fn format_lease_time(secs: u32) -> String {
    let days = secs / 86_400;
    let hours = secs % 86_400 / 3_600;
    let minutes = secs % 3_600 / 60;
    match (days, hours, minutes) {
        (0, 0, 0) => format!("{}s", secs),
        (0, 0, m) => format!("{}m", m),
        (0, h, 0) => format!("{}h", h),
        (0, h, m) => format!("{}h {}m", h, m),
        (d, 0, _) => format!("{}d", d),
        (d, h, _) => format!("{}d {}h", d, h),
    }
}

/// Format duration in human-readable format
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1000.0 {
        format!("{:.0}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.1}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

fn fmt_error(context: &str) -> impl Fn(std::fmt::Error) -> AppError + '_ {
    move |e| AppError::io(format!("Failed to format {}: {}", context, e))
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    /// Create a table with the given format and data
    pub(crate) fn create_table(&self, format: &TableFormat, rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let widths = self.calculate_column_widths(format, rows);
        let mut output = String::new();

        if format.show_header && !format.columns.is_empty() {
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&widths));
                output.push('\n');
            }
            let headers: Vec<String> = format.columns.iter().map(|c| c.header.clone()).collect();
            output.push_str(&self.create_row(&headers, &widths, format));
            output.push('\n');
            if format.show_borders {
                output.push_str(&self.create_horizontal_border(&widths));
                output.push('\n');
            }
        }

        for row in rows {
            output.push_str(&self.create_row(row, &widths, format));
            output.push('\n');
        }

        if format.show_borders {
            output.push_str(&self.create_horizontal_border(&widths));
            output.push('\n');
        }

        output
    }

    /// Calculate optimal column widths
    fn calculate_column_widths(&self, format: &TableFormat, rows: &[RowData]) -> Vec<usize> {
        let num_columns = format
            .columns
            .len()
            .max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

        (0..num_columns)
            .map(|col_idx| {
                let column = format.columns.get(col_idx);
                let mut width = column.map_or(format.min_column_width, |c| c.min_width.max(c.header.chars().count()));
                for row in rows {
                    if let Some(cell) = row.get(col_idx) {
                        width = width.max(cell.chars().count());
                    }
                }
                width.min(column.map_or(format.max_column_width, |c| c.max_width))
            })
            .collect()
    }

    /// Create a table row
    fn create_row(&self, data: &[String], widths: &[usize], format: &TableFormat) -> String {
        let mut row = String::new();

        if format.show_borders {
            row.push('|');
        }

        for (idx, (cell, &width)) in data.iter().zip(widths.iter()).enumerate() {
            let alignment = format.columns.get(idx).map_or(&Alignment::Left, |c| &c.alignment);
            let padded_cell = align_text(cell, width, alignment);

            if format.show_borders {
                row.push(' ');
                row.push_str(&padded_cell);
                row.push_str(" |");
            } else {
                row.push_str(&padded_cell);
                row.push_str("  ");
            }
        }

        row.trim_end().to_string()
    }

    /// Create horizontal border for table
    fn create_horizontal_border(&self, widths: &[usize]) -> String {
        let mut border = String::new();
        if !widths.is_empty() {
            border.push('+');
            for &width in widths {
                border.push_str(&"-".repeat(width + 2));
                border.push('+');
            }
        }
        border
    }
}

/// Align text within specified width, truncating on overflow
fn align_text(text: &str, width: usize, alignment: &Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }

    let padding = width - len;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, analysis: &Analysis) -> Result<String> {
        let mut output = String::new();
        let title = format!("Network Analysis: {}", analysis.record.name);
        let border = "=".repeat(title.len() + 4);

        writeln!(output, "{}", border).map_err(fmt_error("header"))?;
        writeln!(output, "  {}  ", title).map_err(fmt_error("header"))?;
        writeln!(output, "{}", border).map_err(fmt_error("header"))?;
        write!(
            output,
            "Mode: {} | Started: {} | Duration: {}",
            analysis.mode,
            analysis.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            format_duration(analysis.duration.as_secs_f64() * 1000.0)
        )
        .map_err(fmt_error("header"))?;

        Ok(output)
    }

    fn format_section(&self, title: &str, fields: &[Field]) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}:", title).map_err(fmt_error("section"))?;
        writeln!(output, "{}", "-".repeat(title.len() + 1)).map_err(fmt_error("section"))?;
        for field in fields {
            if field.value.is_none() && !self.options.verbose_mode {
                continue;
            }
            writeln!(output, "{:<16} {}", format!("{}:", field.label), field.display_value())
                .map_err(fmt_error("section"))?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_table(&self, title: &str, format: &TableFormat, rows: &[RowData]) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{} ({}):", title, rows.len()).map_err(fmt_error("table"))?;
        output.push_str(&self.create_table(format, rows));
        Ok(output.trim_end().to_string())
    }

    fn format_assessment(&self, assessment: &HealthAssessment) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Health Assessment:").map_err(fmt_error("assessment"))?;
        writeln!(output, "------------------").map_err(fmt_error("assessment"))?;
        writeln!(output, "Score:    {}/100", assessment.score).map_err(fmt_error("assessment"))?;
        write!(output, "Category: {}", assessment.category).map_err(fmt_error("assessment"))?;

        if !assessment.warnings.is_empty() {
            write!(output, "\n\nWarnings:").map_err(fmt_error("assessment"))?;
            for warning in &assessment.warnings {
                write!(output, "\n  [{}] {}: {}", warning.severity, warning.area, warning.message)
                    .map_err(fmt_error("assessment"))?;
            }
        }

        if self.options.verbose_mode && !assessment.deductions.is_empty() {
            write!(output, "\n\nDeductions:").map_err(fmt_error("assessment"))?;
            for deduction in &assessment.deductions {
                write!(output, "\n  -{:<3} {}: {}", deduction.points, deduction.area, deduction.reason)
                    .map_err(fmt_error("assessment"))?;
            }
        }

        Ok(output)
    }

    fn format_recommendations(&self, assessment: &HealthAssessment) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "Recommendations:").map_err(fmt_error("recommendations"))?;
        writeln!(output, "----------------").map_err(fmt_error("recommendations"))?;
        if assessment.recommendations.is_empty() {
            write!(output, "No issues found.").map_err(fmt_error("recommendations"))?;
        } else {
            for (index, recommendation) in assessment.recommendations.iter().enumerate() {
                writeln!(output, "{}. {}", index + 1, recommendation).map_err(fmt_error("recommendations"))?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(format!("WARNING: {}", warning))
    }
}

/// Worst severity among the warnings, if any
pub fn worst_severity(assessment: &HealthAssessment) -> Option<Severity> {
    assessment.warnings.iter().map(|w| w.severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Counters, DnsTestResult, RttStats, SpeedTestResult};

    fn plain(verbose: bool) -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: verbose,
            table_borders: true,
        })
    }

    #[test]
    fn test_absent_fields_are_not_zero() {
        let record = InterfaceRecord::empty("en0");
        let fields = interface_fields(&record);
        let packets = fields.iter().find(|f| f.label == "Packets in/out").unwrap();
        assert_eq!(packets.value, None);
        assert_eq!(packets.display_value(), UNKNOWN);
    }

    #[test]
    fn test_interface_fields() {
        let mut record = InterfaceRecord::empty("en0");
        record.is_active = Some(true);
        record.ipv4_addresses = vec!["192.168.1.23".into(), "10.0.0.4".into()];
        record.counters = Counters {
            packets_in: Some(1000),
            packets_out: Some(1000),
            errors_in: Some(30),
            errors_out: Some(0),
            bytes_in: Some(5 * 1024 * 1024),
            bytes_out: Some(512),
            collisions: Some(0),
        };

        let fields = interface_fields(&record);
        let get = |label: &str| fields.iter().find(|f| f.label == label).unwrap().clone();

        assert_eq!(get("Status").tone, Tone::Good);
        assert_eq!(get("IPv4").display_value(), "192.168.1.23, 10.0.0.4");
        assert_eq!(get("Error rate").display_value(), "1.5%");
        assert_eq!(get("Error rate").tone, Tone::Bad);
        assert_eq!(get("Bytes in/out").display_value(), "5.0 MiB / 512 B");
    }

    #[test]
    fn test_dhcp_lease_fields() {
        let mut record = InterfaceRecord::empty("en0");
        record.dhcp = Some(crate::models::DhcpInfo {
            server: Some("192.168.1.1".into()),
            lease_time_secs: Some(86_400),
            router: Some("192.168.1.254".into()),
            subnet_mask: Some("255.255.255.0".into()),
            ..Default::default()
        });

        let fields = interface_fields(&record);
        let get = |label: &str| fields.iter().find(|f| f.label == label).unwrap().clone();

        assert_eq!(get("Gateway").display_value(), "192.168.1.254");
        assert_eq!(get("Subnet mask").display_value(), "255.255.255.0");
        assert_eq!(get("DHCP server").display_value(), "192.168.1.1");
        assert_eq!(get("DHCP lease").display_value(), "1d");
        assert_eq!(get("Domain").value, None);
    }

    #[test]
    fn test_format_lease_time() {
        assert_eq!(format_lease_time(45), "45s");
        assert_eq!(format_lease_time(2_700), "45m");
        assert_eq!(format_lease_time(43_200), "12h");
        assert_eq!(format_lease_time(45_000), "12h 30m");
        assert_eq!(format_lease_time(93_600), "1d 2h");
    }

    #[test]
    fn test_wifi_fields_mark_unreliable_rssi() {
        let wifi = WifiInfo {
            rssi: Some(12),
            channel: Some(149),
            channel_width_mhz: Some(80),
            ..Default::default()
        };
        let fields = wifi_fields(&wifi);
        let rssi = fields.iter().find(|f| f.label == "RSSI").unwrap();
        assert_eq!(rssi.display_value(), "12 dBm (unreliable)");
        assert_eq!(rssi.tone, Tone::Neutral);

        let channel = fields.iter().find(|f| f.label == "Channel").unwrap();
        assert_eq!(channel.display_value(), "149 (5GHz, 80 MHz)");
    }

    #[test]
    fn test_latency_fields() {
        let latency = LatencyResult::new(10, 7, RttStats::new(10.0, 20.0, 30.0, 4.0)).with_target("1.1.1.1");
        let fields = latency_fields(&latency);
        let loss = fields.iter().find(|f| f.label == "Packet loss").unwrap();
        assert_eq!(loss.display_value(), "30.0%");
        assert_eq!(loss.tone, Tone::Bad);
    }

    #[test]
    fn test_online_fields() {
        let online = OnlineMetrics {
            speed_test: Some(SpeedTestResult {
                download_mbps: Some(250.0),
                upload_mbps: Some(3.0),
                ..Default::default()
            }),
            dns_test: Some(DnsTestResult::from_outcomes(
                "192.168.1.1",
                vec![("a.com".to_string(), Some(10.0)), ("b.com".to_string(), None)],
            )),
            ..Default::default()
        };
        let fields = online_fields(&online);
        let get = |label: &str| fields.iter().find(|f| f.label == label).unwrap().clone();

        assert_eq!(get("Download").tone, Tone::Good);
        assert_eq!(get("Upload").tone, Tone::Bad);
        assert_eq!(get("DNS success").display_value(), "1/2 (50.0%)");
        assert_eq!(get("Public IP").value, None);
    }

    #[test]
    fn test_section_hides_unknown_unless_verbose() {
        let fields = vec![
            Field::new("Known", Some("yes".to_string())),
            Field::new("Missing", None),
        ];

        let compact = plain(false).format_section("Test", &fields).unwrap();
        assert!(compact.contains("Known:"));
        assert!(!compact.contains("Missing"));

        let verbose = plain(true).format_section("Test", &fields).unwrap();
        assert!(verbose.contains("Missing:"));
        assert!(verbose.contains(UNKNOWN));
    }

    #[test]
    fn test_table_rendering() {
        let format = TableFormat::with_headers(&["Destination", "Gateway"], true);
        let rows = vec![
            vec!["default".to_string(), "192.168.1.1".to_string()],
            vec!["127".to_string(), "127.0.0.1".to_string()],
        ];
        let table = plain(false).create_table(&format, &rows);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "+-------------+-------------+");
        assert_eq!(lines[1], "| Destination | Gateway     |");
        assert_eq!(lines[3], "| default     | 192.168.1.1 |");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(format_percentage(100.0), "100.0%");
        assert_eq!(format_percentage(0.0), "0.0%");
        assert_eq!(format_percentage(0.5), "0.50%");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1536), "1.5 KiB");
        assert_eq!(format_duration(250.0), "250ms");
        assert_eq!(format_duration(1500.0), "1.5s");
        assert_eq!(format_duration(90000.0), "1m30.0s");
    }
}
