//! Data models shared by the collectors, the health engine and the renderers

pub mod config;
pub mod health;
pub mod interface;
pub mod metrics;
pub mod wifi;

// Re-export main model types
pub use config::{Config, DnsBackend};
pub use health::{Area, Deduction, HealthAssessment, HealthCategory, HealthWarning, Severity};
pub use interface::{
    is_wireless_port_label, ArpEntry, Counters, DhcpInfo, InterfaceRecord, MacAddress, RouteEntry,
};
pub use metrics::{
    BandwidthResult, DnsTestResult, Geolocation, LatencyResult, OnlineMetrics, RttStats,
    SpeedTestResult,
};
pub use wifi::{ScanEntry, SignalQuality, WifiBand, WifiInfo};
