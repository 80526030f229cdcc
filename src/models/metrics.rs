//! Latency and online measurement data models

use serde::{Deserialize, Serialize};

/// Round-trip statistics of a ping run; all-or-nothing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RttStats {
    pub min_ms: f64,
    pub avg_ms: f64,
    pub max_ms: f64,
    /// Standard deviation of the probes, reported as jitter
    pub jitter_ms: f64,
}

impl RttStats {
    /// Build stats, rejecting negative or non-finite values
    pub fn new(min_ms: f64, avg_ms: f64, max_ms: f64, jitter_ms: f64) -> Option<Self> {
        let values = [min_ms, avg_ms, max_ms, jitter_ms];
        if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
            Some(Self { min_ms, avg_ms, max_ms, jitter_ms })
        } else {
            None
        }
    }
}

/// Result of a latency test against one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatencyResult {
    pub target: Option<String>,
    pub packets_sent: u32,
    pub packets_received: u32,
    pub rtt: Option<RttStats>,
}

impl LatencyResult {
    /// Create a result; `received` is clamped to `sent`
    pub fn new(packets_sent: u32, packets_received: u32, rtt: Option<RttStats>) -> Self {
        Self {
            target: None,
            packets_sent,
            packets_received: packets_received.min(packets_sent),
            rtt,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Loss in percent; undefined when nothing was sent
    pub fn packet_loss_percent(&self) -> Option<f64> {
        if self.packets_sent == 0 {
            return None;
        }
        let ratio = self.packets_received as f64 / self.packets_sent as f64;
        Some((100.0 * (1.0 - ratio)).clamp(0.0, 100.0))
    }

    /// Whether at least one probe came back
    pub fn reached(&self) -> bool {
        self.packets_received > 0
    }
}

/// Output of the native speed test
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeedTestResult {
    pub download_mbps: Option<f64>,
    pub upload_mbps: Option<f64>,
    pub responsiveness_rpm: Option<f64>,
    pub idle_latency_ms: Option<f64>,
}

impl SpeedTestResult {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of the DNS reliability sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsTestResult {
    /// Resolver label: an address or `system default`
    pub resolver: String,
    pub domains_tested: usize,
    pub success_count: usize,
    pub failed_domains: Vec<String>,
    pub min_ms: Option<f64>,
    pub avg_ms: Option<f64>,
    pub max_ms: Option<f64>,
}

impl DnsTestResult {
    /// Aggregate per-domain outcomes. `None` timings mark failures.
    pub fn from_outcomes<I>(resolver: impl Into<String>, outcomes: I) -> Self
    where
        I: IntoIterator<Item = (String, Option<f64>)>,
    {
        let mut failed_domains = Vec::new();
        let mut timings = Vec::new();
        let mut domains_tested = 0;

        for (domain, elapsed_ms) in outcomes {
            domains_tested += 1;
            match elapsed_ms {
                Some(ms) => timings.push(ms),
                None => failed_domains.push(domain),
            }
        }

        let (min_ms, avg_ms, max_ms) = if timings.is_empty() {
            (None, None, None)
        } else {
            let min = timings.iter().copied().fold(f64::INFINITY, f64::min);
            let max = timings.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let avg = timings.iter().sum::<f64>() / timings.len() as f64;
            (Some(min), Some(avg), Some(max))
        };

        Self {
            resolver: resolver.into(),
            domains_tested,
            success_count: timings.len(),
            failed_domains,
            min_ms,
            avg_ms,
            max_ms,
        }
    }

    /// Success rate in percent; undefined for an empty sweep
    pub fn success_rate(&self) -> Option<f64> {
        if self.domains_tested == 0 {
            return None;
        }
        Some(self.success_count as f64 / self.domains_tested as f64 * 100.0)
    }
}

/// iperf3 bandwidth test; each direction independently optional
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandwidthResult {
    pub server: String,
    pub upload_mbps: Option<f64>,
    pub download_mbps: Option<f64>,
    pub upload_retransmits: Option<u64>,
    pub download_retransmits: Option<u64>,
}

impl BandwidthResult {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            upload_mbps: None,
            download_mbps: None,
            upload_retransmits: None,
            download_retransmits: None,
        }
    }

    /// True when neither direction produced a measurement
    pub fn is_empty(&self) -> bool {
        self.upload_mbps.is_none() && self.download_mbps.is_none()
    }
}

/// Geolocation of the public IP
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geolocation {
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub isp: Option<String>,
    pub org: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl Geolocation {
    /// `City, Region, Country`, skipping unknown parts
    pub fn summary(&self) -> Option<String> {
        let parts: Vec<&str> = [&self.city, &self.region, &self.country]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// Measurements that need internet reachability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OnlineMetrics {
    pub speed_test: Option<SpeedTestResult>,
    pub dns_test: Option<DnsTestResult>,
    pub bandwidth_test: Option<BandwidthResult>,
    /// One entry per well-known resolver that produced a ping summary
    #[serde(default)]
    pub global_pings: Vec<LatencyResult>,
    pub public_ip: Option<String>,
    pub geolocation: Option<Geolocation>,
}

impl OnlineMetrics {
    pub fn download_mbps(&self) -> Option<f64> {
        self.speed_test.as_ref()?.download_mbps
    }

    pub fn upload_mbps(&self) -> Option<f64> {
        self.speed_test.as_ref()?.upload_mbps
    }

    pub fn responsiveness_rpm(&self) -> Option<f64> {
        self.speed_test.as_ref()?.responsiveness_rpm
    }
}
