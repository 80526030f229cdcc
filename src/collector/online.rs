//! Online collector: throughput, DNS reliability and public address

use super::CollectContext;
use crate::command::CommandSpec;
use crate::defaults;
use crate::dns::{build_resolver, run_dns_sweep, SweepOptions};
use crate::error::{AppError, Result};
use crate::logging::ErrorEventLogger;
use crate::merge::Source;
use crate::models::{
    BandwidthResult, DnsBackend, DnsTestResult, Geolocation, InterfaceRecord, LatencyResult,
    OnlineMetrics, SpeedTestResult,
};
use crate::parsers::{parse_iperf3, parse_network_quality, parse_ping, IperfPass};
use crate::types::BandwidthTarget;
use futures::future::join_all;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct OnlineOptions {
    pub skip_dns_test: bool,
    pub bandwidth_target: Option<BandwidthTarget>,
    pub iperf3_duration_secs: u32,
    pub ping_count: u32,
    pub dns_backend: DnsBackend,
    pub sweep: SweepOptions,
    pub speed_test_timeout: Duration,
    pub public_ip_url: String,
    pub geolocation_url: String,
}

impl Default for OnlineOptions {
    fn default() -> Self {
        Self {
            skip_dns_test: false,
            bandwidth_target: None,
            iperf3_duration_secs: defaults::DEFAULT_IPERF3_DURATION_SECS,
            ping_count: defaults::DEFAULT_PING_COUNT,
            dns_backend: DnsBackend::default(),
            sweep: SweepOptions::default(),
            speed_test_timeout: defaults::DEFAULT_SPEED_TEST_TIMEOUT,
            public_ip_url: defaults::DEFAULT_PUBLIC_IP_URL.to_string(),
            geolocation_url: defaults::DEFAULT_GEOLOCATION_URL.to_string(),
        }
    }
}

/// `{"ip": "203.0.113.7"}`
#[derive(Debug, Deserialize)]
struct PublicIpResponse {
    ip: String,
}

/// ip-api.com response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeolocationResponse {
    status: Option<String>,
    message: Option<String>,
    country: Option<String>,
    region_name: Option<String>,
    city: Option<String>,
    isp: Option<String>,
    org: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl From<GeolocationResponse> for Geolocation {
    fn from(response: GeolocationResponse) -> Self {
        Self {
            country: response.country,
            region: response.region_name,
            city: response.city,
            isp: response.isp,
            org: response.org,
            lat: response.lat,
            lon: response.lon,
        }
    }
}

pub struct OnlineCollector<'a> {
    ctx: &'a CollectContext,
    options: OnlineOptions,
    http: reqwest::Client,
    errors: ErrorEventLogger,
}

impl<'a> OnlineCollector<'a> {
    pub fn new(ctx: &'a CollectContext, options: OnlineOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(defaults::DEFAULT_HTTP_TIMEOUT)
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            ctx,
            options,
            http,
            errors: ErrorEventLogger::from_logger(ctx.logger.logger().clone()),
        })
    }

    /// Run every online step. Each step degrades to an absent field on its
    /// own; cancellation skips whatever has not started yet.
    ///
    /// The throughput tests run first and one at a time so they have the
    /// link to themselves; the lighter steps then run together.
    pub async fn collect(&self, record: &InterfaceRecord) -> OnlineMetrics {
        let mut metrics = OnlineMetrics::default();

        metrics.speed_test = self.speed_test(&record.name).await;
        if let Some(target) = &self.options.bandwidth_target {
            if !self.ctx.is_cancelled() {
                metrics.bandwidth_test = self.bandwidth_test(target).await;
            }
        }
        if self.ctx.is_cancelled() {
            return metrics;
        }

        let resolver = record.dns.first().map(String::as_str);
        let (dns_test, global_pings, public_ip, geolocation) = tokio::join!(
            self.dns_step(resolver),
            self.global_pings(),
            self.public_ip(),
            self.geolocation(),
        );

        metrics.dns_test = dns_test;
        metrics.global_pings = global_pings;
        match public_ip {
            Ok(ip) => metrics.public_ip = Some(ip),
            Err(e) => self.errors.log_degraded(&e, "public IP").await,
        }
        match geolocation {
            Ok(geo) => metrics.geolocation = Some(geo),
            Err(e) => self.errors.log_degraded(&e, "geolocation").await,
        }

        metrics
    }

    async fn dns_step(&self, server: Option<&str>) -> Option<DnsTestResult> {
        if self.options.skip_dns_test {
            return None;
        }
        self.dns_sweep(server).await
    }

    /// Ping every well-known resolver at once. Targets whose ping produced
    /// no summary are left out.
    pub async fn global_pings(&self) -> Vec<LatencyResult> {
        let runs = defaults::GLOBAL_PING_TARGETS
            .iter()
            .map(|(address, label)| self.global_ping(address, label));
        join_all(runs).await.into_iter().flatten().collect()
    }

    async fn global_ping(&self, address: &str, label: &str) -> Option<LatencyResult> {
        let spec = CommandSpec::new("ping").args([
            "-c".to_string(),
            self.options.ping_count.to_string(),
            address.to_string(),
        ]);
        let output = self.ctx.run(spec).await?;
        // Total loss exits non-zero but still prints the summary
        let text = output.stdout_if_ran()?;

        match parse_ping(text, Some(address)) {
            Some(latency) => Some(latency.with_target(format!("{} ({})", label, address))),
            None => {
                self.ctx.logger.log_extract_miss(Source::Ping, address).await;
                None
            }
        }
    }

    /// `networkQuality -I <if> -v`
    pub async fn speed_test(&self, interface: &str) -> Option<SpeedTestResult> {
        let spec = CommandSpec::new("networkQuality").args(["-I", interface, "-v"]);
        let output = self
            .ctx
            .run_with_timeout(spec.clone(), self.options.speed_test_timeout)
            .await?;

        if let Some(error) = output.to_error(&spec) {
            self.errors.log_degraded(&error, "speed test").await;
            return None;
        }
        let result = parse_network_quality(&output.stdout);
        if result.is_none() {
            self.errors
                .log_degraded(&AppError::parse_miss("networkQuality summary"), "speed test")
                .await;
        }
        result
    }

    pub async fn dns_sweep(&self, server: Option<&str>) -> Option<DnsTestResult> {
        let resolver = match build_resolver(self.options.dns_backend, self.ctx.runner.clone(), server) {
            Ok(resolver) => resolver,
            Err(e) => {
                self.errors.log_degraded(&e, "DNS test").await;
                return None;
            }
        };

        run_dns_sweep(
            resolver,
            &defaults::DNS_TEST_DOMAINS,
            &self.options.sweep,
            &self.ctx.token,
            &self.ctx.logger,
        )
        .await
    }

    /// Upload pass, then reverse (download) pass. A failed direction stays
    /// absent; `None` only when neither direction produced a number.
    pub async fn bandwidth_test(&self, target: &BandwidthTarget) -> Option<BandwidthResult> {
        let mut result = BandwidthResult::new(target.to_string());

        if let Some(pass) = self.iperf_pass(target, false).await {
            result.upload_mbps = Some(pass.mbps);
            result.upload_retransmits = pass.retransmits;
        }
        if let Some(pass) = self.iperf_pass(target, true).await {
            result.download_mbps = Some(pass.mbps);
            result.download_retransmits = pass.retransmits;
        }

        (!result.is_empty()).then_some(result)
    }

    fn iperf_command(&self, target: &BandwidthTarget, reverse: bool) -> CommandSpec {
        let port = target.port.unwrap_or(defaults::DEFAULT_IPERF3_PORT);
        let spec = CommandSpec::new("iperf3").args([
            "-c".to_string(),
            target.host.clone(),
            "-p".to_string(),
            port.to_string(),
            "-t".to_string(),
            self.options.iperf3_duration_secs.to_string(),
            "-J".to_string(),
        ]);
        if reverse {
            spec.arg("-R")
        } else {
            spec
        }
    }

    async fn iperf_pass(&self, target: &BandwidthTarget, reverse: bool) -> Option<IperfPass> {
        let direction = if reverse { "bandwidth download" } else { "bandwidth upload" };
        let spec = self.iperf_command(target, reverse);
        // The test itself runs for the configured duration
        let timeout = Duration::from_secs(u64::from(self.options.iperf3_duration_secs) + 30);

        let output = self.ctx.run_with_timeout(spec.clone(), timeout).await?;
        // iperf3 -J reports its own errors as JSON on a non-zero exit
        let Some(text) = output.stdout_if_ran() else {
            if let Some(error) = output.to_error(&spec) {
                self.errors.log_degraded(&error, direction).await;
            }
            return None;
        };

        let pass = parse_iperf3(text, reverse);
        if pass.is_none() {
            let error = AppError::unreachable(format!("iperf3 server {}", target));
            self.errors.log_degraded(&error, direction).await;
        }
        pass
    }

    pub async fn public_ip(&self) -> Result<String> {
        let response: PublicIpResponse = self.fetch_json(&self.options.public_ip_url).await?;
        let ip = response.ip.trim();
        if ip.is_empty() {
            return Err(AppError::parse_miss("public IP response without an address"));
        }
        Ok(ip.to_string())
    }

    pub async fn geolocation(&self) -> Result<Geolocation> {
        let response: GeolocationResponse = self.fetch_json(&self.options.geolocation_url).await?;
        match response.status.as_deref() {
            Some("success") | None => Ok(response.into()),
            Some(_) => Err(AppError::unreachable(format!(
                "geolocation lookup failed: {}",
                response.message.as_deref().unwrap_or("unknown reason")
            ))),
        }
    }

    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tokio::select! {
            _ = self.ctx.token.cancelled() => Err(AppError::cancelled(url.to_string())),
            result = self.send_json(url) => result,
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_secs_f64() * 1000.0;

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.ctx.logger.log_http_request(url, None, elapsed_ms()).await;
                return Err(e.into());
            }
        };

        let status = response.status();
        self.ctx
            .logger
            .log_http_request(url, Some(status.as_u16()), elapsed_ms())
            .await;
        if !status.is_success() {
            return Err(AppError::unreachable(format!("{} returned {}", url, status)));
        }

        Ok(response.json::<T>().await?)
    }
}
