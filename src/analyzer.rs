//! Analysis orchestration
//!
//! Resolves the interface and the mode, runs the offline collector, then the
//! online collector when the mode allows it, and grades the result. A run
//! level timeout and an external cancellation (Ctrl-C) share one token; when
//! either fires the collectors stop early and the partial record is still
//! assessed.

use crate::collector::{
    probe_reachability, CollectContext, OfflineCollector, OfflineOptions, OnlineCollector, OnlineOptions,
};
use crate::command::{CommandRunner, CommandSpec};
use crate::defaults;
use crate::dns::SweepOptions;
use crate::error::{AppError, Result};
use crate::health::assess;
use crate::logging::{LoggerFactory, StepTimer};
use crate::models::config::validate_interface_name;
use crate::models::{Config, HealthAssessment, InterfaceRecord};
use crate::parsers::{default_route_interface, parse_routes};
use crate::types::{resolve_mode, BandwidthTarget, Mode, RequestedMode};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Per-run switches
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub skip_wifi_scan: bool,
    pub skip_dns_test: bool,
    pub bandwidth_target: Option<BandwidthTarget>,
}

impl AnalyzeOptions {
    /// Take the switches from a loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            skip_wifi_scan: config.skip_wifi_scan,
            skip_dns_test: config.skip_dns_test,
            bandwidth_target: config.bandwidth_target()?,
        })
    }
}

/// Why a run stopped before every step finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Interruption {
    /// The run-level timeout expired
    TimedOut,
    /// Cancelled from outside, e.g. Ctrl-C
    Cancelled,
}

impl Interruption {
    /// The error a caller reports for an interrupted run
    pub fn to_error(self) -> AppError {
        match self {
            Self::TimedOut => AppError::timeout("Run timeout expired before every step finished"),
            Self::Cancelled => AppError::cancelled("Analysis cancelled"),
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub mode: Mode,
    pub record: InterfaceRecord,
    pub assessment: HealthAssessment,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_seconds", serialize_with = "serialize_seconds")]
    pub duration: Duration,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interruption: Option<Interruption>,
}

impl Analysis {
    pub fn is_complete(&self) -> bool {
        self.interruption.is_none()
    }
}

fn serialize_seconds<S: Serializer>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

/// Runs analyses with one command runner and configuration
pub struct Analyzer {
    runner: Arc<dyn CommandRunner>,
    config: Config,
    factory: LoggerFactory,
    token: CancellationToken,
    run_timeout: Duration,
    probe_endpoints: Vec<String>,
}

impl Analyzer {
    pub fn new(runner: Arc<dyn CommandRunner>, config: Config) -> Self {
        let run_timeout = config.run_timeout();
        Self {
            runner,
            factory: LoggerFactory::new(config.clone()),
            config,
            token: CancellationToken::new(),
            run_timeout,
            probe_endpoints: defaults::PROBE_ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        }
    }

    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = timeout;
        self
    }

    /// Replace the `host:port` endpoints of the reachability probe
    pub fn with_probe_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.probe_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Token that cancels every run of this analyzer
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyze `interface`, or the default-route interface when `None`.
    ///
    /// Errors only for configuration problems found before collection and
    /// for an interface that does not exist. Everything else degrades into
    /// absent fields.
    pub async fn analyze(
        &self,
        interface: Option<&str>,
        requested: RequestedMode,
        options: &AnalyzeOptions,
    ) -> Result<Analysis> {
        if self.token.is_cancelled() {
            return Err(AppError::cancelled("Analysis cancelled before it started"));
        }
        if let Some(name) = interface {
            validate_interface_name(name)?;
        }

        let started_at = Utc::now();
        let started = Instant::now();
        let logger = self.factory.create_logger("ANALYZE").await;
        let mut timer = self.factory.create_step_timer().await;

        let run_token = self.token.child_token();
        let watchdog = {
            let run_token = run_token.clone();
            let run_timeout = self.run_timeout;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(run_timeout) => run_token.cancel(),
                    _ = run_token.cancelled() => {}
                }
            })
        };

        let ctx = CollectContext::new(
            self.runner.clone(),
            self.factory.create_collector_logger().await,
            run_token.clone(),
        )
        .with_command_timeout(self.config.command_timeout());

        let result = self.collect(&ctx, interface, requested, options, &mut timer).await;
        watchdog.abort();
        let (mode, record) = match result {
            Ok(collected) => collected,
            Err(e) => {
                let step = timer.active_steps().first().copied().unwrap_or("setup").to_string();
                self.factory.create_error_logger().await.log_abort(&e, &step).await;
                return Err(e);
            }
        };

        let interruption = if self.token.is_cancelled() {
            Some(Interruption::Cancelled)
        } else if run_token.is_cancelled() {
            Some(Interruption::TimedOut)
        } else {
            None
        };

        timer.start("assess").await;
        let assessment = assess(&record);
        timer.finish("assess").await;

        logger
            .info("Analysis finished")
            .field("interface", &record.name)
            .field("mode", mode.to_string())
            .field("score", assessment.score)
            .field("category", assessment.category.to_string())
            .field("interrupted", interruption.is_some())
            .log()
            .await;

        Ok(Analysis {
            mode,
            record,
            assessment,
            started_at,
            duration: started.elapsed(),
            interruption,
        })
    }

    async fn collect(
        &self,
        ctx: &CollectContext,
        interface: Option<&str>,
        requested: RequestedMode,
        options: &AnalyzeOptions,
        timer: &mut StepTimer,
    ) -> Result<(Mode, InterfaceRecord)> {
        let interface = match interface {
            Some(name) => name.to_string(),
            None => self.default_interface(ctx).await?,
        };

        let probe = if requested.needs_probe() {
            timer.start("probe").await;
            let endpoints: Vec<&str> = self.probe_endpoints.iter().map(String::as_str).collect();
            let reachable =
                probe_reachability(&endpoints, defaults::DEFAULT_PROBE_TIMEOUT, &ctx.token, &ctx.logger).await;
            timer.finish("probe").await;
            Some(reachable)
        } else {
            None
        };
        let mode = resolve_mode(requested, probe);

        timer.start("offline").await;
        ctx.logger.logger().enter_step(Some("offline")).await;
        let offline = OfflineCollector::new(
            ctx,
            OfflineOptions {
                skip_wifi_scan: options.skip_wifi_scan,
                ping_count: self.config.ping_count,
            },
        );
        let mut record = offline.collect(&interface).await?;
        timer.finish("offline").await;

        if mode.is_online() && !ctx.is_cancelled() {
            timer.start("online").await;
            ctx.logger.logger().enter_step(Some("online")).await;
            let online = OnlineCollector::new(ctx, self.online_options(options))?;
            record.online = Some(online.collect(&record).await);
            timer.finish("online").await;
        }
        ctx.logger.logger().enter_step(None).await;

        Ok((mode, record))
    }

    /// Interface of the default route
    async fn default_interface(&self, ctx: &CollectContext) -> Result<String> {
        let output = ctx.run(CommandSpec::new("netstat").arg("-rn")).await;
        if ctx.is_cancelled() {
            return Err(AppError::cancelled("Analysis cancelled while resolving the interface"));
        }

        let routes = output
            .as_ref()
            .and_then(|output| output.stdout_if_success())
            .map(parse_routes)
            .unwrap_or_default();

        let name = default_route_interface(&routes)
            .ok_or_else(|| AppError::config("No default route found; pass an interface with --interface"))?;
        validate_interface_name(name)?;
        Ok(name.to_string())
    }

    fn online_options(&self, options: &AnalyzeOptions) -> OnlineOptions {
        OnlineOptions {
            skip_dns_test: options.skip_dns_test,
            bandwidth_target: options.bandwidth_target.clone(),
            iperf3_duration_secs: self.config.iperf3_duration_secs,
            ping_count: self.config.ping_count,
            dns_backend: self.config.dns_backend,
            sweep: SweepOptions {
                concurrency: self.config.dns_concurrency,
                ..SweepOptions::default()
            },
            speed_test_timeout: self.config.speed_test_timeout(),
            public_ip_url: self.config.public_ip_url.clone(),
            geolocation_url: self.config.geolocation_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandOutput, ReplayRunner};
    use crate::models::HealthCategory;
    use async_trait::async_trait;

    const PORTS: &str = "
Hardware Port: Ethernet
Device: en0
Ethernet Address: a4:83:e7:12:34:56
";

    const IFCONFIG_EN0: &str = "en0: flags=8863<UP,BROADCAST,SMART,RUNNING,SIMPLEX,MULTICAST> mtu 1500
\tether a4:83:e7:12:34:56
\tinet 192.168.1.23 netmask 0xffffff00 broadcast 192.168.1.255
\tmedia: autoselect (1000baseT <full-duplex>)
\tstatus: active
";

    const ROUTES: &str = "Routing tables

Internet:
Destination        Gateway            Flags           Netif Expire
default            192.168.1.1        UGScg             en0
127                127.0.0.1          UCS               lo0
";

    const PING: &str = "PING 192.168.1.1 (192.168.1.1): 56 data bytes

--- 192.168.1.1 ping statistics ---
10 packets transmitted, 10 packets received, 0.0% packet loss
round-trip min/avg/max/stddev = 1.802/2.345/3.101/0.412 ms
";

    fn runner() -> ReplayRunner {
        ReplayRunner::new()
            .with_stdout("networksetup -listallhardwareports", PORTS)
            .with_stdout("ifconfig en0", IFCONFIG_EN0)
            .with_stdout("netstat -rn", ROUTES)
            .with_stdout("ping -c 10 192.168.1.1", PING)
    }

    fn quiet_config() -> Config {
        Config {
            enable_color: false,
            json_output: true,
            ..Config::default()
        }
    }

    /// Every command hangs
    struct StalledRunner;

    #[async_trait]
    impl CommandRunner for StalledRunner {
        async fn run(&self, _spec: &CommandSpec, timeout: Duration) -> CommandOutput {
            tokio::time::sleep(timeout).await;
            CommandOutput::timeout()
        }
    }

    #[tokio::test]
    async fn test_offline_analysis_of_named_interface() {
        let runner = Arc::new(runner());
        let analyzer = Analyzer::new(runner.clone(), quiet_config());

        let analysis = analyzer
            .analyze(Some("en0"), RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap();

        assert_eq!(analysis.mode, Mode::Offline);
        assert!(analysis.is_complete());
        assert_eq!(analysis.record.name, "en0");
        assert_eq!(analysis.record.is_active, Some(true));
        assert!(analysis.record.online.is_none());
        assert!(analysis.assessment.category >= HealthCategory::Good);
        assert!(!runner.was_called("networkQuality"));
    }

    #[tokio::test]
    async fn test_default_route_interface_is_used() {
        let analyzer = Analyzer::new(Arc::new(runner()), quiet_config());
        let analysis = analyzer
            .analyze(None, RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap();
        assert_eq!(analysis.record.name, "en0");
    }

    #[tokio::test]
    async fn test_missing_default_route_is_config_error() {
        let runner = ReplayRunner::new().with_stdout("netstat -rn", "Routing tables\n");
        let analyzer = Analyzer::new(Arc::new(runner), quiet_config());
        let err = analyzer
            .analyze(None, RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "CONFIG");
    }

    #[tokio::test]
    async fn test_invalid_interface_name_runs_nothing() {
        let runner = Arc::new(runner());
        let analyzer = Analyzer::new(runner.clone(), quiet_config());
        let err = analyzer
            .analyze(Some("en0; rm -rf /"), RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "CONFIG");
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_interface_is_rejected() {
        let analyzer = Analyzer::new(Arc::new(runner()), quiet_config());
        let err = analyzer
            .analyze(Some("en9"), RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.category(), "CONFIG");
    }

    #[tokio::test]
    async fn test_auto_mode_without_reachability_stays_offline() {
        let closed = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap()
            .local_addr()
            .unwrap()
            .to_string();
        let runner = Arc::new(runner());
        let analyzer = Analyzer::new(runner.clone(), quiet_config()).with_probe_endpoints([closed]);

        let analysis = analyzer
            .analyze(Some("en0"), RequestedMode::Auto, &AnalyzeOptions::default())
            .await
            .unwrap();
        assert_eq!(analysis.mode, Mode::Offline);
        assert!(!runner.was_called("networkQuality"));
    }

    #[tokio::test]
    async fn test_run_timeout_returns_partial_record() {
        let analyzer =
            Analyzer::new(Arc::new(StalledRunner), quiet_config()).with_run_timeout(Duration::from_millis(50));

        let analysis = analyzer
            .analyze(Some("en0"), RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap();
        assert_eq!(analysis.interruption, Some(Interruption::TimedOut));
        assert_eq!(analysis.record.is_active, None);
        assert_eq!(analysis.assessment.score, 100);
    }

    #[tokio::test]
    async fn test_cancelled_analyzer_refuses_to_start() {
        let analyzer = Analyzer::new(Arc::new(runner()), quiet_config());
        analyzer.cancellation_token().cancel();
        let err = analyzer
            .analyze(Some("en0"), RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 130);
    }

    #[tokio::test]
    async fn test_analysis_serializes_duration_in_seconds() {
        let analyzer = Analyzer::new(Arc::new(runner()), quiet_config());
        let analysis = analyzer
            .analyze(Some("en0"), RequestedMode::Offline, &AnalyzeOptions::default())
            .await
            .unwrap();

        let json = serde_json::to_value(&analysis).unwrap();
        assert_eq!(json["mode"], "offline");
        assert!(json["duration_seconds"].is_f64());
        assert!(json.get("interruption").is_none());
        assert_eq!(json["record"]["name"], "en0");
    }

    #[test]
    fn test_options_from_config() {
        let config = Config {
            skip_wifi_scan: true,
            iperf3_server: Some("10.0.0.5:5202".to_string()),
            ..Config::default()
        };
        let options = AnalyzeOptions::from_config(&config).unwrap();
        assert!(options.skip_wifi_scan);
        assert!(!options.skip_dns_test);
        assert_eq!(options.bandwidth_target.unwrap().port, Some(5202));

        let config = Config {
            iperf3_server: Some("bad host".to_string()),
            ..Config::default()
        };
        assert!(AnalyzeOptions::from_config(&config).is_err());
    }
}
