//! DNS reliability sweep
//!
//! A fixed list of well-known domains is resolved against one resolver with
//! bounded parallelism. Lookups go through a [`DomainResolver`]: `dig` driven
//! by the command runner by default, or the in-process trust-dns resolver.

use crate::{
    command::{CommandRunner, CommandSpec},
    defaults,
    error::{AppError, Result},
    logging::CollectorLogger,
    models::{DnsBackend, DnsTestResult},
    parsers::parse_dig,
};
use async_trait::async_trait;
use futures::future::join_all;
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use trust_dns_resolver::{
    config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};

/// Resolves one domain and reports how long it took
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Resolver address, or the system resolver label
    fn label(&self) -> &str;

    /// Resolve `domain`. Returns the lookup time in milliseconds.
    async fn lookup(&self, domain: &str) -> Result<f64>;
}

/// Queries through the `dig` utility
pub struct DigResolver {
    runner: Arc<dyn CommandRunner>,
    server: Option<String>,
    label: String,
    timeout: Duration,
}

impl DigResolver {
    pub fn new(runner: Arc<dyn CommandRunner>, server: Option<String>) -> Self {
        let label = server
            .clone()
            .unwrap_or_else(|| defaults::SYSTEM_RESOLVER_LABEL.to_string());
        Self {
            runner,
            server,
            label,
            timeout: defaults::DEFAULT_DNS_QUERY_TIMEOUT,
        }
    }

    /// `dig +time=3 +tries=1 [@server] <domain>`
    pub fn command(&self, domain: &str) -> CommandSpec {
        let mut spec = CommandSpec::new("dig").args([
            format!("+time={}", self.timeout.as_secs().max(1)),
            "+tries=1".to_string(),
        ]);
        if let Some(server) = &self.server {
            spec = spec.arg(format!("@{}", server));
        }
        spec.arg(domain)
    }
}

#[async_trait]
impl DomainResolver for DigResolver {
    fn label(&self) -> &str {
        &self.label
    }

    async fn lookup(&self, domain: &str) -> Result<f64> {
        let spec = self.command(domain);
        let started = Instant::now();
        let output = self.runner.run(&spec, self.timeout).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        if let Some(error) = output.to_error(&spec) {
            return Err(error);
        }

        let answer = parse_dig(&output.stdout)
            .ok_or_else(|| AppError::parse_miss(format!("dig output for {}", domain)))?;

        if !answer.is_success() {
            return Err(AppError::unreachable(format!(
                "{} did not resolve ({})",
                domain,
                answer.status.as_deref().unwrap_or("no answer")
            )));
        }

        Ok(answer.query_time_ms.unwrap_or(elapsed_ms))
    }
}

/// Queries with the in-process trust-dns resolver
pub struct NativeResolver {
    resolver: TokioAsyncResolver,
    label: String,
}

impl NativeResolver {
    /// Resolver that follows the system configuration
    pub fn system() -> Result<Self> {
        let (config, opts) = system_conf::read_system_conf()
            .map_err(|e| AppError::config(format!("Failed to read system DNS config: {}", e)))?;

        Ok(Self {
            resolver: TokioAsyncResolver::tokio(config, Self::sweep_opts(opts)),
            label: defaults::SYSTEM_RESOLVER_LABEL.to_string(),
        })
    }

    /// Resolver bound to a single server
    pub fn with_server(server: IpAddr) -> Self {
        let socket_addr = SocketAddr::new(server, 53);
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Udp));
        config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Tcp));

        Self {
            resolver: TokioAsyncResolver::tokio(config, Self::sweep_opts(ResolverOpts::default())),
            label: server.to_string(),
        }
    }

    // Every lookup must hit the wire
    fn sweep_opts(mut opts: ResolverOpts) -> ResolverOpts {
        opts.timeout = defaults::DEFAULT_DNS_QUERY_TIMEOUT;
        opts.attempts = 1;
        opts.cache_size = 0;
        opts
    }
}

#[async_trait]
impl DomainResolver for NativeResolver {
    fn label(&self) -> &str {
        &self.label
    }

    async fn lookup(&self, domain: &str) -> Result<f64> {
        let started = Instant::now();
        self.resolver.lookup_ip(domain).await?;
        Ok(started.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Build the resolver for a sweep against `server`, or the system resolver
/// when no server is known
pub fn build_resolver(
    backend: DnsBackend,
    runner: Arc<dyn CommandRunner>,
    server: Option<&str>,
) -> Result<Arc<dyn DomainResolver>> {
    // scutil prints link-local servers with a scope suffix: fe80::1%en0
    let server = server
        .map(|s| s.split('%').next().unwrap_or(s).trim().to_string())
        .filter(|s| !s.is_empty());

    match backend {
        DnsBackend::Dig => Ok(Arc::new(DigResolver::new(runner, server))),
        DnsBackend::Native => match server.and_then(|s| s.parse::<IpAddr>().ok()) {
            Some(ip) => Ok(Arc::new(NativeResolver::with_server(ip))),
            None => Ok(Arc::new(NativeResolver::system()?)),
        },
    }
}

/// Sweep parameters
#[derive(Debug, Clone)]
pub struct SweepOptions {
    pub concurrency: usize,
    pub query_timeout: Duration,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            concurrency: defaults::DEFAULT_DNS_CONCURRENCY,
            query_timeout: defaults::DEFAULT_DNS_QUERY_TIMEOUT,
        }
    }
}

/// Resolve every domain with at most `concurrency` lookups in flight.
///
/// A lookup that errors or exceeds the query timeout counts as failed.
/// Returns `None` when the token is cancelled before the sweep completes or
/// when there is nothing to query.
pub async fn run_dns_sweep(
    resolver: Arc<dyn DomainResolver>,
    domains: &[&str],
    options: &SweepOptions,
    token: &CancellationToken,
    logger: &CollectorLogger,
) -> Option<DnsTestResult> {
    if domains.is_empty() {
        return None;
    }

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = Vec::with_capacity(domains.len());

    for domain in domains {
        let domain = domain.to_string();
        let resolver = Arc::clone(&resolver);
        let semaphore = Arc::clone(&semaphore);
        let token = token.clone();
        let logger = logger.clone();
        let query_timeout = options.query_timeout;

        tasks.push(tokio::spawn(async move {
            let _permit = tokio::select! {
                _ = token.cancelled() => return None,
                permit = semaphore.acquire_owned() => permit.ok()?,
            };

            let elapsed_ms = tokio::select! {
                _ = token.cancelled() => return None,
                result = tokio::time::timeout(query_timeout, resolver.lookup(&domain)) => {
                    match result {
                        Ok(Ok(ms)) => Some(ms),
                        Ok(Err(_)) | Err(_) => None,
                    }
                }
            };

            logger.log_dns_lookup(&domain, resolver.label(), elapsed_ms).await;
            Some(elapsed_ms)
        }));
    }

    let results = join_all(tasks).await;
    if token.is_cancelled() {
        return None;
    }

    let mut outcomes = Vec::with_capacity(domains.len());
    for (domain, result) in domains.iter().zip(results) {
        match result {
            Ok(Some(elapsed_ms)) => outcomes.push((domain.to_string(), elapsed_ms)),
            Ok(None) => return None,
            // A panicked lookup is a failed lookup
            Err(_) => outcomes.push((domain.to_string(), None)),
        }
    }

    Some(DnsTestResult::from_outcomes(resolver.label(), outcomes))
}
