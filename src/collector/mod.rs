//! Metric collection
//!
//! The offline collector reads the local utilities, the online collector
//! measures throughput, DNS reliability and the public address. Both share a
//! [`CollectContext`]: the command runner, the logger and the run-level
//! cancellation token.

pub mod offline;
pub mod online;

pub use offline::{OfflineCollector, OfflineOptions};
pub use online::{OnlineCollector, OnlineOptions};

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::defaults;
use crate::logging::CollectorLogger;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

/// State shared by the collectors of one run
#[derive(Clone)]
pub struct CollectContext {
    pub runner: Arc<dyn CommandRunner>,
    pub logger: CollectorLogger,
    pub token: CancellationToken,
    /// Budget for ordinary commands
    pub command_timeout: Duration,
}

impl CollectContext {
    pub fn new(runner: Arc<dyn CommandRunner>, logger: CollectorLogger, token: CancellationToken) -> Self {
        Self {
            runner,
            logger,
            token,
            command_timeout: defaults::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run a command with the default budget
    pub async fn run(&self, spec: CommandSpec) -> Option<CommandOutput> {
        self.run_with_timeout(spec, self.command_timeout).await
    }

    /// Run a command, abandoning it on cancellation. Returns `None` when
    /// the run was cancelled; the dropped child is killed.
    pub async fn run_with_timeout(&self, spec: CommandSpec, timeout: Duration) -> Option<CommandOutput> {
        if self.token.is_cancelled() {
            return None;
        }

        let started = Instant::now();
        let output = tokio::select! {
            _ = self.token.cancelled() => return None,
            output = self.runner.run(&spec, timeout) => output,
        };

        self.logger.log_command(&spec, &output, started.elapsed()).await;
        Some(output)
    }
}

/// TCP reachability probe. Tries `endpoints` in order and succeeds on the
/// first completed connect. Cancellation counts as unreachable.
pub async fn probe_reachability(
    endpoints: &[&str],
    timeout: Duration,
    token: &CancellationToken,
    logger: &CollectorLogger,
) -> bool {
    for endpoint in endpoints {
        let attempt = tokio::select! {
            _ = token.cancelled() => return false,
            attempt = tokio::time::timeout(timeout, TcpStream::connect(*endpoint)) => attempt,
        };

        match attempt {
            Ok(Ok(_stream)) => {
                logger.log_probe(endpoint, true, None).await;
                return true;
            }
            Ok(Err(e)) => logger.log_probe(endpoint, false, Some(&e.to_string())).await,
            Err(_) => logger.log_probe(endpoint, false, Some("timed out")).await,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ReplayRunner;
    use tokio::net::TcpListener;

    fn context(runner: ReplayRunner) -> CollectContext {
        CollectContext::new(Arc::new(runner), CollectorLogger::silent(), CancellationToken::new())
    }

    #[tokio::test]
    async fn test_run_returns_output() {
        let ctx = context(ReplayRunner::new().with_stdout("scutil --dns", "DNS configuration"));
        let output = ctx.run(CommandSpec::new("scutil").arg("--dns")).await.unwrap();
        assert!(output.is_success());
    }

    #[tokio::test]
    async fn test_run_after_cancel_is_skipped() {
        let runner = Arc::new(ReplayRunner::new().with_stdout("scutil --dns", "DNS configuration"));
        let ctx = CollectContext::new(runner.clone(), CollectorLogger::silent(), CancellationToken::new());
        ctx.token.cancel();

        assert!(ctx.run(CommandSpec::new("scutil").arg("--dns")).await.is_none());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_probe_succeeds_on_listening_endpoint() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let reachable = probe_reachability(
            &[addr.as_str()],
            Duration::from_secs(1),
            &CancellationToken::new(),
            &CollectorLogger::silent(),
        )
        .await;
        assert!(reachable);
    }

    #[tokio::test]
    async fn test_probe_falls_through_to_next_endpoint() {
        // Bind then drop to get a port nobody listens on
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap().local_addr().unwrap().to_string();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open = listener.local_addr().unwrap().to_string();

        let reachable = probe_reachability(
            &[closed.as_str(), open.as_str()],
            Duration::from_secs(1),
            &CancellationToken::new(),
            &CollectorLogger::silent(),
        )
        .await;
        assert!(reachable);
    }

    #[tokio::test]
    async fn test_cancelled_probe_is_unreachable() {
        let token = CancellationToken::new();
        token.cancel();
        let reachable = probe_reachability(
            &["127.0.0.1:9"],
            Duration::from_secs(1),
            &token,
            &CollectorLogger::silent(),
        )
        .await;
        assert!(!reachable);
    }
}
