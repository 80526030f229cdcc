//! Structured logging for the network analyzer
//!
//! Log entries carry a level, the emitting component, the run step they
//! belong to and arbitrary structured fields. Warnings and above always go to
//! stderr. When the report itself is printed as JSON every entry goes to
//! stderr so stdout stays machine-readable.

use crate::command::{CommandOutput, CommandSpec, CommandStatus};
use crate::error::AppError;
use crate::merge::Source;
use crate::models::Config;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Log level, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    /// The run cannot continue
    Fatal = 5,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// ANSI color used by the console format
    pub fn color_code(&self) -> &'static str {
        match self {
            LogLevel::Trace => "\x1b[37m",
            LogLevel::Debug => "\x1b[36m",
            LogLevel::Info => "\x1b[32m",
            LogLevel::Warn => "\x1b[33m",
            LogLevel::Error => "\x1b[31m",
            LogLevel::Fatal => "\x1b[35m",
        }
    }

    pub fn reset_code() -> &'static str {
        "\x1b[0m"
    }

    /// Level derived from the verbosity flags: debug, then verbose, else warnings only
    pub fn from_config(config: &Config) -> Self {
        if config.debug {
            LogLevel::Debug
        } else if config.verbose {
            LogLevel::Info
        } else {
            LogLevel::Warn
        }
    }
}

/// One structured log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    /// Emitting component, e.g. `COLLECT`
    pub logger: String,
    /// Run step the entry belongs to, e.g. `offline`
    pub step: Option<String>,
    pub fields: HashMap<String, serde_json::Value>,
    pub thread_id: Option<String>,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogFormat {
    /// Human-readable console format
    Console,
    /// One JSON object per line
    Json,
}

/// Context shared by every clone of a logger
#[derive(Debug, Default)]
struct LogContext {
    session_id: Option<String>,
    current_step: Option<String>,
}

/// Logger with a minimum level and an output format.
///
/// Clones share the session id and the current step.
#[derive(Debug, Clone)]
pub struct Logger {
    min_level: LogLevel,
    use_color: bool,
    /// Keep stdout free for the report
    stderr_only: bool,
    format: LogFormat,
    name: String,
    context: Arc<RwLock<LogContext>>,
}

impl Logger {
    pub fn new(name: String) -> Self {
        Self {
            min_level: LogLevel::Info,
            use_color: true,
            stderr_only: false,
            format: LogFormat::Console,
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Create a logger whose level, color and format follow the run configuration
    pub fn with_config(name: String, config: &Config) -> Self {
        Self {
            min_level: LogLevel::from_config(config),
            use_color: config.enable_color,
            stderr_only: config.json_output,
            format: if config.debug { LogFormat::Json } else { LogFormat::Console },
            name,
            context: Arc::new(RwLock::new(LogContext::default())),
        }
    }

    /// Logger that drops everything; used where no configuration is at hand
    pub fn silent(name: &str) -> Self {
        let mut logger = Self::new(name.to_string());
        logger.min_level = LogLevel::Fatal;
        logger.stderr_only = true;
        logger
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn set_session_id(&self, session_id: String) {
        let mut context = self.context.write().await;
        context.session_id = Some(session_id);
    }

    /// Tag subsequent entries of this logger and its clones with `step`
    pub async fn enter_step(&self, step: Option<&str>) {
        let mut context = self.context.write().await;
        context.current_step = step.map(str::to_string);
    }

    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn trace(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    async fn write_entry(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        let context = self.context.read().await;
        if let Some(session_id) = &context.session_id {
            entry
                .fields
                .insert("session_id".to_string(), serde_json::Value::String(session_id.clone()));
        }
        if entry.step.is_none() {
            entry.step = context.current_step.clone();
        }
        drop(context);

        let output = self.render(&entry);

        if self.stderr_only || entry.level >= LogLevel::Warn {
            let _ = writeln!(io::stderr(), "{}", output);
        } else {
            let _ = writeln!(io::stdout(), "{}", output);
        }
    }

    fn render(&self, entry: &LogEntry) -> String {
        match self.format {
            LogFormat::Console => self.format_console(entry),
            LogFormat::Json => self.format_json(entry),
        }
    }

    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = entry.level.as_str();

        let formatted_level = if self.use_color {
            format!("{}{:>5}{}", entry.level.color_code(), level_str, LogLevel::reset_code())
        } else {
            format!("{:>5}", level_str)
        };

        let mut output = format!("{} {} [{}] {}", timestamp, formatted_level, entry.logger, entry.message);

        if let Some(step) = &entry.step {
            output.push_str(&format!(" ({})", step));
        }

        if !entry.fields.is_empty() {
            let mut fields: Vec<String> = entry
                .fields
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            fields.sort();
            output.push_str(&format!(" {{{}}}", fields.join(", ")));
        }

        output
    }

    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => serde_json::json!({
                "error": "Failed to serialize log entry",
                "message": entry.message,
            })
            .to_string(),
        }
    }
}

/// Builder for one log entry
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                step: None,
                fields: HashMap::new(),
                thread_id: std::thread::current().name().map(String::from),
            },
        }
    }

    /// Add a structured field. Values that fail to serialize are dropped.
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Attach a command and the way it ended
    pub fn command(self, spec: &CommandSpec, output: &CommandOutput) -> Self {
        self.field("command", spec.command_line())
            .field("exit_code", output.exit_code)
            .field("timed_out", output.timed_out)
            .field("tool_absent", output.tool_absent)
            .field("stdout_bytes", output.stdout.len())
    }

    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
            .field("error_exit_code", error.exit_code())
    }

    pub async fn log(self) {
        self.logger.write_entry(self.entry).await;
    }
}

/// Logs what the collectors do: commands, extractions, lookups and probes
#[derive(Debug, Clone)]
pub struct CollectorLogger {
    logger: Logger,
}

impl CollectorLogger {
    pub fn new(config: &Config) -> Self {
        Self::from_logger(Logger::with_config("COLLECT".to_string(), config))
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    /// Collector logger that never prints
    pub fn silent() -> Self {
        Self::from_logger(Logger::silent("COLLECT"))
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Log a finished command. Failures are informational; the affected
    /// fields simply stay absent.
    pub async fn log_command(&self, spec: &CommandSpec, output: &CommandOutput, elapsed: Duration) {
        let (level, outcome) = match output.status() {
            CommandStatus::Success => (LogLevel::Debug, "ok"),
            CommandStatus::Failed => (LogLevel::Info, "failed"),
            CommandStatus::ToolAbsent => (LogLevel::Info, "tool absent"),
            CommandStatus::TimedOut => (LogLevel::Warn, "timed out"),
        };

        let mut builder = self
            .logger
            .log(level, &format!("{} -> {} in {}ms", spec, outcome, elapsed.as_millis()))
            .command(spec, output)
            .field("duration_ms", elapsed.as_secs_f64() * 1000.0);

        let stderr = output.stderr.trim();
        if !stderr.is_empty() && output.status() != CommandStatus::Success {
            builder = builder.field("stderr", stderr);
        }

        builder.log().await;
    }

    /// An extractor found nothing usable in the output of a source
    pub async fn log_extract_miss(&self, source: Source, interface: &str) {
        let error = AppError::parse_miss(format!("{} for {}", source, interface));
        self.logger
            .debug(&format!("No fields extracted from {} for {}", source, interface))
            .field("source", source.to_string())
            .field("interface", interface)
            .error_info(&error)
            .log()
            .await;
    }

    pub async fn log_dns_lookup(&self, domain: &str, resolver: &str, elapsed_ms: Option<f64>) {
        let success = elapsed_ms.is_some();
        self.logger
            .trace(&format!(
                "DNS lookup {} via {}: {}",
                domain,
                resolver,
                if success { "ok" } else { "failed" }
            ))
            .field("domain", domain)
            .field("resolver", resolver)
            .field("success", success)
            .field("duration_ms", elapsed_ms)
            .log()
            .await;
    }

    pub async fn log_http_request(&self, url: &str, status_code: Option<u16>, duration_ms: f64) {
        let success = status_code.is_some_and(|code| (200..400).contains(&code));
        let level = if success { LogLevel::Debug } else { LogLevel::Info };

        self.logger
            .log(
                level,
                &format!(
                    "GET {} -> {} in {:.1}ms",
                    url,
                    status_code.map_or("FAILED".to_string(), |c| c.to_string()),
                    duration_ms
                ),
            )
            .field("url", url)
            .field("status_code", status_code)
            .field("success", success)
            .field("duration_ms", duration_ms)
            .log()
            .await;
    }

    /// Log one reachability probe attempt
    pub async fn log_probe(&self, target: &str, success: bool, error: Option<&str>) {
        let message = if success {
            format!("Reached {}", target)
        } else {
            format!("Could not reach {}: {}", target, error.unwrap_or("unknown error"))
        };

        let mut builder = self
            .logger
            .debug(&message)
            .field("target", target)
            .field("success", success);
        if let Some(err) = error {
            builder = builder.field("error", err);
        }
        builder.log().await;
    }
}

/// Times the steps of a run
pub struct StepTimer {
    logger: Logger,
    start_times: HashMap<String, DateTime<Utc>>,
}

impl StepTimer {
    pub fn new(config: &Config) -> Self {
        Self::from_logger(Logger::with_config("TIMING".to_string(), config))
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self {
            logger,
            start_times: HashMap::new(),
        }
    }

    pub async fn start(&mut self, step: &str) {
        let start_time = Utc::now();
        self.start_times.insert(step.to_string(), start_time);

        self.logger
            .debug(&format!("Step started: {}", step))
            .field("step", step)
            .field("start_time", start_time)
            .log()
            .await;
    }

    /// Stop timing `step`. Returns `None` for a step that was never started.
    pub async fn finish(&mut self, step: &str) -> Option<chrono::Duration> {
        let Some(start_time) = self.start_times.remove(step) else {
            self.logger
                .warn(&format!("Finish for a step that never started: {}", step))
                .field("step", step)
                .log()
                .await;
            return None;
        };

        let elapsed = Utc::now() - start_time;
        self.logger
            .info(&format!("Step {} took {}ms", step, elapsed.num_milliseconds()))
            .field("step", step)
            .field("duration_ms", elapsed.num_milliseconds())
            .log()
            .await;

        Some(elapsed)
    }

    pub fn active_steps(&self) -> Vec<&str> {
        let mut steps: Vec<&str> = self.start_times.keys().map(String::as_str).collect();
        steps.sort_unstable();
        steps
    }
}

/// Logs errors together with their category and exit code
pub struct ErrorEventLogger {
    logger: Logger,
}

impl ErrorEventLogger {
    pub fn new(config: &Config) -> Self {
        Self::from_logger(Logger::with_config("ERR".to_string(), config))
    }

    pub fn from_logger(logger: Logger) -> Self {
        Self { logger }
    }

    /// Log an error that ends the run. The reporter prints the error itself,
    /// so this entry only shows up with `--verbose` or `--debug`.
    pub async fn log_abort(&self, error: &AppError, step: &str) {
        self.logger
            .info(&format!("Analysis aborted during {}: {}", step, error))
            .field("step", step)
            .error_info(error)
            .log()
            .await;
    }

    /// Log a metric that was dropped because of a recoverable error
    pub async fn log_degraded(&self, error: &AppError, metric: &str) {
        let level = match error {
            AppError::ParseMiss(_) => LogLevel::Debug,
            AppError::ToolAbsent(_) => LogLevel::Info,
            _ => LogLevel::Warn,
        };

        self.logger
            .log(level, &format!("{} unavailable: {}", metric, error))
            .field("metric", metric)
            .error_info(error)
            .log()
            .await;
    }
}

/// Creates loggers that share one session id
pub struct LoggerFactory {
    config: Config,
    session_id: String,
}

impl LoggerFactory {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session_id: Uuid::new_v4().to_string(),
        }
    }

    pub async fn create_logger(&self, name: &str) -> Logger {
        let logger = Logger::with_config(name.to_string(), &self.config);
        logger.set_session_id(self.session_id.clone()).await;
        logger
    }

    pub async fn create_collector_logger(&self) -> CollectorLogger {
        CollectorLogger::from_logger(self.create_logger("COLLECT").await)
    }

    pub async fn create_step_timer(&self) -> StepTimer {
        StepTimer::from_logger(self.create_logger("TIMING").await)
    }

    pub async fn create_error_logger(&self) -> ErrorEventLogger {
        ErrorEventLogger::from_logger(self.create_logger("ERR").await)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
